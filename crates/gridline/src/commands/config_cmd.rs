//! Config subcommand handlers.

use std::fmt::Write as _;

use gridline_config::{Config, ConfigError};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

/// Copy of the config with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(MASK.into());
        }
    }
    cfg
}

fn format_profiles(cfg: &Config) -> String {
    let default = cfg.default_profile.as_deref().unwrap_or("default");
    let mut out = String::new();
    if cfg.profiles.is_empty() {
        out.push_str("No profiles configured\n");
    }
    for (name, profile) in &cfg.profiles {
        let marker = if name == default { "*" } else { " " };
        let _ = writeln!(out, "{marker} {name}\t{}", profile.base_url);
    }
    if !cfg.collections.is_empty() {
        out.push_str("\nCollections:\n");
        for (name, section) in &cfg.collections {
            let _ = writeln!(out, "  {name}\t{}", section.path);
        }
    }
    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = gridline_config::load_config()?;
            let text = toml::to_string_pretty(&redacted(&cfg)).map_err(ConfigError::from)?;
            output::print_output(&text, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists (use --force to overwrite)", path.display()),
                });
            }
            gridline_config::save_config_to(&Config::example(), &path)?;
            if !global.quiet {
                eprintln!("Wrote starter config to {}", path.display());
                eprintln!("Edit base_url and set GRIDLINE_TOKEN, then run: gridline list products");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            output::print_output(&format_profiles(&cfg), global.quiet);
            Ok(())
        }
    }
}
