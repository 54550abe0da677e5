//! Resolution of the config file plus global flags into the core's
//! `BackendConfig`, `EngineConfig` and `CollectionConfig`.

use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use gridline_config::{Config, Profile};
use gridline_core::{BackendConfig, CollectionConfig, EngineConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use gridline_config::{config_path, load_config_or_default};

/// Everything a command needs to mount a table.
pub struct Resolved {
    pub backend: BackendConfig,
    pub engine: EngineConfig,
    pub collection: CollectionConfig,
}

pub fn resolve(global: &GlobalOpts, collection: &str) -> Result<Resolved, CliError> {
    let cfg = gridline_config::load_config()?;
    Ok(Resolved {
        backend: backend_config(&cfg, global)?,
        engine: cfg.defaults.engine_config()?,
        collection: collection_config(&cfg, collection)?,
    })
}

/// Profile (if any) with flag overrides. Without a profile, `--base-url`
/// alone is enough for an unauthenticated backend.
fn backend_config(cfg: &Config, global: &GlobalOpts) -> Result<BackendConfig, CliError> {
    let selected = global.profile.as_deref();
    let (profile_name, mut profile) = match cfg.profile(selected) {
        Ok((name, profile)) => (Some(name.to_owned()), profile.clone()),
        // An explicitly requested profile must exist
        Err(e) if selected.is_some() => return Err(e.into()),
        Err(_) => {
            let base_url = global.base_url.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let profile = Profile {
                base_url,
                ..Profile::default()
            };
            (None, profile)
        }
    };
    debug!(profile = profile_name.as_deref().unwrap_or("(flags)"), "resolved profile");

    if let Some(ref url) = global.base_url {
        profile.base_url.clone_from(url);
    }

    // Flags-only runs have no profile to look up credentials for
    let token = match (&global.token, &profile_name) {
        (Some(token), _) => Some(SecretString::from(token.clone())),
        (None, Some(name)) => gridline_config::resolve_token(&profile, name)?,
        (None, None) => None,
    };

    let mut backend = gridline_config::profile_to_backend_config(&profile, &cfg.defaults, token)?;
    if global.insecure {
        backend.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        backend.timeout = Duration::from_secs(secs);
    }
    Ok(backend)
}

/// A configured collection, or an ad-hoc one whose name is its path.
fn collection_config(cfg: &Config, name: &str) -> Result<CollectionConfig, CliError> {
    if let Some(section) = cfg.collections.get(name) {
        return Ok(section.to_collection_config(name)?);
    }
    let path = name.trim_matches('/');
    if path.is_empty() {
        return Err(CliError::Validation {
            field: "collection".into(),
            reason: "must not be empty".into(),
        });
    }
    debug!(collection = path, "not configured, using name as path");
    let short = path.rsplit('/').next().unwrap_or(path);
    Ok(CollectionConfig::new(short, path))
}
