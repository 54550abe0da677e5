//! Clap derive structures for the `gridline` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gridline -- browse and bulk-edit paginated REST collections
#[derive(Debug, Parser)]
#[command(
    name = "gridline",
    version,
    about = "Browse, search, import and export paginated REST collections",
    long_about = "Lists any paginated REST collection as a table, with search,\n\
        page-size control, CSV export, CSV/XLSX bulk import and row mutations.\n\n\
        Collections are described in the config file; an unconfigured name is\n\
        treated as a path under the backend's base URL.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "GRIDLINE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend base URL (overrides profile)
    #[arg(long, short = 'u', env = "GRIDLINE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token (overrides profile)
    #[arg(long, env = "GRIDLINE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GRIDLINE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "GRIDLINE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "GRIDLINE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// CSV in the collection's export layout
    Csv,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List one page of a collection
    #[command(alias = "ls")]
    List(ListArgs),

    /// Export one page (or selected rows) as CSV
    Export(ExportArgs),

    /// Create rows in bulk from a CSV or XLSX file
    Import(ImportArgs),

    /// Create a single row from a JSON payload
    Create(CreateArgs),

    /// Update a row from a JSON payload
    #[command(alias = "edit")]
    Update(UpdateArgs),

    /// Delete a row
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Page, size and search flags shared by list and export.
#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Rows per page (one of the configured page sizes)
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,

    /// Search text
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Collection name from the config file, or a path
    pub collection: String,

    #[command(flatten)]
    pub page: PageArgs,

    /// Keep the actions column in table output
    #[arg(long)]
    pub actions: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    pub collection: String,

    #[command(flatten)]
    pub page: PageArgs,

    /// Export only these row ids (must be on the loaded page)
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Write to a file instead of stdout
    #[arg(long = "out", short = 'f', value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub collection: String,

    /// CSV or XLSX file; the first row is the header
    pub file: PathBuf,

    /// Concurrent create requests (overrides config)
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub collection: String,

    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub collection: String,

    /// Row id
    pub id: String,

    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// Inline JSON object
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Read the JSON object from a file
    #[arg(long = "from-file", short = 'F', value_name = "FILE")]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub collection: String,

    /// Row id
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the config with secrets masked
    Show,

    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List profiles and configured collections
    Profiles,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
