use clap::{Args, Parser, Subcommand, ValueEnum};
use libbeacon_core::Format;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "beacon", about = "Compose portable project snapshots for AI threads", version)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress human-readable output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the config directory (default: $BEACON_HOME or .beacon)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compose a snapshot and deliver it
    Compose(ComposeArgs),

    /// Check that a copied snapshot parses and is well-formed
    Validate {
        /// File to read; '-' or nothing reads stdin
        path: Option<PathBuf>,
    },

    /// Project index and selection
    Projects {
        #[command(subcommand)]
        cmd: ProjectsCommand,
    },

    /// Submit a project for validation by the ingestion endpoint
    Ingest(IngestArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct ComposeArgs {
    /// Project id for the banner (default: selected project, then config)
    #[arg(long)]
    pub project: Option<String>,

    /// Base URL serving brain.yml, prompt_pack, runtime and version (repeatable)
    #[arg(long = "base-url")]
    pub base_url: Vec<String>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Curated file; inlined when small enough (repeatable)
    #[arg(long)]
    pub file: Vec<PathBuf>,

    /// Curated file that is always inlined (repeatable)
    #[arg(long)]
    pub inline: Vec<PathBuf>,

    /// Glob over tracked files listed in the file tree only
    #[arg(long)]
    pub pattern: Option<String>,

    /// Local prompt pack; skips the remote chain
    #[arg(long = "prompt-pack")]
    pub prompt_pack: Option<PathBuf>,

    /// Repository name override
    #[arg(long = "repo-name")]
    pub repo_name: Option<String>,

    /// Repository remote URL override
    #[arg(long)]
    pub remote: Option<String>,

    /// Branch override
    #[arg(long)]
    pub branch: Option<String>,

    /// Commit hash override (short or full)
    #[arg(long)]
    pub commit: Option<String>,

    /// Endpoint entry as key=url (repeatable)
    #[arg(long = "endpoint")]
    pub endpoint: Vec<String>,

    /// Where the snapshot goes
    #[arg(long, value_enum, default_value = "clipboard")]
    pub deliver: DeliverMode,

    /// Target path for --deliver file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Do not read identity or tracked files from the local git repository
    #[arg(long = "no-git")]
    pub no_git: bool,

    /// Use overrides only; fetch nothing
    #[arg(long)]
    pub offline: bool,

    /// Per-fetch timeout in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct IngestArgs {
    /// Ingestion API base URL (default: first configured base URL)
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Snapshot URL of the project
    #[arg(long = "stp-url", default_value = "")]
    pub stp_url: String,

    /// AI guide URL
    #[arg(long = "ai-url", default_value = "")]
    pub ai_url: String,

    /// Prompt pack URL
    #[arg(long = "prompt-pack-url", default_value = "")]
    pub prompt_pack_url: String,

    /// Display name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Project id
    #[arg(long, default_value = "")]
    pub id: String,

    /// Comma-separated tags
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Snapshot JSON to submit instead of (or along with) the URL
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Subcommand, Clone)]
pub enum ProjectsCommand {
    /// List projects from the index
    List {
        /// Index base URL (repeatable; default: configured base URLs)
        #[arg(long = "base-url")]
        base_url: Vec<String>,

        /// Filter by name, id or tag
        #[arg(long)]
        query: Option<String>,
    },

    /// Remember a project as the current one
    Select {
        /// Project id
        id: String,

        /// Check the id against the index served here
        #[arg(long = "base-url")]
        base_url: Vec<String>,
    },

    /// Show the current project
    Current,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Format::Json,
            FormatArg::Yaml => Format::Yaml,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliverMode {
    #[default]
    Clipboard,
    Stdout,
    File,
}
