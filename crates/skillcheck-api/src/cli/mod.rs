//! CLI command definitions for the `skc` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (`skc session list`, `skc assign skills`), with `draft` as the
//! scripted editing entry point.

pub mod assign;
pub mod backend;
pub mod draft;
pub mod session;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use skillcheck_types::session::SessionId;

/// Record and review team skill checks.
#[derive(Parser)]
#[command(name = "skc", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Talk to a running `skc serve` instead of the local database.
    #[arg(long, global = true, env = "SKILLCHECK_REMOTE")]
    pub remote: Option<String>,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage assessment sessions.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Edit a draft session and save the coalesced changes in one batch.
    Draft(draft::DraftArgs),

    /// Replace a session's assessee or skill assignments.
    Assign {
        #[command(subcommand)]
        action: AssignCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Create a new draft session.
    Create {
        /// Session name (prompted if omitted).
        #[arg(long)]
        name: Option<String>,

        /// Owning team (prompted if omitted).
        #[arg(long)]
        team: Option<String>,

        /// Session date as YYYY-MM-DD (defaults to today).
        #[arg(long)]
        date: Option<String>,
    },

    /// List sessions.
    #[command(alias = "ls")]
    List {
        /// Filter by status (draft, complete, discard).
        #[arg(long)]
        status: Option<String>,

        /// Filter by team.
        #[arg(long)]
        team: Option<String>,
    },

    /// Show a session with its assignments and latest results.
    Show {
        /// Session ID.
        id: String,
    },

    /// Mark a draft session complete. No further edits are accepted.
    Complete(StatusChangeArgs),

    /// Discard a draft session. Results stay stored but the session is closed.
    Discard(StatusChangeArgs),

    /// Delete a session with its assignments and checks.
    #[command(alias = "rm")]
    Delete {
        /// Session ID.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct StatusChangeArgs {
    /// Session ID.
    pub id: String,

    /// Skip confirmation prompt.
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum AssignCommand {
    /// Replace the assessee set.
    Assessees {
        /// Session ID.
        id: String,

        /// Person IDs to assign (the full new set).
        ids: Vec<String>,
    },

    /// Replace the skill set.
    Skills {
        /// Session ID.
        id: String,

        /// Skill IDs to assign (the full new set).
        ids: Vec<String>,
    },
}

/// Parse a session ID argument.
pub fn parse_session_id(raw: &str) -> anyhow::Result<SessionId> {
    raw.parse()
        .map_err(|e| anyhow::anyhow!("invalid session id '{raw}': {e}"))
}

/// Spinner used while a request is in flight.
pub fn spinner(message: impl Into<std::borrow::Cow<'static, str>>) -> anyhow::Result<indicatif::ProgressBar> {
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?,
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}
