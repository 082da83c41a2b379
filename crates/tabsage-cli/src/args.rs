use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabsage")]
#[command(about = "Ask natural-language questions against spreadsheets and relational tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Workspace directory holding cache, sessions, and config
    #[arg(long, global = true)]
    pub workspace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the workspace and sweep stale sessions
    Init,

    /// Ask a natural-language question against a source
    Ask {
        /// CSV file or SQLite database to question
        #[arg(long)]
        source: PathBuf,

        /// Table name inside a SQLite source (defaults to the first table)
        #[arg(long)]
        table: Option<String>,

        /// Conversation thread to bind; a fresh one is created when omitted
        #[arg(long)]
        thread: Option<String>,

        /// Override the configured retry count
        #[arg(long)]
        max_retries: Option<u32>,

        /// Feed the raw question to generation instead of the rewrite
        #[arg(long)]
        no_rewrite: bool,

        question: String,
    },

    /// Run one guarded read-only SQL statement directly (no generator)
    Query {
        #[arg(long)]
        source: PathBuf,

        #[arg(long)]
        table: Option<String>,

        sql: String,
    },

    /// Show the derived schema description for a source
    Schema {
        #[arg(long)]
        source: PathBuf,

        #[arg(long)]
        table: Option<String>,
    },

    /// Inspect or reset conversation sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Show recent query-log records for a source
    Log {
        #[arg(long)]
        source: PathBuf,

        #[arg(long)]
        table: Option<String>,

        /// Number of records from the end of the log
        #[arg(long, default_value_t = 10)]
        tail: usize,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// List session thread ids
    List,
    /// Remove one thread's session directory
    Reset { thread: String },
    /// Remove and recreate the sessions root
    ResetAll,
}
