pub mod args;
pub mod config;
pub mod context;
pub mod handlers;

pub use args::{Cli, Commands, SessionCommands};

use anyhow::Result;
use tabsage_store::resolve_workspace_path;

pub fn run(cli: Cli) -> Result<()> {
    let workspace = resolve_workspace_path(cli.workspace.as_deref())?;

    match cli.command {
        Commands::Init => handlers::init::run(&workspace),
        Commands::Ask {
            source,
            table,
            thread,
            max_retries,
            no_rewrite,
            question,
        } => handlers::ask::run(
            &workspace,
            handlers::ask::AskArgs {
                source,
                table,
                thread,
                max_retries,
                no_rewrite,
                question,
            },
        ),
        Commands::Query { source, table, sql } => {
            handlers::query::run(&workspace, &source, table.as_deref(), &sql)
        }
        Commands::Schema { source, table } => {
            handlers::schema::run(&workspace, &source, table.as_deref())
        }
        Commands::Session { command } => handlers::session::run(&workspace, command),
        Commands::Log {
            source,
            table,
            tail,
        } => handlers::log::run(&workspace, &source, table.as_deref(), tail),
    }
}
