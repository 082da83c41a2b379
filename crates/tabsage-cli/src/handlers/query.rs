use crate::config::Config;
use crate::context::bind_source;
use crate::handlers::status_line;
use anyhow::{Result, bail};
use std::path::Path;
use tabsage_engine::{GuardPolicy, SqlOutcome, execute_guarded};
use tabsage_frame::to_markdown;
use tabsage_store::Store;

/// Run one read-only statement directly, under the same guard the
/// generator's statements go through.
pub fn run(workspace: &Path, source: &Path, table: Option<&str>, sql: &str) -> Result<()> {
    let store = Store::open(workspace)?;
    let config = Config::load_from(&Config::path(workspace))?;
    let bound = bind_source(&store, source, table, config.limits.preview_rows)?;

    let guard = GuardPolicy {
        max_rows: config.limits.max_rows,
        ..GuardPolicy::default()
    };
    let execution = execute_guarded(&bound.conn, sql, &guard);
    match execution.outcome {
        SqlOutcome::Rows(frame) => {
            println!("{}", to_markdown(&frame));
            println!();
            println!(
                "{}",
                status_line(&format!("executed: {}", execution.executed_sql.replace('\n', " ")))
            );
            Ok(())
        }
        SqlOutcome::GuardViolation(msg) => bail!("guard rejected the statement: {}", msg),
        SqlOutcome::ExecError(msg) => bail!("execution failed: {}", msg),
    }
}
