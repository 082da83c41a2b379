use crate::config::Config;
use crate::context::bind_source;
use anyhow::Result;
use std::path::Path;
use tabsage_store::Store;

/// Print the last `tail` query-log records for a source, newest last.
pub fn run(workspace: &Path, source: &Path, table: Option<&str>, tail: usize) -> Result<()> {
    let store = Store::open(workspace)?;
    let config = Config::load_from(&Config::path(workspace))?;
    let bound = bind_source(&store, source, table, config.limits.preview_rows)?;

    let log_path = bound.entry.dir().join("query_log.jsonl");
    if !log_path.exists() {
        println!("no query log yet for {}", source.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(tail);
    for line in &lines[start..] {
        println!("{}", line);
    }
    Ok(())
}
