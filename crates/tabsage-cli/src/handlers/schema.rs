use crate::config::Config;
use crate::context::bind_source;
use crate::handlers::status_line;
use anyhow::Result;
use std::path::Path;
use tabsage_store::Store;

/// Print the derived schema description for a source, deriving and caching
/// it on first use.
pub fn run(workspace: &Path, source: &Path, table: Option<&str>) -> Result<()> {
    let store = Store::open(workspace)?;
    let config = Config::load_from(&Config::path(workspace))?;
    let bound = bind_source(&store, source, table, config.limits.preview_rows)?;
    let schema = bound.entry.load_schema()?;

    println!("{}", serde_json::to_string_pretty(&schema)?);
    println!();
    println!(
        "{}",
        status_line(&format!(
            "table {} | cached at {}",
            bound.table,
            bound.entry.dir().display()
        ))
    );
    Ok(())
}
