use crate::config::Config;
use anyhow::Result;
use std::path::Path;
use tabsage_store::Store;

/// Bootstrap the workspace: create the cache and session roots, sweep any
/// stale sessions from a previous run, and write a default config once.
pub fn run(workspace: &Path) -> Result<()> {
    let store = Store::open(workspace)?;
    store.reset_all_sessions();

    let config_path = Config::path(workspace);
    if !config_path.exists() {
        Config::default().save_to(&config_path)?;
    }

    println!("Initialized workspace at {}", workspace.display());
    println!("  cache:    {}", store.cache_root().display());
    println!("  sessions: {}", store.sessions_root().display());
    println!("  config:   {}", config_path.display());
    Ok(())
}
