use crate::args::SessionCommands;
use anyhow::Result;
use std::path::Path;
use tabsage_store::Store;

pub fn run(workspace: &Path, command: SessionCommands) -> Result<()> {
    let store = Store::open(workspace)?;
    match command {
        SessionCommands::List => {
            let mut threads: Vec<String> = std::fs::read_dir(store.sessions_root())?
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_dir())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            threads.sort();
            if threads.is_empty() {
                println!("no active sessions");
            } else {
                for thread in threads {
                    println!("{}", thread);
                }
            }
        }
        SessionCommands::Reset { thread } => {
            store.reset_session(&thread);
            println!("session {} removed", thread);
        }
        SessionCommands::ResetAll => {
            store.reset_all_sessions();
            println!("all sessions removed");
        }
    }
    Ok(())
}
