//! Test fixtures for tabsage.
//!
//! Provides utilities to:
//! - Create isolated workspace and data-source environments
//! - Script generator responses for deterministic retry scenarios
//! - Script code-executor outcomes for the dataframe variant

pub mod scripted;
pub mod world;

pub use scripted::{ScriptedCodeExecutor, ScriptedGenerator};
pub use world::TestWorld;
