//! Command-line interface for pyrunner
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions and parsing structures (clap)
//! - `run`: Main entry point and command dispatch
//! - `commands`: Command implementations and JSON output

pub mod args;
mod commands;
mod run;


// Re-export argument types
pub use args::{Cli, Commands, VenvCommands, build_cli};

// Re-export run function
pub use run::run;
