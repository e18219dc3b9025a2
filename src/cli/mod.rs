//! CLI layer for monitor-assist.
//!
//! Provides the command-line interface using clap, with commands for asking
//! Genie and searching the channel index.

pub mod commands;
pub mod parser;

pub use commands::execute;
#[cfg(feature = "mcp")]
pub use parser::McpCommands;
pub use parser::{Cli, Commands, GenieArgs};
