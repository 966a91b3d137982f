//! Command-line interface for dirconfig.
//!
//! This module provides the clap command definitions and the output
//! formatting shared by every command.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, StateCommands};
pub use output::{MessageLevel, OutputFormatter};
