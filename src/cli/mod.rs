//! CLI module for the Bunny provider.
//!
//! This module provides the command-line interface for checking and
//! applying storage zone and edge rule changes.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
