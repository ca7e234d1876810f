//! CLI module for sendplan - command-line interface and subcommands.
//!
//! Provides the main entry point with the range view as the default action,
//! plus read-only views, status updates and directory upkeep.

pub mod commands;

pub use commands::Cli;
