//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - range: refresh and show the scheduling window (default)
//! - day / week: read-only views
//! - status: set an assignment's status
//! - quota, user, candidate: settings and directory upkeep

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sendplan - daily outreach planner for a team of senders
#[derive(Parser, Debug)]
#[command(name = "sendplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Act as this user (defaults to the built-in admin)
    #[arg(long = "as", global = true, value_name = "USERNAME")]
    pub as_user: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Schedule and show the window starting at a date
    Range {
        /// First date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        start: Option<NaiveDate>,

        /// Number of weekdays in the window
        #[arg(short, long)]
        days: Option<usize>,
    },

    /// Show one date without scheduling
    Day {
        /// Date to show (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show Monday..Friday of a week without scheduling
    Week {
        /// Any date in the week (YYYY-MM-DD, default today)
        #[arg(short, long)]
        start: Option<NaiveDate>,
    },

    /// Set the status of an assignment
    Status {
        /// Plan row id
        id: i64,

        /// pending, sent, interested or won
        status: String,
    },

    /// Read or change the per-day quota
    Quota {
        #[command(subcommand)]
        command: QuotaCommands,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage candidates
    Candidate {
        #[command(subcommand)]
        command: CandidateCommands,
    },
}

/// Quota subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum QuotaCommands {
    /// Show the current quota
    Get,

    /// Store a new quota (clamped to 1..=200)
    Set {
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
}

/// User subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommands {
    /// Register a user
    Add {
        username: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Register as admin instead of sender
        #[arg(long)]
        admin: bool,
    },

    /// List users
    List,
}

/// Candidate subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CandidateCommands {
    /// Add a candidate
    Add {
        handle: String,

        /// Full name
        #[arg(short, long)]
        name: Option<String>,

        /// Profile link
        #[arg(short, long)]
        link: Option<String>,

        /// Avatar image URL
        #[arg(long)]
        avatar: Option<String>,

        /// Exclude from scheduling
        #[arg(long)]
        unwanted: bool,
    },

    /// Mark a candidate unwanted
    Unwanted {
        handle: String,

        /// Clear the mark instead
        #[arg(long)]
        clear: bool,
    },

    /// Count candidates
    Count,
}
