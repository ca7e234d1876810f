//! Storage layer for Sendplan.
//!
//! This module provides:
//! - **Traits**: the collaborator seams the scheduler and readers depend on
//! - **PlanStore**: SQLite persistence for users, candidates, plan rows and settings
//!
//! # Example
//!
//! ```ignore
//! use sendplan::store::{PlanStore, SettingsStore};
//! use std::path::Path;
//!
//! let mut store = PlanStore::open(Path::new("/tmp/sendplan.db"))?;
//! let quota = store.source().get_quota()?;
//!
//! // Scheduling passes run in one write transaction
//! store.in_transaction(|source| scheduler.run(source, &window))?;
//! ```

mod plan_store;
mod traits;

pub use plan_store::{PlanStore, QUOTA_SETTING, SqliteSource};
pub use traits::{AssignmentStore, CandidateStore, InsertOutcome, PlanSource, SenderDirectory, SettingsStore};
