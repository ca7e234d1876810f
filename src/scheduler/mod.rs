//! Range-plan scheduler.
//!
//! This module provides:
//! - **Calendar**: weekday-only date sequences and the scheduling `Window`.
//! - **Capacity**: the per-sender daily quota.
//! - **SenderBook**: an in-memory copy of one sender's plan that stages mutate.
//! - **Stages**: backlog relocation, overflow rebalancing and capacity filling.
//! - **Scheduler**: runs the stages for every sender and applies the result.
//!
//! # Architecture
//!
//! Each pass is request-triggered and idempotent:
//! 1. Settings and senders are read once as a snapshot
//! 2. Every sender's book is loaded and the three stages emit intents
//! 3. Intents are written in one batch inside the caller's transaction
//!
//! # Example
//!
//! ```ignore
//! use sendplan::scheduler::{Scheduler, Window};
//!
//! let window = Window::new(today, 2)?;
//! let report = Scheduler::default().run(&source, &window)?;
//! ```

mod book;
mod calendar;
mod capacity;
mod fill;
mod pass;
mod rebalance;
mod relocate;

pub use book::{BacklogItem, BookEntry, MoveIntent, SenderBook, StageReport};
pub use calendar::{ForwardDates, Window, advance_one_eligible_day, is_eligible, monday_of, next_eligible_dates};
pub use capacity::{CapacityPolicy, DEFAULT_QUOTA, MAX_QUOTA, MIN_QUOTA, Quota, UniformQuota};
pub use fill::{CandidatePool, fill_capacity};
pub use pass::{DEFAULT_MAX_FORWARD_DAYS, PassLimits, PassPlan, PassReport, Scheduler, StorePool};
pub use rebalance::rebalance_overflow;
pub use relocate::relocate_backlog;
