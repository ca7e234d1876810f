//! Sendplan - daily outreach planning for a team of senders
//!
//! Every time the plan for a date window is requested, one scheduling pass
//! moves stale pending work forward, spreads overloaded days and fills free
//! capacity from the candidate pool, then returns the window as the caller
//! is allowed to see it.

pub mod config;
pub mod domain;
pub mod error;
pub mod manager;
pub mod scheduler;
pub mod store;
pub mod views;

pub use error::{Result, SendplanError};
