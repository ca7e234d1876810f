//! Domain types for Sendplan
//!
//! This module contains the records the scheduler reads and writes:
//! - Candidate: a prospect that can be handed to a sender exactly once
//! - Assignment: one candidate scheduled to a sender on a date (a "plan row")
//! - User: a sender or administrator, plus the Caller identity used for views

pub mod assignment;
pub mod candidate;
pub mod user;

pub use assignment::{Assignment, AssignmentId, NewAssignment, PlanStatus};
pub use candidate::{Candidate, CandidateId, NewCandidate};
pub use user::{Caller, Role, User, UserId};
