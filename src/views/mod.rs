//! Caller-facing plan views.
//!
//! - `visibility`: the one row filter deciding which assignments a caller sees
//! - `range`: window/day/week readers and their response types

pub mod range;
pub mod visibility;

pub use range::{AssignmentView, DayPlan, RangePlan, WeekPlan, read_dates, sort_views};
pub use visibility::Visibility;
