//! Collaborator traits the scheduler and readers consume.
//!
//! The SQLite store implements all of them on a connection or transaction;
//! the scheduler only ever sees these seams.

use chrono::NaiveDate;

use crate::domain::{Assignment, AssignmentId, Candidate, CandidateId, NewAssignment, User, UserId};
use crate::error::Result;
use crate::scheduler::Quota;
use crate::views::{AssignmentView, Visibility};

/// Result of inserting an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row created with this id
    Inserted(AssignmentId),
    /// Candidate already has an assignment (uniqueness constraint)
    Conflict,
}

/// Candidate lookups.
pub trait CandidateStore {
    /// Candidates that are not unwanted and have no assignment, ascending id,
    /// strictly after `after` when given.
    fn find_unassigned_eligible(&self, after: Option<CandidateId>, limit: usize) -> Result<Vec<Candidate>>;

    /// Every candidate row.
    fn count_all(&self) -> Result<usize>;
}

/// Persisted settings.
pub trait SettingsStore {
    /// Per-day quota, defaulting when missing or invalid.
    fn get_quota(&self) -> Result<Quota>;
}

/// Registered users.
pub trait SenderDirectory {
    /// All users with the sender role, ascending id.
    fn list_senders(&self) -> Result<Vec<User>>;
}

/// Assignment reads and writes.
pub trait AssignmentStore {
    /// A sender's assignments dated on or after `window_start`, plus their
    /// pending ones dated before it.
    fn load_schedulable(&self, sender: UserId, window_start: NaiveDate) -> Result<Vec<Assignment>>;

    /// Rewrite the date of one assignment. Status, label and owner are untouched.
    fn move_assignment(&self, id: AssignmentId, date: NaiveDate) -> Result<()>;

    /// Insert a pending assignment.
    fn insert_assignment(&self, new: &NewAssignment) -> Result<InsertOutcome>;

    /// Joined views for dates in `[from, to]` the visibility admits.
    fn list_views(&self, from: NaiveDate, to: NaiveDate, visibility: Visibility) -> Result<Vec<AssignmentView>>;
}

/// Everything a scheduling pass needs.
pub trait PlanSource: CandidateStore + SettingsStore + SenderDirectory + AssignmentStore {}

impl<T> PlanSource for T where T: CandidateStore + SettingsStore + SenderDirectory + AssignmentStore {}
