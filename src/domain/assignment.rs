//! Assignment ("plan row") records and the status lifecycle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::candidate::CandidateId;
use crate::domain::user::UserId;
use crate::error::SendplanError;

/// Row id of an assignment. Ascending ids are creation order.
pub type AssignmentId = i64;

/// A candidate scheduled to a sender on a date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub id: AssignmentId,

    /// One candidate has at most one assignment, ever
    pub candidate_id: CandidateId,

    /// Calendar day; the scheduler only ever picks weekdays
    pub date: NaiveDate,

    /// Denormalized sender display string
    pub account_label: String,

    pub sender_id: Option<UserId>,

    pub status: PlanStatus,

    /// Who last changed the status
    pub updated_by: Option<UserId>,
}

/// An assignment the filler wants to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub candidate_id: CandidateId,
    pub date: NaiveDate,
    pub account_label: String,
    pub sender_id: UserId,
}

/// Assignment status lifecycle: pending -> sent -> interested -> won.
///
/// Transitions are made by people, not by the scheduler, and may go backward.
/// Every status occupies capacity; only `Pending` may be moved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Scheduled, not contacted yet
    Pending,
    /// Outreach message sent
    Sent,
    /// Prospect replied with interest
    Interested,
    /// Converted
    Won,
}

impl PlanStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [PlanStatus; 4] = [
        PlanStatus::Pending,
        PlanStatus::Sent,
        PlanStatus::Interested,
        PlanStatus::Won,
    ];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "pending",
            PlanStatus::Sent => "sent",
            PlanStatus::Interested => "interested",
            PlanStatus::Won => "won",
        }
    }

    /// Check if the scheduler may change this assignment's date.
    pub fn is_movable(&self) -> bool {
        matches!(self, PlanStatus::Pending)
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = SendplanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PlanStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| SendplanError::InvalidStatus(s.to_string()))
    }
}
