//! Candidate (prospect) records.

use serde::{Deserialize, Serialize};

/// Row id of a candidate. Ascending ids are insertion order.
pub type CandidateId = i64;

/// A prospect that can be scheduled for outreach.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub id: CandidateId,

    /// Unique natural key (profile handle)
    pub handle: String,

    pub full_name: Option<String>,

    /// Canonical outreach link
    pub link: Option<String>,

    pub avatar_url: Option<String>,

    /// Unwanted candidates are never drawn by the filler
    pub unwanted: bool,

    /// Free-form classification label, set by ingestion
    pub category: Option<String>,
}

/// Fields needed to insert a candidate.
#[derive(Debug, Clone, Default)]
pub struct NewCandidate {
    pub handle: String,
    pub full_name: Option<String>,
    pub link: Option<String>,
    pub avatar_url: Option<String>,
    pub unwanted: bool,
    pub category: Option<String>,
}

impl NewCandidate {
    /// Create a candidate with only a handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            ..Self::default()
        }
    }

    /// Mark the candidate unwanted.
    pub fn unwanted(mut self) -> Self {
        self.unwanted = true;
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    /// Set the outreach link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}
