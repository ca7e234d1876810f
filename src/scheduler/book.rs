//! In-memory plan book for one sender during a pass.
//!
//! The stages never talk to storage. They read and rearrange a `SenderBook`
//! and emit intents; the pass driver applies all intents at the end.

use std::collections::{BTreeMap, VecDeque};

use chrono::NaiveDate;

use crate::domain::{Assignment, AssignmentId, CandidateId, NewAssignment, PlanStatus, User};

/// An existing assignment as the book sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub id: AssignmentId,
    pub status: PlanStatus,
}

/// A pending assignment dated before the window start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacklogItem {
    pub id: AssignmentId,
    pub date: NaiveDate,
}

/// Change the date of an existing assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub assignment_id: AssignmentId,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// What a relocation stage decided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub moves: Vec<MoveIntent>,
    /// Pending items left where they were because the forward cap was hit
    pub deferred: usize,
}

#[derive(Debug, Clone, Default)]
struct DaySlots {
    existing: Vec<BookEntry>,
    fresh: usize,
}

impl DaySlots {
    fn count(&self) -> usize {
        self.existing.len() + self.fresh
    }
}

/// One sender's assignments from the window start onward, plus stale backlog.
#[derive(Debug, Clone)]
pub struct SenderBook {
    sender: User,
    quota: usize,
    days: BTreeMap<NaiveDate, DaySlots>,
    backlog: VecDeque<BacklogItem>,
}

impl SenderBook {
    /// Build a book from the sender's stored assignments.
    ///
    /// Assignments dated on or after `window_start` are counted on their date
    /// whatever their status. Earlier ones become backlog only while pending.
    pub fn load(
        sender: User,
        quota: usize,
        window_start: NaiveDate,
        assignments: impl IntoIterator<Item = Assignment>,
    ) -> Self {
        let mut days: BTreeMap<NaiveDate, DaySlots> = BTreeMap::new();
        let mut backlog = Vec::new();

        for assignment in assignments {
            if assignment.date < window_start {
                if assignment.status.is_movable() {
                    backlog.push(BacklogItem {
                        id: assignment.id,
                        date: assignment.date,
                    });
                }
                continue;
            }
            days.entry(assignment.date).or_default().existing.push(BookEntry {
                id: assignment.id,
                status: assignment.status,
            });
        }

        // Oldest date first, then creation order
        backlog.sort_by_key(|item| (item.date, item.id));

        Self {
            sender,
            quota,
            days,
            backlog: backlog.into(),
        }
    }

    pub fn sender(&self) -> &User {
        &self.sender
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Assignments of any status occupying `date`, including ones planned this pass.
    pub fn count(&self, date: NaiveDate) -> usize {
        self.days.get(&date).map(DaySlots::count).unwrap_or(0)
    }

    /// Free slots on `date`.
    pub fn room(&self, date: NaiveDate) -> usize {
        self.quota.saturating_sub(self.count(date))
    }

    /// Pending assignment ids on `date`, newest first.
    pub fn pending_newest_first(&self, date: NaiveDate) -> Vec<AssignmentId> {
        let mut ids: Vec<AssignmentId> = self
            .days
            .get(&date)
            .map(|slots| {
                slots
                    .existing
                    .iter()
                    .filter(|entry| entry.status.is_movable())
                    .map(|entry| entry.id)
                    .collect()
            })
            .unwrap_or_default();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids
    }

    pub fn has_backlog(&self) -> bool {
        !self.backlog.is_empty()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Move up to `limit` of the oldest backlog items onto `date`.
    pub fn place_backlog(&mut self, date: NaiveDate, limit: usize) -> Vec<MoveIntent> {
        let take = limit.min(self.backlog.len());
        let items: Vec<BacklogItem> = self.backlog.drain(..take).collect();
        let slots = self.days.entry(date).or_default();

        items
            .into_iter()
            .map(|item| {
                slots.existing.push(BookEntry {
                    id: item.id,
                    status: PlanStatus::Pending,
                });
                MoveIntent {
                    assignment_id: item.id,
                    from: item.date,
                    to: date,
                }
            })
            .collect()
    }

    /// Move one existing assignment between two dates in the book.
    ///
    /// Returns None if the assignment is not on `from`.
    pub fn shift(&mut self, id: AssignmentId, from: NaiveDate, to: NaiveDate) -> Option<MoveIntent> {
        let source = self.days.get_mut(&from)?;
        let position = source.existing.iter().position(|entry| entry.id == id)?;
        let entry = source.existing.remove(position);
        self.days.entry(to).or_default().existing.push(entry);

        Some(MoveIntent {
            assignment_id: id,
            from,
            to,
        })
    }

    /// Reserve one slot on `date` for a new assignment and describe it.
    pub fn add_fresh(&mut self, date: NaiveDate, candidate_id: CandidateId) -> NewAssignment {
        self.days.entry(date).or_default().fresh += 1;
        NewAssignment {
            candidate_id,
            date,
            account_label: self.sender.display_name().to_string(),
            sender_id: self.sender.id,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::Role;

    pub fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub fn sender(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            name: None,
            role: Role::Sender,
        }
    }

    pub fn assignment(id: i64, date: &str, status: PlanStatus) -> Assignment {
        Assignment {
            id,
            candidate_id: 1000 + id,
            date: d(date),
            account_label: "ana".to_string(),
            sender_id: Some(1),
            status,
            updated_by: None,
        }
    }

    /// `count` pending assignments on `date`, ids starting at `first_id`.
    pub fn pending_run(first_id: i64, count: usize, date: &str) -> Vec<Assignment> {
        (0..count as i64)
            .map(|offset| assignment(first_id + offset, date, PlanStatus::Pending))
            .collect()
    }
}
