//! Range, day and week plan readers.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{AssignmentId, CandidateId, Caller, PlanStatus, UserId};
use crate::error::Result;
use crate::store::AssignmentStore;
use crate::views::visibility::Visibility;

/// One assignment joined with candidate and sender display data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssignmentView {
    pub plan_id: AssignmentId,
    pub date: NaiveDate,
    pub account_label: String,
    pub status: PlanStatus,
    pub sender_id: Option<UserId>,
    pub candidate_id: CandidateId,
    pub handle: String,
    pub full_name: Option<String>,
    pub link: Option<String>,
    pub avatar_url: Option<String>,
    pub sender_username: Option<String>,
    pub sender_name: Option<String>,
}

impl AssignmentView {
    /// Sender display key: username when the owner exists, else the stored label.
    pub fn sender_key(&self) -> &str {
        self.sender_username.as_deref().unwrap_or(&self.account_label)
    }
}

/// Response of "get/refresh range plan".
#[derive(Debug, Clone, Serialize)]
pub struct RangePlan {
    pub dates: Vec<NaiveDate>,
    pub items: Vec<AssignmentView>,
    /// True when no sender is registered and nothing was scheduled
    pub no_senders: bool,
    /// Pending rows the pass could not place within the forward horizon
    pub deferred: usize,
}

/// Read-only view of one calendar date.
#[derive(Debug, Clone, Serialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub items: Vec<AssignmentView>,
}

/// Read-only Monday..Friday view.
#[derive(Debug, Clone, Serialize)]
pub struct WeekPlan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub items: Vec<AssignmentView>,
}

/// Order by date, then sender display name, then candidate handle.
pub fn sort_views(items: &mut [AssignmentView]) {
    items.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.sender_key().cmp(b.sender_key()))
            .then_with(|| a.handle.cmp(&b.handle))
    });
}

/// Assignments on exactly the given dates that the caller may see, ordered.
pub fn read_dates<S>(store: &S, dates: &[NaiveDate], caller: &Caller) -> Result<Vec<AssignmentView>>
where
    S: AssignmentStore + ?Sized,
{
    let (Some(&from), Some(&to)) = (dates.iter().min(), dates.iter().max()) else {
        return Ok(Vec::new());
    };

    let visibility = Visibility::for_caller(caller);
    let mut items: Vec<AssignmentView> = store
        .list_views(from, to, visibility)?
        .into_iter()
        .filter(|view| dates.contains(&view.date) && visibility.allows_owner(view.sender_id))
        .collect();

    sort_views(&mut items);
    Ok(items)
}
