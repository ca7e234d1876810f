//! Scheduling pass driver.
//!
//! One pass runs, for every sender in id order:
//! 1. Backlog relocation
//! 2. Overflow rebalancing
//! 3. Capacity filling
//!
//! Stages only produce intents against in-memory books. `apply` writes them
//! in one batch; the caller owns the surrounding transaction.

use serde::Serialize;

use crate::domain::{CandidateId, NewAssignment};
use crate::error::Result;
use crate::scheduler::book::{MoveIntent, SenderBook};
use crate::scheduler::calendar::Window;
use crate::scheduler::capacity::{CapacityPolicy, UniformQuota};
use crate::scheduler::fill::{CandidatePool, fill_capacity};
use crate::scheduler::rebalance::rebalance_overflow;
use crate::scheduler::relocate::relocate_backlog;
use crate::store::{CandidateStore, InsertOutcome, PlanSource};

/// Default cap on weekdays walked past the window per stage and sender.
pub const DEFAULT_MAX_FORWARD_DAYS: usize = 250;

/// Bounds on the work a single pass may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassLimits {
    pub max_forward_days: usize,
}

impl Default for PassLimits {
    fn default() -> Self {
        Self {
            max_forward_days: DEFAULT_MAX_FORWARD_DAYS,
        }
    }
}

/// Everything a pass decided, before it is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassPlan {
    pub no_senders: bool,
    pub senders: usize,
    pub moves: Vec<MoveIntent>,
    pub inserts: Vec<NewAssignment>,
    pub deferred: usize,
}

impl PassPlan {
    /// True when applying the plan would not write anything.
    pub fn is_noop(&self) -> bool {
        self.moves.is_empty() && self.inserts.is_empty()
    }
}

/// Counts of what a pass wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub no_senders: bool,
    pub senders: usize,
    pub moved: usize,
    pub created: usize,
    pub deferred: usize,
    /// Inserts rejected because the candidate was assigned concurrently
    pub conflicts: usize,
    /// Conflicted inserts for which no replacement candidate was left
    pub shortfall: usize,
}

/// Candidate pool reading from a store with an id cursor.
///
/// Nothing is written while a pass plans, so the cursor is what keeps one
/// candidate from being drawn twice.
pub struct StorePool<'a, S: CandidateStore + ?Sized> {
    store: &'a S,
    after: Option<CandidateId>,
    exhausted: bool,
}

impl<'a, S: CandidateStore + ?Sized> StorePool<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            after: None,
            exhausted: false,
        }
    }
}

impl<S: CandidateStore + ?Sized> CandidatePool for StorePool<'_, S> {
    fn draw(&mut self, limit: usize) -> Result<Vec<CandidateId>> {
        if self.exhausted || limit == 0 {
            return Ok(Vec::new());
        }

        let ids: Vec<CandidateId> = self
            .store
            .find_unassigned_eligible(self.after, limit)?
            .into_iter()
            .map(|candidate| candidate.id)
            .collect();

        if ids.len() < limit {
            self.exhausted = true;
        }
        if let Some(&last) = ids.last() {
            self.after = Some(last);
        }
        Ok(ids)
    }
}

/// Range-plan scheduler.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    limits: PassLimits,
}

impl Scheduler {
    pub fn new(limits: PassLimits) -> Self {
        Self { limits }
    }

    /// Decide every move and insert for the window without writing.
    pub fn plan<S, P>(&self, source: &S, window: &Window, pool: &mut P) -> Result<PassPlan>
    where
        S: PlanSource + ?Sized,
        P: CandidatePool + ?Sized,
    {
        // Settings snapshot: read once, used for the whole pass
        let quota = source.get_quota()?;
        let policy = UniformQuota::new(quota);
        let senders = source.list_senders()?;

        if senders.is_empty() {
            tracing::info!("No senders registered, skipping scheduling pass");
            return Ok(PassPlan {
                no_senders: true,
                ..PassPlan::default()
            });
        }

        let mut plan = PassPlan {
            senders: senders.len(),
            ..PassPlan::default()
        };

        for sender in senders {
            let rows = source.load_schedulable(sender.id, window.first())?;
            let sender_quota = policy.quota_for(&sender);
            let mut book = SenderBook::load(sender, sender_quota, window.first(), rows);

            let relocated = relocate_backlog(&mut book, window, self.limits.max_forward_days);
            let rebalanced = rebalance_overflow(&mut book, window, self.limits.max_forward_days);
            let created = fill_capacity(&mut book, window, pool)?;

            tracing::debug!(
                sender_id = book.sender().id,
                quota = sender_quota,
                relocated = relocated.moves.len(),
                rebalanced = rebalanced.moves.len(),
                created = created.len(),
                "Planned sender"
            );

            plan.deferred += relocated.deferred + rebalanced.deferred;
            plan.moves.extend(relocated.moves);
            plan.moves.extend(rebalanced.moves);
            plan.inserts.extend(created);
        }

        Ok(plan)
    }

    /// Write a plan. Conflicting inserts are retried with the next pool candidate.
    pub fn apply<S, P>(&self, source: &S, plan: &PassPlan, pool: &mut P) -> Result<PassReport>
    where
        S: PlanSource + ?Sized,
        P: CandidatePool + ?Sized,
    {
        let mut report = PassReport {
            no_senders: plan.no_senders,
            senders: plan.senders,
            deferred: plan.deferred,
            ..PassReport::default()
        };

        for intent in &plan.moves {
            source.move_assignment(intent.assignment_id, intent.to)?;
            report.moved += 1;
        }

        for new in &plan.inserts {
            let mut attempt = new.clone();
            loop {
                match source.insert_assignment(&attempt)? {
                    InsertOutcome::Inserted(_) => {
                        report.created += 1;
                        break;
                    }
                    InsertOutcome::Conflict => {
                        report.conflicts += 1;
                        tracing::warn!(
                            candidate_id = attempt.candidate_id,
                            "Candidate already assigned, drawing a replacement"
                        );
                        match pool.draw(1)?.first() {
                            Some(&replacement) => attempt.candidate_id = replacement,
                            None => {
                                report.shortfall += 1;
                                break;
                            }
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// Plan and apply one pass against a store.
    pub fn run<S>(&self, source: &S, window: &Window) -> Result<PassReport>
    where
        S: PlanSource + ?Sized,
    {
        let mut pool = StorePool::new(source);
        let plan = self.plan(source, window, &mut pool)?;
        let report = self.apply(source, &plan, &mut pool)?;

        tracing::info!(
            start = %window.first(),
            days = window.days(),
            senders = report.senders,
            moved = report.moved,
            created = report.created,
            deferred = report.deferred,
            conflicts = report.conflicts,
            "Scheduling pass complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    use chrono::NaiveDate;

    use crate::domain::{Assignment, AssignmentId, Candidate, PlanStatus, User, UserId};
    use crate::scheduler::Quota;
    use crate::scheduler::book::test_support::{d, sender};
    use crate::store::{AssignmentStore, SenderDirectory, SettingsStore};
    use crate::views::{AssignmentView, Visibility};

    /// In-memory stand-in for the SQLite store.
    struct FakeSource {
        quota: Quota,
        senders: Vec<User>,
        candidates: Vec<Candidate>,
        assignments: RefCell<Vec<Assignment>>,
        /// Candidates another writer grabs between planning and insert
        stolen: HashSet<CandidateId>,
    }

    impl FakeSource {
        fn new(quota: i64, senders: Vec<User>, candidates: usize) -> Self {
            Self {
                quota: Quota::clamped(quota),
                senders,
                candidates: (1..=candidates as i64)
                    .map(|id| Candidate {
                        id,
                        handle: format!("c{:04}", id),
                        full_name: None,
                        link: None,
                        avatar_url: None,
                        unwanted: false,
                        category: None,
                    })
                    .collect(),
                assignments: RefCell::new(Vec::new()),
                stolen: HashSet::new(),
            }
        }

        fn count_on(&self, sender: UserId, date: NaiveDate) -> usize {
            self.assignments
                .borrow()
                .iter()
                .filter(|a| a.sender_id == Some(sender) && a.date == date)
                .count()
        }
    }

    impl CandidateStore for FakeSource {
        fn find_unassigned_eligible(&self, after: Option<CandidateId>, limit: usize) -> Result<Vec<Candidate>> {
            let assigned: HashSet<_> = self.assignments.borrow().iter().map(|a| a.candidate_id).collect();
            Ok(self
                .candidates
                .iter()
                .filter(|c| !c.unwanted && !assigned.contains(&c.id))
                .filter(|c| after.is_none_or(|after| c.id > after))
                .take(limit)
                .cloned()
                .collect())
        }

        fn count_all(&self) -> Result<usize> {
            Ok(self.candidates.len())
        }
    }

    impl SettingsStore for FakeSource {
        fn get_quota(&self) -> Result<Quota> {
            Ok(self.quota)
        }
    }

    impl SenderDirectory for FakeSource {
        fn list_senders(&self) -> Result<Vec<User>> {
            Ok(self.senders.clone())
        }
    }

    impl AssignmentStore for FakeSource {
        fn load_schedulable(&self, sender: UserId, window_start: NaiveDate) -> Result<Vec<Assignment>> {
            Ok(self
                .assignments
                .borrow()
                .iter()
                .filter(|a| a.sender_id == Some(sender))
                .filter(|a| a.date >= window_start || a.status == PlanStatus::Pending)
                .cloned()
                .collect())
        }

        fn move_assignment(&self, id: AssignmentId, date: NaiveDate) -> Result<()> {
            if let Some(row) = self.assignments.borrow_mut().iter_mut().find(|a| a.id == id) {
                row.date = date;
            }
            Ok(())
        }

        fn insert_assignment(&self, new: &NewAssignment) -> Result<InsertOutcome> {
            let mut rows = self.assignments.borrow_mut();
            if self.stolen.contains(&new.candidate_id) || rows.iter().any(|a| a.candidate_id == new.candidate_id) {
                return Ok(InsertOutcome::Conflict);
            }
            let id = rows.len() as i64 + 1;
            rows.push(Assignment {
                id,
                candidate_id: new.candidate_id,
                date: new.date,
                account_label: new.account_label.clone(),
                sender_id: Some(new.sender_id),
                status: PlanStatus::Pending,
                updated_by: None,
            });
            Ok(InsertOutcome::Inserted(id))
        }

        fn list_views(&self, _from: NaiveDate, _to: NaiveDate, _visibility: Visibility) -> Result<Vec<AssignmentView>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_no_senders_is_noop() {
        let source = FakeSource::new(25, Vec::new(), 10);
        let window = Window::new(d("2024-06-03"), 2).unwrap();
        let report = Scheduler::default().run(&source, &window).unwrap();

        assert!(report.no_senders);
        assert_eq!(report.created, 0);
        assert!(source.assignments.borrow().is_empty());
    }

    #[test]
    fn test_fresh_fill_for_one_sender() {
        let source = FakeSource::new(25, vec![sender(1, "ana")], 500);
        let window = Window::new(d("2024-06-03"), 2).unwrap();
        let report = Scheduler::default().run(&source, &window).unwrap();

        assert!(!report.no_senders);
        assert_eq!(report.created, 50);
        assert_eq!(source.count_on(1, d("2024-06-03")), 25);
        assert_eq!(source.count_on(1, d("2024-06-04")), 25);
    }

    #[test]
    fn test_second_pass_plans_nothing() {
        let source = FakeSource::new(5, vec![sender(1, "ana"), sender(2, "bruno")], 100);
        let window = Window::new(d("2024-06-03"), 3).unwrap();
        let scheduler = Scheduler::default();
        scheduler.run(&source, &window).unwrap();

        let mut pool = StorePool::new(&source);
        let plan = scheduler.plan(&source, &window, &mut pool).unwrap();
        assert!(plan.is_noop());
    }

    #[test]
    fn test_senders_consume_pool_in_order() {
        let source = FakeSource::new(3, vec![sender(1, "ana"), sender(2, "bruno")], 4);
        let window = Window::new(d("2024-06-03"), 1).unwrap();
        let report = Scheduler::default().run(&source, &window).unwrap();

        assert_eq!(report.created, 4);
        let rows = source.assignments.borrow();
        let bruno: Vec<_> = rows.iter().filter(|a| a.sender_id == Some(2)).map(|a| a.candidate_id).collect();
        assert_eq!(bruno, vec![4]);
    }

    #[test]
    fn test_conflict_draws_replacement() {
        let mut source = FakeSource::new(2, vec![sender(1, "ana")], 5);
        source.stolen.insert(1);
        let window = Window::new(d("2024-06-03"), 1).unwrap();
        let report = Scheduler::default().run(&source, &window).unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.conflicts, 1);
        assert_eq!(report.shortfall, 0);
        let mut ids: Vec<_> = source.assignments.borrow().iter().map(|a| a.candidate_id).collect();
        ids.sort();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_conflict_with_empty_pool_is_shortfall() {
        let mut source = FakeSource::new(2, vec![sender(1, "ana")], 2);
        source.stolen.insert(2);
        let window = Window::new(d("2024-06-03"), 1).unwrap();
        let report = Scheduler::default().run(&source, &window).unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.shortfall, 1);
    }

    #[test]
    fn test_store_pool_cursor_skips_drawn() {
        let source = FakeSource::new(2, Vec::new(), 5);
        let mut pool = StorePool::new(&source);
        assert_eq!(pool.draw(2).unwrap(), vec![1, 2]);
        assert_eq!(pool.draw(2).unwrap(), vec![3, 4]);
        assert_eq!(pool.draw(2).unwrap(), vec![5]);
        assert!(pool.draw(2).unwrap().is_empty());
    }
}
