//! Plan manager implementation
//!
//! PlanManager owns the store and scheduler and exposes every caller-facing
//! operation: the refreshing range view, read-only day and week views,
//! status updates and directory upkeep.

use chrono::{Days, Local, NaiveDate};

use crate::config::{GlobalConfig, SchedulerConfig};
use crate::domain::{AssignmentId, Caller, Candidate, NewCandidate, PlanStatus, Role, User};
use crate::error::{Result, SendplanError};
use crate::scheduler::{PassReport, Quota, Scheduler, Window, monday_of, next_eligible_dates};
use crate::store::{CandidateStore, PlanStore, SettingsStore};
use crate::views::{DayPlan, RangePlan, WeekPlan, read_dates};

/// Weekdays covered by the week view.
const WEEK_DAYS: usize = 5;

/// Caller-facing operations over one plan database.
#[derive(Debug)]
pub struct PlanManager {
    store: PlanStore,
    scheduler: Scheduler,
    config: SchedulerConfig,
}

impl PlanManager {
    /// Create a manager over an open store.
    pub fn new(store: PlanStore, config: SchedulerConfig) -> Self {
        Self {
            store,
            scheduler: Scheduler::new(config.pass_limits()),
            config,
        }
    }

    /// Open the configured database.
    pub fn open(config: &GlobalConfig) -> Result<Self> {
        let store = PlanStore::open(&config.storage.db_path)?;
        Ok(Self::new(store, config.scheduler))
    }

    pub fn store(&self) -> &PlanStore {
        &self.store
    }

    /// Get/refresh range plan.
    ///
    /// Runs one scheduling pass over the window in a single transaction, then
    /// reads the window back with the caller's visibility.
    pub fn refresh_range(&mut self, start: Option<NaiveDate>, days: Option<usize>, caller: &Caller) -> Result<RangePlan> {
        let start = start.unwrap_or_else(today);
        let window = Window::new(start, self.config.window_days(days))?;

        let scheduler = &self.scheduler;
        let report: PassReport = self.store.in_transaction(|source| scheduler.run(source, &window))?;
        log::debug!(
            "Range pass from {} over {} days: created={} moved={} deferred={}",
            window.first(),
            window.days(),
            report.created,
            report.moved,
            report.deferred
        );

        let items = read_dates(&self.store.source(), window.dates(), caller)?;
        Ok(RangePlan {
            dates: window.dates().to_vec(),
            items,
            no_senders: report.no_senders,
            deferred: report.deferred,
        })
    }

    /// Read-only view of one calendar date.
    pub fn day_plan(&self, date: Option<NaiveDate>, caller: &Caller) -> Result<DayPlan> {
        let date = date.unwrap_or_else(today);
        let items = read_dates(&self.store.source(), &[date], caller)?;
        Ok(DayPlan { date, items })
    }

    /// Read-only Monday..Friday view of the week containing `start`.
    pub fn week_plan(&self, start: Option<NaiveDate>, caller: &Caller) -> Result<WeekPlan> {
        let monday = monday_of(start.unwrap_or_else(today));
        let dates = next_eligible_dates(monday, WEEK_DAYS);
        let end = monday
            .checked_add_days(Days::new(WEEK_DAYS as u64 - 1))
            .unwrap_or(monday);
        let items = read_dates(&self.store.source(), &dates, caller)?;
        Ok(WeekPlan {
            start: monday,
            end,
            dates,
            items,
        })
    }

    /// Set an assignment's status.
    ///
    /// Restricted callers may only touch unowned assignments or their own.
    /// Returns the status that was stored.
    pub fn set_status(&self, id: AssignmentId, status: &str, caller: &Caller) -> Result<PlanStatus> {
        let status: PlanStatus = status.parse()?;
        let source = self.store.source();
        let assignment = source
            .get_assignment(id)?
            .ok_or_else(|| SendplanError::NotFound(format!("assignment {}", id)))?;

        if !caller.is_privileged()
            && let Some(owner) = assignment.sender_id
            && caller.id != Some(owner)
        {
            log::warn!("Caller {:?} denied status change on assignment {}", caller.id, id);
            return Err(SendplanError::Forbidden(format!(
                "assignment {} belongs to another sender",
                id
            )));
        }

        source.update_status(id, status, caller.id)?;
        log::info!("Assignment {} set to {}", id, status);
        Ok(status)
    }

    pub fn quota(&self) -> Result<Quota> {
        self.store.source().get_quota()
    }

    /// Store a new per-day quota, clamped into range. Privileged only.
    pub fn set_quota(&self, requested: i64, caller: &Caller) -> Result<Quota> {
        require_privileged(caller, "change the daily quota")?;
        let quota = Quota::clamped(requested);
        self.store.source().set_quota(quota)?;
        log::info!("Daily quota set to {} (requested {})", quota, requested);
        Ok(quota)
    }

    /// Resolve a username into a caller; None is the built-in admin.
    pub fn caller_for(&self, username: Option<&str>) -> Result<Caller> {
        let Some(username) = username else {
            return Ok(Caller::system());
        };
        let user = self
            .store
            .source()
            .find_user(username)?
            .ok_or_else(|| SendplanError::NotFound(format!("user {}", username)))?;
        Ok(Caller::from_user(&user))
    }

    pub fn add_user(&self, username: &str, name: Option<&str>, role: Role, caller: &Caller) -> Result<User> {
        require_privileged(caller, "register users")?;
        let user = self.store.source().add_user(username, name, role)?;
        log::info!("Registered {} {}", user.role, user.username);
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.store.source().list_users()
    }

    pub fn add_candidate(&self, new: &NewCandidate, caller: &Caller) -> Result<Candidate> {
        require_privileged(caller, "add candidates")?;
        self.store.source().add_candidate(new)
    }

    /// Flag or clear a candidate's unwanted mark.
    pub fn set_unwanted(&self, handle: &str, unwanted: bool, caller: &Caller) -> Result<()> {
        require_privileged(caller, "change candidates")?;
        self.store.source().set_unwanted(handle, unwanted)
    }

    pub fn count_candidates(&self) -> Result<usize> {
        self.store.source().count_all()
    }
}

fn require_privileged(caller: &Caller, action: &str) -> Result<()> {
    if caller.is_privileged() {
        Ok(())
    } else {
        Err(SendplanError::Forbidden(format!("only admins may {}", action)))
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
