//! Plan Manager module
//!
//! Operation surface over the store: range refresh, views, status and upkeep.

mod plan_manager;

pub use plan_manager::PlanManager;
