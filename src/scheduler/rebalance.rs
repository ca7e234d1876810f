//! Overflow rebalancing within the window.
//!
//! A date holding more pending work than the quota pushes its newest pending
//! assignments forward to the next dates with room. Completed work
//! (sent/interested/won) never moves.

use std::collections::VecDeque;

use crate::scheduler::book::{SenderBook, StageReport};
use crate::scheduler::calendar::Window;

/// Single forward sweep over the window resolving over-quota dates.
///
/// A date that absorbs overflow is not re-examined for its own overflow in
/// the same sweep; the next pass picks it up.
pub fn rebalance_overflow(book: &mut SenderBook, window: &Window, max_forward_days: usize) -> StageReport {
    let mut report = StageReport::default();
    let quota = book.quota();

    for (index, &date) in window.dates().iter().enumerate() {
        let total = book.count(date);
        if total <= quota {
            continue;
        }

        let pending = book.pending_newest_first(date);
        if pending.len() <= quota {
            tracing::debug!(
                sender_id = book.sender().id,
                %date,
                total,
                pending = pending.len(),
                "Over quota but overflow is completed work, leaving in place"
            );
            continue;
        }

        let surplus = pending.len() - quota;
        let mut remaining: VecDeque<_> = pending.into_iter().take(surplus).collect();

        for target in window.dates_after(index, max_forward_days) {
            let room = book.room(target).min(remaining.len());
            for id in remaining.drain(..room) {
                if let Some(intent) = book.shift(id, date, target) {
                    report.moves.push(intent);
                }
            }
            if remaining.is_empty() {
                break;
            }
        }

        if !remaining.is_empty() {
            tracing::warn!(
                sender_id = book.sender().id,
                %date,
                deferred = remaining.len(),
                "Overflow did not fit within the forward horizon"
            );
            report.deferred += remaining.len();
        }
    }

    report
}
