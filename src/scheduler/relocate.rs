//! Backlog relocation.
//!
//! Pending work dated before the window is pulled into the window, oldest
//! first, filling each date up to its free room. Whatever does not fit keeps
//! rolling forward past the window one weekday at a time.

use crate::scheduler::book::{SenderBook, StageReport};
use crate::scheduler::calendar::Window;

/// Move stale pending backlog into (and if needed past) the window.
///
/// Dates with no room are skipped without consuming backlog. After
/// `max_forward_days` weekdays past the window the remaining backlog is
/// reported as deferred and stays on its old date until the next pass.
pub fn relocate_backlog(book: &mut SenderBook, window: &Window, max_forward_days: usize) -> StageReport {
    let mut report = StageReport::default();
    if !book.has_backlog() {
        return report;
    }

    for date in window.forward(max_forward_days) {
        let room = book.room(date);
        if room > 0 {
            report.moves.extend(book.place_backlog(date, room));
        }
        if !book.has_backlog() {
            break;
        }
    }

    report.deferred = book.backlog_len();
    if report.deferred > 0 {
        tracing::warn!(
            sender_id = book.sender().id,
            deferred = report.deferred,
            max_forward_days,
            "Backlog did not fit within the forward horizon"
        );
    }

    tracing::debug!(
        sender_id = book.sender().id,
        moved = report.moves.len(),
        "Relocated backlog"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanStatus;
    use crate::scheduler::book::test_support::*;

    #[test]
    fn test_no_backlog_is_noop() {
        let mut book = SenderBook::load(sender(1, "ana"), 25, d("2024-06-05"), pending_run(1, 3, "2024-06-05"));
        let window = Window::new(d("2024-06-05"), 2).unwrap();
        let report = relocate_backlog(&mut book, &window, 10);
        assert!(report.moves.is_empty());
        assert_eq!(report.deferred, 0);
    }

    #[test]
    fn test_backlog_fills_first_date_then_spills() {
        // 30 pending from yesterday, quota 25, window of two days
        let mut book = SenderBook::load(sender(1, "ana"), 25, d("2024-06-05"), pending_run(1, 30, "2024-06-04"));
        let window = Window::new(d("2024-06-05"), 2).unwrap();
        let report = relocate_backlog(&mut book, &window, 10);

        assert_eq!(report.moves.len(), 30);
        assert_eq!(book.count(d("2024-06-05")), 25);
        assert_eq!(book.count(d("2024-06-06")), 5);

        let first_day: Vec<_> = report
            .moves
            .iter()
            .filter(|m| m.to == d("2024-06-05"))
            .map(|m| m.assignment_id)
            .collect();
        assert_eq!(first_day, (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn test_full_dates_are_skipped() {
        let mut rows = pending_run(1, 3, "2024-06-03");
        rows.extend(pending_run(100, 2, "2024-06-05"));
        rows.push(assignment(200, "2024-06-06", PlanStatus::Sent));
        let mut book = SenderBook::load(sender(1, "ana"), 2, d("2024-06-05"), rows);
        let window = Window::new(d("2024-06-05"), 2).unwrap();

        let report = relocate_backlog(&mut book, &window, 10);

        assert!(report.moves.iter().all(|m| m.to != d("2024-06-05")));
        assert_eq!(book.count(d("2024-06-06")), 2);
        assert_eq!(book.count(d("2024-06-07")), 2);
        assert_eq!(report.deferred, 0);
    }

    #[test]
    fn test_backlog_carries_past_window_over_weekend() {
        let mut book = SenderBook::load(sender(1, "ana"), 2, d("2024-06-06"), pending_run(1, 7, "2024-06-03"));
        let window = Window::new(d("2024-06-06"), 2).unwrap();
        let report = relocate_backlog(&mut book, &window, 10);

        assert_eq!(book.count(d("2024-06-06")), 2);
        assert_eq!(book.count(d("2024-06-07")), 2);
        assert_eq!(book.count(d("2024-06-08")), 0);
        assert_eq!(book.count(d("2024-06-10")), 2);
        assert_eq!(book.count(d("2024-06-11")), 1);
        assert_eq!(report.deferred, 0);
    }

    #[test]
    fn test_forward_cap_defers_remaining() {
        let mut book = SenderBook::load(sender(1, "ana"), 1, d("2024-06-03"), pending_run(1, 5, "2024-05-31"));
        let window = Window::new(d("2024-06-03"), 1).unwrap();
        let report = relocate_backlog(&mut book, &window, 2);

        assert_eq!(report.moves.len(), 3);
        assert_eq!(report.deferred, 2);
        assert_eq!(book.backlog_len(), 2);
    }

    #[test]
    fn test_relocation_preserves_fifo_order() {
        let mut rows = pending_run(10, 2, "2024-06-04");
        rows.extend(pending_run(1, 2, "2024-06-03"));
        let mut book = SenderBook::load(sender(1, "ana"), 2, d("2024-06-05"), rows);
        let window = Window::new(d("2024-06-05"), 2).unwrap();
        let report = relocate_backlog(&mut book, &window, 10);

        let order: Vec<_> = report.moves.iter().map(|m| m.assignment_id).collect();
        assert_eq!(order, vec![1, 2, 10, 11]);
        assert!(report.moves.windows(2).all(|pair| pair[0].to <= pair[1].to));
    }
}
