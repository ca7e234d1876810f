//! Capacity filling from the unassigned candidate pool.

use std::collections::VecDeque;

use crate::domain::{CandidateId, NewAssignment};
use crate::error::Result;
use crate::scheduler::book::SenderBook;
use crate::scheduler::calendar::Window;

/// Source of candidates that have never been assigned and are not unwanted.
///
/// Draws come out in ascending candidate id order and a drawn candidate is
/// never handed out again by the same pool.
pub trait CandidatePool {
    /// Take up to `limit` candidates. Fewer (or none) means the pool ran dry.
    fn draw(&mut self, limit: usize) -> Result<Vec<CandidateId>>;
}

impl CandidatePool for VecDeque<CandidateId> {
    fn draw(&mut self, limit: usize) -> Result<Vec<CandidateId>> {
        let take = limit.min(self.len());
        Ok(self.drain(..take).collect())
    }
}

/// Top up every window date of the sender to its quota with fresh candidates.
///
/// A short pool is not an error: dates stay under quota until a later pass
/// finds new candidates.
pub fn fill_capacity<P>(book: &mut SenderBook, window: &Window, pool: &mut P) -> Result<Vec<NewAssignment>>
where
    P: CandidatePool + ?Sized,
{
    let mut created = Vec::new();

    for &date in window.dates() {
        let missing = book.room(date);
        if missing == 0 {
            continue;
        }

        let drawn = pool.draw(missing)?;
        if drawn.len() < missing {
            tracing::info!(
                sender_id = book.sender().id,
                %date,
                missing,
                available = drawn.len(),
                "Candidate pool ran short"
            );
        }
        for candidate_id in drawn {
            created.push(book.add_fresh(date, candidate_id));
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanStatus;
    use crate::scheduler::book::test_support::*;

    fn pool(ids: std::ops::RangeInclusive<i64>) -> VecDeque<CandidateId> {
        ids.collect()
    }

    #[test]
    fn test_fill_empty_book_to_quota() {
        let mut book = SenderBook::load(sender(1, "ana"), 25, d("2024-06-03"), Vec::new());
        let window = Window::new(d("2024-06-03"), 2).unwrap();
        let mut candidates = pool(1..=500);

        let created = fill_capacity(&mut book, &window, &mut candidates).unwrap();

        assert_eq!(created.len(), 50);
        assert_eq!(book.count(d("2024-06-03")), 25);
        assert_eq!(book.count(d("2024-06-04")), 25);
        assert_eq!(created[0].candidate_id, 1);
        assert_eq!(created[25].candidate_id, 26);
        assert_eq!(created[25].date, d("2024-06-04"));
        assert_eq!(candidates.len(), 450);
    }

    #[test]
    fn test_fill_counts_completed_work() {
        let rows = vec![
            assignment(1, "2024-06-03", PlanStatus::Sent),
            assignment(2, "2024-06-03", PlanStatus::Won),
        ];
        let mut book = SenderBook::load(sender(1, "ana"), 3, d("2024-06-03"), rows);
        let window = Window::new(d("2024-06-03"), 1).unwrap();
        let mut candidates = pool(1..=10);

        let created = fill_capacity(&mut book, &window, &mut candidates).unwrap();

        assert_eq!(created.len(), 1);
    }

    #[test]
    fn test_fill_short_pool_is_partial() {
        let mut book = SenderBook::load(sender(1, "ana"), 5, d("2024-06-03"), Vec::new());
        let window = Window::new(d("2024-06-03"), 2).unwrap();
        let mut candidates = pool(1..=7);

        let created = fill_capacity(&mut book, &window, &mut candidates).unwrap();

        assert_eq!(created.len(), 7);
        assert_eq!(book.count(d("2024-06-03")), 5);
        assert_eq!(book.count(d("2024-06-04")), 2);
    }

    #[test]
    fn test_pool_is_shared_across_senders() {
        let window = Window::new(d("2024-06-03"), 1).unwrap();
        let mut candidates = pool(1..=6);

        let mut first = SenderBook::load(sender(1, "ana"), 4, d("2024-06-03"), Vec::new());
        let mut second = SenderBook::load(sender(2, "bruno"), 4, d("2024-06-03"), Vec::new());
        let a = fill_capacity(&mut first, &window, &mut candidates).unwrap();
        let b = fill_capacity(&mut second, &window, &mut candidates).unwrap();

        let a_ids: Vec<_> = a.iter().map(|n| n.candidate_id).collect();
        let b_ids: Vec<_> = b.iter().map(|n| n.candidate_id).collect();
        assert_eq!(a_ids, vec![1, 2, 3, 4]);
        assert_eq!(b_ids, vec![5, 6]);
        assert_eq!(b[0].account_label, "bruno");
    }

    #[test]
    fn test_full_dates_draw_nothing() {
        let mut book = SenderBook::load(sender(1, "ana"), 2, d("2024-06-03"), pending_run(1, 2, "2024-06-03"));
        let window = Window::new(d("2024-06-03"), 1).unwrap();
        let mut candidates = pool(1..=3);

        let created = fill_capacity(&mut book, &window, &mut candidates).unwrap();

        assert!(created.is_empty());
        assert_eq!(candidates.len(), 3);
    }
}
