//! Weekday calendar for the scheduling window.
//!
//! Only Monday..Friday are eligible scheduling days. All math is on
//! `NaiveDate`, so time-of-day and timezone never leak into comparisons.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::{Result, SendplanError};

/// Check if a date may receive assignments (Monday..Friday).
pub fn is_eligible(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Return `count` eligible dates starting at or after `start`, ascending.
pub fn next_eligible_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut day = Some(start);

    while dates.len() < count {
        let Some(current) = day else { break };
        if is_eligible(current) {
            dates.push(current);
        }
        day = current.succ_opt();
    }

    dates
}

/// Next eligible date strictly after `from`.
///
/// Returns None only at the end of chrono's representable range.
pub fn advance_one_eligible_day(from: NaiveDate) -> Option<NaiveDate> {
    let mut day = from.succ_opt()?;
    while !is_eligible(day) {
        day = day.succ_opt()?;
    }
    Some(day)
}

/// Monday of the ISO week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    let since_monday = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(since_monday)).unwrap_or(date)
}

/// The contiguous run of eligible dates being viewed and scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    dates: Vec<NaiveDate>,
}

impl Window {
    /// Build a window of `days` eligible dates from `start`. `days` is raised to 1.
    ///
    /// Fails when the calendar runs out before `days` dates are found, so a
    /// window always has a first and last date.
    pub fn new(start: NaiveDate, days: usize) -> Result<Self> {
        let days = days.max(1);
        let dates = next_eligible_dates(start, days);
        if dates.len() < days {
            return Err(SendplanError::InvalidInput(format!(
                "no room for {} weekdays starting at {}",
                days, start
            )));
        }
        Ok(Self { dates })
    }

    /// Window dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// First date of the window.
    pub fn first(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Last date of the window.
    pub fn last(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Number of dates in the window.
    pub fn days(&self) -> usize {
        self.dates.len()
    }

    /// Every window date, then eligible dates past the window.
    ///
    /// At most `max_beyond` dates are produced after the window ends.
    pub fn forward(&self, max_beyond: usize) -> ForwardDates<'_> {
        ForwardDates {
            window: &self.dates,
            next_index: 0,
            cursor: None,
            beyond: 0,
            max_beyond,
        }
    }

    /// Window dates after position `index`, then eligible dates past the window.
    pub fn dates_after(&self, index: usize, max_beyond: usize) -> ForwardDates<'_> {
        ForwardDates {
            window: &self.dates,
            next_index: index + 1,
            cursor: self.dates.get(index).copied(),
            beyond: 0,
            max_beyond,
        }
    }
}

/// Iterator over window dates that keeps advancing weekday by weekday past the end.
#[derive(Debug, Clone)]
pub struct ForwardDates<'a> {
    window: &'a [NaiveDate],
    next_index: usize,
    cursor: Option<NaiveDate>,
    beyond: usize,
    max_beyond: usize,
}

impl Iterator for ForwardDates<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if let Some(&date) = self.window.get(self.next_index) {
            self.next_index += 1;
            self.cursor = Some(date);
            return Some(date);
        }

        if self.beyond >= self.max_beyond {
            return None;
        }

        let date = advance_one_eligible_day(self.cursor?)?;
        self.beyond += 1;
        self.cursor = Some(date);
        Some(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_is_eligible() {
        assert!(is_eligible(d("2024-06-03"))); // Monday
        assert!(is_eligible(d("2024-06-07"))); // Friday
        assert!(!is_eligible(d("2024-06-08"))); // Saturday
        assert!(!is_eligible(d("2024-06-09"))); // Sunday
    }

    #[test]
    fn test_next_eligible_dates_skips_weekend() {
        let dates = next_eligible_dates(d("2024-06-06"), 4);
        assert_eq!(dates, vec![d("2024-06-06"), d("2024-06-07"), d("2024-06-10"), d("2024-06-11")]);
    }

    #[test]
    fn test_next_eligible_dates_starting_on_weekend() {
        let dates = next_eligible_dates(d("2024-06-08"), 2);
        assert_eq!(dates, vec![d("2024-06-10"), d("2024-06-11")]);
    }

    #[test]
    fn test_next_eligible_dates_zero() {
        assert!(next_eligible_dates(d("2024-06-03"), 0).is_empty());
    }

    #[test]
    fn test_advance_one_eligible_day() {
        assert_eq!(advance_one_eligible_day(d("2024-06-03")), Some(d("2024-06-04")));
        assert_eq!(advance_one_eligible_day(d("2024-06-07")), Some(d("2024-06-10")));
        assert_eq!(advance_one_eligible_day(d("2024-06-08")), Some(d("2024-06-10")));
    }

    #[test]
    fn test_monday_of() {
        assert_eq!(monday_of(d("2024-06-05")), d("2024-06-03"));
        assert_eq!(monday_of(d("2024-06-03")), d("2024-06-03"));
        assert_eq!(monday_of(d("2024-06-09")), d("2024-06-03"));
    }

    #[test]
    fn test_window_bounds() {
        let window = Window::new(d("2024-06-07"), 2).unwrap();
        assert_eq!(window.first(), d("2024-06-07"));
        assert_eq!(window.last(), d("2024-06-10"));
        assert_eq!(window.days(), 2);
        assert_eq!(window.dates(), &[d("2024-06-07"), d("2024-06-10")]);
    }

    #[test]
    fn test_window_zero_days_is_one() {
        let window = Window::new(d("2024-06-03"), 0).unwrap();
        assert_eq!(window.days(), 1);
    }

    #[test]
    fn test_window_rejects_start_at_calendar_end() {
        let result = Window::new(NaiveDate::MAX, 10);
        assert!(matches!(result, Err(SendplanError::InvalidInput(_))));
    }

    #[test]
    fn test_forward_extends_past_window() {
        let window = Window::new(d("2024-06-06"), 2).unwrap();
        let dates: Vec<_> = window.forward(3).collect();
        assert_eq!(
            dates,
            vec![d("2024-06-06"), d("2024-06-07"), d("2024-06-10"), d("2024-06-11"), d("2024-06-12")]
        );
    }

    #[test]
    fn test_forward_respects_cap() {
        let window = Window::new(d("2024-06-03"), 1).unwrap();
        let mut iter = window.forward(0);
        assert_eq!(iter.next(), Some(d("2024-06-03")));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_dates_after_last_index_goes_beyond() {
        let window = Window::new(d("2024-06-06"), 2).unwrap();
        let dates: Vec<_> = window.dates_after(1, 2).collect();
        assert_eq!(dates, vec![d("2024-06-10"), d("2024-06-11")]);
    }

    #[test]
    fn test_dates_after_middle_index() {
        let window = Window::new(d("2024-06-03"), 3).unwrap();
        let dates: Vec<_> = window.dates_after(0, 1).collect();
        assert_eq!(dates, vec![d("2024-06-04"), d("2024-06-05"), d("2024-06-06")]);
    }
}
