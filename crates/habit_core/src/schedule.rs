use chrono::{Datelike, NaiveDate};

use crate::habit::{Frequency, Habit, Weekday};

/// Whether the habit's schedule requires action on `date`.
///
/// Fails closed: dates before the start date and unrecognized frequencies
/// are never due.
pub fn is_due(habit: &Habit, date: NaiveDate) -> bool {
    if date < habit.start_date {
        return false;
    }
    match habit.frequency {
        Frequency::Daily => true,
        Frequency::Weekdays => !matches!(
            date.weekday(),
            chrono::Weekday::Sat | chrono::Weekday::Sun
        ),
        Frequency::Weekly | Frequency::Custom => {
            habit.days.contains(&Weekday::from(date.weekday()))
        }
        Frequency::Unknown => false,
    }
}

/// First due date at or after `from`, scanning at most `horizon_days`
/// ahead. Used to pick the next reminder slot.
pub fn next_due(habit: &Habit, from: NaiveDate, horizon_days: u32) -> Option<NaiveDate> {
    from.iter_days()
        .take(horizon_days as usize + 1)
        .find(|date| is_due(habit, *date))
}
