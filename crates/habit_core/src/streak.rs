use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{completion, habit::Habit, schedule};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
}

/// Walk the calendar backward from `as_of` to the habit's start date and
/// measure completion runs over due dates only.
///
/// Dates that are not due neither extend nor break a run. A due date that
/// is not resolved complete breaks the run, except when it lies strictly
/// after `today` (a window being viewed ahead of time is not a failure).
/// `current` is the unbroken run touching `as_of`; `longest` keeps
/// tracking across breaks over the full history.
pub fn compute_streaks(habit: &Habit, as_of: NaiveDate, today: NaiveDate) -> StreakSummary {
    let entries = habit.progress_by_date();
    let mut run = 0u32;
    let mut longest = 0u32;
    let mut current = 0u32;
    let mut current_closed = false;

    let mut date = as_of;
    while date >= habit.start_date {
        if schedule::is_due(habit, date) {
            let entry = entries.get(&date).copied();
            if completion::is_completed(habit, entry) {
                run += 1;
                longest = longest.max(run);
            } else if date <= today {
                if !current_closed {
                    current = run;
                    current_closed = true;
                }
                run = 0;
            }
        }
        match date.pred_opt() {
            Some(prev) => date = prev,
            None => break,
        }
    }
    if !current_closed {
        current = run;
    }

    StreakSummary { current, longest }
}
