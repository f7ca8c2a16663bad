use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{completion, habit::Habit, schedule};

/// Per-date slice of a window, for calendars and heatmaps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayBreakdown {
    pub date: NaiveDate,
    pub due: u32,
    pub completed: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    pub total_due: u32,
    pub total_completed: u32,
    pub per_day: Vec<DayBreakdown>,
}

impl WindowSummary {
    /// Raw completion ratio; 0.0 when nothing was due in the window.
    pub fn completion_rate(&self) -> f64 {
        if self.total_due == 0 {
            return 0.0;
        }
        f64::from(self.total_completed) / f64::from(self.total_due)
    }

    /// Whole-number percentage for display and trend deltas.
    pub fn rate_percent(&self) -> i64 {
        (self.completion_rate() * 100.0).round() as i64
    }
}

/// Count due and resolved-completed slots for every habit over the
/// inclusive `[start, end]` range. Dates where nothing is due still get a
/// `per_day` row (with zeros) but contribute nothing to the rate
/// denominator.
pub fn aggregate(habits: &[Habit], start: NaiveDate, end: NaiveDate) -> WindowSummary {
    let mut summary = WindowSummary::default();
    if start > end {
        return summary;
    }

    let by_date: Vec<_> = habits.iter().map(|h| (h, h.progress_by_date())).collect();

    for date in start.iter_days().take_while(|d| *d <= end) {
        let mut day = DayBreakdown {
            date,
            due: 0,
            completed: 0,
        };
        for (habit, entries) in &by_date {
            if !schedule::is_due(habit, date) {
                continue;
            }
            day.due += 1;
            if completion::is_completed(habit, entries.get(&date).copied()) {
                day.completed += 1;
            }
        }
        summary.total_due += day.due;
        summary.total_completed += day.completed;
        summary.per_day.push(day);
    }
    summary
}
