use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{completion, habit::Habit, stats, streak};

/// Completions per achievement milestone.
const ACHIEVEMENT_MILESTONE: u32 = 10;
/// Display cap on freshly surfaced achievements.
const NEW_ACHIEVEMENT_CAP: u32 = 2;

/// Cross-habit statistics for a user, shaped like the original backend's
/// stats response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub active_habits: usize,
    pub completion_rate: i64,
    pub week_over_week_change: i64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub achievements: u32,
    pub new_achievements: u32,
}

/// Week-over-week trend report as of `reference_date`.
///
/// The current week is the 7 days ending at `reference_date`; the
/// previous week is the 7 days immediately before it. Streaks are the
/// maximum over habits, not a sum. Achievements derive from lifetime
/// resolved completions and are recomputed idempotently, never stored.
pub fn report(habits: &[Habit], reference_date: NaiveDate) -> StatsReport {
    let week_start = reference_date - Days::new(6);
    let current_week = stats::aggregate(habits, week_start, reference_date);
    let previous_week = stats::aggregate(
        habits,
        week_start - Days::new(7),
        week_start - Days::new(1),
    );

    let mut current_streak = 0u32;
    let mut best_streak = 0u32;
    let mut lifetime_completed = 0u32;
    for habit in habits {
        let summary = streak::compute_streaks(habit, reference_date, reference_date);
        current_streak = current_streak.max(summary.current);
        best_streak = best_streak.max(summary.longest);

        for entry in habit.progress_by_date().values().copied() {
            if completion::is_completed(habit, Some(entry)) {
                lifetime_completed += 1;
            }
        }
    }

    let achievements = lifetime_completed / ACHIEVEMENT_MILESTONE;
    let new_achievements = if achievements > 0 {
        achievements.min(NEW_ACHIEVEMENT_CAP)
    } else {
        0
    };

    StatsReport {
        active_habits: habits.len(),
        completion_rate: current_week.rate_percent(),
        week_over_week_change: current_week.rate_percent() - previous_week.rate_percent(),
        current_streak,
        best_streak,
        achievements,
        new_achievements,
    }
}
