pub mod completion;
pub mod habit;
pub mod report;
pub mod schedule;
pub mod stats;
pub mod streak;

pub use crate::habit::{Frequency, Habit, HabitError, Priority, ProgressEntry, Weekday};
pub use crate::report::{report, StatsReport};
pub use crate::stats::{aggregate, DayBreakdown, WindowSummary};
pub use crate::streak::{compute_streaks, StreakSummary};
