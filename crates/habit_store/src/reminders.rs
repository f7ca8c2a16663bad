use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use habit_core::Habit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Platform-specific reminder delivery (desktop notifications, push, ...)
/// implements this trait and is injected into the store. The store never
/// owns timers or global scheduling state.
pub trait ReminderSink: Send + Sync {
    fn schedule(&self, reminder: ReminderRequest);
    fn clear_for_habit(&self, habit: &Habit);
}
