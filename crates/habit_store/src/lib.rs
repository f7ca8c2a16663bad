pub mod reminders;
pub mod store;

pub use crate::reminders::{ReminderRequest, ReminderSink};
pub use crate::store::{HabitStore, HabitStoreBuilder, UserProfile};
