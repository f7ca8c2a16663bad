use crate::habit::{Habit, ProgressEntry};

/// Resolve whether an entry counts as a completion for this habit.
///
/// Absence is never completion. Quantity-based habits are resolved from
/// the logged quantity against the target; the stored `completed` flag is
/// only authoritative for boolean habits.
pub fn is_completed(habit: &Habit, entry: Option<&ProgressEntry>) -> bool {
    let Some(entry) = entry else {
        return false;
    };
    if habit.is_quantity_based {
        entry.quantity_done >= habit.quantity
    } else {
        entry.completed
    }
}
