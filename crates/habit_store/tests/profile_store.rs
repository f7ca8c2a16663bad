use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tempfile::tempdir;

use habit_core::{Frequency, Habit, Weekday};
use habit_store::{HabitStore, ReminderRequest, ReminderSink, UserProfile};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_file(path: &PathBuf, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write fixture");
}

fn ada_profile() -> &'static str {
    r#"{
        "user": "ada",
        "habits": [
            {
                "id": "h-journal",
                "name": "Journal",
                "startDate": "2025-06-01T00:00:00.000Z",
                "frequency": "daily",
                "priority": "high",
                "progress": [
                    {"date": "2025-06-12", "completed": true},
                    {"date": "2025-06-13", "completed": true},
                    {"date": "2025-06-14", "completed": true},
                    {"date": "garbage", "completed": true}
                ]
            },
            {
                "id": "h-gym",
                "name": "Gym",
                "startDate": "2025-06-02",
                "frequency": "weekly",
                "days": ["mon", "wed", "fri"],
                "progress": [
                    {"date": "2025-06-09", "completed": true},
                    {"date": "2025-06-11", "completed": false},
                    {"date": "2025-06-13", "completed": true}
                ]
            }
        ]
    }"#
}

fn grace_profile() -> &'static str {
    r#"{
        "user": "grace",
        "habits": [
            {
                "id": "h-water",
                "name": "Drink water",
                "startDate": "2025-06-08",
                "frequency": "daily",
                "isQuantityBased": true,
                "quantity": 8,
                "progress": [
                    {"date": "2025-06-12", "completed": false, "quantityDone": 8},
                    {"date": "2025-06-13", "completed": true, "quantityDone": 5},
                    {"date": "2025-06-14", "completed": false, "quantityDone": 9}
                ]
            }
        ]
    }"#
}

#[test]
fn loads_profiles_and_derives_statistics() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    write_file(&root.join("ada.json"), ada_profile());
    write_file(&root.join("grace.json"), grace_profile());

    let store = HabitStore::builder()
        .add_root(root)
        .build()
        .expect("build habit store");

    assert_eq!(store.list_users(), vec!["ada".to_string(), "grace".into()]);

    let habits = store.habits("ada").expect("ada habits");
    assert_eq!(habits.len(), 2);
    let journal = store.habit("ada", "h-journal").expect("journal habit");
    assert_eq!(
        journal.progress.len(),
        3,
        "entry with unparseable date is dropped on load"
    );

    // Friday 2025-06-13: Wednesday was due but failed, so the Monday
    // completion does not chain into the current run.
    let gym = store.streaks("ada", "h-gym", day(2025, 6, 13)).expect("gym streaks");
    assert_eq!(gym.current, 1);
    assert_eq!(gym.longest, 1);

    let journal_streaks = store
        .streaks("ada", "h-journal", day(2025, 6, 14))
        .expect("journal streaks");
    assert_eq!(journal_streaks.current, 3);

    let stats = store.stats("ada", day(2025, 6, 14)).expect("ada stats");
    assert_eq!(stats.active_habits, 2);
    assert_eq!(stats.completion_rate, 50); // 5 of 10 due slots this week
    assert_eq!(stats.week_over_week_change, 50); // nothing logged the week before
    assert_eq!(stats.current_streak, 3);
    assert_eq!(stats.best_streak, 3);
    assert_eq!(stats.achievements, 0); // 5 lifetime completions

    let window = store
        .window("ada", day(2025, 6, 8), day(2025, 6, 14))
        .expect("ada window");
    assert_eq!(window.per_day.len(), 7);
    assert_eq!(window.per_day[1].due, 2, "Monday has journal and gym due");
    assert_eq!(window.total_due, 10);
    assert_eq!(window.total_completed, 5);

    // Quantity resolution is authoritative over the stored flag.
    let water = store.streaks("grace", "h-water", day(2025, 6, 14)).expect("water streaks");
    assert_eq!(water.current, 1); // 6/14 done by quantity, 6/13 short of 8
    assert_eq!(water.longest, 1);
}

#[test]
fn progress_upsert_replaces_and_persists() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    let ada_file = root.join("ada.json");
    write_file(&ada_file, ada_profile());

    let store = HabitStore::builder()
        .add_root(root)
        .build()
        .expect("build habit store");

    let updated = store
        .upsert_progress("ada", "h-gym", day(2025, 6, 11), true, 0)
        .expect("upsert progress");
    assert_eq!(updated.progress.len(), 3, "replaced, not appended");

    let gym = store.streaks("ada", "h-gym", day(2025, 6, 13)).expect("gym streaks");
    assert_eq!(gym.current, 3, "repaired Wednesday re-joins the run");

    let raw = fs::read_to_string(&ada_file).expect("read persisted profile");
    let persisted: UserProfile = serde_json::from_str(&raw).expect("parse persisted profile");
    let gym = persisted
        .habits
        .iter()
        .find(|h| h.id == "h-gym")
        .expect("gym persisted");
    let wednesday = gym
        .entry_on(day(2025, 6, 11))
        .expect("wednesday entry persisted");
    assert!(wednesday.completed);
}

#[test]
fn deleting_a_habit_cascades_to_its_progress() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    let ada_file = root.join("ada.json");
    write_file(&ada_file, ada_profile());

    let store = HabitStore::builder()
        .add_root(root)
        .build()
        .expect("build habit store");

    store.delete_habit("ada", "h-journal").expect("delete habit");
    assert_eq!(store.habits("ada").expect("ada habits").len(), 1);
    assert!(store.habit("ada", "h-journal").is_err());

    let raw = fs::read_to_string(&ada_file).expect("read persisted profile");
    let persisted: UserProfile = serde_json::from_str(&raw).expect("parse persisted profile");
    assert_eq!(persisted.habits.len(), 1);
    assert_eq!(persisted.habits[0].id, "h-gym");
}

#[test]
fn lookups_fail_cleanly_for_unknown_records() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    write_file(&root.join("ada.json"), ada_profile());

    let store = HabitStore::builder()
        .add_root(root)
        .build()
        .expect("build habit store");

    assert!(store.habits("nobody").is_err());
    assert!(store.habit("ada", "h-missing").is_err());
    assert!(store.stats("nobody", day(2025, 6, 14)).is_err());
}

#[test]
fn invalid_definitions_are_rejected_at_the_store() {
    let temp = tempdir().expect("tempdir");
    let store = HabitStore::builder()
        .add_root(temp.path())
        .build()
        .expect("build habit store");

    let weekly_without_days = Habit::new("h-bad", "Review", day(2025, 6, 1), Frequency::Weekly);
    assert!(store.add_habit("lin", weekly_without_days).is_err());

    let walk = Habit::new("h-walk", "Walk", day(2025, 6, 1), Frequency::Daily);
    store.add_habit("lin", walk.clone()).expect("add habit");
    assert!(
        store.add_habit("lin", walk).is_err(),
        "duplicate id is rejected"
    );
}

#[derive(Default)]
struct RecordingSink {
    scheduled: Mutex<Vec<ReminderRequest>>,
    cleared: Mutex<Vec<String>>,
}

struct SinkHandle(Arc<RecordingSink>);

impl ReminderSink for SinkHandle {
    fn schedule(&self, reminder: ReminderRequest) {
        self.0.scheduled.lock().unwrap().push(reminder);
    }

    fn clear_for_habit(&self, habit: &Habit) {
        self.0.cleared.lock().unwrap().push(habit.id.clone());
    }
}

#[test]
fn updating_a_habit_persists_and_reschedules_reminders() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    let sink = Arc::new(RecordingSink::default());

    let store = HabitStore::builder()
        .add_root(root)
        .with_reminder_sink(Box::new(SinkHandle(Arc::clone(&sink))))
        .build()
        .expect("build habit store");

    let habit = Habit::new("h-gym", "Gym", day(2020, 1, 1), Frequency::Daily);
    store.add_habit("lin", habit).expect("add habit");
    store
        .upsert_progress("lin", "h-gym", day(2025, 6, 9), true, 0)
        .expect("log progress");

    let mut revised = store.habit("lin", "h-gym").expect("fetch habit");
    revised.frequency = Frequency::Weekly;
    revised.days = vec![Weekday::Mon, Weekday::Fri];
    store.update_habit("lin", revised).expect("update habit");

    let current = store.habit("lin", "h-gym").expect("fetch updated habit");
    assert_eq!(current.frequency, Frequency::Weekly);
    assert_eq!(current.days, vec![Weekday::Mon, Weekday::Fri]);
    assert_eq!(
        current.progress.len(),
        1,
        "embedded progress travels with the definition"
    );

    let raw = fs::read_to_string(root.join("lin.json")).expect("read persisted profile");
    let persisted: UserProfile = serde_json::from_str(&raw).expect("parse persisted profile");
    assert_eq!(persisted.habits.len(), 1);
    assert_eq!(persisted.habits[0].days, vec![Weekday::Mon, Weekday::Fri]);
    assert!(persisted.habits[0].entry_on(day(2025, 6, 9)).is_some());

    // Add scheduled once; update cleared the old slot and scheduled anew.
    assert_eq!(sink.cleared.lock().unwrap().as_slice(), ["h-gym"]);
    assert_eq!(sink.scheduled.lock().unwrap().len(), 2);

    let mut invalid = store.habit("lin", "h-gym").expect("fetch habit again");
    invalid.name = "  ".into();
    assert!(store.update_habit("lin", invalid).is_err());
    assert!(store
        .update_habit("lin", Habit::new("h-none", "Ghost", day(2020, 1, 1), Frequency::Daily))
        .is_err());
}

#[test]
fn new_habits_schedule_reminders_and_create_profiles() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    let sink = Arc::new(RecordingSink::default());

    let store = HabitStore::builder()
        .add_root(root)
        .with_reminder_sink(Box::new(SinkHandle(Arc::clone(&sink))))
        .build()
        .expect("build habit store");

    // Daily habit with a start date far in the past is due today,
    // whenever "today" is.
    let habit = Habit::new("h-walk", "Walk", day(2020, 1, 1), Frequency::Daily);
    store.add_habit("lin", habit).expect("add habit");

    let scheduled = sink.scheduled.lock().unwrap();
    assert_eq!(scheduled.len(), 1);
    assert!(scheduled[0].title.contains("Walk"));
    drop(scheduled);

    store.delete_habit("lin", "h-walk").expect("delete habit");
    assert_eq!(sink.cleared.lock().unwrap().as_slice(), ["h-walk"]);

    let raw = fs::read_to_string(root.join("lin.json")).expect("profile file created");
    let persisted: UserProfile = serde_json::from_str(&raw).expect("parse created profile");
    assert_eq!(persisted.user, "lin");
    assert!(persisted.habits.is_empty(), "deletion persisted too");
}
