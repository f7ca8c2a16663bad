use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use habit_core::{
    report, schedule, stats, streak, Habit, StatsReport, StreakSummary, WindowSummary,
};

use crate::reminders::{ReminderRequest, ReminderSink};

/// How far ahead to look for the next due date when scheduling a
/// reminder. Two weeks covers every weekly pattern.
const REMINDER_HORIZON_DAYS: u32 = 14;

/// On-disk shape of one user's profile file (`<user>.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub user: String,
    #[serde(default)]
    pub habits: Vec<Habit>,
}

#[derive(Debug, Default)]
struct StoredProfile {
    path: Option<PathBuf>,
    habits: Vec<Habit>,
}

/// In-memory habit collections for all known users, loaded from JSON
/// profile files and kept behind a read-write lock. Statistics calls take
/// a consistent snapshot under the read lock and delegate to `habit_core`.
pub struct HabitStore {
    roots: Vec<PathBuf>,
    profiles: RwLock<HashMap<String, StoredProfile>>,
    watcher: Option<RecommendedWatcher>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
}

pub struct HabitStoreBuilder {
    roots: Vec<PathBuf>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
}

impl HabitStoreBuilder {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            reminder_sink: None,
        }
    }

    /// Add a profile file or a directory of `*.json` profiles.
    pub fn add_root(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if !self.roots.contains(&path) {
            self.roots.push(path);
        }
        self
    }

    pub fn with_reminder_sink(mut self, sink: Box<dyn ReminderSink>) -> Self {
        self.reminder_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<HabitStore> {
        let mut store = HabitStore {
            roots: self.roots,
            profiles: RwLock::new(HashMap::new()),
            watcher: None,
            reminder_sink: self.reminder_sink,
        };
        store.reload_all()?;
        Ok(store)
    }
}

impl Default for HabitStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitStore {
    pub fn builder() -> HabitStoreBuilder {
        HabitStoreBuilder::new()
    }

    pub fn reload_all(&mut self) -> Result<()> {
        let mut profiles = self.profiles.write();
        profiles.clear();
        for root in &self.roots {
            Self::ingest_root(&mut profiles, root)?;
        }
        Ok(())
    }

    pub fn list_users(&self) -> Vec<String> {
        let profiles = self.profiles.read();
        let mut users: Vec<String> = profiles.keys().cloned().collect();
        users.sort();
        users
    }

    pub fn habits(&self, user: &str) -> Result<Vec<Habit>> {
        let profiles = self.profiles.read();
        let profile = profiles
            .get(user)
            .ok_or_else(|| anyhow!("user profile not loaded: {user}"))?;
        Ok(profile.habits.clone())
    }

    pub fn habit(&self, user: &str, habit_id: &str) -> Result<Habit> {
        self.habits(user)?
            .into_iter()
            .find(|h| h.id == habit_id)
            .ok_or_else(|| anyhow!("habit not found: {habit_id}"))
    }

    /// Register a new habit for a user, creating the profile on first use.
    pub fn add_habit(&self, user: &str, habit: Habit) -> Result<()> {
        habit.validate()?;
        {
            let mut profiles = self.profiles.write();
            let profile = Self::ensure_profile(&mut profiles, &self.roots, user);
            if profile.habits.iter().any(|h| h.id == habit.id) {
                return Err(anyhow!("habit already exists: {}", habit.id));
            }
            profile.habits.push(habit.clone());
            Self::persist(user, profile)?;
        }
        self.schedule_reminder(&habit);
        Ok(())
    }

    /// Replace a habit definition wholesale. Embedded progress travels
    /// with the definition.
    pub fn update_habit(&self, user: &str, habit: Habit) -> Result<()> {
        habit.validate()?;
        {
            let mut profiles = self.profiles.write();
            let profile = profiles
                .get_mut(user)
                .ok_or_else(|| anyhow!("user profile not loaded: {user}"))?;
            let slot = profile
                .habits
                .iter_mut()
                .find(|h| h.id == habit.id)
                .ok_or_else(|| anyhow!("habit not found: {}", habit.id))?;
            *slot = habit.clone();
            Self::persist(user, profile)?;
        }
        if let Some(sink) = &self.reminder_sink {
            sink.clear_for_habit(&habit);
        }
        self.schedule_reminder(&habit);
        Ok(())
    }

    /// Delete a habit and, with it, all of its progress. Progress is
    /// embedded, so nothing can be orphaned.
    pub fn delete_habit(&self, user: &str, habit_id: &str) -> Result<()> {
        let removed = {
            let mut profiles = self.profiles.write();
            let profile = profiles
                .get_mut(user)
                .ok_or_else(|| anyhow!("user profile not loaded: {user}"))?;
            let index = profile
                .habits
                .iter()
                .position(|h| h.id == habit_id)
                .ok_or_else(|| anyhow!("habit not found: {habit_id}"))?;
            let removed = profile.habits.remove(index);
            Self::persist(user, profile)?;
            removed
        };
        if let Some(sink) = &self.reminder_sink {
            sink.clear_for_habit(&removed);
        }
        Ok(())
    }

    /// Set progress for `(habit, date)`, replacing any existing entry for
    /// that date. Returns the updated habit, as the original API did.
    pub fn upsert_progress(
        &self,
        user: &str,
        habit_id: &str,
        date: NaiveDate,
        completed: bool,
        quantity_done: u32,
    ) -> Result<Habit> {
        let mut profiles = self.profiles.write();
        let profile = profiles
            .get_mut(user)
            .ok_or_else(|| anyhow!("user profile not loaded: {user}"))?;
        let habit = profile
            .habits
            .iter_mut()
            .find(|h| h.id == habit_id)
            .ok_or_else(|| anyhow!("habit not found: {habit_id}"))?;
        habit.upsert_progress(date, completed, quantity_done);
        let updated = habit.clone();
        Self::persist(user, profile)?;
        Ok(updated)
    }

    pub fn stats(&self, user: &str, reference_date: NaiveDate) -> Result<StatsReport> {
        let profiles = self.profiles.read();
        let profile = profiles
            .get(user)
            .ok_or_else(|| anyhow!("user profile not loaded: {user}"))?;
        Ok(report(&profile.habits, reference_date))
    }

    pub fn window(
        &self,
        user: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WindowSummary> {
        let profiles = self.profiles.read();
        let profile = profiles
            .get(user)
            .ok_or_else(|| anyhow!("user profile not loaded: {user}"))?;
        Ok(stats::aggregate(&profile.habits, start, end))
    }

    pub fn streaks(
        &self,
        user: &str,
        habit_id: &str,
        as_of: NaiveDate,
    ) -> Result<StreakSummary> {
        let habit = self.habit(user, habit_id)?;
        Ok(streak::compute_streaks(&habit, as_of, as_of))
    }

    /// Watch the ingested roots for external edits to profile files.
    pub fn watch(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        let mut watcher = notify::recommended_watcher(|res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                tracing::debug!(?event, "profile change detected");
            }
        })?;
        for root in &self.roots {
            let mode = if root.is_file() {
                RecursiveMode::NonRecursive
            } else {
                RecursiveMode::Recursive
            };
            watcher.watch(root, mode)?;
        }
        self.watcher = Some(watcher);
        Ok(())
    }
}

impl HabitStore {
    fn ingest_root(
        profiles: &mut HashMap<String, StoredProfile>,
        root: &Path,
    ) -> Result<()> {
        if root.is_file() {
            if Self::is_profile_file(root) {
                Self::load_profile(profiles, root)?;
            }
            return Ok(());
        }
        if root.is_dir() {
            for entry in WalkDir::new(root) {
                let entry = entry?;
                if entry.file_type().is_file() && Self::is_profile_file(entry.path()) {
                    Self::load_profile(profiles, entry.path())?;
                }
            }
        }
        Ok(())
    }

    fn load_profile(profiles: &mut HashMap<String, StoredProfile>, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read profile {}", path.display()))?;
        let parsed: UserProfile = serde_json::from_str(&raw)
            .with_context(|| format!("parse profile {}", path.display()))?;
        tracing::debug!(user = %parsed.user, habits = parsed.habits.len(), "loaded profile");
        profiles.insert(
            parsed.user.clone(),
            StoredProfile {
                path: Some(path.to_path_buf()),
                habits: parsed.habits,
            },
        );
        Ok(())
    }

    fn ensure_profile<'a>(
        profiles: &'a mut HashMap<String, StoredProfile>,
        roots: &[PathBuf],
        user: &str,
    ) -> &'a mut StoredProfile {
        profiles.entry(user.to_string()).or_insert_with(|| {
            let path = roots
                .iter()
                .find(|root| root.is_dir())
                .map(|root| root.join(format!("{user}.json")));
            StoredProfile {
                path,
                habits: Vec::new(),
            }
        })
    }

    fn persist(user: &str, profile: &StoredProfile) -> Result<()> {
        let Some(path) = &profile.path else {
            return Ok(());
        };
        let snapshot = UserProfile {
            user: user.to_string(),
            habits: profile.habits.clone(),
        };
        let payload = serde_json::to_string_pretty(&snapshot)?;
        fs::write(path, payload).with_context(|| format!("write profile {}", path.display()))?;
        Ok(())
    }

    fn schedule_reminder(&self, habit: &Habit) {
        let Some(sink) = &self.reminder_sink else {
            return;
        };
        let today = Utc::now().date_naive();
        if let Some(due) = schedule::next_due(habit, today, REMINDER_HORIZON_DAYS) {
            let time = habit
                .reminder_time
                .unwrap_or_else(|| NaiveTime::from_hms_opt(9, 0, 0).unwrap());
            let when = Utc.from_utc_datetime(&due.and_time(time));
            sink.schedule(ReminderRequest {
                title: format!("Habit: {}", habit.name),
                body: format!("Due on {due}"),
                scheduled_for: when,
            });
        }
    }

    fn is_profile_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}
