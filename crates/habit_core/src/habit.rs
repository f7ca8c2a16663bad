use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HabitError {
    #[error("habit name must not be empty")]
    EmptyName,
    #[error("quantity target must be at least 1")]
    ZeroQuantity,
    #[error("weekly and custom habits need at least one weekday")]
    MissingDays,
}

/// Fixed weekday tokens as they appear on the wire (`mon`..`sun`).
/// The mapping from calendar dates is locale-independent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
            chrono::Weekday::Sun => Weekday::Sun,
        }
    }
}

/// Schedule rule for a habit. Unrecognized values deserialize to `Unknown`
/// so one bad record cannot fail a whole profile load; an `Unknown`
/// frequency is simply never due.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekdays,
    Weekly,
    Custom,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A single day's log for a habit. Time-of-day is stripped at the
/// boundary; only the calendar date is meaningful.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub date: NaiveDate,
    pub completed: bool,
    pub quantity_done: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "de_day")]
    pub start_date: NaiveDate,
    pub frequency: Frequency,
    #[serde(default)]
    pub days: Vec<Weekday>,
    #[serde(default)]
    pub reminder_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_quantity_based: bool,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "de_progress")]
    pub progress: Vec<ProgressEntry>,
}

fn default_quantity() -> u32 {
    1
}

impl Habit {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_date: NaiveDate,
        frequency: Frequency,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            start_date,
            frequency,
            days: Vec::new(),
            reminder_time: None,
            is_quantity_based: false,
            quantity: default_quantity(),
            priority: Priority::default(),
            progress: Vec::new(),
        }
    }

    /// Creation-time invariants. The engine itself tolerates records that
    /// violate these (they come out inert), but mutations through the
    /// store must reject them.
    pub fn validate(&self) -> Result<(), HabitError> {
        if self.name.trim().is_empty() {
            return Err(HabitError::EmptyName);
        }
        if self.quantity == 0 {
            return Err(HabitError::ZeroQuantity);
        }
        if matches!(self.frequency, Frequency::Weekly | Frequency::Custom) && self.days.is_empty()
        {
            return Err(HabitError::MissingDays);
        }
        Ok(())
    }

    /// Set progress for a calendar date, replacing any existing entry for
    /// that date. Upsert, not append.
    pub fn upsert_progress(&mut self, date: NaiveDate, completed: bool, quantity_done: u32) {
        let entry = ProgressEntry {
            date,
            completed,
            quantity_done,
        };
        match self.progress.iter_mut().find(|p| p.date == date) {
            Some(existing) => *existing = entry,
            None => self.progress.push(entry),
        }
    }

    /// The authoritative entry per date. Stored progress is ordered by
    /// insertion; should duplicates for one date exist, the last write
    /// wins.
    pub fn progress_by_date(&self) -> BTreeMap<NaiveDate, &ProgressEntry> {
        let mut by_date = BTreeMap::new();
        for entry in &self.progress {
            by_date.insert(entry.date, entry);
        }
        by_date
    }

    pub fn entry_on(&self, date: NaiveDate) -> Option<&ProgressEntry> {
        self.progress.iter().rev().find(|p| p.date == date)
    }
}

/// Accept `YYYY-MM-DD` with any trailing time-of-day (`T..` or ` ..`)
/// stripped before parsing.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day_part = trimmed
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
}

fn de_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).ok_or_else(|| D::Error::custom(format!("invalid calendar date: {raw}")))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProgressEntry {
    date: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    quantity_done: u32,
}

/// Progress entries are deserialized leniently: an entry whose date does
/// not parse is dropped with a warning instead of failing the habit.
fn de_progress<'de, D>(deserializer: D) -> Result<Vec<ProgressEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RawProgressEntry>::deserialize(deserializer)?;
    let entries = raw
        .into_iter()
        .filter_map(|entry| match parse_day(&entry.date) {
            Some(date) => Some(ProgressEntry {
                date,
                completed: entry.completed,
                quantity_done: entry.quantity_done,
            }),
            None => {
                tracing::warn!(date = %entry.date, "skipping progress entry with unparseable date");
                None
            }
        })
        .collect();
    Ok(entries)
}
