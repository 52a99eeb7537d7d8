use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Represents a single task in the to-do list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier, assigned monotonically by the store.
    pub id: u64,
    /// The name or description of the task.
    pub name: String,
    /// Optional due date.
    #[serde(default, deserialize_with = "lenient_date")]
    pub due: Option<NaiveDate>,
    /// Optional time of day, persisted as `HH:MM`.
    #[serde(default, with = "hhmm")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    /// Recurrence rule; only valid together with a due date.
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    /// Free-text label.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Soft-removed tasks only show up in the archive view.
    #[serde(default)]
    pub archived: bool,
    /// Date the task was completed; set exactly while `status` is completed.
    #[serde(default, deserialize_with = "lenient_date")]
    pub completed_at: Option<NaiveDate>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Pending with a due date strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && self.due.is_some_and(|d| d < today)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Med,
    High,
}

impl Priority {
    /// Sort rank, most important first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Med => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Med => "med",
            Priority::High => "high",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Computes the due date of the next instance.
    ///
    /// Monthly recurrence keeps the day of month but caps it at 28, so a task
    /// due on the 29th-31st moves to the 28th of the following month.
    // NOTE: the cap drops days 29-31 even for months that have them. Kept for
    // compatibility with existing data files; likely worth revisiting.
    pub fn next_due(self, due: NaiveDate) -> NaiveDate {
        match self {
            Recurrence::Daily => due + Duration::days(1),
            Recurrence::Weekly => due + Duration::weeks(1),
            Recurrence::Monthly => {
                let (year, month) = if due.month() == 12 {
                    (due.year() + 1, 1)
                } else {
                    (due.year(), due.month() + 1)
                };
                // every month has a 28th
                NaiveDate::from_ymd_opt(year, month, due.day().min(28)).unwrap_or(due)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "med" => Ok(Priority::Med),
            "high" => Ok(Priority::High),
            _ => Err(Error::validation("Priority must be low, med, or high.")),
        }
    }
}

impl FromStr for Recurrence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            _ => Err(Error::validation("Repeat must be daily, weekly, or monthly.")),
        }
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "completed" => Ok(Status::Completed),
            _ => Err(Error::validation("Status must be pending or completed.")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
        })
    }
}

/// Completion history and the daily goal, persisted next to the tasks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
    #[serde(default = "default_goal")]
    pub daily_goal: u32,
}

fn default_goal() -> u32 {
    3
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            completed_dates: BTreeSet::new(),
            daily_goal: default_goal(),
        }
    }
}

/// An explicit edit to an optional field: either a new value or a clear.
///
/// `Option<Change<T>>` separates "not supplied" (`None`) from "clear it".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<T> {
    Set(T),
    Clear,
}

impl<T> Change<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Change::Set(v) => Some(v),
            Change::Clear => None,
        }
    }
}

/// Parses `HH:MM` (24h). Returns `None` for anything else.
pub fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    let (h, m) = raw.trim().split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Parses `dd.mm` or `dd.mm.yyyy`; a missing year is taken from `base`.
pub fn parse_ddmm(raw: &str, base: NaiveDate) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('.').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }
    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = match parts.get(2) {
        Some(y) => y.parse().ok()?,
        None => base.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_ddmm(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Unparseable dates in a data file are read as absent rather than failing
/// the whole load.
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()))
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.serialize_some(&super::format_hhmm(*t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|s| super::parse_hhmm(&s)))
    }
}
