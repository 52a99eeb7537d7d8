use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{format_hhmm, parse_ddmm, parse_hhmm, Status, Task};
use crate::store::{ImportedTask, NewTask};

pub const CSV_DEFAULT: &str = "tasks.csv";
pub const ICS_DEFAULT: &str = "tasks.ics";

/// Fixed CSV column layout. Every column is text; empty means absent.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
struct CsvRow {
    name: String,
    due: String,
    time: String,
    status: String,
    priority: String,
    recurrence: String,
    tag: String,
    category: String,
    archived: String,
}

impl From<&Task> for CsvRow {
    fn from(t: &Task) -> Self {
        CsvRow {
            name: t.name.clone(),
            due: t.due.map(|d| d.to_string()).unwrap_or_default(),
            time: t.time.map(format_hhmm).unwrap_or_default(),
            status: t.status.to_string(),
            priority: t.priority.to_string(),
            recurrence: t.recurrence.map(|r| r.to_string()).unwrap_or_default(),
            tag: t.tag.clone().unwrap_or_default(),
            category: t.category.clone().unwrap_or_default(),
            archived: if t.archived { "1" } else { "0" }.to_string(),
        }
    }
}

impl CsvRow {
    /// Lenient conversion: invalid enum values fall back to defaults.
    fn into_import(self, base: NaiveDate) -> ImportedTask {
        let due = match self.due.trim() {
            "" => None,
            raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .or_else(|| parse_ddmm(raw, base)),
        };
        let text = |s: String| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        ImportedTask {
            task: NewTask {
                name: self.name.trim().to_string(),
                due,
                time: parse_hhmm(&self.time),
                tag: text(self.tag),
                category: text(self.category),
                priority: self.priority.parse().unwrap_or_default(),
                recurrence: self.recurrence.parse().ok(),
            },
            status: self.status.parse().unwrap_or(Status::Pending),
            archived: matches!(
                self.archived.trim().to_lowercase().as_str(),
                "1" | "true" | "yes"
            ),
        }
    }
}

/// Writes every task to `path` as CSV. Returns the number of rows.
pub fn export_csv(tasks: &[Task], path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    for task in tasks {
        writer.serialize(CsvRow::from(task))?;
    }
    writer.flush()?;
    Ok(tasks.len())
}

/// Reads tasks from a CSV file with the export column layout.
pub fn import_csv(path: &Path, base: NaiveDate) -> Result<Vec<ImportedTask>> {
    if !path.exists() {
        return Err(Error::validation("CSV file not found."));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        rows.push(record?.into_import(base));
    }
    if rows.is_empty() {
        return Err(Error::validation("CSV file is empty."));
    }
    Ok(rows)
}

/// Renders dated, non-archived tasks as a minimal iCalendar document.
pub fn ics_string(tasks: &[Task]) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//Neondo//EN".to_string(),
    ];
    for task in tasks.iter().filter(|t| !t.archived) {
        let Some(due) = task.due else { continue };
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@neondo", task.id));
        match task.time {
            Some(time) => {
                let stamp = NaiveDateTime::new(due, time).format("%Y%m%dT%H%M%S");
                lines.push(format!("DTSTAMP:{}", stamp));
                lines.push(format!("DTSTART:{}", stamp));
            }
            None => {
                let stamp = due.format("%Y%m%d");
                lines.push(format!("DTSTAMP:{}", stamp));
                lines.push(format!("DTSTART;VALUE=DATE:{}", stamp));
            }
        }
        lines.push(format!("SUMMARY:{}", task.name));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());
    lines.join("\n")
}

pub fn export_ics(tasks: &[Task], path: &Path) -> Result<()> {
    fs::write(path, ics_string(tasks))?;
    Ok(())
}
