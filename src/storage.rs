use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::models::{Stats, Task};

const TASKS_FILE: &str = "tasks.json";
const STATS_FILE: &str = "stats.json";
const MIRROR_DIR: &str = "autosync";

/// Flat-file persistence rooted at a data directory.
///
/// Every save rewrites the whole file and then copies both files into the
/// `autosync/` mirror directory, best-effort.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Storage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path to the tasks file (`tasks.json`).
    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    /// Returns the path to the stats file (`stats.json`).
    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(STATS_FILE)
    }

    pub fn mirror_dir(&self) -> PathBuf {
        self.dir.join(MIRROR_DIR)
    }

    /// Loads all tasks from the storage file.
    ///
    /// Returns an empty vector if the file does not exist or is not a JSON
    /// array. Each record is decoded on its own: one that does not decode or
    /// has no valid id is skipped without affecting the rest. Blank names are
    /// replaced.
    pub fn load_tasks(&self) -> Vec<Task> {
        let records: Vec<Value> = read_json(&self.tasks_path()).unwrap_or_default();
        records
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| match serde_json::from_value::<Task>(record) {
                Ok(task) => Some(task),
                Err(e) => {
                    debug!("skipping task record {}: {}", i, e);
                    None
                }
            })
            .filter(|t| t.id > 0)
            .map(|mut t| {
                let trimmed = t.name.trim();
                t.name = if trimmed.is_empty() {
                    "Untitled task".to_string()
                } else {
                    trimmed.to_string()
                };
                t
            })
            .collect()
    }

    /// Saves the given list of tasks to the storage file.
    ///
    /// Overwrites the existing file, then refreshes the mirror.
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        write_json(&self.tasks_path(), &tasks)?;
        self.mirror();
        Ok(())
    }

    /// Loads completion history and the daily goal.
    pub fn load_stats(&self) -> Stats {
        read_json(&self.stats_path()).unwrap_or_default()
    }

    pub fn save_stats(&self, stats: &Stats) -> Result<()> {
        write_json(&self.stats_path(), stats)?;
        self.mirror();
        Ok(())
    }

    /// Copies the data files into the mirror directory. Failures are ignored.
    pub fn mirror(&self) {
        let target = self.mirror_dir();
        if let Err(e) = fs::create_dir_all(&target) {
            debug!("mirror directory {} unavailable: {}", target.display(), e);
            return;
        }
        for (src, name) in [(self.tasks_path(), TASKS_FILE), (self.stats_path(), STATS_FILE)] {
            if !src.exists() {
                continue;
            }
            if let Err(e) = fs::copy(&src, target.join(name)) {
                debug!("failed to mirror {}: {}", src.display(), e);
            }
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    let mut f = OpenOptions::new().read(true).open(path).ok()?;
    let mut s = String::new();
    f.read_to_string(&mut s).ok()?;
    match serde_json::from_str(&s) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("ignoring unreadable {}: {}", path.display(), e);
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
