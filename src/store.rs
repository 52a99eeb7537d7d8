use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Change, Priority, Recurrence, Stats, Status, Task};
use crate::storage::Storage;

/// Fields for a task about to be created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub due: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub priority: Priority,
    pub recurrence: Option<Recurrence>,
}

impl NewTask {
    pub fn new(name: impl Into<String>) -> Self {
        NewTask {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub due: Option<Change<NaiveDate>>,
    pub time: Option<Change<NaiveTime>>,
    pub priority: Option<Priority>,
    pub recurrence: Option<Change<Recurrence>>,
    pub tag: Option<Change<String>>,
    pub category: Option<Change<String>>,
    pub status: Option<Status>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

/// A record read from an external source (CSV import).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTask {
    pub task: NewTask,
    pub status: Status,
    pub archived: bool,
}

/// Immutable copy of the collection and id counter, used for undo/redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Snapshot {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}

/// Result of completing a task.
#[derive(Debug, Clone)]
pub struct Completion {
    pub task: Task,
    /// Next instance of a recurring task.
    pub spawned: Option<Task>,
}

/// Counters shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub completed_today: usize,
    pub goal: u32,
    pub streak: u32,
}

/// In-memory task collection with linear undo/redo history.
///
/// Every mutating operation validates before touching any state, records an
/// undo snapshot, then rewrites the backing file.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    stats: Stats,
    storage: Storage,
}

impl TaskStore {
    /// Loads tasks and stats from `storage`. Missing or corrupt files start empty.
    pub fn open(storage: Storage) -> Self {
        let tasks = storage.load_tasks();
        let stats = storage.load_stats();
        let next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        TaskStore {
            tasks,
            next_id,
            undo: Vec::new(),
            redo: Vec::new(),
            stats,
            storage,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            next_id: self.next_id,
        }
    }

    /// Creates a task with the next identifier.
    pub fn add(&mut self, new: NewTask) -> Result<Task> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Task name is required."));
        }
        if new.recurrence.is_some() && new.due.is_none() {
            return Err(Error::validation("Repeat requires a due date."));
        }

        self.checkpoint();
        let task = Task {
            id: self.take_id(),
            name,
            due: new.due,
            time: new.time,
            status: Status::Pending,
            priority: new.priority,
            recurrence: new.recurrence,
            tag: clean(new.tag),
            category: clean(new.category),
            archived: false,
            completed_at: None,
        };
        self.tasks.push(task.clone());
        self.commit()?;
        info!(id = task.id, "task added: {}", task.name);
        Ok(task)
    }

    /// Quick entry: due today, tagged `inbox`.
    pub fn capture(&mut self, name: &str, today: NaiveDate) -> Result<Task> {
        self.add(NewTask {
            due: Some(today),
            tag: Some("inbox".to_string()),
            ..NewTask::new(name)
        })
    }

    /// Applies the supplied fields of `patch` to task `id`.
    ///
    /// The patched task is validated as a whole before anything is written.
    pub fn update(&mut self, id: u64, patch: TaskPatch, today: NaiveDate) -> Result<Task> {
        let idx = self.index_of(id)?;
        if patch.is_empty() {
            return Err(Error::validation("Nothing to update."));
        }

        let mut candidate = self.tasks[idx].clone();
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::validation("Task name is required."));
            }
            candidate.name = name;
        }
        if let Some(due) = patch.due {
            candidate.due = due.into_option();
        }
        if let Some(time) = patch.time {
            candidate.time = time.into_option();
        }
        if let Some(priority) = patch.priority {
            candidate.priority = priority;
        }
        if let Some(recurrence) = patch.recurrence {
            candidate.recurrence = recurrence.into_option();
        }
        if let Some(tag) = patch.tag {
            candidate.tag = clean(tag.into_option());
        }
        if let Some(category) = patch.category {
            candidate.category = clean(category.into_option());
        }
        if let Some(status) = patch.status {
            candidate.status = status;
        }
        if candidate.recurrence.is_some() && candidate.due.is_none() {
            return Err(Error::validation("Repeat requires a due date."));
        }

        let newly_completed = candidate.is_completed() && candidate.completed_at.is_none();
        match candidate.status {
            Status::Completed if newly_completed => candidate.completed_at = Some(today),
            Status::Completed => {}
            Status::Pending => candidate.completed_at = None,
        }

        self.checkpoint();
        self.tasks[idx] = candidate.clone();
        self.commit()?;
        if newly_completed {
            self.record_completion(today)?;
        }
        info!(id, "task updated");
        Ok(candidate)
    }

    /// Marks task `id` completed on `today`.
    ///
    /// A recurring task spawns its next instance here, never ahead of time.
    pub fn complete(&mut self, id: u64, today: NaiveDate) -> Result<Completion> {
        let idx = self.index_of(id)?;
        if self.tasks[idx].is_completed() {
            return Err(Error::validation("Task is already completed."));
        }

        self.checkpoint();
        let task = {
            let t = &mut self.tasks[idx];
            t.status = Status::Completed;
            t.completed_at = Some(today);
            t.clone()
        };

        let spawned = match (task.recurrence, task.due) {
            (Some(rule), Some(due)) => {
                let next = Task {
                    id: self.take_id(),
                    due: Some(rule.next_due(due)),
                    status: Status::Pending,
                    archived: false,
                    completed_at: None,
                    ..task.clone()
                };
                self.tasks.push(next.clone());
                Some(next)
            }
            _ => None,
        };

        self.commit()?;
        self.record_completion(today)?;
        info!(id, "task completed: {}", task.name);
        if let Some(next) = &spawned {
            info!(id = next.id, "recurring task scheduled for {:?}", next.due);
        }
        Ok(Completion { task, spawned })
    }

    /// Deletes a task outright.
    pub fn remove(&mut self, id: u64) -> Result<Task> {
        let idx = self.index_of(id)?;
        self.checkpoint();
        let task = self.tasks.remove(idx);
        self.commit()?;
        info!(id, "task removed");
        Ok(task)
    }

    /// Deletes every task. The id counter keeps running.
    pub fn clear(&mut self) -> Result<usize> {
        self.checkpoint();
        let count = self.tasks.len();
        self.tasks.clear();
        self.commit()?;
        info!(count, "all tasks cleared");
        Ok(count)
    }

    /// Archives every completed, non-archived task.
    pub fn archive(&mut self) -> Result<usize> {
        let count = self
            .tasks
            .iter()
            .filter(|t| t.is_completed() && !t.archived)
            .count();
        if count == 0 {
            return Err(Error::validation("No completed tasks to archive."));
        }
        self.checkpoint();
        for t in self.tasks.iter_mut().filter(|t| t.is_completed() && !t.archived) {
            t.archived = true;
        }
        self.commit()?;
        info!(count, "tasks archived");
        Ok(count)
    }

    /// Clears the archived flag on every archived task.
    pub fn archive_restore(&mut self) -> Result<usize> {
        let count = self.tasks.iter().filter(|t| t.archived).count();
        if count == 0 {
            return Err(Error::validation("No archived tasks to restore."));
        }
        self.checkpoint();
        for t in self.tasks.iter_mut().filter(|t| t.archived) {
            t.archived = false;
        }
        self.commit()?;
        info!(count, "archived tasks restored");
        Ok(count)
    }

    /// Moves every overdue, non-archived task to `today`.
    pub fn reschedule_overdue(&mut self, today: NaiveDate) -> Result<usize> {
        let count = self
            .tasks
            .iter()
            .filter(|t| !t.archived && t.is_overdue(today))
            .count();
        if count == 0 {
            return Err(Error::validation("No overdue tasks to reschedule."));
        }
        self.checkpoint();
        for t in self.tasks.iter_mut().filter(|t| !t.archived && t.is_overdue(today)) {
            t.due = Some(today);
        }
        self.commit()?;
        info!(count, "overdue tasks rescheduled");
        Ok(count)
    }

    /// Appends imported records with fresh identifiers as one undo step.
    ///
    /// Rows with a blank name are skipped; a recurrence without a due date is
    /// dropped rather than rejecting the row.
    pub fn import(&mut self, rows: Vec<ImportedTask>, today: NaiveDate) -> Result<usize> {
        let rows: Vec<ImportedTask> = rows
            .into_iter()
            .filter(|r| !r.task.name.trim().is_empty())
            .collect();
        if rows.is_empty() {
            return Err(Error::validation("Nothing to import."));
        }
        self.checkpoint();
        let count = rows.len();
        for row in rows {
            let new = row.task;
            let task = Task {
                id: self.take_id(),
                name: new.name.trim().to_string(),
                due: new.due,
                time: new.time,
                status: row.status,
                priority: new.priority,
                recurrence: new.recurrence.filter(|_| new.due.is_some()),
                tag: clean(new.tag),
                category: clean(new.category),
                archived: row.archived,
                completed_at: (row.status == Status::Completed).then_some(today),
            };
            self.tasks.push(task);
        }
        self.commit()?;
        info!(count, "tasks imported");
        Ok(count)
    }

    /// Sets the daily completion goal. Not part of the undo history.
    pub fn set_goal(&mut self, goal: u32) -> Result<()> {
        self.stats.daily_goal = goal;
        self.storage.save_stats(&self.stats)?;
        Ok(())
    }

    /// Restores the most recent snapshot. Returns `false` if there is none.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(snapshot) = self.undo.pop() else {
            warn!("Nothing to undo.");
            return Ok(false);
        };
        match self.restore(snapshot) {
            Ok(current) => {
                self.redo.push(current);
                Ok(true)
            }
            Err((snapshot, e)) => {
                self.undo.push(snapshot);
                Err(e)
            }
        }
    }

    /// Re-applies the most recently undone state. Returns `false` if there is none.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(snapshot) = self.redo.pop() else {
            warn!("Nothing to redo.");
            return Ok(false);
        };
        match self.restore(snapshot) {
            Ok(current) => {
                self.undo.push(current);
                Ok(true)
            }
            Err((snapshot, e)) => {
                self.redo.push(snapshot);
                Err(e)
            }
        }
    }

    pub fn streak(&self, today: NaiveDate) -> u32 {
        streak(&self.stats.completed_dates, today)
    }

    pub fn summary(&self, today: NaiveDate) -> Summary {
        let active: Vec<&Task> = self.tasks.iter().filter(|t| !t.archived).collect();
        let completed = active.iter().filter(|t| t.is_completed()).count();
        Summary {
            total: active.len(),
            pending: active.len() - completed,
            completed,
            overdue: active.iter().filter(|t| t.is_overdue(today)).count(),
            due_today: active
                .iter()
                .filter(|t| !t.is_completed() && t.due == Some(today))
                .count(),
            completed_today: active
                .iter()
                .filter(|t| t.is_completed() && t.completed_at == Some(today))
                .count(),
            goal: self.stats.daily_goal,
            streak: self.streak(today),
        }
    }

    /// The pending, non-archived task with the earliest due date.
    pub fn next_due(&self) -> Option<&Task> {
        self.tasks
            .iter()
            .filter(|t| !t.archived && !t.is_completed() && t.due.is_some())
            .min_by_key(|t| t.due)
    }

    fn index_of(&self, id: u64) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::NotFound(id))
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Records an undo point; any redo history is abandoned.
    /// Pushes the pre-mutation state. Paired with [`TaskStore::commit`].
    fn checkpoint(&mut self) {
        let snapshot = self.snapshot();
        self.undo.push(snapshot);
    }

    /// Writes the mutated collection. If the write fails, the state saved by
    /// the last `checkpoint` is put back and the history is left as it was.
    fn commit(&mut self) -> Result<()> {
        match self.persist() {
            Ok(()) => {
                self.redo.clear();
                Ok(())
            }
            Err(e) => {
                if let Some(previous) = self.undo.pop() {
                    self.tasks = previous.tasks;
                    self.next_id = previous.next_id;
                }
                warn!("save failed, change rolled back: {}", e);
                Err(e)
            }
        }
    }

    /// Swaps in `snapshot` and persists it, returning the replaced state.
    /// On a failed write the old state stays and `snapshot` is handed back.
    fn restore(&mut self, snapshot: Snapshot) -> std::result::Result<Snapshot, (Snapshot, Error)> {
        let current = self.snapshot();
        self.tasks = snapshot.tasks;
        self.next_id = snapshot.next_id;
        if let Err(e) = self.persist() {
            let target = Snapshot {
                tasks: std::mem::replace(&mut self.tasks, current.tasks),
                next_id: std::mem::replace(&mut self.next_id, current.next_id),
            };
            warn!("save failed, history step not applied: {}", e);
            return Err((target, e));
        }
        info!("state restored");
        Ok(current)
    }

    fn persist(&self) -> Result<()> {
        self.storage.save_tasks(&self.tasks)
    }

    fn record_completion(&mut self, day: NaiveDate) -> Result<()> {
        if self.stats.completed_dates.insert(day) {
            self.storage.save_stats(&self.stats)?;
        }
        Ok(())
    }
}

/// Counts consecutive days ending at `today` that appear in `dates`.
pub fn streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut count = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|d| dates.contains(d)) {
        count += 1;
        cursor = day.pred_opt();
    }
    count
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
