//! Event-loop state: one actor executing commands against the store.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::commands::{self, ArchiveAction, Command, PomodoroAction, HELP, SHORT_HELP};
use crate::error::{Error, Result};
use crate::export::{self, CSV_DEFAULT, ICS_DEFAULT};
use crate::models::{format_ddmm, Task};
use crate::pomodoro::Pomodoro;
use crate::store::{Summary, TaskStore};
use crate::theme::{Theme, ThemeName};
use crate::view::{self, Row, ViewFilter, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Echo of the entered command.
    Cmd,
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// Something a tick wants the front end to surface prominently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PomodoroDone(String),
    DueToday(String),
}

pub struct Session {
    pub store: TaskStore,
    pub view: ViewState,
    pub theme: Theme,
    pub focus: bool,
    /// Date picked with `due`; new tasks without `--time` default to it.
    pub selected_date: Option<NaiveDate>,
    pub pomodoro: Pomodoro,
    log: Vec<LogLine>,
    notified: HashSet<(u64, NaiveDate)>,
    today: Option<NaiveDate>,
}

impl Session {
    pub fn new(store: TaskStore, theme: ThemeName) -> Session {
        Session {
            store,
            view: ViewState::default(),
            theme: Theme::new(theme),
            focus: false,
            selected_date: None,
            pomodoro: Pomodoro::default(),
            log: Vec::new(),
            notified: HashSet::new(),
            today: None,
        }
    }

    /// Pins "today" to a fixed date instead of the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Session {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn log(&self) -> &[LogLine] {
        &self.log
    }

    /// Removes and returns the log lines produced so far.
    pub fn drain_log(&mut self) -> Vec<LogLine> {
        std::mem::take(&mut self.log)
    }

    pub fn rows(&self) -> Vec<Row<'_>> {
        view::rows(self.store.tasks(), &self.view, self.today())
    }

    pub fn visible(&self) -> Vec<&Task> {
        view::visible(self.store.tasks(), &self.view, self.today())
    }

    pub fn summary(&self) -> Summary {
        self.store.summary(self.today())
    }

    /// Runs one input line. Every outcome is reported in the log.
    pub fn execute(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.push(LogLevel::Cmd, format!("> {}", line));
        let base = self.selected_date.unwrap_or_else(|| self.today());
        let result = commands::parse(line, base).and_then(|cmd| self.dispatch(cmd));
        if let Err(e) = result {
            warn!("command rejected: {}", e);
            self.push(LogLevel::Error, e.to_string());
        }
    }

    fn dispatch(&mut self, cmd: Command) -> Result<()> {
        let today = self.today();
        match cmd {
            Command::Add(mut args) => {
                if !args.explicit_due {
                    args.task.due = self.selected_date;
                }
                let task = self.store.add(args.task)?;
                self.success(format!("Task added: {}.", task.name));
            }
            Command::Remove(n) => {
                let id = self.resolve(n)?;
                let task = self.store.remove(id)?;
                self.success(format!("Task removed: {}.", task.name));
            }
            Command::Complete(n) => {
                let id = self.resolve(n)?;
                let done = self.store.complete(id, today)?;
                self.success(format!("Task completed: {}.", done.task.name));
                if let Some(next) = done.spawned.and_then(|t| t.due) {
                    self.info(format!("Next occurrence due {}.", format_ddmm(next)));
                }
            }
            Command::List => {
                self.view.filter = ViewFilter::All;
                self.view.keyword = None;
                self.info("Listing all tasks.");
            }
            Command::Due(date) => {
                self.view.filter = ViewFilter::Due(date);
                self.selected_date = Some(date);
                self.info(format!("Showing tasks due {}.", format_ddmm(date)));
            }
            Command::Update { number, patch } => {
                let id = self.resolve(number)?;
                self.store.update(id, patch, today)?;
                self.success("Task updated.");
            }
            Command::Filter(keyword) => {
                self.info(format!("Filtering tasks by '{}'.", keyword));
                self.view.keyword = Some(keyword);
            }
            Command::Clear => {
                self.store.clear()?;
                self.view.filter = ViewFilter::All;
                self.view.keyword = None;
                self.success("All tasks cleared.");
            }
            Command::Today => {
                self.view.filter = ViewFilter::Today;
                self.info("Showing tasks due today.");
            }
            Command::Week => {
                self.view.filter = ViewFilter::Week;
                self.info("Showing tasks due this week.");
            }
            Command::Overdue => {
                self.view.filter = ViewFilter::Overdue;
                self.info("Showing overdue tasks.");
            }
            Command::Hide => {
                self.view.hide_completed = !self.view.hide_completed;
                let state = if self.view.hide_completed { "ON" } else { "OFF" };
                self.info(format!("Hide completed: {}", state));
            }
            Command::Refresh => self.info("View refreshed."),
            Command::Theme(name) => {
                self.theme = Theme::new(name);
                self.success(format!("Theme set to {}.", name));
            }
            Command::Archive(ArchiveAction::View) => {
                self.view.filter = ViewFilter::Archive;
                self.info("Showing archived tasks.");
            }
            Command::Archive(ArchiveAction::Restore) => {
                let n = self.store.archive_restore()?;
                self.success(format!("Restored {} archived tasks.", n));
            }
            Command::Archive(ArchiveAction::Run) => {
                let n = self.store.archive()?;
                self.success(format!("Archived {} completed tasks.", n));
            }
            Command::Focus => {
                self.focus = !self.focus;
                if self.focus {
                    self.view.filter = ViewFilter::Today;
                    self.info("Focus mode ON (today view).");
                } else {
                    self.info("Focus mode OFF.");
                }
            }
            Command::Capture(name) => {
                self.store.capture(&name, today)?;
                self.success("Captured to inbox (today).");
            }
            Command::Goal(goal) => {
                self.store.set_goal(goal)?;
                self.success(format!("Daily goal set to {}.", goal));
            }
            Command::RescheduleOverdue => {
                let n = self.store.reschedule_overdue(today)?;
                self.success(format!("Rescheduled {} overdue tasks to today.", n));
            }
            Command::Export(path) => {
                let path = path.unwrap_or_else(|| PathBuf::from(CSV_DEFAULT));
                let n = export::export_csv(self.store.tasks(), &path)?;
                self.success(format!("Exported {} tasks to {}.", n, path.display()));
            }
            Command::Import(path) => {
                let path = path.unwrap_or_else(|| PathBuf::from(CSV_DEFAULT));
                let rows = export::import_csv(&path, today)?;
                let n = self.store.import(rows, today)?;
                self.success(format!("Imported {} tasks.", n));
            }
            Command::ExportIcs(path) => {
                let path = path.unwrap_or_else(|| PathBuf::from(ICS_DEFAULT));
                export::export_ics(self.store.tasks(), &path)?;
                self.success(format!("Exported ICS to {}.", path.display()));
            }
            Command::Pomodoro(action) => self.pomodoro_command(action)?,
            Command::Sort { key, descending } => {
                self.view.sort = key;
                self.view.descending = descending;
                let order = if descending { "desc" } else { "asc" };
                self.info(format!("Sorting by {} ({}).", key.as_str(), order));
            }
            Command::Undo => {
                if self.store.undo()? {
                    self.success("State restored.");
                } else {
                    self.push(LogLevel::Error, "Nothing to undo.".to_string());
                }
            }
            Command::Redo => {
                if self.store.redo()? {
                    self.success("State restored.");
                } else {
                    self.push(LogLevel::Error, "Nothing to redo.".to_string());
                }
            }
            Command::Help => {
                self.info(HELP);
                self.info(SHORT_HELP);
            }
            Command::ShortHelp => self.info(SHORT_HELP),
        }
        Ok(())
    }

    fn pomodoro_command(&mut self, action: PomodoroAction) -> Result<()> {
        match action {
            PomodoroAction::Stop => {
                self.pomodoro.stop();
                self.info("Pomodoro stopped.");
            }
            PomodoroAction::Status => match self.pomodoro.remaining() {
                Some((m, s)) => self.info(format!("Pomodoro running: {:02}:{:02}", m, s)),
                None => self.info("Pomodoro idle."),
            },
            PomodoroAction::Start { number, minutes } => {
                let id = self.resolve(number)?;
                let name = self
                    .store
                    .get(id)
                    .map(|t| t.name.clone())
                    .ok_or(Error::NotFound(id))?;
                self.pomodoro.start(id, name.as_str(), minutes);
                self.info(format!("Pomodoro started: {} ({} min).", name, minutes));
            }
        }
        Ok(())
    }

    /// Maps a 1-based row number of the current view to a task id.
    fn resolve(&self, number: usize) -> Result<u64> {
        number
            .checked_sub(1)
            .and_then(|i| self.visible().get(i).map(|t| t.id))
            .ok_or(Error::NotInView(number))
    }

    /// Advances timers by `secs` and runs the reminder check.
    pub fn tick(&mut self, secs: u64) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Some(name) = self.pomodoro.tick(secs) {
            self.success(format!("Pomodoro complete for: {}", name));
            notices.push(Notice::PomodoroDone(name));
        }
        notices.extend(self.check_reminders());
        notices
    }

    /// Reports the earliest due pending task once per (task, due date).
    pub fn check_reminders(&mut self) -> Option<Notice> {
        let today = self.today();
        let (id, name, due) = self
            .store
            .next_due()
            .and_then(|t| t.due.map(|d| (t.id, t.name.clone(), d)))?;
        if due > today || !self.notified.insert((id, due)) {
            return None;
        }
        if due < today {
            self.push(LogLevel::Error, format!("Overdue: {} ({})", name, format_ddmm(due)));
            None
        } else {
            self.info(format!("Due today: {}", name));
            Some(Notice::DueToday(name))
        }
    }

    /// Countdown text for the next due task.
    pub fn next_due_label(&self) -> String {
        let today = self.today();
        match self.store.next_due().and_then(|t| t.due.map(|d| (t, d))) {
            None => "Next due: --".to_string(),
            Some((t, due)) => {
                let days = (due - today).num_days();
                if days < 0 {
                    format!("Next due: overdue by {}d ({})", -days, t.name)
                } else if days == 0 {
                    format!("Next due: today ({})", t.name)
                } else {
                    format!("Next due: in {}d ({})", days, t.name)
                }
            }
        }
    }

    /// One-line counters, streak and goal progress.
    pub fn status_line(&self) -> String {
        let s = self.summary();
        format!(
            "total {} | pending {} | done {} | overdue {} | today {} | STREAK {} | GOAL {}/{}",
            s.total, s.pending, s.completed, s.overdue, s.due_today, s.streak, s.completed_today, s.goal
        )
    }

    fn push(&mut self, level: LogLevel, message: String) {
        self.log.push(LogLine { level, message });
    }

    fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    fn success(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.push(LogLevel::Success, message);
    }
}
