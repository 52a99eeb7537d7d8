//! Pure view layer: (tasks, view state) -> ordered display rows.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate};

use crate::models::{format_ddmm, format_hhmm, Task};

/// Predicate selecting which tasks are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    Today,
    /// Today through today + 6 days, inclusive.
    Week,
    Overdue,
    Due(NaiveDate),
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    #[default]
    Due,
    Priority,
    Status,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Due => "due",
            SortKey::Priority => "priority",
            SortKey::Status => "status",
        }
    }
}

/// Everything that decides what the task list shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: ViewFilter,
    /// Free-text filter, applied on top of `filter`.
    pub keyword: Option<String>,
    pub sort: SortKey,
    pub descending: bool,
    pub hide_completed: bool,
}

/// One line of the rendered task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row<'a> {
    CategoryHeader(String),
    /// `number` is the 1-based position commands refer to.
    Task { number: usize, task: &'a Task },
}

impl ViewState {
    pub fn title(&self) -> String {
        if let Some(kw) = &self.keyword {
            return format!("Filter: {}", kw);
        }
        match self.filter {
            ViewFilter::All => "All tasks".to_string(),
            ViewFilter::Today => "Tasks due today".to_string(),
            ViewFilter::Week => "Tasks due this week".to_string(),
            ViewFilter::Overdue => "Overdue tasks".to_string(),
            ViewFilter::Due(d) => format!("Tasks due {}", format_ddmm(d)),
            ViewFilter::Archive => "Archived tasks".to_string(),
        }
    }

    fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if self.filter == ViewFilter::Archive {
            return task.archived;
        }
        if task.archived {
            return false;
        }
        if self.hide_completed && task.is_completed() {
            return false;
        }
        match self.filter {
            ViewFilter::All | ViewFilter::Archive => true,
            ViewFilter::Today => task.due == Some(today),
            ViewFilter::Week => task
                .due
                .is_some_and(|d| d >= today && d <= today + Duration::days(6)),
            ViewFilter::Overdue => task.is_overdue(today),
            ViewFilter::Due(date) => task.due == Some(date),
        }
    }
}

/// Case-insensitive substring match over the searchable fields.
pub fn matches_keyword(task: &Task, keyword: &str) -> bool {
    let kw = keyword.to_lowercase();
    let contains = |s: &str| s.to_lowercase().contains(&kw);
    contains(&task.name)
        || task.due.is_some_and(|d| contains(&format_ddmm(d)))
        || contains(task.priority.as_str())
        || task.time.is_some_and(|t| contains(&format_hhmm(t)))
        || task.tag.as_deref().is_some_and(contains)
        || task.category.as_deref().is_some_and(contains)
}

/// Returns the visible tasks in display order.
pub fn visible<'a>(tasks: &'a [Task], state: &ViewState, today: NaiveDate) -> Vec<&'a Task> {
    let mut out: Vec<&Task> = tasks
        .iter()
        .filter(|t| state.matches(t, today))
        .filter(|t| state.keyword.as_deref().map_or(true, |kw| matches_keyword(t, kw)))
        .collect();
    sort_tasks(&mut out, state.sort, state.descending);
    out
}

/// Sorts in place. Sorting by due date keeps undated tasks last in either
/// direction; within a day, missing times sort after set ones.
pub fn sort_tasks(tasks: &mut [&Task], key: SortKey, descending: bool) {
    let directed = |o: Ordering| if descending { o.reverse() } else { o };
    match key {
        SortKey::Name => {
            tasks.sort_by(|a, b| directed(a.name.to_lowercase().cmp(&b.name.to_lowercase())))
        }
        SortKey::Priority => tasks.sort_by(|a, b| directed(a.priority.rank().cmp(&b.priority.rank()))),
        SortKey::Status => tasks.sort_by(|a, b| directed(a.is_completed().cmp(&b.is_completed()))),
        SortKey::Due => tasks.sort_by(|a, b| match (a.due, b.due) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(da), Some(db)) => directed(da.cmp(&db).then_with(|| time_order(a, b))),
        }),
    }
}

fn time_order(a: &Task, b: &Task) -> Ordering {
    match (a.time, b.time) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(ta), Some(tb)) => ta.cmp(&tb),
    }
}

/// Builds display rows, inserting a header whenever the category changes.
pub fn rows<'a>(tasks: &'a [Task], state: &ViewState, today: NaiveDate) -> Vec<Row<'a>> {
    let mut out = Vec::new();
    let mut current: Option<&str> = None;
    for (i, task) in visible(tasks, state, today).into_iter().enumerate() {
        let category = task.category.as_deref().unwrap_or("Uncategorized");
        if current != Some(category) {
            current = Some(category);
            out.push(Row::CategoryHeader(category.to_string()));
        }
        out.push(Row::Task { number: i + 1, task });
    }
    out
}
