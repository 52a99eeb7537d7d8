//! Text command surface: tokenizes one input line into a [`Command`].

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};

use crate::error::{Error, Result};
use crate::models::{parse_ddmm, parse_hhmm, Change, Priority, Recurrence, Status};
use crate::pomodoro::DEFAULT_MINUTES;
use crate::store::{NewTask, TaskPatch};
use crate::theme::ThemeName;
use crate::view::SortKey;

pub const ADD_USAGE: &str = "Usage: add [task name] --time [dd.mm.yyyy] [hh:mm] --at [HH:MM] --tag [label] --category [label] --priority [low|med|high] --repeat [daily|weekly|monthly]";
pub const UPDATE_USAGE: &str = "Usage: update [task number] --name [new name] --time [dd.mm.yyyy] [hh:mm] --at [HH:MM] --tag [label] --category [label] --priority [low|med|high] --repeat [daily|weekly|monthly] --status [pending|completed]";

pub const HELP: &str = "Commands:
  add [task name] --time [dd.mm.yyyy] [hh:mm] --at [HH:MM] --tag [label] --category [label] --priority [low|med|high] --repeat [daily|weekly|monthly]
  remove [task number]
  complete [task number]
  list
  due [dd.mm]
  update [task number] --name [new name] --time [dd.mm.yyyy] [hh:mm] --at [HH:MM] --tag [label] --category [label] --priority [low|med|high] --repeat [daily|weekly|monthly] --status [pending|completed]
  filter [keyword]
  clear
  today | week | overdue
  hide  (toggle hide completed)
  refresh
  theme [cyber|toxic|ember]
  archive [view|restore]
  focus
  capture [task name]
  goal [number]
  reschedule overdue
  exportics [filename.ics]
  pomodoro start [task number] [minutes]
  pomodoro stop | status
  sort [name|due|priority|status] [asc|desc]
  sort --priority | --due-date | --completed
  undo | redo
  export [filename.csv]
  import [filename.csv]";

pub const SHORT_HELP: &str = "Short commands:
  a add | rm remove | c complete | ls list | u update | du due | fl filter | cl clear
  ref refresh | th theme | ar archive | fo focus | cap capture | rs reschedule | ics exportics | pomo pomodoro
Short flags:
  -d date | -a time | -g tag | -c category | -p priority | -r repeat";

/// One parsed command. Task numbers refer to rows of the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(AddArgs),
    Remove(usize),
    Complete(usize),
    List,
    Due(NaiveDate),
    Update { number: usize, patch: TaskPatch },
    Filter(String),
    Clear,
    Today,
    Week,
    Overdue,
    Hide,
    Refresh,
    Theme(ThemeName),
    Archive(ArchiveAction),
    Focus,
    Capture(String),
    Goal(u32),
    RescheduleOverdue,
    Export(Option<PathBuf>),
    Import(Option<PathBuf>),
    ExportIcs(Option<PathBuf>),
    Pomodoro(PomodoroAction),
    Sort { key: SortKey, descending: bool },
    Undo,
    Redo,
    Help,
    ShortHelp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    pub task: NewTask,
    /// Whether `--time` was given; otherwise the session's selected date applies.
    pub explicit_due: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveAction {
    Run,
    View,
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PomodoroAction {
    Start { number: usize, minutes: u32 },
    Stop,
    Status,
}

type Flags = HashMap<String, Option<String>>;

/// Parses a command line. Dates without a year take it from `base`.
pub fn parse(line: &str, base: NaiveDate) -> Result<Command> {
    let tokens = shlex::split(line).ok_or_else(|| Error::usage("Invalid command format."))?;
    let Some((head, rest)) = tokens.split_first() else {
        return Err(Error::usage("Type 'help' for commands."));
    };
    let args = expand_short_flags(rest);

    let cmd = match canonical(&head.to_lowercase()) {
        "add" => Command::Add(parse_add(&args, base)?),
        "remove" => Command::Remove(single_number(&args, "Usage: remove [task number]")?),
        "complete" => Command::Complete(single_number(&args, "Usage: complete [task number]")?),
        "list" => Command::List,
        "due" => {
            if args.len() != 1 {
                return Err(Error::usage("Usage: due [dd.mm]"));
            }
            let date = parse_ddmm(&args[0], base)
                .ok_or_else(|| Error::usage("Invalid date format. Use dd.mm"))?;
            Command::Due(date)
        }
        "update" => parse_update(&args, base)?,
        "filter" => {
            let keyword = args.join(" ").trim().to_string();
            if keyword.is_empty() {
                return Err(Error::usage("Usage: filter [keyword]"));
            }
            Command::Filter(keyword)
        }
        "clear" => Command::Clear,
        "today" => Command::Today,
        "week" => Command::Week,
        "overdue" => Command::Overdue,
        "hide" => Command::Hide,
        "refresh" => Command::Refresh,
        "theme" => match args.first() {
            Some(name) => Command::Theme(name.parse()?),
            None => return Err(Error::usage("Usage: theme [cyber|toxic|ember]")),
        },
        "archive" => match args.first().map(|a| a.to_lowercase()).as_deref() {
            None => Command::Archive(ArchiveAction::Run),
            Some("view") => Command::Archive(ArchiveAction::View),
            Some("restore") => Command::Archive(ArchiveAction::Restore),
            Some(_) => return Err(Error::usage("Usage: archive [view|restore]")),
        },
        "focus" => Command::Focus,
        "capture" => {
            let name = args.join(" ").trim().to_string();
            if name.is_empty() {
                return Err(Error::usage("Usage: capture [task name]"));
            }
            Command::Capture(name)
        }
        "goal" => {
            let goal = args
                .first()
                .and_then(|a| a.parse::<u32>().ok())
                .ok_or_else(|| Error::usage("Usage: goal [number]"))?;
            Command::Goal(goal)
        }
        "reschedule" => match args.first() {
            Some(a) if a.eq_ignore_ascii_case("overdue") => Command::RescheduleOverdue,
            _ => return Err(Error::usage("Usage: reschedule overdue")),
        },
        "export" => Command::Export(args.first().map(PathBuf::from)),
        "import" => Command::Import(args.first().map(PathBuf::from)),
        "exportics" => Command::ExportIcs(args.first().map(PathBuf::from)),
        "pomodoro" => Command::Pomodoro(parse_pomodoro(&args)?),
        "sort" => parse_sort(&args)?,
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "help" => Command::Help,
        "short" => Command::ShortHelp,
        _ => return Err(Error::usage("Unknown command. Type 'help' for options.")),
    };
    Ok(cmd)
}

fn canonical(cmd: &str) -> &str {
    match cmd {
        "a" => "add",
        "rm" => "remove",
        "c" => "complete",
        "ls" => "list",
        "u" => "update",
        "du" => "due",
        "fl" => "filter",
        "cl" => "clear",
        "ref" => "refresh",
        "th" => "theme",
        "ar" => "archive",
        "fo" => "focus",
        "cap" => "capture",
        "rs" => "reschedule",
        "ics" => "exportics",
        "pomo" => "pomodoro",
        "-h" | "--help" => "help",
        other => other,
    }
}

fn expand_short_flags(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|a| {
            match a.as_str() {
                "-d" => "--time",
                "-a" => "--at",
                "-g" => "--tag",
                "-p" => "--priority",
                "-r" => "--repeat",
                "-c" => "--category",
                other => other,
            }
            .to_string()
        })
        .collect()
}

/// Splits tokens into positional words and `--flag value` pairs.
///
/// Flags listed in `multi` swallow every word up to the next flag.
fn parse_flags(tokens: &[String], known: &[&str], multi: &[&str]) -> Result<(Vec<String>, Flags)> {
    let mut words = Vec::new();
    let mut flags = Flags::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;
        if !token.starts_with("--") {
            words.push(token.clone());
            continue;
        }
        if !known.contains(&token.as_str()) {
            return Err(Error::usage(format!("Unknown flag '{}'.", token)));
        }
        let mut values = Vec::new();
        while i < tokens.len() && !tokens[i].starts_with("--") {
            values.push(tokens[i].clone());
            i += 1;
            if !multi.contains(&token.as_str()) {
                break;
            }
        }
        let value = (!values.is_empty()).then(|| values.join(" "));
        flags.insert(token.clone(), value);
    }
    Ok((words, flags))
}

fn is_clear(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "none" | "clear")
}

/// `--time` value: `dd.mm[.yyyy] [HH:MM]`, or the clear sentinel.
fn parse_when(raw: Option<&str>, base: NaiveDate) -> Result<Change<(NaiveDate, Option<NaiveTime>)>> {
    let raw = raw.ok_or_else(|| Error::usage("Invalid date format. Use dd.mm.yyyy"))?;
    if is_clear(raw) {
        return Ok(Change::Clear);
    }
    let mut parts = raw.split_whitespace();
    let date = parts
        .next()
        .and_then(|p| parse_ddmm(p, base))
        .ok_or_else(|| Error::usage("Invalid date format. Use dd.mm.yyyy"))?;
    let time = match parts.next() {
        Some(p) => Some(parse_hhmm(p).ok_or_else(|| Error::usage("Invalid time format. Use HH:MM"))?),
        None => None,
    };
    if parts.next().is_some() {
        return Err(Error::usage("Invalid --time value. Use dd.mm[.yyyy] [HH:MM]"));
    }
    Ok(Change::Set((date, time)))
}

fn parse_clock(raw: Option<&str>) -> Result<Change<NaiveTime>> {
    let raw = raw.ok_or_else(|| Error::usage("Invalid time format. Use HH:MM"))?;
    if is_clear(raw) {
        return Ok(Change::Clear);
    }
    parse_hhmm(raw)
        .map(Change::Set)
        .ok_or_else(|| Error::usage("Invalid time format. Use HH:MM"))
}

fn parse_label(raw: Option<&str>) -> Change<String> {
    match raw {
        Some(v) if !is_clear(v) && !v.trim().is_empty() => Change::Set(v.trim().to_string()),
        _ => Change::Clear,
    }
}

const TASK_FLAGS: [&str; 6] = ["--time", "--at", "--tag", "--category", "--priority", "--repeat"];

fn parse_add(args: &[String], base: NaiveDate) -> Result<AddArgs> {
    if args.is_empty() {
        return Err(Error::usage(ADD_USAGE));
    }
    let (words, flags) = parse_flags(args, &TASK_FLAGS, &["--time"])?;
    let name = words.join(" ").trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Task name is required."));
    }

    let mut task = NewTask::new(name);
    let explicit_due = flags.contains_key("--time");
    if explicit_due {
        if let Change::Set((date, time)) = parse_when(flag(&flags, "--time"), base)? {
            task.due = Some(date);
            task.time = time;
        }
    }
    if flags.contains_key("--at") {
        task.time = parse_clock(flag(&flags, "--at"))?.into_option();
    }
    if flags.contains_key("--tag") {
        task.tag = parse_label(flag(&flags, "--tag")).into_option();
    }
    if flags.contains_key("--category") {
        task.category = parse_label(flag(&flags, "--category")).into_option();
    }
    if let Some(p) = flag(&flags, "--priority") {
        task.priority = p.parse()?;
    }
    if let Some(r) = flag(&flags, "--repeat") {
        if !is_clear(r) {
            task.recurrence = Some(r.parse()?);
        }
    }
    if task.recurrence.is_some() && explicit_due && task.due.is_none() {
        return Err(Error::validation("Repeat requires a due date. Use --time [dd.mm]."));
    }
    Ok(AddArgs { task, explicit_due })
}

fn parse_update(args: &[String], base: NaiveDate) -> Result<Command> {
    let number = args
        .first()
        .and_then(|a| parse_number(a))
        .ok_or_else(|| Error::usage(UPDATE_USAGE))?;

    let mut known = TASK_FLAGS.to_vec();
    known.extend(["--name", "--status"]);
    let (words, flags) = parse_flags(&args[1..], &known, &["--name", "--time"])?;
    if !words.is_empty() {
        return Err(Error::usage("Use flags: --name, --time, --at, --tag, --category, --priority, --repeat, --status"));
    }

    let mut patch = TaskPatch::default();
    if flags.contains_key("--name") {
        let name = flag(&flags, "--name").unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Task name is required."));
        }
        patch.name = Some(name);
    }
    if flags.contains_key("--time") {
        match parse_when(flag(&flags, "--time"), base)? {
            Change::Set((date, time)) => {
                patch.due = Some(Change::Set(date));
                if let Some(t) = time {
                    patch.time = Some(Change::Set(t));
                }
            }
            Change::Clear => patch.due = Some(Change::Clear),
        }
    }
    if flags.contains_key("--at") {
        patch.time = Some(parse_clock(flag(&flags, "--at"))?);
    }
    if flags.contains_key("--tag") {
        patch.tag = Some(parse_label(flag(&flags, "--tag")));
    }
    if flags.contains_key("--category") {
        patch.category = Some(parse_label(flag(&flags, "--category")));
    }
    if flags.contains_key("--priority") {
        patch.priority = Some(flag(&flags, "--priority").unwrap_or_default().parse::<Priority>()?);
    }
    if flags.contains_key("--repeat") {
        let raw = flag(&flags, "--repeat").unwrap_or("none");
        patch.recurrence = Some(if is_clear(raw) {
            Change::Clear
        } else {
            Change::Set(raw.parse::<Recurrence>()?)
        });
    }
    if flags.contains_key("--status") {
        patch.status = Some(flag(&flags, "--status").unwrap_or_default().parse::<Status>()?);
    }

    if patch.is_empty() {
        return Err(Error::usage(
            "Nothing to update. Provide --name, --time, --at, --tag, --category, --priority, --repeat or --status",
        ));
    }
    Ok(Command::Update { number, patch })
}

fn parse_pomodoro(args: &[String]) -> Result<PomodoroAction> {
    const USAGE: &str = "Usage: pomodoro start [task number] [minutes] | stop | status";
    let action = args.first().map(|a| a.to_lowercase()).ok_or_else(|| Error::usage(USAGE))?;
    match action.as_str() {
        "stop" => Ok(PomodoroAction::Stop),
        "status" => Ok(PomodoroAction::Status),
        "start" => {
            let number = args
                .get(1)
                .and_then(|a| parse_number(a))
                .ok_or_else(|| Error::usage("Pomodoro requires a task number."))?;
            let minutes = args
                .get(2)
                .and_then(|a| a.parse::<u32>().ok())
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_MINUTES);
            Ok(PomodoroAction::Start { number, minutes })
        }
        _ => Err(Error::usage(USAGE)),
    }
}

fn parse_sort(args: &[String]) -> Result<Command> {
    let raw = args
        .first()
        .map(|a| a.to_lowercase())
        .ok_or_else(|| Error::usage("Usage: sort [name|due|priority|status] [asc|desc]"))?;
    let key = match raw.as_str() {
        "name" => SortKey::Name,
        "due" | "--due-date" | "--duedate" => SortKey::Due,
        "priority" | "--priority" => SortKey::Priority,
        "status" | "--completed" | "--status" => SortKey::Status,
        _ => return Err(Error::usage("Sort key must be name, due, priority, or status.")),
    };
    let descending = match args.get(1).map(|a| a.to_lowercase()).as_deref() {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(_) => return Err(Error::usage("Sort order must be asc or desc.")),
    };
    Ok(Command::Sort { key, descending })
}

fn single_number(args: &[String], usage: &str) -> Result<usize> {
    match args {
        [one] => parse_number(one).ok_or_else(|| Error::usage(usage)),
        _ => Err(Error::usage(usage)),
    }
}

fn parse_number(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn flag<'a>(flags: &'a Flags, name: &str) -> Option<&'a str> {
    flags.get(name).and_then(|v| v.as_deref())
}
