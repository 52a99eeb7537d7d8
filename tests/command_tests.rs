use chrono::NaiveDate;
use neondo::models::{Priority, Status};
use neondo::session::{LogLevel, Notice, Session};
use neondo::storage::Storage;
use neondo::store::TaskStore;
use neondo::theme::ThemeName;
use neondo::view::ViewFilter;
use std::path::Path;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn with_session<F>(f: F)
where
    F: FnOnce(&Path, &mut Session),
{
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::open(Storage::new(dir.path()));
    let mut session = Session::new(store, ThemeName::Cyber).with_today(date(2025, 6, 15));
    f(dir.path(), &mut session);
}

fn last_level(session: &Session) -> LogLevel {
    session.log().last().unwrap().level
}

fn last_message(session: &Session) -> String {
    session.log().last().unwrap().message.clone()
}

#[test]
fn test_pay_rent_scenario() {
    with_session(|_, s| {
        s.execute(r#"add "Pay rent" --time 01.05.2025 --repeat monthly"#);
        assert_eq!(last_level(s), LogLevel::Success);
        s.execute("complete 1");
        assert_eq!(last_level(s), LogLevel::Info);

        let tasks = s.store.tasks();
        assert_eq!(tasks.len(), 2);
        let done = tasks.iter().find(|t| t.is_completed()).unwrap();
        let next = tasks.iter().find(|t| !t.is_completed()).unwrap();
        assert_eq!(done.due, Some(date(2025, 5, 1)));
        assert_eq!(done.completed_at, Some(date(2025, 6, 15)));
        assert_eq!(next.due, Some(date(2025, 6, 1)));
        assert_eq!(next.name, "Pay rent");
        assert_ne!(done.id, next.id);
    });
}

#[test]
fn test_monthly_on_31st_through_commands() {
    with_session(|_, s| {
        s.execute("add Invoice -d 31.01.2025 -r monthly");
        s.execute("complete 1");
        let next = s.store.tasks().iter().find(|t| !t.is_completed()).unwrap();
        assert_eq!(next.due, Some(date(2025, 2, 28)));
    });
}

#[test]
fn test_numbers_refer_to_current_view() {
    with_session(|_, s| {
        s.execute("add Later -d 20.06.2025");
        s.execute("add Now -d 15.06.2025");
        s.execute("today");
        // only "Now" is visible, as number 1
        s.execute("complete 2");
        assert_eq!(last_level(s), LogLevel::Error);
        assert!(last_message(s).contains("not found in current view"));

        s.execute("complete 1");
        let now = s.store.tasks().iter().find(|t| t.name == "Now").unwrap();
        assert_eq!(now.status, Status::Completed);
        let later = s.store.tasks().iter().find(|t| t.name == "Later").unwrap();
        assert_eq!(later.status, Status::Pending);
    });
}

#[test]
fn test_rejections_are_logged_not_raised() {
    with_session(|_, s| {
        for line in [
            "add",
            "add x --priority urgent",
            "add x --repeat daily",
            "add x --time 99.99",
            "remove abc",
            "update 1 --name y",
            "frobnicate",
            "undo",
            "redo",
            "archive",
            "reschedule overdue",
            "import missing.csv",
        ] {
            s.execute(line);
            assert_eq!(last_level(s), LogLevel::Error, "line {:?}", line);
        }
        assert!(s.store.tasks().is_empty());
    });
}

#[test]
fn test_update_command_is_atomic() {
    with_session(|_, s| {
        s.execute("add Report -d 16.06 --priority high");
        s.execute("update 1 --name Final report --repeat weekly --tag work");
        let t = &s.store.tasks()[0];
        assert_eq!(t.name, "Final report");
        assert_eq!(t.tag.as_deref(), Some("work"));
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.due, Some(date(2025, 6, 16)));

        s.execute("update 1 --time none --name Other");
        assert_eq!(last_level(s), LogLevel::Error);
        let t = &s.store.tasks()[0];
        assert_eq!(t.name, "Final report");
        assert_eq!(t.due, Some(date(2025, 6, 16)));
    });
}

#[test]
fn test_undo_redo_commands() {
    with_session(|_, s| {
        s.execute("add a");
        s.execute("add b");
        s.execute("undo");
        assert_eq!(s.store.tasks().len(), 1);
        s.execute("redo");
        assert_eq!(s.store.tasks().len(), 2);
        s.execute("undo");
        s.execute("add c");
        s.execute("redo");
        assert_eq!(last_message(s), "Nothing to redo.");
        let names: Vec<_> = s.store.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    });
}

#[test]
fn test_due_view_sets_default_date_for_add() {
    with_session(|_, s| {
        s.execute("due 20.06");
        assert_eq!(s.view.filter, ViewFilter::Due(date(2025, 6, 20)));
        s.execute("add Picked day");
        assert_eq!(s.store.tasks()[0].due, Some(date(2025, 6, 20)));
        assert_eq!(s.visible().len(), 1);
    });
}

#[test]
fn test_archive_commands() {
    with_session(|_, s| {
        s.execute("add done");
        s.execute("add open");
        s.execute("complete 1");
        s.execute("archive");
        assert_eq!(s.visible().len(), 1);
        s.execute("archive view");
        assert_eq!(s.visible().len(), 1);
        assert_eq!(s.visible()[0].name, "done");
        s.execute("archive restore");
        s.execute("list");
        assert_eq!(s.visible().len(), 2);
    });
}

#[test]
fn test_capture_goal_and_status_line() {
    with_session(|dir, s| {
        s.execute("capture Buy milk");
        s.execute("goal 2");
        s.execute("complete 1");
        let line = s.status_line();
        assert!(line.contains("STREAK 1"), "{}", line);
        assert!(line.contains("GOAL 1/2"), "{}", line);

        let stats = std::fs::read_to_string(dir.join("stats.json")).unwrap();
        assert!(stats.contains("2025-06-15"));
        assert!(stats.contains("\"daily_goal\": 2"));
    });
}

#[test]
fn test_csv_export_import() {
    with_session(|dir, s| {
        let csv = dir.join("out.csv");
        s.execute("add \"Water plants\" -d 18.06.2025 09:00 -g home -c chores -p low -r weekly");
        s.execute("add Someday");
        s.execute(&format!("export {}", csv.display()));
        assert_eq!(last_level(s), LogLevel::Success);

        let text = std::fs::read_to_string(&csv).unwrap();
        assert!(text.starts_with("name,due,time,status,priority,recurrence,tag,category,archived"));
        assert!(text.contains("Water plants,2025-06-18,09:00,pending,low,weekly,home,chores,0"));

        s.execute("clear");
        s.execute(&format!("import {}", csv.display()));
        assert_eq!(last_level(s), LogLevel::Success);
        let tasks = s.store.tasks();
        assert_eq!(tasks.len(), 2);
        let plants = tasks.iter().find(|t| t.name == "Water plants").unwrap();
        assert_eq!(plants.due, Some(date(2025, 6, 18)));
        assert_eq!(plants.priority, Priority::Low);
        assert_eq!(plants.category.as_deref(), Some("chores"));
        assert!(plants.id > 2);
    });
}

#[test]
fn test_import_is_lenient() {
    with_session(|dir, s| {
        let csv = dir.join("in.csv");
        std::fs::write(
            &csv,
            "name,due,status,priority,recurrence\n\
             Dentist,03.07.2025,weird,urgent,yearly\n\
             ,2025-01-01,pending,low,\n\
             Gym,2025-06-20,completed,high,daily\n",
        )
        .unwrap();
        s.execute(&format!("import {}", csv.display()));
        let tasks = s.store.tasks();
        assert_eq!(tasks.len(), 2);
        let dentist = &tasks[0];
        assert_eq!(dentist.due, Some(date(2025, 7, 3)));
        assert_eq!(dentist.status, Status::Pending);
        assert_eq!(dentist.priority, Priority::Med);
        assert_eq!(dentist.recurrence, None);
        let gym = &tasks[1];
        assert!(gym.is_completed());
        assert!(gym.completed_at.is_some());
    });
}

#[test]
fn test_ics_export() {
    with_session(|dir, s| {
        let ics = dir.join("cal.ics");
        s.execute("add Meeting -d 17.06.2025 14:30");
        s.execute("add Holiday -d 01.08.2025");
        s.execute("add Undated");
        s.execute(&format!("exportics {}", ics.display()));
        let text = std::fs::read_to_string(&ics).unwrap();
        assert!(text.starts_with("BEGIN:VCALENDAR\nVERSION:2.0"));
        assert!(text.contains("DTSTART:20250617T143000"));
        assert!(text.contains("DTSTART;VALUE=DATE:20250801"));
        assert!(!text.contains("Undated"));
        assert_eq!(text.matches("BEGIN:VEVENT").count(), 2);
        assert!(text.ends_with("END:VCALENDAR"));
    });
}

#[test]
fn test_view_toggles() {
    with_session(|_, s| {
        s.execute("add a -d 10.06.2025");
        s.execute("add b");
        s.execute("complete 2");
        s.execute("hide");
        assert_eq!(s.visible().len(), 1);
        s.execute("overdue");
        assert_eq!(s.visible()[0].name, "a");
        s.execute("reschedule overdue");
        assert_eq!(s.store.tasks()[0].due, Some(date(2025, 6, 15)));

        s.execute("focus");
        assert!(s.focus);
        assert_eq!(s.view.filter, ViewFilter::Today);
        s.execute("theme ember");
        assert_eq!(s.theme.name, ThemeName::Ember);
        s.execute("filter A");
        assert_eq!(s.view.title(), "Filter: A");
    });
}

#[test]
fn test_pomodoro_and_reminders() {
    with_session(|_, s| {
        s.execute("add Essay -d 15.06.2025");
        s.execute("pomodoro start 1 1");
        s.execute("pomodoro status");
        assert_eq!(last_message(s), "Pomodoro running: 01:00");

        let notices = s.tick(60);
        assert!(notices.contains(&Notice::PomodoroDone("Essay".into())));
        assert!(notices.contains(&Notice::DueToday("Essay".into())));
        // reminder fires only once per task and date
        assert!(s.tick(1).is_empty());

        s.execute("pomodoro status");
        assert_eq!(last_message(s), "Pomodoro idle.");
        assert!(s.next_due_label().contains("today"));
    });
}

#[test]
fn test_reopening_keeps_tasks() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = TaskStore::open(Storage::new(dir.path()));
        let mut s = Session::new(store, ThemeName::Toxic);
        s.execute("add Persist me -p high");
    }
    let store = TaskStore::open(Storage::new(dir.path()));
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].priority, Priority::High);
    assert_eq!(store.next_id(), 2);
}
