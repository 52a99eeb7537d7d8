use chrono::{Duration, NaiveDate};
use neondo::error::Error;
use neondo::models::{Change, Priority, Recurrence, Status};
use neondo::storage::Storage;
use neondo::store::{streak, NewTask, TaskPatch, TaskStore};
use std::collections::BTreeSet;
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2025, 6, 15)
}

fn open_store() -> (TempDir, TaskStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::open(Storage::new(dir.path()));
    (dir, store)
}

fn dated(name: &str, due: NaiveDate) -> NewTask {
    NewTask {
        due: Some(due),
        ..NewTask::new(name)
    }
}

#[test]
fn test_ids_strictly_increase() {
    let (_dir, mut store) = open_store();
    let a = store.add(NewTask::new("one")).unwrap();
    let b = store.add(NewTask::new("two")).unwrap();
    store.remove(b.id).unwrap();
    let c = store.add(NewTask::new("three")).unwrap();
    assert!(b.id > a.id);
    assert!(c.id > b.id);
}

#[test]
fn test_add_validates_without_mutation() {
    let (_dir, mut store) = open_store();
    assert!(matches!(store.add(NewTask::new("   ")), Err(Error::Validation(_))));
    for rule in [Recurrence::Daily, Recurrence::Weekly, Recurrence::Monthly] {
        let new = NewTask {
            recurrence: Some(rule),
            ..NewTask::new("repeat me")
        };
        assert!(matches!(store.add(new), Err(Error::Validation(_))));
    }
    assert!(store.tasks().is_empty());
    assert_eq!(store.next_id(), 1);
    assert!(!store.can_undo());
}

#[test]
fn test_update_rejects_recurrence_without_due() {
    let (_dir, mut store) = open_store();
    let plain = store.add(NewTask::new("plain")).unwrap();
    for rule in [Recurrence::Daily, Recurrence::Weekly, Recurrence::Monthly] {
        let patch = TaskPatch {
            recurrence: Some(Change::Set(rule)),
            ..Default::default()
        };
        assert!(matches!(store.update(plain.id, patch, today()), Err(Error::Validation(_))));
    }

    let rec = store
        .add(NewTask {
            recurrence: Some(Recurrence::Weekly),
            ..dated("weekly", today())
        })
        .unwrap();
    let clear_due = TaskPatch {
        due: Some(Change::Clear),
        name: Some("renamed".into()),
        ..Default::default()
    };
    assert!(store.update(rec.id, clear_due, today()).is_err());
    // atomic: the name was not written either
    assert_eq!(store.get(rec.id).unwrap().name, "weekly");
    assert_eq!(store.get(rec.id).unwrap().due, Some(today()));
}

#[test]
fn test_update_applies_only_supplied_fields() {
    let (_dir, mut store) = open_store();
    let t = store
        .add(NewTask {
            tag: Some("work".into()),
            category: Some("office".into()),
            priority: Priority::High,
            ..dated("report", today())
        })
        .unwrap();

    let patch = TaskPatch {
        tag: Some(Change::Clear),
        priority: Some(Priority::Low),
        ..Default::default()
    };
    let updated = store.update(t.id, patch, today()).unwrap();
    assert_eq!(updated.tag, None);
    assert_eq!(updated.priority, Priority::Low);
    assert_eq!(updated.category.as_deref(), Some("office"));
    assert_eq!(updated.due, Some(today()));
    assert!(matches!(store.update(999, TaskPatch::default(), today()), Err(Error::NotFound(999))));
}

#[test]
fn test_update_status_keeps_completed_at_consistent() {
    let (_dir, mut store) = open_store();
    let t = store.add(NewTask::new("toggle")).unwrap();
    let done = store
        .update(t.id, TaskPatch { status: Some(Status::Completed), ..Default::default() }, today())
        .unwrap();
    assert_eq!(done.completed_at, Some(today()));
    assert!(store.stats().completed_dates.contains(&today()));

    let back = store
        .update(t.id, TaskPatch { status: Some(Status::Pending), ..Default::default() }, today())
        .unwrap();
    assert_eq!(back.completed_at, None);
}

#[test]
fn test_complete_daily_spawns_next_instance() {
    let (_dir, mut store) = open_store();
    let d = date(2025, 6, 10);
    let t = store
        .add(NewTask {
            priority: Priority::High,
            tag: Some("health".into()),
            recurrence: Some(Recurrence::Daily),
            ..dated("Stretch", d)
        })
        .unwrap();

    let done = store.complete(t.id, today()).unwrap();
    assert_eq!(done.task.status, Status::Completed);
    assert_eq!(done.task.completed_at, Some(today()));

    let next = done.spawned.unwrap();
    assert_eq!(next.due, Some(d + Duration::days(1)));
    assert_eq!(next.name, "Stretch");
    assert_eq!(next.priority, Priority::High);
    assert_eq!(next.tag.as_deref(), Some("health"));
    assert_eq!(next.status, Status::Pending);
    assert_eq!(next.completed_at, None);
    assert!(next.id > t.id);

    let pending: Vec<_> = store.tasks().iter().filter(|t| !t.is_completed()).collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(store.tasks().len(), 2);
}

#[test]
fn test_complete_monthly_caps_day_31() {
    let (_dir, mut store) = open_store();
    let t = store
        .add(NewTask {
            recurrence: Some(Recurrence::Monthly),
            ..dated("Invoice", date(2025, 1, 31))
        })
        .unwrap();
    let next = store.complete(t.id, today()).unwrap().spawned.unwrap();
    assert_eq!(next.due, Some(date(2025, 2, 28)));
}

#[test]
fn test_complete_twice_is_rejected() {
    let (_dir, mut store) = open_store();
    let t = store.add(NewTask::new("once")).unwrap();
    store.complete(t.id, today()).unwrap();
    assert!(matches!(store.complete(t.id, today()), Err(Error::Validation(_))));
}

#[test]
fn test_undo_redo_linear_history() {
    let (_dir, mut store) = open_store();
    let before = store.snapshot();
    let a = store.add(NewTask::new("a")).unwrap();
    store.add(NewTask::new("b")).unwrap();
    store.complete(a.id, today()).unwrap();
    let after = store.snapshot();

    for _ in 0..3 {
        assert!(store.undo().unwrap());
    }
    assert_eq!(store.snapshot(), before);
    assert!(!store.undo().unwrap());

    for _ in 0..3 {
        assert!(store.redo().unwrap());
    }
    assert_eq!(store.snapshot(), after);
    assert!(!store.redo().unwrap());

    store.undo().unwrap();
    store.add(NewTask::new("c")).unwrap();
    assert!(!store.can_redo());
    assert!(!store.redo().unwrap());
}

#[test]
fn test_undo_persists_restored_state() {
    let (dir, mut store) = open_store();
    store.add(NewTask::new("keep")).unwrap();
    store.add(NewTask::new("drop")).unwrap();
    store.undo().unwrap();

    let reopened = TaskStore::open(Storage::new(dir.path()));
    assert_eq!(reopened.tasks().len(), 1);
    assert_eq!(reopened.tasks()[0].name, "keep");
    assert_eq!(reopened.next_id(), 2);
}

#[test]
fn test_archive_only_completed() {
    let (_dir, mut store) = open_store();
    let done = store.add(NewTask::new("done")).unwrap();
    let open = store.add(NewTask::new("open")).unwrap();
    assert!(matches!(store.archive(), Err(Error::Validation(_))));

    store.complete(done.id, today()).unwrap();
    assert_eq!(store.archive().unwrap(), 1);
    assert!(store.get(done.id).unwrap().archived);
    assert!(!store.get(open.id).unwrap().archived);
    assert!(matches!(store.archive(), Err(Error::Validation(_))));

    assert_eq!(store.archive_restore().unwrap(), 1);
    assert!(!store.get(done.id).unwrap().archived);
    assert!(matches!(store.archive_restore(), Err(Error::Validation(_))));
}

#[test]
fn test_reschedule_overdue() {
    let (_dir, mut store) = open_store();
    let late = store.add(dated("late", today() - Duration::days(3))).unwrap();
    let future = store.add(dated("future", today() + Duration::days(3))).unwrap();
    let finished = store.add(dated("finished", today() - Duration::days(1))).unwrap();
    store.complete(finished.id, today()).unwrap();

    assert_eq!(store.reschedule_overdue(today()).unwrap(), 1);
    assert_eq!(store.get(late.id).unwrap().due, Some(today()));
    assert_eq!(store.get(future.id).unwrap().due, Some(today() + Duration::days(3)));
    assert_eq!(store.get(finished.id).unwrap().due, Some(today() - Duration::days(1)));
    assert!(store.reschedule_overdue(today()).is_err());
}

#[test]
fn test_persistence_round_trip() {
    let (dir, mut store) = open_store();
    store
        .add(NewTask {
            tag: Some("x".into()),
            category: Some("home".into()),
            recurrence: Some(Recurrence::Weekly),
            time: chrono::NaiveTime::from_hms_opt(7, 45, 0),
            ..dated("first", today())
        })
        .unwrap();
    let second = store.add(NewTask::new("second")).unwrap();
    store.complete(second.id, today()).unwrap();

    let reopened = TaskStore::open(Storage::new(dir.path()));
    assert_eq!(reopened.tasks(), store.tasks());
    assert_eq!(reopened.next_id(), store.next_id());
    assert!(reopened.stats().completed_dates.contains(&today()));

    // mirrored copy exists
    assert!(dir.path().join("autosync").join("tasks.json").exists());
    assert!(dir.path().join("autosync").join("stats.json").exists());
}

#[test]
fn test_corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tasks.json"), "{ not json").unwrap();
    std::fs::write(dir.path().join("stats.json"), "oops").unwrap();
    let store = TaskStore::open(Storage::new(dir.path()));
    assert!(store.tasks().is_empty());
    assert_eq!(store.next_id(), 1);
    assert_eq!(store.stats().daily_goal, 3);
}

#[test]
fn test_streak_counts_contiguous_days() {
    let t = today();
    let contiguous: BTreeSet<_> = [t, t - Duration::days(1), t - Duration::days(2)].into();
    assert_eq!(streak(&contiguous, t), 3);
    let gap: BTreeSet<_> = [t, t - Duration::days(2)].into();
    assert_eq!(streak(&gap, t), 1);
    let none: BTreeSet<NaiveDate> = [t - Duration::days(1)].into();
    assert_eq!(streak(&none, t), 0);
}

#[test]
fn test_streak_from_completions() {
    let (_dir, mut store) = open_store();
    for offset in 0..3 {
        let t = store.add(NewTask::new(format!("day {}", offset))).unwrap();
        store.complete(t.id, today() - Duration::days(offset)).unwrap();
    }
    assert_eq!(store.streak(today()), 3);
    let summary = store.summary(today());
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.completed_today, 1);
    assert_eq!(summary.streak, 3);
}

#[test]
fn test_goal_and_capture() {
    let (dir, mut store) = open_store();
    store.set_goal(5).unwrap();
    let t = store.capture("idea", today()).unwrap();
    assert_eq!(t.due, Some(today()));
    assert_eq!(t.tag.as_deref(), Some("inbox"));
    assert_eq!(t.priority, Priority::Med);

    let reopened = TaskStore::open(Storage::new(dir.path()));
    assert_eq!(reopened.stats().daily_goal, 5);
}

#[test]
fn test_bad_record_does_not_drop_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tasks.json"),
        r#"[
            {"id": 1, "name": "good", "priority": "med", "due": "2025-06-20"},
            {"id": 2, "name": "bad", "priority": "urgent"},
            {"id": 0, "name": "no id"},
            {"id": 3, "name": "  ", "status": "completed", "completed_at": "2025-06-01"}
        ]"#,
    )
    .unwrap();

    let mut store = TaskStore::open(Storage::new(dir.path()));
    let names: Vec<_> = store.tasks().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["good", "Untitled task"]);
    assert_eq!(store.next_id(), 4);

    store.add(NewTask::new("new")).unwrap();
    let reopened = TaskStore::open(Storage::new(dir.path()));
    let names: Vec<_> = reopened.tasks().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["good", "Untitled task", "new"]);
    assert_eq!(reopened.get(1).unwrap().due, Some(date(2025, 6, 20)));
}

#[test]
fn test_failed_save_rolls_back() {
    let (dir, mut store) = open_store();
    let tasks_file = dir.path().join("tasks.json");
    std::fs::create_dir(&tasks_file).unwrap();

    assert!(matches!(store.add(NewTask::new("ghost")), Err(Error::Io(_))));
    assert!(store.tasks().is_empty());
    assert_eq!(store.next_id(), 1);
    assert!(!store.can_undo());

    std::fs::remove_dir(&tasks_file).unwrap();
    let kept = store.add(NewTask::new("kept")).unwrap();
    let before = store.snapshot();

    std::fs::remove_file(&tasks_file).unwrap();
    std::fs::create_dir(&tasks_file).unwrap();
    assert!(store.complete(kept.id, today()).is_err());
    assert!(store.remove(kept.id).is_err());
    assert_eq!(store.snapshot(), before);
    assert!(store.stats().completed_dates.is_empty());

    // a failed undo keeps both the state and the history step
    assert!(store.undo().is_err());
    assert_eq!(store.snapshot(), before);
    assert!(store.can_undo());
    assert!(!store.can_redo());

    std::fs::remove_dir(&tasks_file).unwrap();
    assert!(store.undo().unwrap());
    assert!(store.tasks().is_empty());
    assert!(store.redo().unwrap());
    assert_eq!(store.tasks().len(), 1);
}
