use std::path::Path;

use chrono::{Duration, Local, NaiveDate, NaiveTime};
use echo_core::db::Database;
use echo_core::models::*;
use echo_core::store::{EchoStore, StoreError};
use speculate2::speculate;
use uuid::Uuid;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

/// Write a task row whose id is not a UUID, through a separate connection.
fn corrupt_tasks(path: &Path) {
    let conn = rusqlite::Connection::open(path).expect("Failed to open second connection");
    conn.execute(
        "INSERT INTO tasks (id, goal_id, title, description, is_completed, priority, created_at, updated_at)
         VALUES ('not-a-uuid', ?1, 'Broken', '', 0, 'MEDIUM', ?2, ?2)",
        (Uuid::new_v4().to_string(), chrono::Utc::now().to_rfc3339()),
    )
    .expect("Failed to insert undecodable row");
}

fn empty_store() -> EchoStore {
    let db = Database::open_memory().expect("Failed to create in-memory database");
    db.migrate().expect("Failed to run migrations");
    let store = EchoStore::new(db);
    store.reload_all().expect("Failed to load collections");
    store
}

speculate! {
    describe "initialize" {
        before {
            let db = Database::open_memory().expect("Failed to create in-memory database");
            db.migrate().expect("Failed to run migrations");
            let store = EchoStore::new(db);
        }

        it "seeds sample data into an empty database" {
            store.initialize_on(today()).unwrap();

            assert_eq!(store.current_goals().len(), 1);
            assert_eq!(store.current_tasks().len(), 3);
            assert_eq!(store.current_time_blocks().len(), 3);
            assert!(store.current_mood_entries().is_empty());
        }

        it "does not seed twice" {
            store.initialize_on(today()).unwrap();
            store.initialize_on(today()).unwrap();

            assert_eq!(store.current_goals().len(), 1);
            assert_eq!(store.database().count_goals().unwrap(), 1);
        }

        it "does not seed when a goal already exists" {
            store.database()
                .insert_goal(&Goal::new("Mine", "", today(), None))
                .unwrap();

            store.initialize().unwrap();

            let goals = store.current_goals();
            assert_eq!(goals.len(), 1);
            assert_eq!(goals[0].title, "Mine");
            assert!(store.current_tasks().is_empty());
        }
    }

    describe "observation" {
        before {
            let store = empty_store();
        }

        it "publishes a new snapshot after each write" {
            let mut rx = store.goals();
            rx.borrow_and_update();
            let before = rx.borrow().version;

            let goal = store.add_goal(Goal::new("Learn Rust", "", today(), None)).unwrap();

            assert!(rx.has_changed().unwrap());
            let snapshot = rx.borrow_and_update().clone();
            assert_eq!(snapshot.version, before + 1);
            assert_eq!(snapshot.items.len(), 1);
            assert_eq!(snapshot.items[0], goal);
            assert!(!snapshot.stale);
        }

        it "wakes an observer waiting for changes" {
            let mut rx = store.time_blocks();
            rx.borrow_and_update();

            store.add_time_block(TimeBlock::new(Uuid::new_v4(), today(), at(9, 0), at(9, 25))).unwrap();

            tokio_test::block_on(rx.changed()).expect("store dropped");
            assert_eq!(rx.borrow().items.len(), 1);
        }

        it "reflects completion changes" {
            let goal = store.add_goal(Goal::new("Learn Rust", "", today(), None)).unwrap();
            let task = store.add_task(Task::new(goal.id, "Read the book", "", TaskPriority::High)).unwrap();

            store.set_task_completed(task.id, true).unwrap();
            assert!(store.current_tasks()[0].is_completed);

            store.set_task_completed(task.id, false).unwrap();
            assert!(!store.current_tasks()[0].is_completed);
        }

        it "does not publish when a write fails" {
            let rx = store.tasks();
            let before = rx.borrow().version;

            let err = store.set_task_completed(Uuid::new_v4(), true).unwrap_err();

            assert!(err.is_not_found());
            assert!(matches!(err, StoreError::Db(_)));
            assert_eq!(rx.borrow().version, before);
        }

        it "adds a task and its time block together" {
            let goal = store.add_goal(Goal::new("Plan", "", today(), None)).unwrap();
            let task = Task::new(goal.id, "Outline", "", TaskPriority::Medium);
            let block = TimeBlock::new(task.id, today(), at(9, 0), at(10, 0));

            let (task, block) = store.add_task_with_time_block(task, block).unwrap();

            assert_eq!(*store.current_tasks(), vec![task]);
            assert_eq!(*store.current_time_blocks(), vec![block]);
        }

        it "keeps tasks after their goal is deleted" {
            let goal = store.add_goal(Goal::new("Plan", "", today(), None)).unwrap();
            store.add_task(Task::new(goal.id, "Outline", "", TaskPriority::Medium)).unwrap();

            assert!(store.delete_goal(goal.id).unwrap());
            assert!(!store.delete_goal(goal.id).unwrap());

            assert!(store.current_goals().is_empty());
            assert_eq!(store.current_tasks().len(), 1);
        }

        it "tracks mood entries and filters them by date" {
            let yesterday = today() - Duration::days(1);
            store.add_mood_entry(MoodEnergyEntry::new(MoodLevel::Good, EnergyLevel::High, "", today(), at(9, 0))).unwrap();
            store.add_mood_entry(MoodEnergyEntry::new(MoodLevel::Bad, EnergyLevel::Low, "", yesterday, at(9, 0))).unwrap();

            assert_eq!(store.current_mood_entries().len(), 2);
            let todays = store.mood_entries_on(today()).unwrap();
            assert_eq!(todays.len(), 1);
            assert_eq!(todays[0].mood, MoodLevel::Good);
        }
    }

    describe "reflections" {
        before {
            let store = empty_store();
        }

        it "keeps reflections in memory and filters by type" {
            let mut rx = store.reflections();
            rx.borrow_and_update();

            store.add_reflection(Reflection::new("Keep going", ReflectionType::Motivation));
            store.add_reflection(Reflection::new("Good day", ReflectionType::EndOfDay));
            store.add_reflection(Reflection::new("One more push", ReflectionType::Motivation));

            assert!(rx.has_changed().unwrap());
            assert_eq!(rx.borrow_and_update().items.len(), 3);

            let motivation = store.reflections_of(ReflectionType::Motivation);
            assert_eq!(motivation.len(), 2);
            assert_eq!(motivation[0].message, "Keep going");
            assert!(store.reflections_of(ReflectionType::Narrative).is_empty());
        }

        it "drops reflections on reload" {
            store.add_reflection(Reflection::new("Keep going", ReflectionType::Motivation));
            store.reload_all().unwrap();

            assert_eq!(store.current_reflections().len(), 1);

            let reopened = EchoStore::new(store.database().clone());
            reopened.reload_all().unwrap();
            assert!(reopened.current_reflections().is_empty());
        }
    }

    describe "focus_status" {
        before {
            let store = empty_store();
        }

        it "is idle without open tasks" {
            let status = store.focus_status();

            assert!(status.current_task.is_none());
            assert!(status.current_time_block.is_none());
            assert_eq!(status.message, "Echo is ready to help you with your tasks");
        }

        it "focuses on the first open task and its open block" {
            store.initialize_on(today()).unwrap();

            let status = store.focus_status();

            let task = status.current_task.expect("an open task");
            assert_eq!(task.title, "Draft project outline");
            assert_eq!(status.message, "Echo is focused on Draft project outline");
            let block = status.current_time_block.expect("an open block");
            assert_eq!(block.task_id, task.id);
            assert_eq!(block.start_time, at(11, 0));
        }
    }

    describe "completion_stats" {
        before {
            let store = empty_store();
        }

        it "counts tasks completed today, this week and overall" {
            let goal = store.add_goal(Goal::new("Plan", "", today(), None)).unwrap();
            let a = store.add_task(Task::new(goal.id, "a", "", TaskPriority::Low)).unwrap();
            let b = store.add_task(Task::new(goal.id, "b", "", TaskPriority::Low)).unwrap();
            store.add_task(Task::new(goal.id, "c", "", TaskPriority::Low)).unwrap();

            store.set_task_completed(a.id, true).unwrap();
            store.set_task_completed(b.id, true).unwrap();

            let stats = store.completion_stats(today());
            assert_eq!(stats, CompletionStats { today: 2, this_week: 2, total: 2 });

            let far_future = today() + Duration::days(400);
            let later = store.completion_stats(far_future);
            assert_eq!(later, CompletionStats { today: 0, this_week: 0, total: 2 });
        }
    }

    describe "reload failures" {
        before {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("echo.db");
            let db = Database::open(path.clone()).expect("Failed to open database");
            db.migrate().expect("Failed to run migrations");
            let store = EchoStore::new(db);
            store.reload_all().expect("Failed to load collections");
        }

        it "still publishes the time block when the task reload fails" {
            corrupt_tasks(&path);
            let task = Task::new(Uuid::new_v4(), "Plan", "", TaskPriority::Medium);
            let block = TimeBlock::new(task.id, today(), at(9, 0), at(10, 0));

            let err = store.add_task_with_time_block(task, block.clone()).unwrap_err();

            assert!(matches!(err, StoreError::Reload { collection: "tasks", .. }));
            let tasks = store.tasks().borrow().clone();
            assert!(tasks.stale);
            let blocks = store.time_blocks().borrow().clone();
            assert!(!blocks.stale);
            assert_eq!(*blocks.items, vec![block]);
        }

        it "reloads every collection and flags only the failed one" {
            let goal = store.add_goal(Goal::new("Kept", "", today(), None)).unwrap();
            store.database()
                .insert_mood_entry(&MoodEnergyEntry::new(MoodLevel::Good, EnergyLevel::High, "", today(), at(8, 0)))
                .unwrap();
            corrupt_tasks(&path);

            let err = store.reload_all().unwrap_err();

            assert!(matches!(err, StoreError::Reload { collection: "tasks", .. }));
            assert!(store.tasks().borrow().stale);
            assert_eq!(*store.current_goals(), vec![goal]);
            let moods = store.mood_entries().borrow().clone();
            assert!(!moods.stale);
            assert_eq!(moods.items.len(), 1);
        }
    }

    describe "local reflections" {
        before {
            let store = empty_store();
        }

        it "records a narrative about the current task" {
            store.initialize_on(today()).unwrap();

            let reflection = store.focus_reflection();

            assert_eq!(reflection.kind, ReflectionType::Narrative);
            assert_eq!(
                reflection.message,
                "I'm currently helping you with Draft project outline. Create a detailed outline of the project scope"
            );
            assert_eq!(store.reflections_of(ReflectionType::Narrative), vec![reflection]);
        }

        it "records an idle narrative without open tasks" {
            let reflection = store.focus_reflection();

            assert_eq!(
                reflection.message,
                "I'm ready to help you with your tasks. What would you like to work on today?"
            );
        }

        it "records motivation scaled to today's completions" {
            let goal = store.add_goal(Goal::new("Plan", "", today(), None)).unwrap();
            let before = store.motivation_reflection(today());
            assert_eq!(before.message, "Ready to start your productivity journey? You've got this!");

            let task = store.add_task(Task::new(goal.id, "a", "", TaskPriority::Low)).unwrap();
            store.set_task_completed(task.id, true).unwrap();
            let after = store.motivation_reflection(today());

            assert_eq!(after.kind, ReflectionType::Motivation);
            assert_eq!(after.message, "Great job making progress today!");
            assert_eq!(store.reflections_of(ReflectionType::Motivation).len(), 2);
        }
    }
}
