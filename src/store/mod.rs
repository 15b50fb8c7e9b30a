//! Reactive state facade.
//!
//! [`EchoStore`] sits between the [`Database`] and whatever presents the data.
//! Each entity collection is published through a [`tokio::sync::watch`]
//! channel. After every write the affected collection is re-read in full and
//! republished, so observers only ever see complete snapshots.
//!
//! Lifecycle: construct with [`EchoStore::new`] at startup, call
//! [`EchoStore::initialize`] once, and [`EchoStore::shutdown`] when done.

mod snapshot;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Datelike, Local, NaiveDate};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::db::{Database, DbError};
use crate::models::*;

pub use snapshot::Snapshot;
use snapshot::Collection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Reload of {collection} failed; observers hold a stale snapshot: {source}")]
    Reload {
        collection: &'static str,
        #[source]
        source: DbError,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_not_found())
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

pub struct EchoStore {
    db: Database,
    write_lock: Mutex<()>,
    goals: Collection<Goal>,
    tasks: Collection<Task>,
    time_blocks: Collection<TimeBlock>,
    mood_entries: Collection<MoodEnergyEntry>,
    reflections: Collection<Reflection>,
}

impl EchoStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
            goals: Collection::new("goals"),
            tasks: Collection::new("tasks"),
            time_blocks: Collection::new("time_blocks"),
            mood_entries: Collection::new("mood_entries"),
            reflections: Collection::new("reflections"),
        }
    }

    /// Seed sample data if there are no goals yet, then load every collection.
    pub fn initialize(&self) -> Result<()> {
        self.initialize_on(Local::now().date_naive())
    }

    /// [`initialize`](Self::initialize) with an explicit date for the sample time blocks.
    pub fn initialize_on(&self, today: NaiveDate) -> Result<()> {
        let _guard = self.write_guard();
        if self.db.count_goals()? == 0 {
            self.db.seed_sample_data(today)?;
        }
        self.reload_all()
    }

    /// Re-read every persisted collection.
    ///
    /// Every collection is attempted even if an earlier one fails, so each
    /// failed collection is flagged stale. Returns the first failure.
    pub fn reload_all(&self) -> Result<()> {
        first_failure([
            self.reload_goals(),
            self.reload_tasks(),
            self.reload_time_blocks(),
            self.reload_mood_entries(),
        ])
    }

    pub fn shutdown(self) {
        tracing::info!("Echo store shut down");
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reload_goals(&self) -> Result<()> {
        self.goals.refresh(|| self.db.list_goals())
    }

    fn reload_tasks(&self) -> Result<()> {
        self.tasks.refresh(|| self.db.list_tasks())
    }

    fn reload_time_blocks(&self) -> Result<()> {
        self.time_blocks.refresh(|| self.db.list_time_blocks())
    }

    fn reload_mood_entries(&self) -> Result<()> {
        self.mood_entries.refresh(|| self.db.list_mood_entries())
    }

    // ============================================================
    // Observation
    // ============================================================

    pub fn goals(&self) -> watch::Receiver<Snapshot<Goal>> {
        self.goals.subscribe()
    }

    pub fn tasks(&self) -> watch::Receiver<Snapshot<Task>> {
        self.tasks.subscribe()
    }

    pub fn time_blocks(&self) -> watch::Receiver<Snapshot<TimeBlock>> {
        self.time_blocks.subscribe()
    }

    pub fn mood_entries(&self) -> watch::Receiver<Snapshot<MoodEnergyEntry>> {
        self.mood_entries.subscribe()
    }

    pub fn reflections(&self) -> watch::Receiver<Snapshot<Reflection>> {
        self.reflections.subscribe()
    }

    pub fn current_goals(&self) -> Arc<Vec<Goal>> {
        self.goals.current()
    }

    pub fn current_tasks(&self) -> Arc<Vec<Task>> {
        self.tasks.current()
    }

    pub fn current_time_blocks(&self) -> Arc<Vec<TimeBlock>> {
        self.time_blocks.current()
    }

    pub fn current_mood_entries(&self) -> Arc<Vec<MoodEnergyEntry>> {
        self.mood_entries.current()
    }

    pub fn current_reflections(&self) -> Arc<Vec<Reflection>> {
        self.reflections.current()
    }

    // ============================================================
    // Goals
    // ============================================================

    pub fn add_goal(&self, goal: Goal) -> Result<Goal> {
        let _guard = self.write_guard();
        self.db.insert_goal(&goal)?;
        self.reload_goals()?;
        Ok(goal)
    }

    pub fn update_goal(&self, goal: &Goal) -> Result<Goal> {
        let _guard = self.write_guard();
        let stored = self.db.update_goal(goal)?;
        self.reload_goals()?;
        Ok(stored)
    }

    pub fn set_goal_completed(&self, id: Uuid, completed: bool) -> Result<Goal> {
        let _guard = self.write_guard();
        let stored = self.db.set_goal_completed(id, completed)?;
        self.reload_goals()?;
        Ok(stored)
    }

    /// Delete a goal. Tasks under it are kept.
    pub fn delete_goal(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_guard();
        let deleted = self.db.delete_goal(id)?;
        self.reload_goals()?;
        Ok(deleted)
    }

    // ============================================================
    // Tasks
    // ============================================================

    pub fn add_task(&self, task: Task) -> Result<Task> {
        let _guard = self.write_guard();
        self.db.insert_task(&task)?;
        self.reload_tasks()?;
        Ok(task)
    }

    /// Add a task together with its first time block, atomically.
    pub fn add_task_with_time_block(&self, task: Task, block: TimeBlock) -> Result<(Task, TimeBlock)> {
        let _guard = self.write_guard();
        self.db.insert_task_with_time_block(&task, &block)?;
        first_failure([self.reload_tasks(), self.reload_time_blocks()])?;
        Ok((task, block))
    }

    pub fn update_task(&self, task: &Task) -> Result<Task> {
        let _guard = self.write_guard();
        let stored = self.db.update_task(task)?;
        self.reload_tasks()?;
        Ok(stored)
    }

    pub fn set_task_completed(&self, id: Uuid, completed: bool) -> Result<Task> {
        let _guard = self.write_guard();
        let stored = self.db.set_task_completed(id, completed)?;
        self.reload_tasks()?;
        Ok(stored)
    }

    pub fn delete_task(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_guard();
        let deleted = self.db.delete_task(id)?;
        self.reload_tasks()?;
        Ok(deleted)
    }

    // ============================================================
    // Time blocks
    // ============================================================

    pub fn add_time_block(&self, block: TimeBlock) -> Result<TimeBlock> {
        let _guard = self.write_guard();
        self.db.insert_time_block(&block)?;
        self.reload_time_blocks()?;
        Ok(block)
    }

    pub fn update_time_block(&self, block: &TimeBlock) -> Result<TimeBlock> {
        let _guard = self.write_guard();
        let stored = self.db.update_time_block(block)?;
        self.reload_time_blocks()?;
        Ok(stored)
    }

    pub fn set_time_block_completed(&self, id: Uuid, completed: bool) -> Result<TimeBlock> {
        let _guard = self.write_guard();
        let stored = self.db.set_time_block_completed(id, completed)?;
        self.reload_time_blocks()?;
        Ok(stored)
    }

    pub fn delete_time_block(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_guard();
        let deleted = self.db.delete_time_block(id)?;
        self.reload_time_blocks()?;
        Ok(deleted)
    }

    // ============================================================
    // Mood / energy
    // ============================================================

    pub fn add_mood_entry(&self, entry: MoodEnergyEntry) -> Result<MoodEnergyEntry> {
        let _guard = self.write_guard();
        self.db.insert_mood_entry(&entry)?;
        self.reload_mood_entries()?;
        Ok(entry)
    }

    pub fn update_mood_entry(&self, entry: &MoodEnergyEntry) -> Result<MoodEnergyEntry> {
        let _guard = self.write_guard();
        let stored = self.db.update_mood_entry(entry)?;
        self.reload_mood_entries()?;
        Ok(stored)
    }

    pub fn delete_mood_entry(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_guard();
        let deleted = self.db.delete_mood_entry(id)?;
        self.reload_mood_entries()?;
        Ok(deleted)
    }

    pub fn mood_entries_on(&self, date: NaiveDate) -> Result<Vec<MoodEnergyEntry>> {
        Ok(self.db.get_mood_entries_on(date)?)
    }

    // ============================================================
    // Reflections (memory only)
    // ============================================================

    pub fn add_reflection(&self, reflection: Reflection) -> Reflection {
        let _guard = self.write_guard();
        let mut items = self.reflections.current().as_ref().clone();
        items.push(reflection.clone());
        self.reflections.publish(items);
        reflection
    }

    pub fn reflections_of(&self, kind: ReflectionType) -> Vec<Reflection> {
        self.reflections
            .current()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    // ============================================================
    // Derived views
    // ============================================================

    /// The first incomplete task and its first incomplete time block.
    pub fn focus_status(&self) -> FocusStatus {
        let tasks = self.tasks.current();
        let blocks = self.time_blocks.current();

        let current_task = tasks.iter().find(|t| !t.is_completed).cloned();
        let current_time_block = current_task.as_ref().and_then(|task| {
            blocks
                .iter()
                .find(|b| b.task_id == task.id && !b.is_completed)
                .cloned()
        });
        let message = match &current_task {
            Some(task) => format!("Echo is focused on {}", task.title),
            None => "Echo is ready to help you with your tasks".to_string(),
        };

        FocusStatus {
            current_task,
            current_time_block,
            message,
        }
    }

    /// Record a narrative reflection about the current focus and return it.
    pub fn focus_reflection(&self) -> Reflection {
        let message = self.focus_status().narrative();
        self.add_reflection(Reflection::new(message, ReflectionType::Narrative))
    }

    /// Record a motivation reflection based on [`completion_stats`](Self::completion_stats).
    pub fn motivation_reflection(&self, today: NaiveDate) -> Reflection {
        let message = self.completion_stats(today).motivation();
        self.add_reflection(Reflection::new(message, ReflectionType::Motivation))
    }

    /// Completed tasks, bucketed by the local date of their last update.
    pub fn completion_stats(&self, today: NaiveDate) -> CompletionStats {
        let week = today.iso_week();
        let mut stats = CompletionStats::default();

        for task in self.tasks.current().iter().filter(|t| t.is_completed) {
            let day = task.updated_at.with_timezone(&Local).date_naive();
            stats.total += 1;
            if day == today {
                stats.today += 1;
            }
            if day.iso_week() == week {
                stats.this_week += 1;
            }
        }

        stats
    }
}

fn first_failure<const N: usize>(results: [Result<()>; N]) -> Result<()> {
    results.into_iter().find(|r| r.is_err()).unwrap_or(Ok(()))
}
