mod columns;
mod driver;
mod error;
mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;
use columns::*;

pub use driver::{ConnectionFactory, FileConnection, MemoryConnection};
pub use error::{DbError, Result};

const GOAL_COLUMNS: &str =
    "id, title, description, start_date, end_date, is_completed, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, goal_id, title, description, is_completed, priority, created_at, updated_at";
const TIME_BLOCK_COLUMNS: &str = "id, task_id, date, start_time, end_time, is_completed";
const MOOD_COLUMNS: &str = "id, mood_level, energy_level, note, date, time, created_at";

/// The persistence gateway: typed reads and writes over one SQLite database.
///
/// Cheap to clone; clones share the same connection. Every call takes the
/// connection lock for its whole duration, so the gateway itself is a
/// single writer.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn with_factory(factory: &dyn ConnectionFactory) -> Result<Self> {
        let conn = factory.connect()?;
        tracing::debug!("Opened database at {}", factory.describe());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        Self::with_factory(&FileConnection::new(path))
    }

    pub fn open_default() -> Result<Self> {
        let factory = FileConnection::default_location().ok_or_else(|| {
            DbError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine data directory",
            ))
        })?;
        Self::with_factory(&factory)
    }

    pub fn open_memory() -> Result<Self> {
        Self::with_factory(&MemoryConnection)
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        schema::run_migrations(&conn).map_err(DbError::Migration)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================
    // Goal operations
    // ============================================================

    pub fn list_goals(&self) -> Result<Vec<Goal>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals ORDER BY created_at, rowid"
        ))?;
        let goals = stmt
            .query_map([], goal_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(goals)
    }

    pub fn get_goal(&self, id: Uuid) -> Result<Option<Goal>> {
        let conn = self.lock();
        fetch_goal(&conn, id)
    }

    pub fn count_goals(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM goals", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert a goal exactly as given. Fails with [`DbError::Duplicate`] if the id exists.
    pub fn insert_goal(&self, goal: &Goal) -> Result<()> {
        let conn = self.lock();
        write_goal(&conn, goal)
    }

    /// Replace every mutable column of an existing goal and stamp `updated_at`.
    ///
    /// `created_at` is never rewritten. Returns the goal as stored.
    pub fn update_goal(&self, goal: &Goal) -> Result<Goal> {
        let conn = self.lock();
        let existing = fetch_goal(&conn, goal.id)?.ok_or(DbError::NotFound {
            entity: "Goal",
            id: goal.id,
        })?;
        let updated_at = next_timestamp(existing.updated_at);

        conn.execute(
            "UPDATE goals SET title = ?, description = ?, start_date = ?, end_date = ?,
                    is_completed = ?, updated_at = ?
             WHERE id = ?",
            (
                &goal.title,
                &goal.description,
                date_to_sql(goal.start_date),
                goal.end_date.map(date_to_sql),
                bool_to_sql(goal.is_completed),
                updated_at.to_rfc3339(),
                goal.id.to_string(),
            ),
        )?;

        Ok(Goal {
            created_at: existing.created_at,
            updated_at,
            ..goal.clone()
        })
    }

    pub fn set_goal_completed(&self, id: Uuid, completed: bool) -> Result<Goal> {
        let conn = self.lock();
        let existing = fetch_goal(&conn, id)?.ok_or(DbError::NotFound { entity: "Goal", id })?;
        let updated_at = next_timestamp(existing.updated_at);

        conn.execute(
            "UPDATE goals SET is_completed = ?, updated_at = ? WHERE id = ?",
            (
                bool_to_sql(completed),
                updated_at.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Goal {
            is_completed: completed,
            updated_at,
            ..existing
        })
    }

    /// Delete a goal. Its tasks are left in place.
    ///
    /// Returns `true` if a row was deleted, `false` if no goal had this id.
    pub fn delete_goal(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM goals WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Task operations
    // ============================================================

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at, rowid"
        ))?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn get_tasks_by_goal(&self, goal_id: Uuid) -> Result<Vec<Task>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE goal_id = ? ORDER BY created_at, rowid"
        ))?;
        let tasks = stmt
            .query_map([goal_id.to_string()], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        let conn = self.lock();
        fetch_task(&conn, id)
    }

    pub fn insert_task(&self, task: &Task) -> Result<()> {
        let conn = self.lock();
        write_task(&conn, task)
    }

    /// Insert a task and its first time block in one transaction.
    ///
    /// Either both rows are committed or neither is.
    pub fn insert_task_with_time_block(&self, task: &Task, block: &TimeBlock) -> Result<()> {
        if block.task_id != task.id {
            return Err(DbError::InvalidReference(format!(
                "time block {} belongs to task {}, not {}",
                block.id, block.task_id, task.id
            )));
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        write_task(&tx, task)?;
        write_time_block(&tx, block)?;
        tx.commit()?;
        Ok(())
    }

    pub fn update_task(&self, task: &Task) -> Result<Task> {
        let conn = self.lock();
        let existing = fetch_task(&conn, task.id)?.ok_or(DbError::NotFound {
            entity: "Task",
            id: task.id,
        })?;
        let updated_at = next_timestamp(existing.updated_at);

        conn.execute(
            "UPDATE tasks SET goal_id = ?, title = ?, description = ?, is_completed = ?,
                    priority = ?, updated_at = ?
             WHERE id = ?",
            (
                task.goal_id.to_string(),
                &task.title,
                &task.description,
                bool_to_sql(task.is_completed),
                task.priority.as_str(),
                updated_at.to_rfc3339(),
                task.id.to_string(),
            ),
        )?;

        Ok(Task {
            created_at: existing.created_at,
            updated_at,
            ..task.clone()
        })
    }

    pub fn set_task_completed(&self, id: Uuid, completed: bool) -> Result<Task> {
        let conn = self.lock();
        let existing = fetch_task(&conn, id)?.ok_or(DbError::NotFound { entity: "Task", id })?;
        let updated_at = next_timestamp(existing.updated_at);

        conn.execute(
            "UPDATE tasks SET is_completed = ?, updated_at = ? WHERE id = ?",
            (
                bool_to_sql(completed),
                updated_at.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Task {
            is_completed: completed,
            updated_at,
            ..existing
        })
    }

    /// Delete a task. Its time blocks are left in place.
    pub fn delete_task(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Time Block operations
    // ============================================================

    pub fn list_time_blocks(&self) -> Result<Vec<TimeBlock>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIME_BLOCK_COLUMNS} FROM time_blocks ORDER BY date, start_time, rowid"
        ))?;
        let blocks = stmt
            .query_map([], time_block_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(blocks)
    }

    pub fn get_time_blocks_by_task(&self, task_id: Uuid) -> Result<Vec<TimeBlock>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIME_BLOCK_COLUMNS} FROM time_blocks WHERE task_id = ?
             ORDER BY date, start_time, rowid"
        ))?;
        let blocks = stmt
            .query_map([task_id.to_string()], time_block_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(blocks)
    }

    pub fn get_time_blocks_on(&self, date: NaiveDate) -> Result<Vec<TimeBlock>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIME_BLOCK_COLUMNS} FROM time_blocks WHERE date = ?
             ORDER BY start_time, rowid"
        ))?;
        let blocks = stmt
            .query_map([date_to_sql(date)], time_block_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(blocks)
    }

    pub fn get_time_block(&self, id: Uuid) -> Result<Option<TimeBlock>> {
        let conn = self.lock();
        fetch_time_block(&conn, id)
    }

    pub fn insert_time_block(&self, block: &TimeBlock) -> Result<()> {
        let conn = self.lock();
        write_time_block(&conn, block)
    }

    pub fn update_time_block(&self, block: &TimeBlock) -> Result<TimeBlock> {
        let conn = self.lock();
        let rows = conn.execute(
            "UPDATE time_blocks SET task_id = ?, date = ?, start_time = ?, end_time = ?,
                    is_completed = ?
             WHERE id = ?",
            (
                block.task_id.to_string(),
                date_to_sql(block.date),
                time_to_sql(block.start_time),
                time_to_sql(block.end_time),
                bool_to_sql(block.is_completed),
                block.id.to_string(),
            ),
        )?;

        if rows == 0 {
            return Err(DbError::NotFound {
                entity: "TimeBlock",
                id: block.id,
            });
        }
        Ok(block.clone())
    }

    pub fn set_time_block_completed(&self, id: Uuid, completed: bool) -> Result<TimeBlock> {
        let conn = self.lock();
        let rows = conn.execute(
            "UPDATE time_blocks SET is_completed = ? WHERE id = ?",
            (bool_to_sql(completed), id.to_string()),
        )?;

        if rows == 0 {
            return Err(DbError::NotFound {
                entity: "TimeBlock",
                id,
            });
        }
        fetch_time_block(&conn, id)?.ok_or(DbError::NotFound {
            entity: "TimeBlock",
            id,
        })
    }

    pub fn delete_time_block(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute("DELETE FROM time_blocks WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Mood / Energy operations
    // ============================================================

    pub fn list_mood_entries(&self) -> Result<Vec<MoodEnergyEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MOOD_COLUMNS} FROM mood_energy_entries ORDER BY date, time, rowid"
        ))?;
        let entries = stmt
            .query_map([], mood_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn get_mood_entries_on(&self, date: NaiveDate) -> Result<Vec<MoodEnergyEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MOOD_COLUMNS} FROM mood_energy_entries WHERE date = ? ORDER BY time, rowid"
        ))?;
        let entries = stmt
            .query_map([date_to_sql(date)], mood_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn get_mood_entry(&self, id: Uuid) -> Result<Option<MoodEnergyEntry>> {
        let conn = self.lock();
        let entry = conn
            .query_row(
                &format!("SELECT {MOOD_COLUMNS} FROM mood_energy_entries WHERE id = ?"),
                [id.to_string()],
                mood_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn insert_mood_entry(&self, entry: &MoodEnergyEntry) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            &format!("INSERT INTO mood_energy_entries ({MOOD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"),
            (
                entry.id.to_string(),
                entry.mood.as_str(),
                entry.energy.as_str(),
                &entry.note,
                date_to_sql(entry.date),
                time_to_sql(entry.time),
                entry.created_at.to_rfc3339(),
            ),
        )
        .map_err(|e| DbError::on_insert(e, "MoodEnergyEntry", entry.id))?;
        Ok(())
    }

    pub fn update_mood_entry(&self, entry: &MoodEnergyEntry) -> Result<MoodEnergyEntry> {
        let conn = self.lock();
        let rows = conn.execute(
            "UPDATE mood_energy_entries SET mood_level = ?, energy_level = ?, note = ?,
                    date = ?, time = ?
             WHERE id = ?",
            (
                entry.mood.as_str(),
                entry.energy.as_str(),
                &entry.note,
                date_to_sql(entry.date),
                time_to_sql(entry.time),
                entry.id.to_string(),
            ),
        )?;

        if rows == 0 {
            return Err(DbError::NotFound {
                entity: "MoodEnergyEntry",
                id: entry.id,
            });
        }
        Ok(entry.clone())
    }

    pub fn delete_mood_entry(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let rows = conn.execute(
            "DELETE FROM mood_energy_entries WHERE id = ?",
            [id.to_string()],
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Sample data
    // ============================================================

    /// Insert the first-run sample goal with three tasks and their time blocks.
    ///
    /// Runs in one transaction. Returns the sample goal's id.
    pub fn seed_sample_data(&self, today: NaiveDate) -> Result<Uuid> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let goal = Goal::new(
            "Complete Project Proposal",
            "Finish the project proposal for the client meeting",
            today,
            None,
        );
        write_goal(&tx, &goal)?;

        let samples = [
            (
                "Research competitors",
                "Analyze competitor products and features",
                TaskPriority::High,
                true,
                (9, 0),
                (10, 30),
            ),
            (
                "Draft project outline",
                "Create a detailed outline of the project scope",
                TaskPriority::High,
                false,
                (11, 0),
                (12, 30),
            ),
            (
                "Create mockups",
                "Design initial mockups for the client",
                TaskPriority::Medium,
                false,
                (14, 0),
                (16, 0),
            ),
        ];

        for (title, description, priority, done, start, end) in samples {
            let mut task = Task::new(goal.id, title, description, priority);
            task.is_completed = done;
            write_task(&tx, &task)?;

            let mut block = TimeBlock::new(task.id, today, hm(start), hm(end));
            block.is_completed = done;
            write_time_block(&tx, &block)?;
        }

        tx.commit()?;
        tracing::info!("Seeded sample goal {}", goal.id);
        Ok(goal.id)
    }
}

// ============================================================
// Row mapping
// ============================================================

fn goal_from_row(row: &Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: get_uuid(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        start_date: get_date(row, 3)?,
        end_date: get_optional_date(row, 4)?,
        is_completed: get_bool(row, 5)?,
        created_at: get_datetime(row, 6)?,
        updated_at: get_datetime(row, 7)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: get_uuid(row, 0)?,
        goal_id: get_uuid(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        is_completed: get_bool(row, 4)?,
        priority: get_priority(row, 5)?,
        created_at: get_datetime(row, 6)?,
        updated_at: get_datetime(row, 7)?,
    })
}

fn time_block_from_row(row: &Row<'_>) -> rusqlite::Result<TimeBlock> {
    Ok(TimeBlock {
        id: get_uuid(row, 0)?,
        task_id: get_uuid(row, 1)?,
        date: get_date(row, 2)?,
        start_time: get_time(row, 3)?,
        end_time: get_time(row, 4)?,
        is_completed: get_bool(row, 5)?,
    })
}

fn mood_from_row(row: &Row<'_>) -> rusqlite::Result<MoodEnergyEntry> {
    Ok(MoodEnergyEntry {
        id: get_uuid(row, 0)?,
        mood: get_mood(row, 1)?,
        energy: get_energy(row, 2)?,
        note: row.get(3)?,
        date: get_date(row, 4)?,
        time: get_time(row, 5)?,
        created_at: get_datetime(row, 6)?,
    })
}

fn fetch_goal(conn: &Connection, id: Uuid) -> Result<Option<Goal>> {
    let goal = conn
        .query_row(
            &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?"),
            [id.to_string()],
            goal_from_row,
        )
        .optional()?;
    Ok(goal)
}

fn fetch_task(conn: &Connection, id: Uuid) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
            [id.to_string()],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

fn fetch_time_block(conn: &Connection, id: Uuid) -> Result<Option<TimeBlock>> {
    let block = conn
        .query_row(
            &format!("SELECT {TIME_BLOCK_COLUMNS} FROM time_blocks WHERE id = ?"),
            [id.to_string()],
            time_block_from_row,
        )
        .optional()?;
    Ok(block)
}

fn write_goal(conn: &Connection, goal: &Goal) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO goals ({GOAL_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
        (
            goal.id.to_string(),
            &goal.title,
            &goal.description,
            date_to_sql(goal.start_date),
            goal.end_date.map(date_to_sql),
            bool_to_sql(goal.is_completed),
            goal.created_at.to_rfc3339(),
            goal.updated_at.to_rfc3339(),
        ),
    )
    .map_err(|e| DbError::on_insert(e, "Goal", goal.id))?;
    Ok(())
}

fn write_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
        (
            task.id.to_string(),
            task.goal_id.to_string(),
            &task.title,
            &task.description,
            bool_to_sql(task.is_completed),
            task.priority.as_str(),
            task.created_at.to_rfc3339(),
            task.updated_at.to_rfc3339(),
        ),
    )
    .map_err(|e| DbError::on_insert(e, "Task", task.id))?;
    Ok(())
}

fn write_time_block(conn: &Connection, block: &TimeBlock) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO time_blocks ({TIME_BLOCK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"),
        (
            block.id.to_string(),
            block.task_id.to_string(),
            date_to_sql(block.date),
            time_to_sql(block.start_time),
            time_to_sql(block.end_time),
            bool_to_sql(block.is_completed),
        ),
    )
    .map_err(|e| DbError::on_insert(e, "TimeBlock", block.id))?;
    Ok(())
}

/// The timestamp for a write that follows one stamped `previous`.
///
/// Strictly later than `previous` even when the clock has not advanced.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn hm((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
