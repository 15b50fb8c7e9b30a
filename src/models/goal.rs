use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-defined objective.
///
/// Goals own zero or more [`Task`](super::Task)s through the task's `goal_id`.
/// There is no cascade: deleting a goal leaves its tasks in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    /// Optional deadline.
    pub end_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Create a new, incomplete goal with a fresh id and the current time.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            start_date,
            end_date,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Edits to an existing goal. `None` leaves the field as it is;
/// `end_date: Some(None)` removes the deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub end_date: Option<Option<NaiveDate>>,
}

impl Goal {
    pub fn apply(&mut self, changes: GoalChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(end_date) = changes.end_date {
            self.end_date = end_date;
        }
    }
}
