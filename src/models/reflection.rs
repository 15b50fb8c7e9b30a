use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short narrative or motivational message, generated locally or by a vendor AI.
///
/// Reflections are **volatile**: the store keeps them in memory for the
/// lifetime of the process and never writes them to the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub id: Uuid,
    pub message: String,
    pub kind: ReflectionType,
    pub created_at: DateTime<Utc>,
}

impl Reflection {
    pub fn new(message: impl Into<String>, kind: ReflectionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            kind,
            created_at: Utc::now(),
        }
    }
}

/// What a reflection is for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionType {
    /// Breaking a goal down into steps.
    GoalAssistance,
    /// What Echo is "really" up to.
    Narrative,
    /// Encouragement when stuck.
    Motivation,
    /// End-of-day look back.
    EndOfDay,
}
