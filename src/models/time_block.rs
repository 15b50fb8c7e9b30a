use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Problems with a user-supplied start/end window.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("start and end times must be given together")]
    Incomplete,

    #[error("invalid time '{0}', expected HH:MM or HH:MM:SS")]
    InvalidTime(String),
}

/// A scheduled interval for working on a task.
///
/// Overlapping blocks are allowed; nothing validates `start_time < end_time`
/// against other blocks on the same date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: Uuid,
    pub task_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_completed: bool,
}

impl TimeBlock {
    pub fn new(task_id: Uuid, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            date,
            start_time,
            end_time,
            is_completed: false,
        }
    }
}

impl TimeBlock {
    /// Build a block from an optional start/end pair.
    ///
    /// Neither given is `Ok(None)`; only one given is [`WindowError::Incomplete`].
    pub fn from_window(
        task_id: Uuid,
        date: NaiveDate,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> Result<Option<Self>, WindowError> {
        match (start, end) {
            (Some(start), Some(end)) => Ok(Some(Self::new(task_id, date, start, end))),
            (None, None) => Ok(None),
            _ => Err(WindowError::Incomplete),
        }
    }
}

/// Parse a wall-clock time written as `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, WindowError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| WindowError::InvalidTime(s.to_string()))
}
