use serde::{Deserialize, Serialize};

use super::{Task, TimeBlock};

/// What Echo is currently focused on, shown as "Echo is focused on ...".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStatus {
    pub current_task: Option<Task>,
    pub current_time_block: Option<TimeBlock>,
    pub message: String,
}

/// Completed task counts, bucketed by the day the task was last updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub today: usize,
    pub this_week: usize,
    pub total: usize,
}

impl FocusStatus {
    /// A first-person note about the current task, for a narrative reflection.
    pub fn narrative(&self) -> String {
        match &self.current_task {
            Some(task) => format!("I'm currently helping you with {}. {}", task.title, task.description)
                .trim_end()
                .to_string(),
            None => {
                "I'm ready to help you with your tasks. What would you like to work on today?"
                    .to_string()
            }
        }
    }
}

impl CompletionStats {
    /// Encouragement scaled to how much got done.
    pub fn motivation(&self) -> &'static str {
        if self.today > 3 {
            "Incredible work today! You're on fire!"
        } else if self.today > 0 {
            "Great job making progress today!"
        } else if self.this_week > 10 {
            "You've had a productive week! Keep it up!"
        } else if self.this_week > 0 {
            "You're making steady progress this week."
        } else if self.total > 0 {
            "Every completed task is a step forward. You're doing great!"
        } else {
            "Ready to start your productivity journey? You've got this!"
        }
    }
}
