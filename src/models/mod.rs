//! Domain models for Echo.
//!
//! # Core Concepts
//!
//! ## Planning
//!
//! - [`Goal`]: A user-defined objective with an optional deadline. Owns tasks by `goal_id`.
//! - [`Task`]: An actionable item under a goal, with a [`TaskPriority`] and completion state.
//! - [`TimeBlock`]: A scheduled interval on a calendar date during which a task is worked on.
//!
//! ## Wellbeing
//!
//! - [`MoodEnergyEntry`]: A timestamped self-report of [`MoodLevel`] and [`EnergyLevel`].
//! - [`Reflection`]: A short narrative or motivational message. Held in memory only.
//!
//! ## Derived views
//!
//! - [`FocusStatus`]: What Echo is currently "focused on".
//! - [`CompletionStats`]: Completed task counts for today, this week and overall.

mod focus;
mod goal;
mod mood;
mod reflection;
mod task;
mod time_block;

pub use focus::*;
pub use goal::*;
pub use mood::*;
pub use reflection::*;
pub use task::*;
pub use time_block::*;
