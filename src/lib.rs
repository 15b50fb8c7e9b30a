//! Echo: goals, tasks, time blocks and mood tracking with an AI focus companion.
//!
//! - [`db`]: SQLite persistence gateway
//! - [`store`]: observable collections over the gateway
//! - [`ai`]: vendor-neutral assistant client
//! - [`pomodoro`]: focus timer

pub mod ai;
pub mod config;
pub mod db;
pub mod models;
pub mod pomodoro;
pub mod store;
