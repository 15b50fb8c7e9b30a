//! Prompt construction and local message templates. No network access here.

use std::fmt::Write;

use crate::models::{EnergyLevel, MoodEnergyEntry, MoodLevel, Task, TaskPriority};

/// Sent as the user turn when asking for a mood/energy reflection.
pub const REFLECTION_REQUEST: &str = "Please provide a reflection on my mood and energy data.";

/// Returned by reflection requests when there is nothing to reflect on.
pub const NO_MOOD_DATA: &str = "I don't have any mood or energy data to analyze yet. Try tracking your mood and energy levels regularly to get personalized insights.";

const REFLECTION_INSTRUCTIONS: &str = "\
Based on the user's mood and energy tracking data, provide a thoughtful reflection that:
1. Acknowledges their current emotional and energy state
2. Identifies potential patterns or insights
3. Offers personalized suggestions for maintaining or improving their wellbeing
4. Connects their state to their productivity and task management

Keep your response concise (3-5 sentences) but insightful and empathetic.";

const RECENT_COMPLETED_LIMIT: usize = 3;
const RECENT_ENTRY_LIMIT: usize = 5;
const SUMMARY_MIN_ENTRIES: usize = 3;

/// System prompt for a chat turn: who Echo is plus the user's task context.
pub fn system_prompt(tasks: &[Task]) -> String {
    let mut out = String::new();
    out.push_str("You are Echo, an AI assistant focused on helping users manage their tasks, improve productivity, and overcome procrastination.\n");
    out.push_str("Be concise, helpful, and encouraging in your responses.\n");

    if !tasks.is_empty() {
        out.push_str("\nHere is the current context about the user's tasks:\n");

        let incomplete: Vec<&Task> = tasks.iter().filter(|t| !t.is_completed).collect();
        if !incomplete.is_empty() {
            out.push_str("\nIncomplete tasks:\n");
            for task in incomplete {
                let _ = writeln!(
                    out,
                    "- {} (Priority: {}): {}",
                    task.title, task.priority, task.description
                );
            }
        }

        let mut completed = tasks.iter().filter(|t| t.is_completed).peekable();
        if completed.peek().is_some() {
            out.push_str("\nRecently completed tasks:\n");
            for task in completed.take(RECENT_COMPLETED_LIMIT) {
                let _ = writeln!(out, "- {}", task.title);
            }
        }
    }

    out.push_str("\nYou should:\n");
    out.push_str("1. Help the user prioritize their tasks\n");
    out.push_str("2. Provide specific, actionable advice\n");
    out.push_str("3. Offer encouragement and motivation\n");
    out.push_str("4. Suggest techniques to overcome procrastination when relevant\n");
    out
}

/// A greeting that references the user's open tasks.
pub fn initial_greeting(assistant: &str, tasks: &[Task]) -> String {
    greeting_for(assistant, None, tasks)
}

/// [`initial_greeting`] addressed to `user` by name when one is known.
pub fn greeting_for(assistant: &str, user: Option<&str>, tasks: &[Task]) -> String {
    let incomplete: Vec<&Task> = tasks.iter().filter(|t| !t.is_completed).collect();
    let hello = match user.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("Hello, {name}!"),
        None => "Hello!".to_string(),
    };
    let intro = format!("{hello} I'm Echo (powered by {assistant}), your AI assistant.");

    if incomplete.is_empty() {
        return format!(
            "{intro} I'm here to help you manage your tasks and boost your productivity. How can I assist you today?"
        );
    }

    let high: Vec<&&Task> = incomplete
        .iter()
        .filter(|t| t.priority == TaskPriority::High)
        .collect();

    match high.first() {
        Some(first) => format!(
            "{intro} I notice you have {} tasks in progress, including {} high-priority tasks like \"{}\". How can I help you make progress today?",
            incomplete.len(),
            high.len(),
            first.title
        ),
        None => format!(
            "{intro} I see you have {} tasks in progress. How can I help you prioritize and complete them today?",
            incomplete.len()
        ),
    }
}

/// System prompt for a reflection: the five most recent entries, plus the
/// most common mood and energy once there are at least three entries.
pub fn reflection_prompt(entries: &[MoodEnergyEntry]) -> String {
    let mut out = String::from(REFLECTION_INSTRUCTIONS);
    out.push_str("\n\nHere is the user's mood and energy tracking data:\n");

    let mut recent: Vec<&MoodEnergyEntry> = entries.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    for (index, entry) in recent.iter().take(RECENT_ENTRY_LIMIT).enumerate() {
        let _ = writeln!(out, "\nEntry {}:", index + 1);
        let _ = writeln!(out, "- Date: {}", entry.date);
        let _ = writeln!(out, "- Time: {}", entry.time.format("%H:%M"));
        let _ = writeln!(out, "- Mood: {} ({})", entry.mood.label(), entry.mood.icon());
        let _ = writeln!(
            out,
            "- Energy: {} ({})",
            entry.energy.label(),
            entry.energy.icon()
        );
        if !entry.note.trim().is_empty() {
            let _ = writeln!(out, "- Note: {}", entry.note);
        }
    }

    if entries.len() >= SUMMARY_MIN_ENTRIES {
        out.push_str("\nSummary:\n");
        if let Some(mood) = most_common_mood(entries) {
            let _ = writeln!(out, "- Most common mood: {} ({})", mood.label(), mood.icon());
        }
        if let Some(energy) = most_common_energy(entries) {
            let _ = writeln!(
                out,
                "- Most common energy level: {} ({})",
                energy.label(),
                energy.icon()
            );
        }
    }

    out
}

/// The most frequent mood. Ties go to the level declared first in [`MoodLevel`].
pub fn most_common_mood(entries: &[MoodEnergyEntry]) -> Option<MoodLevel> {
    most_common(&MoodLevel::ALL, entries.iter().map(|e| e.mood))
}

/// The most frequent energy level. Ties go to the level declared first in [`EnergyLevel`].
pub fn most_common_energy(entries: &[MoodEnergyEntry]) -> Option<EnergyLevel> {
    most_common(&EnergyLevel::ALL, entries.iter().map(|e| e.energy))
}

fn most_common<T: Copy + PartialEq>(order: &[T], values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts = vec![0usize; order.len()];
    for value in values {
        if let Some(idx) = order.iter().position(|candidate| *candidate == value) {
            counts[idx] += 1;
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (level, count) in order.iter().zip(counts) {
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((*level, count));
        }
    }
    best.map(|(level, _)| level)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    use super::*;

    fn task(title: &str, priority: TaskPriority, done: bool) -> Task {
        let mut t = Task::new(Uuid::new_v4(), title, format!("{title} details"), priority);
        t.is_completed = done;
        t
    }

    fn entry(mood: MoodLevel, energy: EnergyLevel, minutes_ago: i64) -> MoodEnergyEntry {
        let mut e = MoodEnergyEntry::new(
            mood,
            energy,
            "",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        );
        e.created_at = Utc::now() - Duration::minutes(minutes_ago);
        e
    }

    #[test]
    fn test_greeting_without_tasks() {
        assert_eq!(
            initial_greeting("Claude", &[]),
            "Hello! I'm Echo (powered by Claude), your AI assistant. I'm here to help you manage your tasks and boost your productivity. How can I assist you today?"
        );
    }

    #[test]
    fn test_greeting_mentions_high_priority_task() {
        let greeting = initial_greeting("Gemini", &[task("Draft", TaskPriority::High, false)]);
        assert!(greeting.contains("\"Draft\""));
        assert!(greeting.contains("1 tasks in progress"));
        assert!(greeting.contains("powered by Gemini"));
    }

    #[test]
    fn test_greeting_addresses_user_by_name() {
        let greeting = greeting_for("Claude", Some("Sam"), &[]);
        assert!(greeting.starts_with("Hello, Sam! I'm Echo (powered by Claude)"));

        assert_eq!(greeting_for("Claude", Some("  "), &[]), initial_greeting("Claude", &[]));
    }

    #[test]
    fn test_greeting_without_high_priority() {
        let greeting = initial_greeting(
            "Claude",
            &[
                task("Email", TaskPriority::Low, false),
                task("Done", TaskPriority::High, true),
            ],
        );
        assert!(greeting.contains("I see you have 1 tasks in progress"));
        assert!(!greeting.contains("Done"));
    }

    #[test]
    fn test_system_prompt_lists_context() {
        let tasks = vec![
            task("Write intro", TaskPriority::High, false),
            task("A", TaskPriority::Low, true),
            task("B", TaskPriority::Low, true),
            task("C", TaskPriority::Low, true),
            task("D", TaskPriority::Low, true),
        ];
        let prompt = system_prompt(&tasks);
        assert!(prompt.contains("- Write intro (Priority: HIGH): Write intro details"));
        assert!(prompt.contains("Recently completed tasks:"));
        assert!(prompt.contains("- C\n"));
        assert!(!prompt.contains("- D\n"));
    }

    #[test]
    fn test_system_prompt_without_tasks_has_no_context_block() {
        let prompt = system_prompt(&[]);
        assert!(!prompt.contains("current context"));
        assert!(prompt.contains("You should:"));
    }

    #[test]
    fn test_most_common_mood() {
        let entries = vec![
            entry(MoodLevel::Good, EnergyLevel::Low, 3),
            entry(MoodLevel::Good, EnergyLevel::High, 2),
            entry(MoodLevel::Bad, EnergyLevel::High, 1),
        ];
        assert_eq!(most_common_mood(&entries), Some(MoodLevel::Good));
        assert_eq!(most_common_energy(&entries), Some(EnergyLevel::High));
    }

    #[test]
    fn test_ties_resolve_in_declaration_order() {
        let entries = vec![
            entry(MoodLevel::VeryGood, EnergyLevel::VeryHigh, 2),
            entry(MoodLevel::Bad, EnergyLevel::Low, 1),
        ];
        assert_eq!(most_common_mood(&entries), Some(MoodLevel::Bad));
        assert_eq!(most_common_energy(&entries), Some(EnergyLevel::Low));
        assert_eq!(most_common_mood(&[]), None);
    }

    #[test]
    fn test_reflection_prompt_limits_and_summary() {
        let entries: Vec<_> = (0..7)
            .map(|i| entry(MoodLevel::Neutral, EnergyLevel::Medium, i))
            .collect();
        let prompt = reflection_prompt(&entries);
        assert!(prompt.contains("Entry 5:"));
        assert!(!prompt.contains("Entry 6:"));
        assert!(prompt.contains("- Most common mood: Neutral"));
    }

    #[test]
    fn test_reflection_prompt_skips_summary_for_few_entries() {
        let entries = vec![entry(MoodLevel::Good, EnergyLevel::High, 0)];
        let prompt = reflection_prompt(&entries);
        assert!(prompt.contains("Entry 1:"));
        assert!(!prompt.contains("Summary:"));
    }
}
