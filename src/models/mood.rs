use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A combined mood and energy self-report for a specific time.
///
/// Independent of goals and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEnergyEntry {
    pub id: Uuid,
    pub mood: MoodLevel,
    pub energy: EnergyLevel,
    /// Free-text note. Empty when the user left none.
    pub note: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl MoodEnergyEntry {
    pub fn new(
        mood: MoodLevel,
        energy: EnergyLevel,
        note: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mood,
            energy,
            note: note.into(),
            date,
            time,
            created_at: Utc::now(),
        }
    }
}

/// Five-point mood scale, worst to best.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoodLevel {
    VeryBad,
    Bad,
    Neutral,
    Good,
    VeryGood,
}

impl MoodLevel {
    /// All levels in declaration order.
    pub const ALL: [MoodLevel; 5] = [
        Self::VeryBad,
        Self::Bad,
        Self::Neutral,
        Self::Good,
        Self::VeryGood,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryBad => "VERY_BAD",
            Self::Bad => "BAD",
            Self::Neutral => "NEUTRAL",
            Self::Good => "GOOD",
            Self::VeryGood => "VERY_GOOD",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "VERY_BAD" => Some(Self::VeryBad),
            "BAD" => Some(Self::Bad),
            "NEUTRAL" => Some(Self::Neutral),
            "GOOD" => Some(Self::Good),
            "VERY_GOOD" => Some(Self::VeryGood),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryBad => "Very Bad",
            Self::Bad => "Bad",
            Self::Neutral => "Neutral",
            Self::Good => "Good",
            Self::VeryGood => "Very Good",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::VeryBad => "😞",
            Self::Bad => "😔",
            Self::Neutral => "😐",
            Self::Good => "🙂",
            Self::VeryGood => "😄",
        }
    }
}

/// Five-point energy scale, lowest to highest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl EnergyLevel {
    /// All levels in declaration order.
    pub const ALL: [EnergyLevel; 5] = [
        Self::VeryLow,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "VERY_LOW",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::VeryHigh => "VERY_HIGH",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "VERY_LOW" => Some(Self::VeryLow),
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "VERY_HIGH" => Some(Self::VeryHigh),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::VeryLow => "🔋",
            Self::Low => "🔋🔋",
            Self::Medium => "🔋🔋🔋",
            Self::High => "🔋🔋🔋🔋",
            Self::VeryHigh => "🔋🔋🔋🔋🔋",
        }
    }
}
