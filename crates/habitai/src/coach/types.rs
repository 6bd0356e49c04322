//! Core coach data types
//!
//! Messages exchanged with the upstream model, the caller-supplied habit
//! progress context, and the structured habit plan.

use serde::{Deserialize, Serialize};

/// Number of days it takes to form a habit; rendered as "Day N/66"
pub const HABIT_DURATION_DAYS: u32 = 66;

/// Role of a conversation participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in the upstream chat completion format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Habit progress supplied by the caller and embedded into the prompt.
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    #[serde(default)]
    pub habit_name: String,
    #[serde(default = "default_current_day")]
    pub current_day: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub total_completed: u32,
    #[serde(default)]
    pub missed_days: u32,
}

impl Default for ChatContext {
    fn default() -> Self {
        Self {
            habit_name: String::new(),
            current_day: default_current_day(),
            streak: 0,
            total_completed: 0,
            missed_days: 0,
        }
    }
}

fn default_current_day() -> u32 {
    1
}

/// Structured plan for starting a habit, Tiny Habits style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitPlan {
    /// Two-minute version of the habit
    pub tiny_version: String,
    /// Existing routine the habit is anchored to
    pub trigger: String,
    /// Recommended time of day, "HH:MM"
    pub time: String,
    pub motivation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn test_context_defaults_for_missing_fields() {
        let context: ChatContext = serde_json::from_str(r#"{"streak": 4}"#).unwrap();
        assert_eq!(context.habit_name, "");
        assert_eq!(context.current_day, 1);
        assert_eq!(context.streak, 4);
        assert_eq!(context.total_completed, 0);
        assert_eq!(context.missed_days, 0);
        assert_eq!(ChatContext::default().current_day, 1);
    }

    #[test]
    fn test_context_camel_case_fields() {
        let context: ChatContext = serde_json::from_str(
            r#"{"habitName":"Read","currentDay":12,"streak":3,"totalCompleted":10,"missedDays":2}"#,
        )
        .unwrap();
        assert_eq!(context.habit_name, "Read");
        assert_eq!(context.current_day, 12);
        assert_eq!(context.total_completed, 10);
        assert_eq!(context.missed_days, 2);
    }

    #[test]
    fn test_context_rejects_wrong_types() {
        let result = serde_json::from_str::<ChatContext>(r#"{"streak":"many"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_habit_plan_camel_case() {
        let plan = HabitPlan {
            tiny_version: "x".to_string(),
            trigger: "y".to_string(),
            time: "08:00".to_string(),
            motivation: "z".to_string(),
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["tinyVersion"], "x");
        assert_eq!(json["time"], "08:00");
    }
}
