//! Habit plan extraction from free-text model answers
//!
//! The model is asked for a JSON object but usually wraps it in prose. The
//! greedy `{ ... }` span (first `{` to last `}`) is parsed; anything missing
//! or unusable comes from the deterministic default plan.

use serde::Deserialize;

use crate::coach::types::HabitPlan;

pub const DEFAULT_PLAN_TRIGGER: &str = "Right after you wake up in the morning";
pub const DEFAULT_PLAN_TIME: &str = "07:00";
pub const DEFAULT_PLAN_MOTIVATION: &str = "🎯 Start small, that's the key to success!";

/// Plan fields as the model may return them
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    #[serde(default)]
    tiny_version: Option<String>,
    #[serde(default)]
    trigger: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    motivation: Option<String>,
}

/// The plan used when no usable JSON can be extracted
pub fn default_plan(habit_description: &str) -> HabitPlan {
    HabitPlan {
        tiny_version: format!("Do \"{habit_description}\" for just 2 minutes"),
        trigger: DEFAULT_PLAN_TRIGGER.to_string(),
        time: DEFAULT_PLAN_TIME.to_string(),
        motivation: DEFAULT_PLAN_MOTIVATION.to_string(),
    }
}

/// The greedy brace span, if any
fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Whether `time` is a 24-hour "HH:MM" string
fn is_valid_time(time: &str) -> bool {
    let Some((hours, minutes)) = time.split_once(':') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return false;
    }
    matches!(
        (hours.parse::<u8>(), minutes.parse::<u8>()),
        (Ok(h), Ok(m)) if h < 24 && m < 60
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Extract a plan from `response`, never failing.
pub fn extract_habit_plan(response: &str, habit_description: &str) -> HabitPlan {
    let fallback = default_plan(habit_description);

    let Some(json) = find_json_object(response) else {
        tracing::debug!("No JSON object in plan response, using default plan");
        return fallback;
    };

    let raw: RawPlan = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!("Failed to parse plan JSON, using default plan: {e}");
            return fallback;
        }
    };

    HabitPlan {
        tiny_version: non_blank(raw.tiny_version).unwrap_or(fallback.tiny_version),
        trigger: non_blank(raw.trigger).unwrap_or(fallback.trigger),
        time: non_blank(raw.time)
            .filter(|t| is_valid_time(t))
            .unwrap_or(fallback.time),
        motivation: non_blank(raw.motivation).unwrap_or(fallback.motivation),
    }
}
