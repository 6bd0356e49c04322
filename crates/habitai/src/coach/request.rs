//! Assembles the ordered message list for a chat request
//!
//! Order: persona system prompt, context system prompt, conversation history.
//! The new user message is appended to the history first, so it is the last
//! history entry and the last message sent.

use crate::coach::history::ConversationHistory;
use crate::coach::prompts::{SYSTEM_PROMPT, VOICE_MODE_DIRECTIVE};
use crate::coach::types::{ChatContext, HABIT_DURATION_DAYS, Message};

/// Persona system prompt, with the voice directive when requested
pub fn system_prompt(voice_mode: bool) -> String {
    if voice_mode {
        format!("{SYSTEM_PROMPT}{VOICE_MODE_DIRECTIVE}")
    } else {
        SYSTEM_PROMPT.to_string()
    }
}

/// Render habit progress as a labeled text block
pub fn render_context(context: &ChatContext) -> String {
    let days = if context.streak == 1 { "day" } else { "days" };
    format!(
        "Habit: {}\nDay: {}/{}\nCurrent streak: {} {}\nTotal completed: {}\nMissed: {}",
        context.habit_name,
        context.current_day,
        HABIT_DURATION_DAYS,
        context.streak,
        days,
        context.total_completed,
        context.missed_days
    )
}

/// Build the messages for one chat turn, recording the user message in
/// `history`.
pub fn build_chat_messages(
    history: &mut ConversationHistory,
    user_message: &str,
    context: &ChatContext,
    voice_mode: bool,
) -> Vec<Message> {
    history.append(Message::user(user_message));

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt(voice_mode)));
    messages.push(Message::system(format!(
        "CONTEXT:\n{}",
        render_context(context)
    )));
    messages.extend(history.iter().cloned());
    messages
}
