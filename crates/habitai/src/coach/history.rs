//! Conversation history for a single coach conversation
//!
//! Keeps the most recent messages, evicting the oldest first once the cap is
//! exceeded. Lives in memory only.

use std::collections::VecDeque;

use crate::coach::types::Message;

/// Messages kept per conversation and sent with every chat request
pub const DEFAULT_MAX_MESSAGES: usize = 10;

/// Messages returned by lightweight inspection when no limit is given
pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    max_messages: usize,
}

impl ConversationHistory {
    /// Create an empty history holding at most `max_messages` (at least one)
    pub fn new(max_messages: usize) -> Self {
        let max_messages = max_messages.max(1);
        Self {
            messages: VecDeque::with_capacity(max_messages + 1),
            max_messages,
        }
    }

    /// Add a message at the end, evicting from the front past the cap
    pub fn append(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }

    /// The last `limit` messages, oldest first
    pub fn recent(&self, limit: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Iterate over messages, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}
