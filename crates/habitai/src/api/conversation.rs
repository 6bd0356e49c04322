//! Conversation identifiers and the per-conversation history registry
//!
//! Each conversation's history sits behind its own async mutex, held for a
//! whole chat turn, so turns within one conversation run one at a time while
//! different conversations never contend. The registry itself is bounded:
//! once full, starting a new conversation evicts the least recently used one.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;
use thiserror::Error;
use tokio::sync::Mutex as TokioMutex;

use crate::coach::{ConversationHistory, DEFAULT_MAX_MESSAGES};

/// Longest accepted conversation ID, in bytes
const MAX_CONVERSATION_ID_LEN: usize = 128;

/// Default number of conversations kept before the least recently used is evicted
pub const DEFAULT_MAX_CONVERSATIONS: usize = 1000;

/// Why a client-supplied conversation ID was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversationIdError {
    /// The ID was present but had no characters
    #[error("Conversation ID cannot be empty")]
    Empty,

    /// Something other than ASCII letters, digits, `_` or `-`
    #[error("Conversation ID contains invalid characters: allowed are a-z, A-Z, 0-9, _, -")]
    InvalidChars,

    /// Longer than [`MAX_CONVERSATION_ID_LEN`]
    #[error("Conversation ID exceeds maximum length of {MAX_CONVERSATION_ID_LEN} characters")]
    TooLong,
}

/// Client-chosen key for a conversation, checked once at the API boundary
///
/// Parse with `str::parse` or convert an owned `String` with `try_from`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

fn check_conversation_id(raw: &str) -> Result<(), ConversationIdError> {
    if raw.is_empty() {
        Err(ConversationIdError::Empty)
    } else if raw.len() > MAX_CONVERSATION_ID_LEN {
        Err(ConversationIdError::TooLong)
    } else if raw
        .bytes()
        .any(|b| !(b.is_ascii_alphanumeric() || b == b'_' || b == b'-'))
    {
        Err(ConversationIdError::InvalidChars)
    } else {
        Ok(())
    }
}

impl FromStr for ConversationId {
    type Err = ConversationIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        check_conversation_id(raw)?;
        Ok(ConversationId(raw.to_owned()))
    }
}

impl TryFrom<String> for ConversationId {
    type Error = ConversationIdError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        check_conversation_id(&raw)?;
        Ok(ConversationId(raw))
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type SharedHistory = Arc<TokioMutex<ConversationHistory>>;

/// Histories of live conversations, keyed by ID and bounded in number
///
/// The outer lock is synchronous and only held while looking up or inserting
/// an entry, never across an await.
#[derive(Debug, Clone)]
pub struct ConversationRegistry {
    conversations: Arc<Mutex<LruCache<ConversationId, SharedHistory>>>,
    max_messages: usize,
}

impl ConversationRegistry {
    /// Create a registry
    ///
    /// # Arguments
    /// * `max_messages` - Per-conversation message cap
    /// * `max_conversations` - Conversations kept before eviction; zero means
    ///   [`DEFAULT_MAX_CONVERSATIONS`]
    pub fn new(max_messages: usize, max_conversations: usize) -> Self {
        let cap = NonZeroUsize::new(max_conversations)
            .or(NonZeroUsize::new(DEFAULT_MAX_CONVERSATIONS))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            conversations: Arc::new(Mutex::new(LruCache::new(cap))),
            max_messages,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<ConversationId, SharedHistory>> {
        self.conversations.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The history for `id`, created empty on first use
    pub fn get_or_create(&self, id: &ConversationId) -> SharedHistory {
        let mut conversations = self.lock();
        if let Some(history) = conversations.get(id) {
            return history.clone();
        }

        tracing::debug!("Starting conversation {id}");
        let history = Arc::new(TokioMutex::new(ConversationHistory::new(self.max_messages)));
        if let Some((evicted, _)) = conversations.push(id.clone(), history.clone()) {
            tracing::debug!("Evicted idle conversation {evicted}");
        }
        history
    }

    pub fn get(&self, id: &ConversationId) -> Option<SharedHistory> {
        self.lock().get(id).cloned()
    }

    /// Forget a conversation, returning its history if it was known
    pub fn remove(&self, id: &ConversationId) -> Option<SharedHistory> {
        self.lock().pop(id)
    }

    /// A fresh history that is not registered anywhere
    pub fn ephemeral(&self) -> ConversationHistory {
        ConversationHistory::new(self.max_messages)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Conversations kept before the least recently used is evicted
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES, DEFAULT_MAX_CONVERSATIONS)
    }
}
