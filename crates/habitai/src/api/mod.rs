//! HTTP API for the HabitAI coach
//!
//! Exposes chat, habit plan, and missed-day analysis endpoints backed by
//! `CoachService`, plus per-conversation history inspection and reset.

pub mod conversation;
pub mod error;
pub mod handlers;
pub mod server;

pub use conversation::{ConversationId, ConversationIdError, ConversationRegistry};
pub use error::ApiError;
pub use server::{ApiServer, AppState, LEGACY_PREFIX, create_router};
