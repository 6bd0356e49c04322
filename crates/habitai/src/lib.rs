//! HabitAI - Backend proxy for an LLM habit coach
//!
//! This crate provides a server that forwards coach requests to an
//! OpenAI-compatible chat completions API, with bounded retries, fallback
//! answers, per-conversation history, and habit plan extraction.

pub mod api;
pub mod coach;
pub mod config;
pub mod error;
pub mod testing;
pub mod upstream;

pub use error::CoachError;
