//! User-facing messages for when the upstream cannot answer

use crate::upstream::UpstreamError;

pub const TIMEOUT_FALLBACK: &str = "⏱️ That took too long. Please try again!";

pub const UNAVAILABLE_FALLBACK: &str =
    "🤖 Oops, I'm temporarily unavailable. But you're doing great anyway! Keep it up!";

/// Pick the fallback for a terminal upstream error
pub fn fallback_message(error: &UpstreamError) -> &'static str {
    if error.is_timeout() {
        TIMEOUT_FALLBACK
    } else {
        UNAVAILABLE_FALLBACK
    }
}
