//! Pieces every front-end renders the same way.

use crate::conversation::Session;
use crate::error::LLMError;

pub const APP_TITLE: &str = "LLM Chat";
pub const WELCOME: &str = "🤖 Welcome to LLM Chat! Ask me anything.";
pub const THINKING: &str = "Thinking...";
pub const ERROR_PREFIX: &str = "❌ Error:";

/// Outcome of one turn, ready to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Reply(String),
    Error(String),
}

impl Rendered {
    pub fn text(&self) -> &str {
        match self {
            Rendered::Reply(text) | Rendered::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Rendered::Error(_))
    }
}

/// The banner shown in place of a reply when a turn fails.
pub fn format_error(err: &LLMError) -> String {
    format!("{ERROR_PREFIX} {err}")
}

/// Runs one turn on the session and renders the outcome.
pub async fn respond(session: &mut Session, input: &str) -> Rendered {
    match session.send(input).await {
        Ok(reply) => Rendered::Reply(reply),
        Err(e) => Rendered::Error(format_error(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_banner_starts_with_indicator() {
        let banner = format_error(&LLMError::HttpError("connection refused".into()));
        assert!(banner.starts_with(ERROR_PREFIX));
        assert!(banner.ends_with("connection refused"));
    }
}
