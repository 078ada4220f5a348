//! LLM Chat is a small chat front-end for Google Gemini.
//!
//! # Overview
//! One conversation engine ([`conversation::Session`]) keeps an append-only
//! transcript, sends it to the model on every turn, and saves it to a
//! timestamped JSON file when the session ends. Two front-ends drive that
//! engine:
//!
//! - [`api`]: a web page plus JSON endpoints, one session per browser tab
//! - [`repl`]: an interactive terminal prompt, or a single piped turn
//!
//! The `MODE` flag picks the front-end and the place the `GEMINI_API_KEY`
//! credential is read from (see [`config`]).

// Re-export for convenience
pub use async_trait::async_trait;

/// Web front-end serving the chat page and session endpoints
pub mod api;

/// Backend implementations for supported LLM providers
pub mod backends;

/// Builder pattern for configuring and instantiating LLM providers
pub mod builder;

/// Chat-based interactions with language models
pub mod chat;

/// Mode selection, credential sources and resolved settings
pub mod config;

/// Transcript, history files and the per-user session
pub mod conversation;

/// Error types and handling
pub mod error;

/// Terminal front-end
pub mod repl;

/// Secret store for storing API keys and other sensitive information
pub mod secret_store;

/// Live sessions shared between concurrent requests
pub mod session;

/// Text and rendering shared by the front-ends
pub mod ui;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
