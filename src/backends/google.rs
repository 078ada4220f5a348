//! Google Gemini API client implementation for chat.
//!
//! This module provides integration with Google's Gemini models through the
//! `generateContent` endpoint. The whole transcript is sent on every call and
//! the first candidate's text parts are joined into the reply.
//!
//! # Example
//! ```no_run
//! use llm_chat::backends::google::Google;
//! use llm_chat::chat::{ChatMessage, ChatProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Google::new(
//!         "your-api-key",
//!         Some("gemini-2.0-flash".to_string()),
//!         None, // Max tokens
//!         None, // Temperature
//!         None, // Default timeout
//!         None, // No system prompt
//!     )
//!     .unwrap();
//!
//!     let messages = vec![ChatMessage::user().content("Hello!").build()];
//!     let response = client.chat(&messages).await.unwrap();
//!     println!("{response}");
//! }
//! ```

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    chat::{ChatMessage, ChatProvider, ChatResponse, ChatRole},
    error::LLMError,
};

/// Default Gemini API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Client for interacting with Google's Gemini API.
pub struct Google {
    /// API key for authentication with Google's API
    pub api_key: String,
    /// Model identifier (e.g. "gemini-2.0-flash")
    pub model: String,
    /// Maximum number of tokens to generate in responses
    pub max_tokens: Option<u32>,
    /// Sampling temperature between 0.0 and 1.0
    pub temperature: Option<f32>,
    /// Optional system prompt to set context
    pub system: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: Option<u64>,
    /// Scheme and host requests are sent to
    pub base_url: String,
    /// HTTP client for making API requests
    client: Client,
}

/// Request body for chat completions
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleChatRequest<'a> {
    /// List of conversation messages
    contents: Vec<GoogleChatContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GoogleSystemInstruction<'a>>,
    /// Optional generation parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GoogleGenerationConfig>,
}

/// Individual message in a chat conversation
#[derive(Serialize)]
struct GoogleChatContent<'a> {
    /// Role of the message sender ("user" or "model")
    role: &'a str,
    /// Content parts of the message
    parts: Vec<GoogleContentPart<'a>>,
}

#[derive(Serialize)]
struct GoogleSystemInstruction<'a> {
    parts: Vec<GoogleContentPart<'a>>,
}

/// Text content within a chat message
#[derive(Serialize)]
struct GoogleContentPart<'a> {
    /// The actual text content
    text: &'a str,
}

/// Configuration parameters for text generation
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerationConfig {
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Response from the chat completion API
#[derive(Deserialize, Debug)]
struct GoogleChatResponse {
    /// Generated completion candidates
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

/// Individual completion candidate
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GoogleCandidate {
    /// Content of the candidate response
    content: Option<GoogleResponseContent>,
    /// Why generation stopped, e.g. "STOP" or "SAFETY"
    finish_reason: Option<String>,
}

/// Content block within a response
#[derive(Deserialize, Debug)]
struct GoogleResponseContent {
    /// Parts making up the content
    #[serde(default)]
    parts: Vec<GoogleResponsePart>,
}

/// Individual part of response content
#[derive(Deserialize, Debug)]
struct GoogleResponsePart {
    /// Text content of this part
    #[serde(default)]
    text: Option<String>,
}

/// Reply text extracted from the first candidate.
///
/// `text` is `None` when the candidate carries no text parts, e.g. when
/// generation was stopped by a safety filter.
#[derive(Debug)]
pub struct GoogleReply {
    text: Option<String>,
    finish_reason: Option<String>,
}

impl fmt::Display for GoogleReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.text, &self.finish_reason) {
            (Some(text), _) => write!(f, "{text}"),
            (None, Some(reason)) => write!(f, "(no text, finish reason {reason})"),
            (None, None) => write!(f, "(no text)"),
        }
    }
}

impl ChatResponse for GoogleReply {
    fn text(&self) -> Option<String> {
        self.text.clone()
    }
}

impl Google {
    /// Creates a new Google Gemini client with the specified configuration.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google API key for authentication
    /// * `model` - Model identifier (defaults to "gemini-2.0-flash")
    /// * `max_tokens` - Maximum tokens in response
    /// * `temperature` - Sampling temperature between 0.0 and 1.0
    /// * `timeout_seconds` - Request timeout in seconds
    /// * `system` - System prompt to set context
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::HttpError`] if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_seconds: Option<u64>,
        system: Option<String>,
    ) -> Result<Self, LLMError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(std::time::Duration::from_secs(sec));
        }
        Ok(Self {
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            system,
            timeout_seconds,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: builder.build()?,
        })
    }

    /// Points the client at a different host, e.g. a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{base}/v1beta/models/{model}:generateContent",
            base = self.base_url,
            model = self.model
        )
    }
}

#[async_trait]
impl ChatProvider for Google {
    /// Sends a chat request to Google's Gemini API.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        if self.api_key.is_empty() {
            return Err(LLMError::AuthError("Missing Google API key".to_string()));
        }

        let contents = messages
            .iter()
            .map(|msg| GoogleChatContent {
                role: match msg.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                },
                parts: vec![GoogleContentPart { text: &msg.content }],
            })
            .collect();

        let system_instruction = self.system.as_deref().map(|text| GoogleSystemInstruction {
            parts: vec![GoogleContentPart { text }],
        });

        // An empty generationConfig object is rejected by the API
        let generation_config = if self.max_tokens.is_none() && self.temperature.is_none() {
            None
        } else {
            Some(GoogleGenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            })
        };

        let req_body = GoogleChatRequest {
            contents,
            system_instruction,
            generation_config,
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&req_body) {
                log::trace!("Google request payload: {json}");
            }
        }

        let resp = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&req_body)
            .send()
            .await?;

        let status = resp.status();
        log::debug!("Google HTTP status: {status}");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    LLMError::AuthError(format!("{status}: {body}"))
                }
                _ => LLMError::ProviderError(format!("Google API returned {status}: {body}")),
            });
        }

        let raw = resp.text().await?;
        let json_resp: GoogleChatResponse =
            serde_json::from_str(&raw).map_err(|e| LLMError::ResponseFormatError {
                message: format!("Failed to decode Google response: {e}"),
                raw_response: raw.clone(),
            })?;

        let first_candidate = json_resp.candidates.into_iter().next().ok_or_else(|| {
            LLMError::ProviderError("No candidates returned by Google".to_string())
        })?;

        let parts: Vec<String> = first_candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();
        let text = if parts.is_empty() {
            log::debug!(
                "Google candidate has no text, finish reason {:?}",
                first_candidate.finish_reason
            );
            None
        } else {
            Some(parts.concat())
        };

        Ok(Box::new(GoogleReply {
            text,
            finish_reason: first_candidate.finish_reason,
        }))
    }
}
