//! Builder module for configuring and instantiating LLM providers.
//!
//! Models are addressed by a route string of the form `provider/model`
//! (for example `gemini/gemini-2.0-flash`). The provider prefix selects the
//! backend and the remainder is forwarded as the model identifier.

use crate::{chat::ChatProvider, error::LLMError};

/// Supported LLM backend providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LLMBackend {
    /// Google Gemini API provider
    Google,
}

/// Converts a provider name into the corresponding LLMBackend variant.
/// The parsing is case-insensitive.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use llm_chat::builder::LLMBackend;
///
/// let backend = LLMBackend::from_str("gemini").unwrap();
/// assert_eq!(backend, LLMBackend::Google);
///
/// let err = LLMBackend::from_str("invalid").unwrap_err();
/// assert!(err.to_string().contains("Unknown LLM backend"));
/// ```
impl std::str::FromStr for LLMBackend {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gemini" => Ok(LLMBackend::Google),
            _ => Err(LLMError::InvalidRequest(format!("Unknown LLM backend: {s}"))),
        }
    }
}

/// Splits a model route into its backend and model identifier.
///
/// A route without a provider prefix is sent to Google.
///
/// ```
/// use llm_chat::builder::{parse_model_route, LLMBackend};
///
/// let (backend, model) = parse_model_route("gemini/gemini-2.0-flash").unwrap();
/// assert_eq!(backend, LLMBackend::Google);
/// assert_eq!(model, "gemini-2.0-flash");
/// ```
pub fn parse_model_route(route: &str) -> Result<(LLMBackend, String), LLMError> {
    let route = route.trim();
    let (backend, model) = match route.split_once('/') {
        Some((provider, model)) => (provider.parse::<LLMBackend>()?, model),
        None => (LLMBackend::Google, route),
    };
    if model.is_empty() {
        return Err(LLMError::InvalidRequest(format!(
            "Model route '{route}' does not name a model"
        )));
    }
    Ok((backend, model.to_string()))
}

/// Builder for configuring and instantiating LLM providers.
#[derive(Debug, Default)]
pub struct LLMBuilder {
    /// Selected backend provider
    backend: Option<LLMBackend>,
    /// API key for authentication with the provider
    api_key: Option<String>,
    /// Base URL for API requests
    base_url: Option<String>,
    /// Model identifier/name to use
    model: Option<String>,
    /// Maximum tokens to generate in responses
    max_tokens: Option<u32>,
    /// Temperature parameter for controlling response randomness (0.0-1.0)
    temperature: Option<f32>,
    /// System prompt/context to guide model behavior
    system: Option<String>,
    /// Request timeout duration in seconds
    timeout_seconds: Option<u64>,
}

impl LLMBuilder {
    /// Creates a new empty builder instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend provider to use.
    pub fn backend(mut self, backend: LLMBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets backend and model from a `provider/model` route.
    pub fn route(mut self, route: &str) -> Result<Self, LLMError> {
        let (backend, model) = parse_model_route(route)?;
        self.backend = Some(backend);
        self.model = Some(model);
        Ok(self)
    }

    /// Sets the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for API requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the temperature for controlling response randomness (0.0-1.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the system prompt/context.
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Builds and returns a configured LLM provider instance.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend or no API key was configured.
    pub fn build(self) -> Result<Box<dyn ChatProvider>, LLMError> {
        let backend = self
            .backend
            .ok_or_else(|| LLMError::InvalidRequest("No backend specified".to_string()))?;

        let provider: Box<dyn ChatProvider> = match backend {
            LLMBackend::Google => {
                let api_key = self.api_key.ok_or_else(|| {
                    LLMError::InvalidRequest("No API key provided for Google".to_string())
                })?;

                let mut google = crate::backends::google::Google::new(
                    api_key,
                    self.model,
                    self.max_tokens,
                    self.temperature,
                    self.timeout_seconds,
                    self.system,
                )?;
                if let Some(url) = self.base_url {
                    google = google.with_base_url(url);
                }
                Box::new(google)
            }
        };

        Ok(provider)
    }
}
