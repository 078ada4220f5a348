use std::fmt;

/// Error types that can occur while configuring the chat front-end, talking
/// to the LLM provider, or persisting a transcript.
#[derive(Debug)]
pub enum LLMError {
    /// HTTP request/response errors
    HttpError(String),
    /// Authentication and authorization errors
    AuthError(String),
    /// Invalid request parameters or format
    InvalidRequest(String),
    /// Errors returned by the LLM provider
    ProviderError(String),
    /// API response parsing or format error
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    JsonError(String),
    /// Filesystem errors while reading or writing transcripts and secrets
    IoError(String),
    /// A required credential is absent from its configured source
    MissingCredential {
        /// Name of the credential, e.g. `GEMINI_API_KEY`
        key: String,
        /// Human readable description of where it was looked up
        source: String,
    },
    /// Generic error
    Generic(String),
}

impl fmt::Display for LLMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LLMError::HttpError(e) => write!(f, "HTTP Error: {e}"),
            LLMError::AuthError(e) => write!(f, "Auth Error: {e}"),
            LLMError::InvalidRequest(e) => write!(f, "Invalid Request: {e}"),
            LLMError::ProviderError(e) => write!(f, "Provider Error: {e}"),
            LLMError::ResponseFormatError {
                message,
                raw_response,
            } => write!(
                f,
                "Response Format Error: {message}. Raw response: {raw_response}"
            ),
            LLMError::JsonError(e) => write!(f, "JSON Parse Error: {e}"),
            LLMError::IoError(e) => write!(f, "IO Error: {e}"),
            LLMError::MissingCredential { key, source } => {
                write!(f, "{key} not found in {source}")
            }
            LLMError::Generic(e) => write!(f, "Generic Error : {e}"),
        }
    }
}

impl std::error::Error for LLMError {}

/// Converts reqwest HTTP errors into LLMErrors
impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        LLMError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        LLMError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<std::io::Error> for LLMError {
    fn from(err: std::io::Error) -> Self {
        LLMError::IoError(err.to_string())
    }
}
