//! Start-up configuration: front-end mode, credential lookup and the
//! settings every other component reads.
//!
//! The mode flag picks both the front-end and the credential backend. Web
//! mode reads the API key from the [`SecretStore`], terminal mode from an
//! [`EnvFile`]. Both sit behind [`CredentialSource`], so the lookup itself
//! does not care which front-end is running.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::builder::{parse_model_route, LLMBuilder};
use crate::chat::ChatProvider;
use crate::conversation::HistoryStore;
use crate::error::LLMError;
use crate::secret_store::SecretStore;

/// Name of the credential the Gemini backend needs.
pub const API_KEY_NAME: &str = "GEMINI_API_KEY";

/// Model route used when none is configured.
pub const DEFAULT_MODEL_ROUTE: &str = "gemini/gemini-2.0-flash";

/// Address the web front-end listens on by default.
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Seconds a web session may sit unused before it is saved and dropped.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 1800;

/// Which front-end serves the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Browser page served over HTTP
    Web,
    /// Interactive terminal prompt
    Terminal,
}

impl Mode {
    /// Interprets the `MODE` flag.
    ///
    /// Only `streamlit` (case-insensitive) selects the web front-end. Any
    /// other value, including an empty one, selects the terminal. An unset
    /// flag falls back to `streamlit` before it gets here.
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("streamlit") {
            Mode::Web
        } else {
            Mode::Terminal
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Web => write!(f, "web"),
            Mode::Terminal => write!(f, "terminal"),
        }
    }
}

/// A place credentials can be read from.
pub trait CredentialSource {
    /// Human readable location, used in error messages.
    fn describe(&self) -> String;

    /// Returns the value stored under `key`, if any.
    fn lookup(&self, key: &str) -> Result<Option<String>, LLMError>;
}

/// Reads credentials from the process environment, falling back to a
/// dotenv-style file.
///
/// The file is parsed on every lookup and never written into the process
/// environment. Variables already set in the environment win over the file.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn lookup_file(&self, key: &str) -> Result<Option<String>, LLMError> {
        let iter = match dotenvy::from_path_iter(&self.path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => return Ok(None),
            Err(e) => {
                return Err(LLMError::Generic(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        for item in iter {
            let (name, value) = item.map_err(|e| {
                LLMError::Generic(format!("Failed to parse {}: {e}", self.path.display()))
            })?;
            if name == key {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl CredentialSource for EnvFile {
    fn describe(&self) -> String {
        format!("environment or env file {}", self.path.display())
    }

    fn lookup(&self, key: &str) -> Result<Option<String>, LLMError> {
        match std::env::var(key) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            _ => self.lookup_file(key),
        }
    }
}

/// Raw settings, parsed from command-line flags or their environment
/// variables.
#[derive(Debug, Clone, clap::Args)]
pub struct Settings {
    /// Front-end to run: `streamlit` for the browser page, anything else for the terminal
    #[arg(long, env = "MODE", default_value = "streamlit")]
    pub mode: String,

    /// Model route in the form provider/model
    #[arg(long, env = "LLM_CHAT_MODEL", default_value = DEFAULT_MODEL_ROUTE)]
    pub model: String,

    /// Directory holding chat_history.json and the saved transcripts
    #[arg(long, env = "LLM_CHAT_HISTORY_DIR", default_value = ".")]
    pub history_dir: PathBuf,

    /// Address the web front-end listens on
    #[arg(long, env = "LLM_CHAT_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Secrets file used in web mode (defaults to ~/.llm-chat/secrets.json)
    #[arg(long, env = "LLM_CHAT_SECRETS")]
    pub secrets: Option<PathBuf>,

    /// Env file used in terminal mode
    #[arg(long, env = "LLM_CHAT_ENV_FILE", default_value = ".env")]
    pub env_file: PathBuf,

    /// System prompt to set context
    #[arg(long)]
    pub system: Option<String>,

    /// Temperature setting (0.0-1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens in the response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Base URL of the model API
    #[arg(long, env = "LLM_CHAT_BASE_URL")]
    pub base_url: Option<String>,

    /// Seconds before an unused web session is saved and closed (0 disables)
    #[arg(long, env = "LLM_CHAT_IDLE_TIMEOUT", default_value_t = DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: "streamlit".to_string(),
            model: DEFAULT_MODEL_ROUTE.to_string(),
            history_dir: PathBuf::from("."),
            bind: DEFAULT_BIND.to_string(),
            secrets: None,
            env_file: PathBuf::from(".env"),
            system: None,
            temperature: None,
            max_tokens: None,
            timeout: None,
            base_url: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn mode(&self) -> Mode {
        Mode::from_flag(&self.mode)
    }

    /// Opens the secrets store at the configured or default path.
    pub fn secret_store(&self) -> Result<SecretStore, LLMError> {
        let path = match &self.secrets {
            Some(path) => path.clone(),
            None => SecretStore::default_path()?,
        };
        Ok(SecretStore::open(path)?)
    }

    /// The credential backend the given mode reads from.
    pub fn credential_source(&self, mode: Mode) -> Result<Box<dyn CredentialSource>, LLMError> {
        Ok(match mode {
            Mode::Web => Box::new(self.secret_store()?),
            Mode::Terminal => Box::new(EnvFile::new(&self.env_file)),
        })
    }
}

/// Resolved, immutable configuration.
#[derive(Clone)]
pub struct Config {
    pub mode: Mode,
    pub api_key: String,
    pub model: String,
    pub history_dir: PathBuf,
    pub bind: String,
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub base_url: Option<String>,
    pub idle_timeout: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("mode", &self.mode)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("history_dir", &self.history_dir)
            .field("bind", &self.bind)
            .field("system", &self.system)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("base_url", &self.base_url)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

impl Config {
    /// Resolves the configuration, reading the credential from the backend
    /// the mode selects.
    pub fn resolve(settings: &Settings) -> Result<Self, LLMError> {
        let source = settings.credential_source(settings.mode())?;
        Self::resolve_with(settings, source.as_ref())
    }

    /// Resolves the configuration against an explicit credential source.
    ///
    /// # Errors
    ///
    /// [`LLMError::MissingCredential`] when the source has no non-empty
    /// `GEMINI_API_KEY`; [`LLMError::InvalidRequest`] for a bad model route.
    pub fn resolve_with(
        settings: &Settings,
        source: &dyn CredentialSource,
    ) -> Result<Self, LLMError> {
        let api_key = source
            .lookup(API_KEY_NAME)?
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| LLMError::MissingCredential {
                key: API_KEY_NAME.to_string(),
                source: source.describe(),
            })?;

        parse_model_route(&settings.model)?;

        Ok(Self {
            mode: settings.mode(),
            api_key,
            model: settings.model.clone(),
            history_dir: settings.history_dir.clone(),
            bind: settings.bind.clone(),
            system: settings.system.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout_seconds: settings.timeout,
            base_url: settings.base_url.clone(),
            idle_timeout: (settings.idle_timeout > 0)
                .then(|| Duration::from_secs(settings.idle_timeout)),
        })
    }

    /// Builds the completion client described by this configuration.
    pub fn build_provider(&self) -> Result<Box<dyn ChatProvider>, LLMError> {
        let mut builder = LLMBuilder::new()
            .route(&self.model)?
            .api_key(self.api_key.clone());
        if let Some(system) = &self.system {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(timeout) = self.timeout_seconds {
            builder = builder.timeout_seconds(timeout);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }
        builder.build()
    }

    pub fn history_store(&self) -> HistoryStore {
        HistoryStore::new(&self.history_dir)
    }
}
