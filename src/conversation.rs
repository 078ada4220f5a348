//! The conversation engine shared by every front-end.
//!
//! A [`Session`] owns one [`Transcript`] for its whole lifetime. Each turn
//! appends the user's entry, sends the full transcript to the provider and
//! appends the reply. Entries are never edited or removed. When the session
//! ends, the transcript is written to a new timestamped file by the
//! [`HistoryStore`].

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::{ChatMessage, ChatProvider};
use crate::error::LLMError;

/// File a new session's transcript is seeded from, if present.
pub const SEED_FILE_NAME: &str = "chat_history.json";

/// Ordered, append-only list of conversation entries.
///
/// Serializes as a bare JSON array of `{role, content}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Reads a transcript from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LLMError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl From<Vec<ChatMessage>> for Transcript {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}

/// Directory where transcripts are read from and written to.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn seed_path(&self) -> PathBuf {
        self.dir.join(SEED_FILE_NAME)
    }

    /// Loads the seed transcript, or an empty one when the seed file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// An existing seed that cannot be read or is not a JSON array of
    /// entries is an error; the session must not start from it.
    pub fn load_seed(&self) -> Result<Transcript, LLMError> {
        let path = self.seed_path();
        match Transcript::load(&path) {
            Ok(transcript) => {
                log::debug!(
                    "Loaded {} entries from {}",
                    transcript.len(),
                    path.display()
                );
                Ok(transcript)
            }
            Err(LLMError::IoError(_)) if !path.exists() => Ok(Transcript::new()),
            Err(e) => Err(e),
        }
    }

    /// Writes the transcript to `chat_history_<YYYYMMDD_HHMMSS>.json`,
    /// stamped with the current local time.
    pub fn persist(&self, transcript: &Transcript) -> Result<PathBuf, LLMError> {
        self.persist_at(transcript, Local::now())
    }

    /// Writes the transcript to a file stamped with `now`.
    ///
    /// Existing files are never overwritten: if the stamped name is taken,
    /// `_1`, `_2`, ... is appended until a free name is found.
    pub fn persist_at(
        &self,
        transcript: &Transcript,
        now: DateTime<Local>,
    ) -> Result<PathBuf, LLMError> {
        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir)?;
        }
        let json = serde_json::to_string_pretty(transcript)?;
        let stamp = now.format("%Y%m%d_%H%M%S").to_string();

        for attempt in 0..1000u32 {
            let path = self.dir.join(history_file_name(&stamp, attempt));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(LLMError::IoError(format!(
            "no free transcript file name for {stamp} in {}",
            self.dir.display()
        )))
    }
}

fn history_file_name(stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("chat_history_{stamp}.json")
    } else {
        format!("chat_history_{stamp}_{attempt}.json")
    }
}

/// One user's conversation, from start to final flush.
pub struct Session {
    id: Uuid,
    transcript: Transcript,
    provider: Arc<dyn ChatProvider>,
    store: HistoryStore,
    last_active: Instant,
    closed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("entries", &self.transcript.len())
            .field("store", &self.store)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Session {
    /// Starts a session seeded from the store's `chat_history.json`.
    pub fn start(provider: Arc<dyn ChatProvider>, store: HistoryStore) -> Result<Self, LLMError> {
        let transcript = store.load_seed()?;
        let session = Self::with_transcript(provider, store, transcript);
        log::info!(
            "Session {} started with {} entries",
            session.id,
            session.transcript.len()
        );
        Ok(session)
    }

    /// Starts a session from an explicit transcript.
    pub fn with_transcript(
        provider: Arc<dyn ChatProvider>,
        store: HistoryStore,
        transcript: Transcript,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript,
            provider,
            store,
            last_active: Instant::now(),
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether [`Session::close`] has run. A closed session takes no more turns.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Time since the session started or last ran a turn.
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    /// Runs one turn and returns the assistant's reply.
    ///
    /// The user entry is appended before the call and stays in the
    /// transcript even when the call fails; the assistant entry is appended
    /// only on success.
    ///
    /// # Errors
    ///
    /// A closed session rejects the turn with [`LLMError::InvalidRequest`]
    /// and leaves the transcript untouched.
    pub async fn send(&mut self, text: &str) -> Result<String, LLMError> {
        if self.closed {
            return Err(LLMError::InvalidRequest(format!(
                "Session {} has ended",
                self.id
            )));
        }
        self.last_active = Instant::now();
        self.transcript
            .push(ChatMessage::user().content(text).build());

        let result = self
            .provider
            .chat(self.transcript.messages())
            .await
            .and_then(|response| {
                response
                    .text()
                    .ok_or_else(|| LLMError::ProviderError("empty response".to_string()))
            });
        self.last_active = Instant::now();

        match result {
            Ok(reply) => {
                self.transcript
                    .push(ChatMessage::assistant().content(reply.clone()).build());
                Ok(reply)
            }
            Err(e) => {
                log::warn!("Session {} turn failed: {e}", self.id);
                Err(e)
            }
        }
    }

    /// Writes the transcript to a new timestamped file.
    pub fn finish(&self) -> Result<PathBuf, LLMError> {
        let path = self.store.persist(&self.transcript)?;
        log::info!(
            "Session {} saved {} entries to {}",
            self.id,
            self.transcript.len(),
            path.display()
        );
        Ok(path)
    }

    /// Marks the session closed and writes its final transcript.
    pub fn close(&mut self) -> Result<PathBuf, LLMError> {
        self.closed = true;
        self.finish()
    }
}
