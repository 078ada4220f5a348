use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::CredentialSource;
use crate::error::LLMError;

/// A storage for API keys and other sensitive information
///
/// Secrets live in a flat JSON object on disk (`{"GEMINI_API_KEY": "..."}`),
/// by default at `~/.llm-chat/secrets.json`. The web front-end reads its
/// credential from here.
#[derive(Debug, Serialize, Deserialize)]
pub struct SecretStore {
    /// Map of secret keys to their values
    secrets: HashMap<String, String>,
    /// Path to the secrets file
    file_path: PathBuf,
}

impl SecretStore {
    /// Default secrets file, `~/.llm-chat/secrets.json`.
    pub fn default_path() -> io::Result<PathBuf> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not find home directory")
        })?;
        Ok(home_dir.join(".llm-chat").join("secrets.json"))
    }

    /// Opens the store backed by `path`, loading any secrets already saved.
    ///
    /// A missing file is an empty store; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let mut store = SecretStore {
            secrets: HashMap::new(),
            file_path: path.into(),
        };
        store.load()?;
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(&mut self) -> io::Result<()> {
        match File::open(&self.file_path) {
            Ok(mut file) => {
                let mut contents = String::new();
                file.read_to_string(&mut contents)?;
                self.secrets = serde_json::from_str(&contents).map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("{}: {e}", self.file_path.display()),
                    )
                })?;
                Ok(())
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(&self.secrets)?;
        let mut file = File::create(&self.file_path)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    /// Sets a secret value for the given key and saves the store
    pub fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.secrets.insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Retrieves a secret value for the given key
    pub fn get(&self, key: &str) -> Option<&String> {
        self.secrets.get(key)
    }

    /// Deletes a secret with the given key and saves the store
    pub fn delete(&mut self, key: &str) -> io::Result<()> {
        self.secrets.remove(key);
        self.save()
    }
}

impl CredentialSource for SecretStore {
    fn describe(&self) -> String {
        format!("secrets store {}", self.file_path.display())
    }

    fn lookup(&self, key: &str) -> Result<Option<String>, LLMError> {
        Ok(self.get(key).cloned())
    }
}
