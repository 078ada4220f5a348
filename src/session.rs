//! Registry of live sessions for front-ends that serve several users at once.
//!
//! Every session sits behind its own mutex, so one session handles a single
//! turn at a time while other sessions keep going. The registry itself only
//! holds the map lock long enough to insert, look up or remove an entry.
//!
//! A session removed from the registry is closed under its own lock, so a
//! handler that looked it up just before the removal finds it closed and
//! cannot add an unsaved turn.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::conversation::Session;
use crate::error::LLMError;

/// Handle to a session shared between request handlers.
pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a started session and returns its id.
    pub async fn open(&self, session: Session) -> Uuid {
        let id = session.id();
        self.inner
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes the session, closes it and flushes its transcript.
    ///
    /// Returns `Ok(None)` when no session has this id. A turn still in
    /// flight finishes before the flush.
    pub async fn close(&self, id: &Uuid) -> Result<Option<PathBuf>, LLMError> {
        let Some(session) = self.inner.write().await.remove(id) else {
            return Ok(None);
        };
        let mut session = session.lock().await;
        session.close().map(Some)
    }

    /// Removes, closes and flushes every open session.
    ///
    /// Flush failures are logged and skipped so one bad session does not
    /// keep the others from being saved.
    pub async fn close_all(&self) -> Vec<PathBuf> {
        let drained: Vec<SharedSession> = self
            .inner
            .write()
            .await
            .drain()
            .map(|(_, session)| session)
            .collect();
        close_each(drained).await
    }

    /// Closes and flushes every session that has not run a turn for at
    /// least `max_idle`.
    ///
    /// Sessions in the middle of a turn are left alone.
    pub async fn expire_idle(&self, max_idle: Duration) -> Vec<PathBuf> {
        let expired: Vec<SharedSession> = {
            let mut map = self.inner.write().await;
            let stale: Vec<Uuid> = map
                .iter()
                .filter(|(_, session)| {
                    session
                        .try_lock()
                        .map(|session| session.idle_for() >= max_idle)
                        .unwrap_or(false)
                })
                .map(|(id, _)| *id)
                .collect();
            stale.iter().filter_map(|id| map.remove(id)).collect()
        };
        if !expired.is_empty() {
            log::info!("Expiring {} idle session(s)", expired.len());
        }
        close_each(expired).await
    }
}

async fn close_each(sessions: Vec<SharedSession>) -> Vec<PathBuf> {
    let mut saved = Vec::with_capacity(sessions.len());
    for session in sessions {
        let mut session = session.lock().await;
        match session.close() {
            Ok(path) => saved.push(path),
            Err(e) => log::warn!("Failed to save session {}: {e}", session.id()),
        }
    }
    saved
}
