//! Web front-end for the conversation engine.
//!
//! Serves a single chat page plus a small JSON API the page drives. Each
//! browser tab gets its own session; sessions still open when the server
//! stops are flushed to disk on the way out. With an idle timeout set, a
//! background sweeper also saves and drops sessions whose tab went away
//! without ending them.

mod handlers;
mod page;
mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::chat::ChatProvider;
use crate::conversation::HistoryStore;
use crate::error::LLMError;
use crate::session::SessionRegistry;

pub use types::{EndResponse, MessageRequest, MessageResponse, SessionView};

/// Web server owning the provider, the history directory and the live sessions
pub struct Server {
    provider: Arc<dyn ChatProvider>,
    store: HistoryStore,
    sessions: SessionRegistry,
    idle_timeout: Option<Duration>,
}

/// Internal server state shared between request handlers
#[derive(Clone)]
struct ServerState {
    provider: Arc<dyn ChatProvider>,
    store: HistoryStore,
    sessions: SessionRegistry,
}

impl Server {
    pub fn new(provider: Arc<dyn ChatProvider>, store: HistoryStore) -> Self {
        Self {
            provider,
            store,
            sessions: SessionRegistry::new(),
            idle_timeout: None,
        }
    }

    /// Saves and drops sessions that have been unused for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Live sessions, shared with the running server.
    pub fn sessions(&self) -> SessionRegistry {
        self.sessions.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handlers::index))
            .route("/api/sessions", post(handlers::create_session))
            .route("/api/sessions/{id}", get(handlers::get_session))
            .route("/api/sessions/{id}/messages", post(handlers::send_message))
            .route("/api/sessions/{id}/end", post(handlers::end_session))
            .layer(CorsLayer::permissive())
            .with_state(ServerState {
                provider: self.provider.clone(),
                store: self.store.clone(),
                sessions: self.sessions.clone(),
            })
    }

    /// Binds `addr` and serves until Ctrl-C or SIGTERM.
    pub async fn run(self, addr: &str) -> Result<(), LLMError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| LLMError::IoError(format!("Failed to bind {addr}: {e}")))?;
        log::info!("Listening on http://{addr}");
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves, then
    /// flushes every session that is still open.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), LLMError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let sweeper = self
            .idle_timeout
            .map(|max_idle| tokio::spawn(sweep_idle(self.sessions.clone(), max_idle)));

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| LLMError::IoError(e.to_string()));
        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        served?;

        let saved = self.sessions.close_all().await;
        log::info!("Saved {} open session(s) on shutdown", saved.len());
        Ok(())
    }
}

async fn sweep_idle(sessions: SessionRegistry, max_idle: Duration) {
    let period = (max_idle / 2).clamp(Duration::from_millis(50), Duration::from_secs(60));
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        let saved = sessions.expire_idle(max_idle).await;
        if !saved.is_empty() {
            log::info!("Saved {} idle session(s)", saved.len());
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::warn!("Failed to register SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received SIGINT"),
        _ = terminate => log::info!("Received SIGTERM"),
    }
}
