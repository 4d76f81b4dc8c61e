//! Shared application state: the composition root owning both registries.

pub mod registry;
pub mod scoring;
pub mod session;
pub mod timer;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::AppConfig;

pub use self::registry::{SessionHandle, SessionRegistry};

/// Cheaply cloneable handle on the application state.
pub type SharedState = Arc<AppState>;

/// Identifier assigned to each WebSocket connection for its lifetime.
pub type ConnectionId = Uuid;

/// Role a connection holds inside its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    /// The single connection allowed to drive the quiz.
    Host,
    /// A participant submitting answers.
    Player,
}

/// Statically-shaped record kept for every bound connection.
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    /// Role the connection plays in its session.
    pub role: ConnectionRole,
    /// Join code of the session the connection belongs to.
    pub session: String,
    /// Channel feeding the connection's writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state shared by routes, sockets, and timer tasks.
pub struct AppState {
    config: AppConfig,
    http: reqwest::Client,
    sessions: SessionRegistry,
    connections: DashMap<ConnectionId, ConnectionEntry>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            http: reqwest::Client::new(),
            sessions: SessionRegistry::new(),
            connections: DashMap::new(),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// HTTP client used for the question-generation service.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Registry of live sessions keyed by join code.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Registry of bound connections keyed by their identifier.
    pub fn connections(&self) -> &DashMap<ConnectionId, ConnectionEntry> {
        &self.connections
    }

    /// Whether a connection id currently refers to a bound, live socket.
    pub fn connection_is_live(&self, conn: ConnectionId) -> bool {
        self.connections.contains_key(&conn)
    }
}
