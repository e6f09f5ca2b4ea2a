use serde::{Deserialize, Serialize};
use crate::game::Game;
use crate::store::{AdminSessionStore, FallbackStore, MemorySessionStore, RedisSessionStore, SharedConnection};

/// Round sessions live in Redis when it is reachable, otherwise in this process.
pub type RoundStore = FallbackStore<RedisSessionStore, MemorySessionStore>;

/// Configured admin login, if any.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Application state shared across all handlers
pub struct AppState {
    pub game: Game<RoundStore>,
    pub admin_sessions: AdminSessionStore,
    pub admin: Option<AdminCredentials>,
    /// Present when a Redis URL was configured, connected or not.
    pub redis: Option<SharedConnection>,
}

#[derive(Deserialize)]
pub struct PuzzleQuery {
    pub level: Option<u32>,
    pub mode: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub session_id: String,
    pub word: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct SolutionsResponse {
    pub words: Vec<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse { error: message.into() }
    }
}

#[derive(Deserialize)]
pub struct AdminLogin {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub dictionary_size: usize,
    pub cached_puzzles: usize,
    pub active_sessions: usize,
    pub shared_store: bool,
}
