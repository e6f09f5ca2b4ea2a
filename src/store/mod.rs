//! Round session state. Two interchangeable backends sit behind [`SessionStore`]:
//! Redis, shared by every server process, and an in-process map used when Redis
//! cannot be reached. [`FallbackStore`] tries the first and quietly drops to the
//! second on connectivity errors.
//!
//! Sessions created on the in-process backend are visible only to the process
//! that created them, during the outage and after Redis comes back. With
//! several instances behind a load balancer, a round started during a Redis
//! outage can only be played against the instance that dealt it. That gap is
//! accepted; the in-process store is not replicated.

pub mod admin;
pub mod fallback;
pub mod memory;
pub mod redis;

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::StoreError;

pub use admin::AdminSessionStore;
pub use fallback::FallbackStore;
pub use memory::MemorySessionStore;
pub use self::redis::{RedisSessionStore, SharedConnection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Timed,
    Untimed,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Timed => "timed",
            GameMode::Untimed => "untimed",
        }
    }

    /// Anything other than "untimed" plays against the clock.
    pub fn from_query(mode: Option<&str>) -> Self {
        match mode {
            Some(m) if m.eq_ignore_ascii_case("untimed") => GameMode::Untimed,
            _ => GameMode::Timed,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timed" => Ok(GameMode::Timed),
            "untimed" => Ok(GameMode::Untimed),
            other => Err(format!("unknown game mode '{}'", other)),
        }
    }
}

/// Authoritative server-side state of one puzzle attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSession {
    pub id: String,
    pub letters: Vec<char>,
    pub level: u32,
    pub mode: GameMode,
    pub found_words: HashSet<String>,
    pub score: u32,
    pub created_at: DateTime<Utc>,
}

impl RoundSession {
    pub fn new(id: String, letters: &[char], level: u32, mode: GameMode, created_at: DateTime<Utc>) -> Self {
        RoundSession {
            id,
            letters: letters.iter().map(|c| c.to_ascii_uppercase()).collect(),
            level,
            mode,
            found_words: HashSet::new(),
            score: 0,
            created_at,
        }
    }

    pub fn summary(&self) -> RoundSummary {
        let mut found_words: Vec<String> = self.found_words.iter().cloned().collect();
        found_words.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        RoundSummary {
            letters: self.letters.clone(),
            level: self.level,
            game_mode: self.mode,
            words_found: found_words.len(),
            score: self.score,
            found_words,
        }
    }
}

/// Snapshot handed to the score keeper when a round ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub letters: Vec<char>,
    pub level: u32,
    pub game_mode: GameMode,
    pub words_found: usize,
    pub score: u32,
    pub found_words: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    SessionNotFound,
    AlreadyFound,
    TimeExpired,
    InvalidWord,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::SessionNotFound => "Invalid or expired session",
            RejectReason::AlreadyFound => "Word already found",
            RejectReason::TimeExpired => "Time expired",
            RejectReason::InvalidWord => "Not a valid word",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted { score: u32 },
    Rejected(RejectReason),
}

/// Storage contract for round sessions.
///
/// `accept_word` is atomic per session: of any number of concurrent calls
/// crediting the same word, exactly one is accepted and the rest report
/// [`RejectReason::AlreadyFound`]. A session's lifetime is fixed at creation;
/// accepting words never extends it.
///
/// Errors mean the backend failed. "No such session" and "already found" are
/// ordinary results, not errors.
pub trait SessionStore: Send + Sync {
    fn create(
        &self,
        letters: &[char],
        level: u32,
        mode: GameMode,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = Result<Option<RoundSession>, StoreError>> + Send;

    fn accept_word(
        &self,
        id: &str,
        word: &str,
        points: u32,
    ) -> impl Future<Output = Result<AcceptOutcome, StoreError>> + Send;

    /// Read-only snapshot; the session stays open.
    fn summarize(&self, id: &str) -> impl Future<Output = Result<Option<RoundSummary>, StoreError>> + Send {
        async move { Ok(self.get(id).await?.map(|session| session.summary())) }
    }

    /// Snapshot and remove in one step. A closed session is gone for good.
    fn close(&self, id: &str) -> impl Future<Output = Result<Option<RoundSummary>, StoreError>> + Send;

    /// Approximate number of open sessions, for monitoring.
    fn count(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
