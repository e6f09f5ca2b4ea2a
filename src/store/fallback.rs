use log::warn;
use crate::error::StoreError;
use super::{AcceptOutcome, GameMode, RejectReason, RoundSession, RoundSummary, SessionStore};

/// Tries `primary` and, when it fails with a connectivity error, serves the
/// same call from `fallback`. Sessions dealt by the fallback during an outage
/// stay there, so a lookup the primary answers with "no such session" is
/// retried against the fallback. Any other primary outcome is final. With no
/// primary configured every call goes straight to the fallback.
pub struct FallbackStore<P, S> {
    primary: Option<P>,
    fallback: S,
}

impl<P, S> FallbackStore<P, S> {
    pub fn new(primary: Option<P>, fallback: S) -> Self {
        FallbackStore { primary, fallback }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn fallback(&self) -> &S {
        &self.fallback
    }
}

/// Ok(Some) on success, Ok(None) when the fallback should take over.
fn absorb<T>(op: &str, result: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_recoverable() => {
            warn!("Session {} failed on shared store, using in-process store: {}", op, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl<P: SessionStore, S: SessionStore> SessionStore for FallbackStore<P, S> {
    async fn create(&self, letters: &[char], level: u32, mode: GameMode) -> Result<String, StoreError> {
        if let Some(primary) = &self.primary {
            if let Some(id) = absorb("create", primary.create(letters, level, mode).await)? {
                return Ok(id);
            }
        }
        self.fallback.create(letters, level, mode).await
    }

    async fn get(&self, id: &str) -> Result<Option<RoundSession>, StoreError> {
        if let Some(primary) = &self.primary {
            if let Some(Some(session)) = absorb("get", primary.get(id).await)? {
                return Ok(Some(session));
            }
        }
        self.fallback.get(id).await
    }

    async fn accept_word(&self, id: &str, word: &str, points: u32) -> Result<AcceptOutcome, StoreError> {
        if let Some(primary) = &self.primary {
            match absorb("accept", primary.accept_word(id, word, points).await)? {
                Some(AcceptOutcome::Rejected(RejectReason::SessionNotFound)) | None => {}
                Some(outcome) => return Ok(outcome),
            }
        }
        self.fallback.accept_word(id, word, points).await
    }

    async fn summarize(&self, id: &str) -> Result<Option<RoundSummary>, StoreError> {
        if let Some(primary) = &self.primary {
            if let Some(Some(summary)) = absorb("summarize", primary.summarize(id).await)? {
                return Ok(Some(summary));
            }
        }
        self.fallback.summarize(id).await
    }

    async fn close(&self, id: &str) -> Result<Option<RoundSummary>, StoreError> {
        if let Some(primary) = &self.primary {
            if let Some(Some(summary)) = absorb("close", primary.close(id).await)? {
                return Ok(Some(summary));
            }
        }
        self.fallback.close(id).await
    }

    /// Shared sessions plus whatever the in-process store holds.
    async fn count(&self) -> Result<usize, StoreError> {
        let mut total = self.fallback.count().await?;
        if let Some(primary) = &self.primary {
            total += absorb("count", primary.count().await)?.unwrap_or(0);
        }
        Ok(total)
    }
}
