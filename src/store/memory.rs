use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use chrono::{DateTime, Duration, Utc};
use crate::error::StoreError;
use crate::utils::generate_token;
use super::{AcceptOutcome, GameMode, RejectReason, RoundSession, RoundSummary, SessionStore};

/// Single-process session map. Every check-then-update happens under one lock.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, RoundSession>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        MemorySessionStore {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RoundSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stale(&self, session: &RoundSession, now: DateTime<Utc>) -> bool {
        now - session.created_at > self.ttl
    }

    /// Live session by id. Stale entries are dropped on the way.
    fn live<'a>(
        &self,
        sessions: &'a mut HashMap<String, RoundSession>,
        id: &str,
        now: DateTime<Utc>,
    ) -> Option<&'a mut RoundSession> {
        let stale = self.is_stale(sessions.get(id)?, now);
        if stale {
            sessions.remove(id);
            return None;
        }
        sessions.get_mut(id)
    }

    pub(crate) fn insert_at(&self, letters: &[char], level: u32, mode: GameMode, now: DateTime<Utc>) -> String {
        let id = generate_token();
        let session = RoundSession::new(id.clone(), letters, level, mode, now);
        self.lock().insert(id.clone(), session);
        id
    }

    /// Drop sessions older than the TTL. Returns how many were evicted.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| now - session.created_at <= self.ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn create(&self, letters: &[char], level: u32, mode: GameMode) -> Result<String, StoreError> {
        Ok(self.insert_at(letters, level, mode, Utc::now()))
    }

    async fn get(&self, id: &str) -> Result<Option<RoundSession>, StoreError> {
        let mut sessions = self.lock();
        Ok(self.live(&mut sessions, id, Utc::now()).map(|s| s.clone()))
    }

    async fn accept_word(&self, id: &str, word: &str, points: u32) -> Result<AcceptOutcome, StoreError> {
        let mut sessions = self.lock();
        let session = match self.live(&mut sessions, id, Utc::now()) {
            Some(session) => session,
            None => return Ok(AcceptOutcome::Rejected(RejectReason::SessionNotFound)),
        };

        if !session.found_words.insert(word.to_ascii_uppercase()) {
            return Ok(AcceptOutcome::Rejected(RejectReason::AlreadyFound));
        }
        session.score += points;
        Ok(AcceptOutcome::Accepted { score: session.score })
    }

    async fn close(&self, id: &str) -> Result<Option<RoundSummary>, StoreError> {
        let mut sessions = self.lock();
        let now = Utc::now();
        Ok(sessions
            .remove(id)
            .filter(|session| !self.is_stale(session, now))
            .map(|session| session.summary()))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn letters() -> Vec<char> {
        "CASTLE".chars().collect()
    }

    fn store() -> MemorySessionStore {
        MemorySessionStore::new(Duration::hours(2))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store();
        let id = store.create(&letters(), 1, GameMode::Timed).await.unwrap();

        let session = store.get(&id).await.unwrap().unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.letters, letters());
        assert_eq!(session.level, 1);
        assert_eq!(session.mode, GameMode::Timed);
        assert_eq!(session.score, 0);
        assert!(session.found_words.is_empty());

        assert!(store.get("nope").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_accept_word_once() {
        let store = store();
        let id = store.create(&letters(), 1, GameMode::Timed).await.unwrap();

        assert_eq!(
            store.accept_word(&id, "CAT", 30).await.unwrap(),
            AcceptOutcome::Accepted { score: 30 }
        );
        assert_eq!(
            store.accept_word(&id, "cat", 30).await.unwrap(),
            AcceptOutcome::Rejected(RejectReason::AlreadyFound)
        );
        assert_eq!(
            store.accept_word(&id, "CASTLE", 75).await.unwrap(),
            AcceptOutcome::Accepted { score: 105 }
        );
        assert_eq!(
            store.accept_word("missing", "CAT", 30).await.unwrap(),
            AcceptOutcome::Rejected(RejectReason::SessionNotFound)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_credit_once() {
        let store = Arc::new(store());
        let id = store.create(&letters(), 1, GameMode::Timed).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = id.clone();
                tokio::spawn(async move { store.accept_word(&id, "SLATE", 60).await.unwrap() })
            })
            .collect();

        let mut accepted = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                AcceptOutcome::Accepted { score } => {
                    assert_eq!(score, 60);
                    accepted += 1;
                }
                AcceptOutcome::Rejected(RejectReason::AlreadyFound) => duplicates += 1,
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(store.get(&id).await.unwrap().unwrap().score, 60);
    }

    #[tokio::test]
    async fn test_summarize_then_close() {
        let store = store();
        let id = store.create(&letters(), 2, GameMode::Untimed).await.unwrap();
        store.accept_word(&id, "CAT", 30).await.unwrap();
        store.accept_word(&id, "LAST", 45).await.unwrap();

        let summary = store.summarize(&id).await.unwrap().unwrap();
        assert_eq!(summary.score, 75);
        assert_eq!(summary.words_found, 2);
        assert_eq!(summary.found_words, vec!["CAT", "LAST"]);

        let closed = store.close(&id).await.unwrap().unwrap();
        assert_eq!(closed, summary);

        assert!(store.close(&id).await.unwrap().is_none());
        assert!(store.summarize(&id).await.unwrap().is_none());
        assert_eq!(
            store.accept_word(&id, "SALT", 45).await.unwrap(),
            AcceptOutcome::Rejected(RejectReason::SessionNotFound)
        );
    }

    #[tokio::test]
    async fn test_stale_sessions_disappear() {
        let store = MemorySessionStore::new(Duration::minutes(30));
        let old = store.insert_at(&letters(), 1, GameMode::Timed, Utc::now() - Duration::hours(1));
        let fresh = store.insert_at(&letters(), 1, GameMode::Timed, Utc::now());

        assert!(store.get(&old).await.unwrap().is_none());
        assert_eq!(
            store.accept_word(&old, "CAT", 30).await.unwrap(),
            AcceptOutcome::Rejected(RejectReason::SessionNotFound)
        );
        assert!(store.get(&fresh).await.unwrap().is_some());
    }

    #[test]
    fn test_purge_expired() {
        let store = MemorySessionStore::new(Duration::minutes(30));
        let now = Utc::now();
        store.insert_at(&letters(), 1, GameMode::Timed, now - Duration::hours(3));
        store.insert_at(&letters(), 1, GameMode::Timed, now - Duration::minutes(31));
        let keep = store.insert_at(&letters(), 1, GameMode::Timed, now);

        assert_eq!(store.purge_expired(now), 2);
        assert_eq!(store.len(), 1);
        assert!(store.lock().contains_key(&keep));
        assert_eq!(store.purge_expired(now), 0);
    }
}
