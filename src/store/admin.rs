use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use chrono::{DateTime, Duration, Utc};
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, RedisResult};
use log::warn;
use crate::utils::generate_token;
use super::redis::SharedConnection;

const KEY_PREFIX: &str = "wordtwist:admin:";

/// Admin login tokens: opaque id -> creation time, nothing else.
/// Uses Redis when connected and falls back to a local map otherwise.
pub struct AdminSessionStore {
    redis: Option<SharedConnection>,
    local: Mutex<HashMap<String, DateTime<Utc>>>,
    ttl: Duration,
}

impl AdminSessionStore {
    pub fn new(redis: Option<SharedConnection>, ttl: Duration) -> Self {
        AdminSessionStore {
            redis,
            local: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn local(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn redis(&self) -> Option<ConnectionManager> {
        self.redis.as_ref()?.get().ok()
    }

    fn key(token: &str) -> String {
        format!("{}{}", KEY_PREFIX, token)
    }

    pub async fn create(&self) -> String {
        let token = generate_token();
        let now = Utc::now();

        if let Some(mut conn) = self.redis() {
            let stored: RedisResult<()> = ::redis::cmd("SET")
                .arg(Self::key(&token))
                .arg(now.timestamp_millis())
                .arg("PX")
                .arg(self.ttl.num_milliseconds())
                .query_async(&mut conn)
                .await;
            match stored {
                Ok(()) => return token,
                Err(e) => warn!("Admin session create failed on Redis, using local store: {}", e),
            }
        }

        self.local().insert(token.clone(), now);
        token
    }

    pub async fn validate(&self, token: &str) -> bool {
        if let Some(mut conn) = self.redis() {
            match conn.exists::<_, bool>(Self::key(token)).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => warn!("Admin session lookup failed on Redis, using local store: {}", e),
            }
        }

        let now = Utc::now();
        let mut local = self.local();
        match local.get(token) {
            Some(created) if now - *created <= self.ttl => true,
            Some(_) => {
                local.remove(token);
                false
            }
            None => false,
        }
    }

    pub async fn delete(&self, token: &str) {
        if let Some(mut conn) = self.redis() {
            if let Err(e) = conn.del::<_, ()>(Self::key(token)).await {
                warn!("Admin session delete failed on Redis: {}", e);
            }
        }
        self.local().remove(token);
    }

    #[cfg(test)]
    pub(crate) fn insert_local_at(&self, token: &str, created: DateTime<Utc>) {
        self.local().insert(token.to_string(), created);
    }

    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut local = self.local();
        let before = local.len();
        local.retain(|_, created| now - *created <= self.ttl);
        before - local.len()
    }
}
