use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ::redis::aio::ConnectionManager;
use ::redis::{Client, ErrorKind, RedisError, Script};
use log::{debug, error, info, warn};
use tokio::sync::OnceCell;
use crate::error::StoreError;
use crate::utils::generate_token;
use super::{AcceptOutcome, GameMode, RejectReason, RoundSession, RoundSummary, SessionStore};

const KEY_PREFIX: &str = "wordtwist:session:";

/// -1: no such session, -2: word already credited, otherwise the new score.
/// The words set inherits the session's remaining TTL; the session's own TTL is left alone.
const ACCEPT_WORD_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return -1
end
if redis.call('SADD', KEYS[2], ARGV[1]) == 0 then
  return -2
end
local ttl = redis.call('PTTL', KEYS[1])
if ttl > 0 then
  redis.call('PEXPIRE', KEYS[2], ttl)
end
return redis.call('HINCRBY', KEYS[1], 'score', ARGV[2])
"#;

const CLOSE_SCRIPT: &str = r#"
local fields = redis.call('HGETALL', KEYS[1])
if #fields == 0 then
  return false
end
local words = redis.call('SMEMBERS', KEYS[2])
redis.call('DEL', KEYS[1], KEYS[2])
return {fields, words}
"#;

/// Open a connection manager for `url`. It reconnects on its own after failures.
pub async fn connect(url: &str) -> Result<ConnectionManager, StoreError> {
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Connected to Redis for sessions");
    Ok(manager)
}

/// Slot for the Redis connection, filled once the server has been reached.
/// Clones share the slot. Until it is filled every command fails with a
/// recoverable backend error.
#[derive(Clone, Default)]
pub struct SharedConnection {
    slot: Arc<OnceCell<ConnectionManager>>,
}

impl SharedConnection {
    pub fn is_connected(&self) -> bool {
        self.slot.initialized()
    }

    /// Returns false if a connection was already installed.
    pub fn install(&self, conn: ConnectionManager) -> bool {
        self.slot.set(conn).is_ok()
    }

    pub fn get(&self) -> Result<ConnectionManager, StoreError> {
        self.slot.get().cloned().ok_or_else(|| {
            StoreError::Backend(RedisError::from((ErrorKind::IoError, "not connected to Redis")))
        })
    }
}

/// Retry `url` every `retry` until it answers, then install the connection.
/// Gives up only on a URL that can never work.
pub async fn connect_until_ready(url: String, shared: SharedConnection, retry: std::time::Duration) {
    let mut attempts: u32 = 0;
    loop {
        match connect(&url).await {
            Ok(conn) => {
                shared.install(conn);
                info!("Shared sessions restored after {} retries", attempts);
                return;
            }
            Err(StoreError::Backend(e)) if e.kind() == ErrorKind::InvalidClientConfig => {
                error!("Invalid Redis URL, staying on in-process sessions: {}", e);
                return;
            }
            Err(e) => debug!("Redis still unreachable: {}", e),
        }
        attempts += 1;
        if attempts % 60 == 0 {
            warn!("Redis unreachable after {} retries", attempts);
        }
        tokio::time::sleep(retry).await;
    }
}

/// Both keys share the `{id}` hash tag so they land in one cluster slot.
fn session_key(id: &str) -> String {
    format!("{}{{{}}}", KEY_PREFIX, id)
}

fn words_key(id: &str) -> String {
    format!("{}{{{}}}:words", KEY_PREFIX, id)
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str, StoreError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| StoreError::Corrupt(format!("missing field '{}'", name)))
}

fn parse_field<T: std::str::FromStr>(fields: &HashMap<String, String>, name: &str) -> Result<T, StoreError> {
    field(fields, name)?
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("invalid field '{}'", name)))
}

fn decode_session(
    id: &str,
    fields: &HashMap<String, String>,
    found_words: HashSet<String>,
) -> Result<RoundSession, StoreError> {
    let created_ms: i64 = parse_field(fields, "created_at")?;
    let created_at: DateTime<Utc> = Utc
        .timestamp_millis_opt(created_ms)
        .single()
        .ok_or_else(|| StoreError::Corrupt("invalid field 'created_at'".to_string()))?;

    Ok(RoundSession {
        id: id.to_string(),
        letters: field(fields, "letters")?.chars().collect(),
        level: parse_field(fields, "level")?,
        mode: parse_field(fields, "mode")?,
        found_words,
        score: parse_field(fields, "score")?,
        created_at,
    })
}

/// Sessions kept in Redis, one hash plus one set per round. Word acceptance
/// and closing run as server-side scripts so concurrent requests from any
/// number of processes see a consistent session.
pub struct RedisSessionStore {
    conn: SharedConnection,
    ttl: Duration,
    accept_script: Script,
    close_script: Script,
}

impl RedisSessionStore {
    pub fn new(conn: SharedConnection, ttl: Duration) -> Self {
        RedisSessionStore {
            conn,
            ttl,
            accept_script: Script::new(ACCEPT_WORD_SCRIPT),
            close_script: Script::new(CLOSE_SCRIPT),
        }
    }
}

impl SessionStore for RedisSessionStore {
    async fn create(&self, letters: &[char], level: u32, mode: GameMode) -> Result<String, StoreError> {
        let id = generate_token();
        let key = session_key(&id);
        let letters: String = letters.iter().map(|c| c.to_ascii_uppercase()).collect();

        let mut conn = self.conn.get()?;
        let _: () = ::redis::pipe()
            .atomic()
            .cmd("HSET")
            .arg(&key)
            .arg("letters")
            .arg(&letters)
            .arg("level")
            .arg(level)
            .arg("mode")
            .arg(mode.as_str())
            .arg("created_at")
            .arg(Utc::now().timestamp_millis())
            .arg("score")
            .arg(0)
            .ignore()
            .cmd("PEXPIRE")
            .arg(&key)
            .arg(self.ttl.num_milliseconds())
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<RoundSession>, StoreError> {
        let mut conn = self.conn.get()?;
        let (fields, words): (HashMap<String, String>, HashSet<String>) = ::redis::pipe()
            .atomic()
            .cmd("HGETALL")
            .arg(session_key(id))
            .cmd("SMEMBERS")
            .arg(words_key(id))
            .query_async(&mut conn)
            .await?;

        if fields.is_empty() {
            return Ok(None);
        }
        decode_session(id, &fields, words).map(Some)
    }

    async fn accept_word(&self, id: &str, word: &str, points: u32) -> Result<AcceptOutcome, StoreError> {
        let mut conn = self.conn.get()?;
        let result: i64 = self
            .accept_script
            .key(session_key(id))
            .key(words_key(id))
            .arg(word.to_ascii_uppercase())
            .arg(points)
            .invoke_async(&mut conn)
            .await?;

        Ok(match result {
            -1 => AcceptOutcome::Rejected(RejectReason::SessionNotFound),
            -2 => AcceptOutcome::Rejected(RejectReason::AlreadyFound),
            score => AcceptOutcome::Accepted {
                score: u32::try_from(score)
                    .map_err(|_| StoreError::Corrupt(format!("score out of range: {}", score)))?,
            },
        })
    }

    async fn close(&self, id: &str) -> Result<Option<RoundSummary>, StoreError> {
        let mut conn = self.conn.get()?;
        let closed: Option<(Vec<String>, Vec<String>)> = self
            .close_script
            .key(session_key(id))
            .key(words_key(id))
            .invoke_async(&mut conn)
            .await?;

        let Some((flat_fields, words)) = closed else {
            return Ok(None);
        };
        let fields: HashMap<String, String> = flat_fields
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        let session = decode_session(id, &fields, words.into_iter().collect())?;
        Ok(Some(session.summary()))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let mut conn = self.conn.get()?;
        let pattern = format!("{}{{*}}", KEY_PREFIX);
        let mut cursor: u64 = 0;
        let mut total = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = ::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut conn)
                .await?;
            total += keys.len();
            if next == 0 {
                return Ok(total);
            }
            cursor = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FallbackStore, MemorySessionStore};

    #[test]
    fn test_keys_share_hash_tag() {
        assert_eq!(session_key("abc123"), "wordtwist:session:{abc123}");
        assert_eq!(words_key("abc123"), "wordtwist:session:{abc123}:words");
    }

    fn record(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_decode_session() {
        let fields = record(&[
            ("letters", "ELTSAC"),
            ("level", "4"),
            ("mode", "untimed"),
            ("created_at", "1700000000000"),
            ("score", "105"),
        ]);
        let words: HashSet<String> = ["CAT", "CASTLE"].iter().map(|w| w.to_string()).collect();

        let session = decode_session("abc", &fields, words.clone()).unwrap();
        assert_eq!(session.letters, vec!['E', 'L', 'T', 'S', 'A', 'C']);
        assert_eq!(session.level, 4);
        assert_eq!(session.mode, GameMode::Untimed);
        assert_eq!(session.score, 105);
        assert_eq!(session.found_words, words);
        assert_eq!(session.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_decode_corrupt_session() {
        let missing = record(&[("letters", "CASTLE"), ("level", "1")]);
        assert!(matches!(
            decode_session("abc", &missing, HashSet::new()),
            Err(StoreError::Corrupt(_))
        ));

        let garbage = record(&[
            ("letters", "CASTLE"),
            ("level", "one"),
            ("mode", "timed"),
            ("created_at", "0"),
            ("score", "0"),
        ]);
        let err = decode_session("abc", &garbage, HashSet::new()).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_unconnected_store_reports_backend_error() {
        let store = RedisSessionStore::new(SharedConnection::default(), Duration::hours(2));
        let err = store.get("abc").await.unwrap_err();
        assert!(err.is_recoverable());
        assert!(store.accept_word("abc", "CAT", 30).await.unwrap_err().is_recoverable());
    }

    #[tokio::test]
    async fn test_unconnected_store_falls_back() {
        let shared = SharedConnection::default();
        let store = FallbackStore::new(
            Some(RedisSessionStore::new(shared.clone(), Duration::hours(2))),
            MemorySessionStore::new(Duration::hours(2)),
        );
        let id = store.create(&['C', 'A', 'T'], 1, GameMode::Timed).await.unwrap();
        assert!(!shared.is_connected());
        assert_eq!(store.fallback().len(), 1);
        assert_eq!(
            store.accept_word(&id, "CAT", 30).await.unwrap(),
            AcceptOutcome::Accepted { score: 30 }
        );
    }

    #[tokio::test]
    async fn test_connect_until_ready() {
        let shared = SharedConnection::default();
        let gave_up = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            connect_until_ready("not a url".to_string(), shared.clone(), std::time::Duration::from_millis(10)),
        )
        .await;
        assert!(gave_up.is_ok());

        let still_trying = tokio::time::timeout(
            std::time::Duration::from_millis(300),
            connect_until_ready("redis://127.0.0.1:1/".to_string(), shared.clone(), std::time::Duration::from_millis(10)),
        )
        .await;
        assert!(still_trying.is_err());
        assert!(!shared.is_connected());
    }

    fn server_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn test_live_round_lifecycle() {
        let shared = SharedConnection::default();
        assert!(shared.install(connect(&server_url()).await.unwrap()));
        let store = Arc::new(RedisSessionStore::new(shared.clone(), Duration::seconds(60)));
        let mut conn = shared.get().unwrap();

        let id = store.create(&"CASTLE".chars().collect::<Vec<_>>(), 3, GameMode::Timed).await.unwrap();
        let session = store.get(&id).await.unwrap().unwrap();
        assert_eq!(session.letters, vec!['C', 'A', 'S', 'T', 'L', 'E']);
        assert_eq!(session.level, 3);
        assert_eq!(session.score, 0);

        // age the session so a refreshed TTL would stand out
        let _: () = ::redis::cmd("PEXPIRE")
            .arg(session_key(&id))
            .arg(30_000)
            .query_async(&mut conn)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move { store.accept_word(&id, "CAT", 30).await.unwrap() }));
        }
        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                AcceptOutcome::Accepted { score } => {
                    assert_eq!(score, 30);
                    accepted += 1;
                }
                AcceptOutcome::Rejected(reason) => assert_eq!(reason, RejectReason::AlreadyFound),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.get(&id).await.unwrap().unwrap().score, 30);

        let session_ttl: i64 = ::redis::cmd("PTTL").arg(session_key(&id)).query_async(&mut conn).await.unwrap();
        let words_ttl: i64 = ::redis::cmd("PTTL").arg(words_key(&id)).query_async(&mut conn).await.unwrap();
        assert!(session_ttl > 0 && session_ttl <= 30_000);
        assert!(words_ttl > 0 && words_ttl <= 30_000);

        assert_eq!(
            store.accept_word(&id, "CASTLE", 75).await.unwrap(),
            AcceptOutcome::Accepted { score: 105 }
        );
        assert!(store.count().await.unwrap() >= 1);

        let summary = store.close(&id).await.unwrap().unwrap();
        assert_eq!(summary.score, 105);
        assert_eq!(summary.found_words, vec!["CAT", "CASTLE"]);
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(store.close(&id).await.unwrap().is_none());
        assert_eq!(
            store.accept_word(&id, "LAST", 45).await.unwrap(),
            AcceptOutcome::Rejected(RejectReason::SessionNotFound)
        );
        let words_left: bool = ::redis::cmd("EXISTS").arg(words_key(&id)).query_async(&mut conn).await.unwrap();
        assert!(!words_left);
    }
}
