//! In-memory conversation sessions
//!
//! Sessions live only for the lifetime of the process. Each one expires after
//! a period of inactivity and holds a bounded number of messages. A background
//! task removes expired sessions on a fixed interval; `get`, `add_message` and
//! `add_exchange` also drop an expired entry when they touch it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::constants::{
    DEFAULT_SESSION_MAX_MESSAGES, DEFAULT_SESSION_SWEEP_INTERVAL_SECS, DEFAULT_SESSION_TTL_SECS,
    SESSION_ID_BYTES,
};
use crate::utils::crypto::generate_token;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn; immutable once stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Snapshot of a conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Append, first evicting the oldest non-system message while at capacity
    fn push_bounded(&mut self, message: Message, max_messages: usize) {
        while self.messages.len() >= max_messages && !self.messages.is_empty() {
            // With only system messages left the oldest one goes
            let idx = self
                .messages
                .iter()
                .position(|m| m.role != Role::System)
                .unwrap_or(0);
            self.messages.remove(idx);
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
    }
}

/// Session store limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Idle time after which a session expires
    pub ttl: Duration,
    /// Upper bound on messages per session
    pub max_messages: usize,
    /// How often the background task removes expired sessions
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            max_messages: DEFAULT_SESSION_MAX_MESSAGES,
            sweep_interval: Duration::from_secs(DEFAULT_SESSION_SWEEP_INTERVAL_SECS),
        }
    }
}

struct SessionEntry {
    session: Session,
    last_active: Instant,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_active) > ttl
    }
}

type SessionMap = Arc<Mutex<HashMap<String, SessionEntry>>>;

/// Concurrent, expiring, bounded session container
pub struct SessionStore {
    sessions: SessionMap,
    config: SessionConfig,
    stop_tx: watch::Sender<bool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Create the store and start its sweep task.
    ///
    /// Must be called inside a Tokio runtime. Dropping the store stops the
    /// task; `close` also waits for it to finish.
    pub fn new(config: SessionConfig) -> Self {
        let config = SessionConfig {
            max_messages: config.max_messages.max(1),
            sweep_interval: config.sweep_interval.max(Duration::from_millis(1)),
            ..config
        };
        let sessions: SessionMap = Arc::new(Mutex::new(HashMap::new()));
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = start_sweep_task(sessions.clone(), config, stop_rx);

        Self {
            sessions,
            config,
            stop_tx,
            sweeper: Mutex::new(Some(handle)),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create an empty session with a fresh random id
    pub fn create(&self) -> Session {
        self.insert(Vec::new())
    }

    /// Create a session whose history starts with one system message
    pub fn create_with_system(&self, system_prompt: impl Into<String>) -> Session {
        self.insert(vec![Message::new(Role::System, system_prompt)])
    }

    fn insert(&self, messages: Vec<Message>) -> Session {
        let now = Utc::now();
        let session = Session {
            id: generate_token(SESSION_ID_BYTES),
            messages,
            created_at: now,
            updated_at: now,
        };
        self.sessions.lock().insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                last_active: Instant::now(),
            },
        );
        tracing::debug!(session_id = %session.id, "Session created");
        session
    }

    /// Snapshot of a live session; does not count as activity
    pub fn get(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        match sessions.get(id) {
            Some(entry) if entry.is_expired(now, self.config.ttl) => {
                sessions.remove(id);
                tracing::debug!(session_id = %id, "Session expired");
                None
            }
            Some(entry) => Some(entry.session.clone()),
            None => None,
        }
    }

    /// Append one message; false when the session is absent or expired
    pub fn add_message(&self, id: &str, role: Role, content: impl Into<String>) -> bool {
        self.append(id, [Message::new(role, content)])
    }

    /// Append a user turn and its answer under one lock acquisition
    pub fn add_exchange(
        &self,
        id: &str,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) -> bool {
        self.append(
            id,
            [
                Message::new(Role::User, user),
                Message::new(Role::Assistant, assistant),
            ],
        )
    }

    fn append<const N: usize>(&self, id: &str, messages: [Message; N]) -> bool {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let Some(entry) = sessions.get_mut(id) else {
            return false;
        };
        if entry.is_expired(now, self.config.ttl) {
            sessions.remove(id);
            tracing::debug!(session_id = %id, "Session expired");
            return false;
        }
        for message in messages {
            entry
                .session
                .push_bounded(message, self.config.max_messages);
        }
        entry.last_active = now;
        true
    }

    pub fn delete(&self, id: &str) {
        if self.sessions.lock().remove(id).is_some() {
            tracing::debug!(session_id = %id, "Session deleted");
        }
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the sweep task and wait for it to exit. Safe to call repeatedly.
    pub async fn close(&self) {
        let _ = self.stop_tx.send(true);
        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Session sweep task failed");
        }
    }
}

/// Remove every expired session; returns how many were removed
fn sweep(sessions: &SessionMap, ttl: Duration) -> usize {
    let now = Instant::now();
    let mut sessions = sessions.lock();
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_expired(now, ttl));
    before - sessions.len()
}

fn start_sweep_task(
    sessions: SessionMap,
    config: SessionConfig,
    mut stop_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.sweep_interval);
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                // Err means the store was dropped
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        tracing::debug!("Session sweep task stopped");
                        break;
                    }
                }
                _ = interval.tick() => {
                    let removed = sweep(&sessions, config.ttl);
                    if removed > 0 {
                        tracing::debug!(removed, "Expired sessions swept");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl: Duration, max_messages: usize) -> SessionStore {
        SessionStore::new(SessionConfig {
            ttl,
            max_messages,
            sweep_interval: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn test_create_session() {
        let store = SessionStore::new(SessionConfig::default());
        let session = store.create();

        assert_eq!(session.id.len(), 32);
        assert!(
            session
                .id
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        assert!(session.messages.is_empty());
        assert_eq!(session.created_at, session.updated_at);
        assert_eq!(store.get(&session.id), Some(session));
        assert_eq!(store.len(), 1);
        store.close().await;
    }

    #[tokio::test]
    async fn test_create_with_system_message() {
        let store = store(Duration::from_secs(60), 1);
        let session = store.create_with_system("You are a tracing assistant.");

        let expected = vec![Message::new(Role::System, "You are a tracing assistant.")];
        assert_eq!(session.messages, expected);
        assert_eq!(store.get(&session.id).unwrap().messages, expected);
        store.close().await;
    }

    #[tokio::test]
    async fn test_session_ids_unique() {
        let store = SessionStore::new(SessionConfig::default());
        let a = store.create();
        let b = store.create();
        assert_ne!(a.id, b.id);
        store.close().await;
    }

    #[tokio::test]
    async fn test_get_unknown_session() {
        let store = SessionStore::new(SessionConfig::default());
        assert!(store.get("does-not-exist").is_none());
        assert!(!store.add_message("does-not-exist", Role::User, "hi"));
        assert!(!store.add_exchange("does-not-exist", "q", "a"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_expired_session_is_removed() {
        let store = store(Duration::from_millis(10), 50);
        let session = store.create();

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.get(&session.id).is_none());
        assert!(!store.add_message(&session.id, Role::User, "late"));
        assert_eq!(store.len(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn test_expired_session_rejects_message() {
        let store = store(Duration::from_millis(10), 50);
        let session = store.create();

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!store.add_exchange(&session.id, "q", "a"));
        assert_eq!(store.len(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn test_get_does_not_refresh_activity() {
        let store = store(Duration::from_millis(150), 50);
        let session = store.create();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.get(&session.id).is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.get(&session.id).is_none());
        store.close().await;
    }

    #[tokio::test]
    async fn test_add_message_refreshes_activity() {
        let store = store(Duration::from_millis(150), 50);
        let session = store.create();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.add_message(&session.id, Role::User, "still here"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let current = store.get(&session.id).unwrap();
        assert_eq!(current.messages.len(), 1);
        assert!(current.updated_at >= current.created_at);
        store.close().await;
    }

    #[tokio::test]
    async fn test_eviction_keeps_system_message() {
        let store = store(Duration::from_secs(60), 3);
        let session = store.create();

        assert!(store.add_message(&session.id, Role::System, "sys"));
        for i in 0..5 {
            assert!(store.add_message(&session.id, Role::User, format!("m{i}")));
        }

        let messages = store.get(&session.id).unwrap().messages;
        assert_eq!(
            messages,
            vec![
                Message::new(Role::System, "sys"),
                Message::new(Role::User, "m3"),
                Message::new(Role::User, "m4"),
            ]
        );
        store.close().await;
    }

    #[tokio::test]
    async fn test_eviction_with_only_system_messages() {
        let store = store(Duration::from_secs(60), 2);
        let session = store.create();

        for i in 0..4 {
            assert!(store.add_message(&session.id, Role::System, format!("s{i}")));
        }

        let messages = store.get(&session.id).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "s2");
        assert_eq!(messages[1].content, "s3");
        store.close().await;
    }

    #[tokio::test]
    async fn test_add_exchange_appends_in_order() {
        let store = store(Duration::from_secs(60), 50);
        let session = store.create();

        assert!(store.add_message(&session.id, Role::System, "sys"));
        assert!(store.add_exchange(&session.id, "question", "answer"));

        let messages = store.get(&session.id).unwrap().messages;
        assert_eq!(
            messages,
            vec![
                Message::new(Role::System, "sys"),
                Message::new(Role::User, "question"),
                Message::new(Role::Assistant, "answer"),
            ]
        );
        store.close().await;
    }

    #[tokio::test]
    async fn test_delete_session() {
        let store = SessionStore::new(SessionConfig::default());
        let session = store.create();
        store.delete(&session.id);
        assert!(store.get(&session.id).is_none());
        assert!(store.is_empty());
        // Deleting twice is harmless
        store.delete(&session.id);
        store.close().await;
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_sessions() {
        let store = SessionStore::new(SessionConfig {
            ttl: Duration::from_millis(20),
            max_messages: 50,
            sweep_interval: Duration::from_millis(10),
        });
        for _ in 0..3 {
            store.create();
        }
        assert_eq!(store.len(), 3);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.len(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = SessionStore::new(SessionConfig::default());
        tokio::time::timeout(Duration::from_secs(1), store.close())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), store.close())
            .await
            .unwrap();
        // The map stays usable after close
        let session = store.create();
        assert!(store.get(&session.id).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_respect_cap() {
        let store = Arc::new(store(Duration::from_secs(60), 10));
        let session = store.create();
        assert!(store.add_message(&session.id, Role::System, "sys"));

        let mut handles = Vec::new();
        for t in 0..8 {
            let store = store.clone();
            let id = session.id.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    assert!(store.add_exchange(&id, format!("q{t}-{i}"), format!("a{t}-{i}")));
                    assert!(store.get(&id).unwrap().messages.len() <= 10);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let messages = store.get(&session.id).unwrap().messages;
        assert_eq!(messages.len(), 10);
        assert_eq!(messages[0], Message::new(Role::System, "sys"));
        store.close().await;
    }

    #[test]
    fn test_session_serializes_roles_lowercase() {
        let now = Utc::now();
        let session = Session {
            id: "abc".to_string(),
            messages: vec![Message::new(Role::Assistant, "hi")],
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["messages"][0]["role"], "assistant");
    }
}
