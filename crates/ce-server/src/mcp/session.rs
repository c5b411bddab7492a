//! MCP session store
//!
//! Sessions are single-process and in memory. Each session ties a sequence
//! of JSON-RPC messages to one org and one notification channel; idle
//! sessions expire after a configurable timeout and their channels close,
//! ending any open SSE streams.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Notification channel capacity per session
const NOTIFICATION_BUFFER: usize = 64;

/// One MCP session
#[derive(Debug)]
pub struct McpSession {
    /// Transport-negotiated session id
    pub session_id: String,
    /// Owning org; every request on the session must come from it
    pub org_id: Uuid,
    /// When this session was created
    pub created_at: Instant,
    /// Last access time
    pub last_accessed: Instant,
    /// Server-to-client notification channel
    pub notifications: broadcast::Sender<String>,
}

/// A cheap view of a session handed to request handlers
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Transport-negotiated session id
    pub session_id: String,
    /// Owning org
    pub org_id: Uuid,
    /// Notification channel
    pub notifications: broadcast::Sender<String>,
}

/// Session manager for MCP connections
#[derive(Debug)]
pub struct McpSessionStore {
    sessions: DashMap<String, McpSession>,
    idle_timeout: Duration,
}

impl McpSessionStore {
    /// Create a store with the configured idle timeout
    pub fn new(idle_timeout_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        }
    }

    /// Create a new session for an org; the returned id is fresh and cannot
    /// collide with a live one.
    pub fn create(&self, org_id: Uuid) -> SessionHandle {
        loop {
            let session_id = Uuid::new_v4().to_string();
            if self.sessions.contains_key(&session_id) {
                continue;
            }
            let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);
            let now = Instant::now();
            let handle = SessionHandle {
                session_id: session_id.clone(),
                org_id,
                notifications: notifications.clone(),
            };
            self.sessions.insert(
                session_id.clone(),
                McpSession {
                    session_id,
                    org_id,
                    created_at: now,
                    last_accessed: now,
                    notifications,
                },
            );
            return handle;
        }
    }

    /// Look up a session and touch its last-access time
    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let mut session = self.sessions.get_mut(session_id)?;
        session.last_accessed = Instant::now();
        Some(SessionHandle {
            session_id: session.session_id.clone(),
            org_id: session.org_id,
            notifications: session.notifications.clone(),
        })
    }

    /// Remove a session; dropping it closes the notification channel
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Active session count
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle for longer than the timeout
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.duration_since(session.last_accessed) < self.idle_timeout);
        before - self.sessions.len()
    }

    /// Spawn the periodic expiry sweep
    pub fn spawn_sweep(self: Arc<Self>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let interval = Duration::from_secs(interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let expired = self.cleanup_expired();
                if expired > 0 {
                    tracing::debug!(expired, "expired idle MCP sessions");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_get_touches_access_time() {
        let store = McpSessionStore::new(1800);
        let org = Uuid::new_v4();
        let handle = store.create(org);

        let fetched = store.get(&handle.session_id).unwrap();
        assert_eq!(fetched.org_id, org);
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn new_ids_never_collide_with_live_sessions() {
        let store = McpSessionStore::new(1800);
        let org = Uuid::new_v4();
        let a = store.create(org);
        let b = store.create(org);
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn removal_is_idempotent() {
        let store = McpSessionStore::new(1800);
        let handle = store.create(Uuid::new_v4());
        assert!(store.remove(&handle.session_id));
        assert!(!store.remove(&handle.session_id));
        assert!(store.get(&handle.session_id).is_none());
    }

    #[test]
    fn idle_sessions_expire() {
        let store = McpSessionStore::new(0);
        store.create(Uuid::new_v4());
        // Zero timeout: everything is expired immediately
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.session_count(), 0);
    }
}
