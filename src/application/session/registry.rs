//! SessionRegistry - per-session isolation keyed by `SessionId`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::Session;
use crate::domain::foundation::SessionId;

/// Shared handle to one session. Turns on a session are serialized by
/// its mutex; different sessions never share state.
pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory store of live sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session and returns its id and handle.
    pub async fn create(&self) -> (SessionId, SessionHandle) {
        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));

        self.sessions.write().await.insert(id, handle.clone());
        tracing::info!(session_id = %id, "Session created");
        (id, handle)
    }

    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drops a session; returns false if it did not exist.
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drops every session whose last activity is older than `cutoff`.
    ///
    /// Sessions locked by an in-flight turn are kept. Returns the number removed.
    pub async fn prune_inactive_since(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.last_active() >= cutoff,
            Err(_) => true,
        });
        before - sessions.len()
    }

    /// Drops sessions idle for longer than `max_idle`.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle));
        match cutoff {
            Some(cutoff) => self.prune_inactive_since(cutoff).await,
            None => 0,
        }
    }

    /// Spawns a background task pruning idle sessions every `every`.
    pub fn spawn_idle_sweeper(&self, every: Duration, max_idle: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let removed = registry.prune_idle(max_idle).await;
                if removed > 0 {
                    tracing::info!(removed, "Pruned idle sessions");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
