//! In-memory session registry
//!
//! Each session sits behind its own mutex, so turns for one session run
//! strictly one at a time while different sessions proceed in parallel.

use super::Session;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn get_or_create(&self, id: Uuid) -> Arc<Mutex<Session>> {
        if let Some(session) = self.get(id).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id))))
            .clone()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drop sessions untouched for at least `max_idle`. Sessions mid-turn are kept.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, session| {
            let keep = match session.try_lock() {
                Ok(session) => {
                    let idle_for = (now - session.updated_at()).to_std().unwrap_or_default();
                    idle_for < max_idle
                }
                Err(_) => true,
            };
            if !keep {
                debug!(session_id = %id, "Pruning idle session");
            }
            keep
        });

        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
