//! Session registry: in-memory enrollment conversations keyed by id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::enrollment::{self, EnrollmentState, InitOptions, Transition};

/// One participant's conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub state: EnrollmentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(options: InitOptions) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: enrollment::initialize(options),
            created_at: now,
            updated_at: now,
        }
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.updated_at).to_std().unwrap_or_default()
    }
}

/// In-memory session store. Nothing survives a restart.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Start a new conversation at INTENT.
    pub async fn create(&self, options: InitOptions) -> Session {
        let session = Session::new(options);
        info!(
            session_id = %session.id,
            is_eligible = ?options.is_eligible,
            current_age = ?options.current_age,
            "Enrollment session created"
        );
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Drop a session. Returns false if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Enrollment session removed");
        }
        removed
    }

    /// Apply one utterance to a session and store the resulting state.
    ///
    /// Runs under the write lock, so turns for a session apply in order.
    pub async fn advance(&self, id: Uuid, utterance: &str) -> Option<(Session, Transition)> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;

        let transition = enrollment::advance(&session.state, utterance);
        session.state = transition.next_state.clone();
        session.updated_at = Utc::now();

        debug!(
            session_id = %id,
            step = %session.state.step,
            complete = transition.is_complete,
            "Enrollment turn applied"
        );

        Some((session.clone(), transition))
    }

    /// Drop sessions idle for longer than `max_idle`.
    /// Returns the number of sessions removed.
    pub async fn expire_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.idle_for(now) <= max_idle);
        let expired = before - sessions.len();

        if expired > 0 {
            info!(expired, remaining = sessions.len(), "Expired idle enrollment sessions");
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Spawn a background task that sweeps idle sessions every `interval`.
pub fn spawn_expiry_task(
    registry: Arc<SessionRegistry>,
    max_idle: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            registry.expire_idle(max_idle).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::EnrollmentStep;

    #[tokio::test]
    async fn create_and_get() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty().await);

        let session = registry.create(InitOptions::default()).await;
        assert_eq!(session.state.step, EnrollmentStep::Intent);
        assert_eq!(registry.len().await, 1);

        let fetched = registry.get(session.id).await.unwrap();
        assert_eq!(fetched.id, session.id);
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn advance_persists_state() {
        let registry = SessionRegistry::new();
        let session = registry.create(InitOptions::default()).await;

        let (updated, transition) = registry.advance(session.id, "I want to enroll").await.unwrap();
        assert_eq!(transition.next_state.step, EnrollmentStep::RetirementAge);
        assert_eq!(updated.state, transition.next_state);
        assert!(updated.updated_at >= session.updated_at);

        let stored = registry.get(session.id).await.unwrap();
        assert_eq!(stored.state.step, EnrollmentStep::RetirementAge);
    }

    #[tokio::test]
    async fn advance_unknown_session() {
        let registry = SessionRegistry::new();
        assert!(registry.advance(Uuid::new_v4(), "enroll").await.is_none());
    }

    #[tokio::test]
    async fn remove_session() {
        let registry = SessionRegistry::new();
        let session = registry.create(InitOptions::default()).await;
        assert!(registry.remove(session.id).await);
        assert!(!registry.remove(session.id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn expire_idle_only_drops_stale_sessions() {
        let registry = SessionRegistry::new();
        let stale = registry.create(InitOptions::default()).await;
        let fresh = registry.create(InitOptions::default()).await;

        {
            let mut sessions = registry.sessions.write().await;
            let s = sessions.get_mut(&stale.id).unwrap();
            s.updated_at = Utc::now() - chrono::Duration::minutes(90);
        }

        let expired = registry.expire_idle(Duration::from_secs(3600)).await;
        assert_eq!(expired, 1);
        assert!(registry.get(stale.id).await.is_none());
        assert!(registry.get(fresh.id).await.is_some());
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_session_all_apply() {
        let registry = SessionRegistry::new();
        let session = registry.create(InitOptions::default()).await;
        registry.advance(session.id, "enroll").await.unwrap();

        // Two rejected turns racing on the same session leave it intact.
        let a = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.advance(session.id, "???").await })
        };
        let b = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.advance(session.id, "hmm").await })
        };
        assert!(a.await.unwrap().is_some());
        assert!(b.await.unwrap().is_some());

        let stored = registry.get(session.id).await.unwrap();
        assert_eq!(stored.state.step, EnrollmentStep::RetirementAge);
    }
}
