//! # Beat Session Management
//!
//! Tracks the lifecycle of binaural beat sessions and their stream
//! connections. Each session represents one configured listening instance
//! with a bounded total duration.
//!
//! ## Session Lifecycle:
//! 1. **Created**: registered on a generate request, marked active
//! 2. **Streaming**: one WebSocket connection drives the delivery loop
//! 3. **Completed/Aborted**: deactivated and removed from the registry
//!
//! ## Ownership:
//! The [`SessionStore`] is the only owner of session state; every mutation
//! funnels through `create`/`get`/`end`. A session is only ever deactivated by
//! its own streaming task or by an explicit terminate request, and the active
//! flag is atomic, so the two never race.

use crate::audio::synth::BeatConfig;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::info;
use uuid::Uuid;

/// One configured binaural beat listening instance.
pub struct BeatSession {
    /// Unique identifier for this session
    pub session_id: String,

    /// Immutable beat configuration chosen at creation
    pub config: BeatConfig,

    /// When the session was created; streaming progress is measured from here
    pub started_at: DateTime<Utc>,

    /// Whether the session may still stream buffers
    active: AtomicBool,
}

impl BeatSession {
    fn new(config: BeatConfig) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            config,
            started_at: Utc::now(),
            active: AtomicBool::new(true),
        }
    }

    #[cfg(test)]
    fn with_started_at(config: BeatConfig, started_at: DateTime<Utc>) -> Self {
        let mut session = Self::new(config);
        session.started_at = started_at;
        session
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Seconds elapsed since the session was created.
    pub fn elapsed_seconds(&self) -> f64 {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        elapsed.num_milliseconds() as f64 / 1000.0
    }

    /// Fraction of the configured duration already played, clamped to 1.0.
    pub fn progress(&self) -> f64 {
        if self.config.duration == 0 {
            return 0.0;
        }
        (self.elapsed_seconds() / self.config.duration as f64).min(1.0)
    }
}

/// Registry of active beat sessions and their stream connections.
///
/// ## Thread Safety:
/// Cheaply cloneable; all clones share the same maps behind `Arc<RwLock<_>>`.
/// Multiple streaming tasks and the request-handling surface read and update
/// concurrently.
#[derive(Clone)]
pub struct SessionStore {
    /// Active sessions keyed by session ID
    sessions: Arc<RwLock<HashMap<String, Arc<BeatSession>>>>,

    /// Session IDs with a live WebSocket stream attached
    connections: Arc<RwLock<HashSet<String>>>,

    /// Maximum number of concurrently registered sessions
    max_concurrent_sessions: usize,

    /// Sessions created since startup (monotonic, for metrics)
    total_created: Arc<AtomicU64>,
}

impl SessionStore {
    pub fn new(max_concurrent_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashSet::new())),
            max_concurrent_sessions,
            total_created: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Validate a configuration and register a new session for it.
    ///
    /// The configuration is checked before any session exists, so a rejected
    /// request leaves the registry untouched.
    pub fn create(&self, config: BeatConfig) -> AppResult<Arc<BeatSession>> {
        config.validate()?;

        let mut sessions = self.sessions.write().unwrap();

        if sessions.len() >= self.max_concurrent_sessions {
            return Err(AppError::Internal(format!(
                "maximum concurrent sessions ({}) reached",
                self.max_concurrent_sessions
            )));
        }

        let session = Arc::new(BeatSession::new(config));
        sessions.insert(session.session_id.clone(), session.clone());
        self.total_created.fetch_add(1, Ordering::SeqCst);

        info!(session_id = %session.session_id, "Created session");
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<BeatSession>> {
        self.sessions.read().unwrap().get(session_id).cloned()
    }

    /// Deactivate and remove a session, releasing its connection registration.
    ///
    /// Idempotent: ending an unknown or already-ended session is a no-op that
    /// still returns cleanly, so terminate requests and streaming-loop cleanup
    /// can both call this without coordination.
    pub fn end(&self, session_id: &str) {
        let removed = {
            let mut sessions = self.sessions.write().unwrap();
            sessions.remove(session_id)
        };

        if let Some(session) = removed {
            session.deactivate();
            info!(session_id, "Ended session");
        }

        self.connections.write().unwrap().remove(session_id);
    }

    /// Record that a stream is attached to this session.
    pub fn register_connection(&self, session_id: &str) {
        self.connections
            .write()
            .unwrap()
            .insert(session_id.to_string());
    }

    /// Release a stream registration without touching the session itself.
    pub fn release_connection(&self, session_id: &str) {
        self.connections.write().unwrap().remove(session_id);
    }

    pub fn has_connection(&self, session_id: &str) -> bool {
        self.connections.read().unwrap().contains(session_id)
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().unwrap().len()
    }

    pub fn total_sessions_created(&self) -> u64 {
        self.total_created.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::Waveform;
    use chrono::Duration;

    fn test_config() -> BeatConfig {
        BeatConfig {
            carrier_freq: 200.0,
            beat_freq: 10.0,
            waveform: Waveform::Sine,
            duration: 60,
            volume: 0.5,
        }
    }

    #[test]
    fn test_create_and_get_session() {
        let store = SessionStore::new(4);
        let session = store.create(test_config()).unwrap();

        assert!(session.is_active());
        assert_eq!(store.active_session_count(), 1);
        assert_eq!(store.total_sessions_created(), 1);

        let fetched = store.get(&session.session_id).unwrap();
        assert_eq!(fetched.session_id, session.session_id);
        assert!(store.get("no-such-session").is_none());
    }

    #[test]
    fn test_combined_frequency_rejection_creates_no_session() {
        let store = SessionStore::new(4);
        let mut config = test_config();
        config.carrier_freq = 900.0;
        config.beat_freq = 200.0;

        match store.create(config) {
            Err(AppError::InvalidConfiguration(_)) => {}
            other => panic!("expected invalid configuration, got {:?}", other.map(|_| ())),
        }
        assert_eq!(store.active_session_count(), 0);
        assert_eq!(store.total_sessions_created(), 0);
    }

    #[test]
    fn test_session_limit_enforced() {
        let store = SessionStore::new(2);
        store.create(test_config()).unwrap();
        store.create(test_config()).unwrap();
        assert!(store.create(test_config()).is_err());
    }

    #[test]
    fn test_end_is_idempotent() {
        let store = SessionStore::new(4);
        let session = store.create(test_config()).unwrap();
        store.register_connection(&session.session_id);

        store.end(&session.session_id);
        assert!(!session.is_active());
        assert!(store.get(&session.session_id).is_none());
        assert!(!store.has_connection(&session.session_id));

        // Second end (and ends for unknown IDs) are no-ops.
        store.end(&session.session_id);
        store.end("no-such-session");
        assert_eq!(store.active_session_count(), 0);
    }

    #[test]
    fn test_connection_registration() {
        let store = SessionStore::new(4);
        let session = store.create(test_config()).unwrap();

        store.register_connection(&session.session_id);
        assert_eq!(store.connection_count(), 1);

        store.release_connection(&session.session_id);
        assert_eq!(store.connection_count(), 0);
        // Releasing the connection does not end the session.
        assert!(session.is_active());
    }

    #[test]
    fn test_progress_clamped_to_one() {
        let fresh = BeatSession::new(test_config());
        assert!(fresh.progress() < 0.01);

        let long_ago = Utc::now() - Duration::seconds(120);
        let expired = BeatSession::with_started_at(test_config(), long_ago);
        assert_eq!(expired.progress(), 1.0);
    }
}
