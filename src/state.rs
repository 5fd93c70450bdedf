//! # Application State Management
//!
//! Shared state accessed by every HTTP request handler and streaming task.
//!
//! ## Thread Safety Pattern:
//! Mutable pieces live behind `Arc<RwLock<_>>` so many requests can read
//! simultaneously while writes stay exclusive. The [`SessionStore`] carries
//! its own interior synchronization and is cloned freely.

use crate::audio::SessionStore;
use crate::config::AppConfig;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// State shared across all HTTP request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<RwLock<AppConfig>>,

    /// Request counters, updated by middleware on every request
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// Registry of beat sessions and stream connections
    pub sessions: SessionStore,

    /// When the server started (for uptime reporting)
    pub start_time: Instant,
}

/// Counters collected across all HTTP requests.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    /// Total HTTP requests processed since server start
    pub request_count: u64,

    /// Total requests that ended in a 4xx/5xx response
    pub error_count: u64,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let sessions = SessionStore::new(config.streaming.max_concurrent_sessions);
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            sessions,
            start_time: Instant::now(),
        }
    }

    /// Get a copy of the current configuration.
    ///
    /// Cloning releases the read lock immediately so other threads are not
    /// blocked while the caller works with the values.
    pub fn get_config(&self) -> AppConfig {
        self.config.read().unwrap().clone()
    }

    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    /// Snapshot of the counters for the health endpoint.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics.read().unwrap().clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let state = AppState::new(AppConfig::default());

        state.increment_request_count();
        state.increment_request_count();
        state.increment_error_count();

        let snapshot = state.get_metrics_snapshot();
        assert_eq!(snapshot.request_count, 2);
        assert_eq!(snapshot.error_count, 1);
    }
}
