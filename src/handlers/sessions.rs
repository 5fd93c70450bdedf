//! # Session Handlers
//!
//! REST surface for creating, inspecting, and terminating beat sessions.
//! The actual audio delivery happens over the WebSocket in
//! [`crate::websocket`]; these handlers only manage session state.

use crate::audio::{BeatConfig, BinauralGenerator};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

/// Advisory quality hint returned on session creation.
///
/// Purely informational for the client UI; the synthesizer never consults it.
pub fn estimated_quality(carrier_freq: f64) -> &'static str {
    if carrier_freq < 500.0 {
        "high"
    } else {
        "medium"
    }
}

/// `POST /beats/generate` — validate a configuration and register a session.
///
/// Runs one test buffer generation before the session exists, so parameters
/// that pass range checks but fail synthesis are rejected without leaving a
/// stray session behind.
pub async fn generate_beats(
    state: web::Data<AppState>,
    config: web::Json<BeatConfig>,
) -> AppResult<HttpResponse> {
    let config = config.into_inner();
    config.validate()?;

    let generator = BinauralGenerator::new();
    generator.generate_binaural_beats(&config)?;

    let session = state.sessions.create(config)?;
    info!(
        session_id = %session.session_id,
        carrier_freq = session.config.carrier_freq,
        beat_freq = session.config.beat_freq,
        "Beat session ready"
    );

    Ok(HttpResponse::Ok().json(json!({
        "session_id": session.session_id,
        "config": session.config,
        "status": "ready",
        "estimated_quality": estimated_quality(session.config.carrier_freq)
    })))
}

/// `GET /sessions/{session_id}` — current progress of a session.
pub async fn get_session_info(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let session_id = path.into_inner();
    let session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    Ok(HttpResponse::Ok().json(json!({
        "session_id": session.session_id,
        "config": session.config,
        "start_time": session.started_at.to_rfc3339(),
        "duration_played": session.elapsed_seconds(),
        "is_active": session.is_active(),
        "progress": session.progress()
    })))
}

/// `DELETE /sessions/{session_id}` — terminate a session.
///
/// Idempotent: ending an unknown or already-inactive session returns the same
/// acknowledgment. A live stream observes the deactivation at its next tick,
/// within one buffer period.
pub async fn end_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let session_id = path.into_inner();
    state.sessions.end(&session_id);

    Ok(HttpResponse::Ok().json(json!({
        "status": "session_ended",
        "session_id": session_id
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_quality_threshold() {
        assert_eq!(estimated_quality(200.0), "high");
        assert_eq!(estimated_quality(499.9), "high");
        assert_eq!(estimated_quality(500.0), "medium");
        assert_eq!(estimated_quality(900.0), "medium");
    }
}
