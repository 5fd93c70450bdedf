use crate::audio::{BUFFER_SIZE, SAMPLE_RATE};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let config = state.get_config();
    let uptime_seconds = state.get_uptime_seconds();

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "service": {
            "name": "binaural-beats-backend",
            "version": env!("CARGO_PKG_VERSION"),
            "host": config.server.host,
            "port": config.server.port
        },
        "audio": {
            "sample_rate": SAMPLE_RATE,
            "buffer_size": BUFFER_SIZE
        },
        "sessions": {
            "active": state.sessions.active_session_count(),
            "total_created": state.sessions.total_sessions_created(),
            "streaming_connections": state.sessions.connection_count(),
            "max_concurrent": config.streaming.max_concurrent_sessions
        },
        "requests": {
            "total": metrics.request_count,
            "errors": metrics.error_count,
            "error_rate": if metrics.request_count > 0 {
                metrics.error_count as f64 / metrics.request_count as f64
            } else {
                0.0
            }
        }
    }))
}

pub async fn prometheus_metrics(state: web::Data<AppState>) -> HttpResponse {
    let active_sessions = state.sessions.active_session_count();
    let total_sessions = state.sessions.total_sessions_created();
    let connections = state.sessions.connection_count();

    let body = format!(
        "# HELP binaural_active_sessions Number of active binaural beat sessions\n\
         # TYPE binaural_active_sessions gauge\n\
         binaural_active_sessions {}\n\
         \n\
         # HELP binaural_total_sessions Total number of sessions created\n\
         # TYPE binaural_total_sessions counter\n\
         binaural_total_sessions {}\n\
         \n\
         # HELP binaural_websocket_connections Number of active WebSocket connections\n\
         # TYPE binaural_websocket_connections gauge\n\
         binaural_websocket_connections {}\n",
        active_sessions, total_sessions, connections
    );

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body)
}
