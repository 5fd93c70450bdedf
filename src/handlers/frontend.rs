//! Embedded control panel.
//!
//! The page performs the actual audio synthesis in the browser with WebAudio
//! oscillators; the backend supplies session management and presets.

use actix_web::HttpResponse;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// `GET /` — serve the control panel.
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}
