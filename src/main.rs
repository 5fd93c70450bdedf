//! # Binaural Beats Backend - Main Application Entry Point
//!
//! Actix-web server that manages binaural beat sessions and streams
//! synthesized audio buffers over WebSocket.
//!
//! ## Application Architecture:
//! - **config**: layered configuration (TOML file + environment variables)
//! - **state**: shared application state (config, metrics, session registry)
//! - **audio**: waveform synthesis and session store
//! - **websocket**: per-session streaming loop
//! - **handlers**: REST endpoints and the embedded control panel
//! - **health**: health and metrics endpoints
//! - **error**: error taxonomy and HTTP error responses

mod audio;
mod config;
mod error;
mod handlers;
mod health;
mod middleware;
mod state;
mod websocket;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use config::AppConfig;
use error::AppError;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Global shutdown flag set by the signal handler task.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting binaural-beats-backend v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Sample rate: {} Hz, buffer size: {} samples",
        audio::SAMPLE_RATE,
        audio::BUFFER_SIZE
    );
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);

    let app_state = AppState::new(config.clone());
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Malformed JSON bodies (including unknown waveform kinds) come back
        // as the invalid_configuration error shape rather than actix's default.
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::InvalidConfiguration(err.to_string()).into()
        });

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config)
            .wrap(cors)
            .wrap(middleware::RequestTelemetry)
            .route("/", web::get().to(handlers::index))
            .route("/health", web::get().to(health::health_check))
            .route("/metrics", web::get().to(health::prometheus_metrics))
            .service(
                web::scope("/beats")
                    .route("/presets", web::get().to(handlers::get_presets))
                    .route("/generate", web::post().to(handlers::generate_beats))
                    .route("/stream/{session_id}", web::get().to(websocket::stream_session)),
            )
            .service(
                web::scope("/sessions")
                    .route("/{session_id}", web::get().to(handlers::get_session_info))
                    .route("/{session_id}", web::delete().to(handlers::end_session)),
            )
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "binaural_beats_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Listen for SIGTERM/SIGINT and flip the global shutdown flag.
fn setup_signal_handlers() {
    tokio::spawn(async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler");
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
