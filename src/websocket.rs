//! # WebSocket Beat Streaming
//!
//! Drives the streaming delivery loop for one beat session. Clients connect to
//! `/beats/stream/{session_id}` and receive fixed-size stereo sample buffers
//! as JSON frames at real-time pace until the session's duration elapses.
//!
//! ## Protocol:
//! 1. **Connection**: client connects with a session ID from `/beats/generate`;
//!    unknown or inactive IDs are closed immediately with code 4004
//! 2. **Audio frames**: `{left_channel, right_channel, timestamp, sample_rate,
//!    buffer_size}` once per buffer period (1024 samples / 44.1 kHz ≈ 23.2 ms)
//! 3. **Terminal frame**: `{status: "completed"|"error", message}` followed by
//!    a close frame
//!
//! ## Pacing:
//! The loop is a timer tick (`ctx.run_interval`) at exactly one buffer period,
//! so delivery never runs faster than real time and drift stays bounded by one
//! period per iteration. The tick is also the only cancellation point: an
//! explicit terminate or a client disconnect ends the stream within one buffer
//! period. Each exit path deactivates the session and releases the connection
//! registration through the actor's `stopped` hook.

use crate::audio::{
    buffer_period_seconds, BeatSession, BinauralGenerator, SessionStore, BUFFER_SIZE, SAMPLE_RATE,
};
use crate::state::AppState;
use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// WebSocket close code sent when the session ID is unknown or inactive.
pub const CLOSE_SESSION_NOT_FOUND: u16 = 4004;

/// One buffer of samples on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFrame {
    pub left_channel: Vec<f64>,
    pub right_channel: Vec<f64>,
    pub timestamp: f64,
    pub sample_rate: u32,
    pub buffer_size: usize,
}

/// Final message of a stream, sent before the close frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalFrame {
    /// "completed" or "error"
    pub status: String,
    pub message: String,
}

impl TerminalFrame {
    fn completed() -> Self {
        Self {
            status: "completed".to_string(),
            message: "Session finished".to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
        }
    }
}

/// What the streaming loop should do at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStep {
    /// Synthesize and deliver one buffer
    Deliver,
    /// Duration elapsed or session deactivated: send the terminal frame
    Complete,
}

/// Loop condition, kept pure so the lifecycle arithmetic is testable.
///
/// Buffers are delivered while the session is active and the elapsed time is
/// still below the configured duration; everything else completes the stream.
pub fn next_tick_step(elapsed_seconds: f64, duration_seconds: f64, active: bool) -> TickStep {
    if active && elapsed_seconds < duration_seconds {
        TickStep::Deliver
    } else {
        TickStep::Complete
    }
}

/// Interval between streaming ticks: one buffer period of wall-clock time.
pub fn tick_period() -> Duration {
    Duration::from_secs_f64(buffer_period_seconds())
}

/// Actor owning one streaming connection.
///
/// Each active session gets one independent actor; buffers are freshly
/// allocated per tick and never shared between sessions.
pub struct BeatStream {
    /// Session looked up at upgrade time; None closes with 4004
    session: Option<Arc<BeatSession>>,

    /// Shared registry, used for connection tracking and terminal cleanup
    store: SessionStore,

    generator: BinauralGenerator,

    /// When streaming started; drives the duration check
    started: Instant,

    /// Set once a terminal frame has been sent so late ticks do nothing
    finished: bool,
}

impl BeatStream {
    pub fn new(session: Option<Arc<BeatSession>>, store: SessionStore) -> Self {
        Self {
            session,
            store,
            generator: BinauralGenerator::new(),
            started: Instant::now(),
            finished: false,
        }
    }

    fn tick(&mut self, session: &Arc<BeatSession>, ctx: &mut ws::WebsocketContext<Self>) {
        if self.finished {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        match next_tick_step(elapsed, session.config.duration as f64, session.is_active()) {
            TickStep::Deliver => match self.generator.generate_binaural_beats(&session.config) {
                Ok(buffer) => {
                    let frame = AudioFrame {
                        left_channel: buffer.left_channel,
                        right_channel: buffer.right_channel,
                        timestamp: buffer.timestamp,
                        sample_rate: SAMPLE_RATE,
                        buffer_size: BUFFER_SIZE,
                    };
                    match serde_json::to_string(&frame) {
                        Ok(json) => ctx.text(json),
                        Err(err) => self.abort(err.to_string(), ctx),
                    }
                }
                // No retry: a synthesis failure is terminal for this session.
                Err(err) => self.abort(err.to_string(), ctx),
            },
            TickStep::Complete => self.complete(ctx),
        }
    }

    /// Duration expiry or explicit terminate: deliver the "completed" frame.
    fn complete(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.finished = true;

        if let Ok(json) = serde_json::to_string(&TerminalFrame::completed()) {
            ctx.text(json);
        }

        if let Some(session) = &self.session {
            info!(session_id = %session.session_id, "Stream completed");
        }

        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Normal,
            description: None,
        }));
        ctx.stop();
    }

    /// Synthesis or delivery failure: surface it as an in-band terminal frame.
    fn abort(&mut self, reason: String, ctx: &mut ws::WebsocketContext<Self>) {
        self.finished = true;

        if let Some(session) = &self.session {
            error!(session_id = %session.session_id, error = %reason, "Stream aborted");
        }

        if let Ok(json) = serde_json::to_string(&TerminalFrame::error(reason)) {
            ctx.text(json);
        }

        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Error,
            description: None,
        }));
        ctx.stop();
    }
}

impl Actor for BeatStream {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let session = match &self.session {
            Some(session) if session.is_active() => session.clone(),
            _ => {
                warn!("Stream requested for unknown or inactive session");
                ctx.close(Some(ws::CloseReason {
                    code: ws::CloseCode::Other(CLOSE_SESSION_NOT_FOUND),
                    description: Some("Session not found".to_string()),
                }));
                ctx.stop();
                return;
            }
        };

        info!(session_id = %session.session_id, "Stream connected");
        self.store.register_connection(&session.session_id);
        self.started = Instant::now();

        ctx.run_interval(tick_period(), move |act, ctx| {
            act.tick(&session, ctx);
        });
    }

    /// Guaranteed cleanup for every exit path, including client disconnects.
    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(session) = &self.session {
            self.store.end(&session.session_id);
            info!(session_id = %session.session_id, "Stream closed, session cleaned up");
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for BeatStream {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(data)) => ctx.pong(&data),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Close(reason)) => {
                // Client went away: normal termination, no terminal frame.
                self.finished = true;
                info!("Stream disconnected by client: {:?}", reason);
                ctx.stop();
            }
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                debug!("Ignoring unexpected client payload on stream socket");
            }
            Ok(_) => {}
            Err(err) => {
                error!("WebSocket protocol error: {}", err);
                self.finished = true;
                ctx.stop();
            }
        }
    }
}

/// HTTP handler that upgrades `/beats/stream/{session_id}` to a WebSocket.
pub async fn stream_session(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let session_id = path.into_inner();
    let session = state.sessions.get(&session_id);

    if session.is_none() {
        info!(session_id = %session_id, "Stream requested for unknown session");
    }

    let actor = BeatStream::new(session, state.sessions.clone());
    ws::start(actor, &req, stream)
}
