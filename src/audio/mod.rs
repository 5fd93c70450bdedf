//! # Audio Module
//!
//! Binaural beat synthesis and session management.
//!
//! ## Key Components:
//! - **Synthesizer**: Pure waveform generation (sine, square, sawtooth, triangle)
//! - **Session Store**: Registry of active beat sessions and stream connections
//!
//! ## Fixed Synthesis Parameters:
//! - **Sample Rate**: 44.1 kHz (44,100 Hz)
//! - **Buffer Size**: 1024 samples per channel (~23.2 ms per streaming tick)
//!
//! These are process-wide constants, not per-request configurable: the
//! streaming protocol advertises them in every frame and the browser-side
//! player schedules playback against them.

pub mod session;
pub mod synth;

pub use session::{BeatSession, SessionStore};
pub use synth::{AudioBuffer, BeatConfig, BinauralGenerator, Waveform};

/// Samples per second for all synthesized audio.
pub const SAMPLE_RATE: u32 = 44_100;

/// Samples per channel in one streaming buffer.
pub const BUFFER_SIZE: usize = 1024;

/// Wall-clock duration of one streaming buffer in seconds (~23.2 ms).
pub fn buffer_period_seconds() -> f64 {
    BUFFER_SIZE as f64 / SAMPLE_RATE as f64
}
