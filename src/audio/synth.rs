//! # Binaural Waveform Synthesis
//!
//! Pure sample generation for binaural beats: the left ear receives the
//! carrier frequency, the right ear receives carrier + beat frequency, and the
//! brain perceives the difference as a pulsing "beat".
//!
//! ## Waveform Formulas (phase φ = 2πft):
//! - **sine**: `sin(φ)`
//! - **square**: `signum(sin(φ))` — IEEE `signum` maps `+0.0` to `+1.0`, so the
//!   output takes values in exactly {-1, 1} and the zero-crossing at `t = 0`
//!   produces `+1`. This convention is relied on by the tests.
//! - **sawtooth**: `2 (tf - floor(0.5 + tf))`, a ramp in [-1, 1)
//! - **triangle**: `2 |2 (tf - floor(0.5 + tf))| - 1`, symmetric in [-1, 1]
//!
//! Sampling uses the half-open interval `[0, d)`: `N = floor(d * sample_rate)`
//! samples at `t_i = i / sample_rate`, so the sample at `t = d` is excluded.

use crate::audio::{BUFFER_SIZE, SAMPLE_RATE};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Supported waveform kinds.
///
/// This is a closed set: an unknown kind in a request body fails serde
/// deserialization and is rejected as an invalid configuration before any
/// session exists. Nothing ever silently defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Configuration for one binaural beat session.
///
/// Immutable once a session starts. Validated ranges follow the original
/// protocol: carrier 40-1000 Hz, beat 0.5-40 Hz, duration 1-3600 s, volume
/// 0.0-1.0, and carrier + beat must stay at or below 1000 Hz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatConfig {
    /// Base tone frequency presented to the left ear, in Hz
    pub carrier_freq: f64,

    /// Frequency difference between the two ears, in Hz
    pub beat_freq: f64,

    /// Waveform kind for both channels
    #[serde(default = "default_waveform")]
    pub waveform: Waveform,

    /// Total session duration in seconds
    pub duration: u32,

    /// Output gain applied to every sample
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_waveform() -> Waveform {
    Waveform::Sine
}

fn default_volume() -> f64 {
    0.5
}

impl BeatConfig {
    /// Check every range constraint, including the combined-frequency limit.
    pub fn validate(&self) -> AppResult<()> {
        if !(40.0..=1000.0).contains(&self.carrier_freq) {
            return Err(AppError::InvalidConfiguration(format!(
                "carrier frequency {} Hz outside 40-1000 Hz",
                self.carrier_freq
            )));
        }

        if !(0.5..=40.0).contains(&self.beat_freq) {
            return Err(AppError::InvalidConfiguration(format!(
                "beat frequency {} Hz outside 0.5-40 Hz",
                self.beat_freq
            )));
        }

        if !(1..=3600).contains(&self.duration) {
            return Err(AppError::InvalidConfiguration(format!(
                "duration {} s outside 1-3600 s",
                self.duration
            )));
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err(AppError::InvalidConfiguration(format!(
                "volume {} outside 0.0-1.0",
                self.volume
            )));
        }

        if self.carrier_freq + self.beat_freq > 1000.0 {
            return Err(AppError::InvalidConfiguration(format!(
                "combined frequency {} Hz exceeds the 1000 Hz limit",
                self.carrier_freq + self.beat_freq
            )));
        }

        Ok(())
    }
}

/// One streaming unit of synthesized stereo audio.
///
/// Ephemeral: produced and transmitted per tick, never persisted. Both
/// channels have equal length and every sample lies in [-volume, volume].
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub left_channel: Vec<f64>,
    pub right_channel: Vec<f64>,
    /// Unix timestamp (seconds) at generation time
    pub timestamp: f64,
}

/// Stateless binaural beat generator.
#[derive(Debug, Clone)]
pub struct BinauralGenerator {
    sample_rate: u32,
    buffer_size: usize,
}

impl Default for BinauralGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BinauralGenerator {
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            buffer_size: BUFFER_SIZE,
        }
    }

    /// Generate `floor(duration * sample_rate)` samples of one waveform.
    ///
    /// Pure function of its inputs; no state is carried between calls.
    pub fn generate_waveform(
        &self,
        frequency: f64,
        duration: f64,
        waveform: Waveform,
    ) -> AppResult<Vec<f64>> {
        if !(frequency > 0.0) {
            return Err(AppError::InvalidConfiguration(format!(
                "frequency must be positive, got {}",
                frequency
            )));
        }
        if !(duration > 0.0) {
            return Err(AppError::InvalidConfiguration(format!(
                "duration must be positive, got {}",
                duration
            )));
        }

        let sample_count = (duration * self.sample_rate as f64).floor() as usize;
        let mut samples = Vec::with_capacity(sample_count);

        for i in 0..sample_count {
            let t = i as f64 / self.sample_rate as f64;
            let sample = match waveform {
                Waveform::Sine => (2.0 * PI * frequency * t).sin(),
                Waveform::Square => (2.0 * PI * frequency * t).sin().signum(),
                Waveform::Sawtooth => 2.0 * (t * frequency - (0.5 + t * frequency).floor()),
                Waveform::Triangle => {
                    2.0 * (2.0 * (t * frequency - (0.5 + t * frequency).floor())).abs() - 1.0
                }
            };
            samples.push(sample);
        }

        Ok(samples)
    }

    /// Generate one stereo buffer of binaural beats for a session config.
    ///
    /// The buffer spans `buffer_size / sample_rate` seconds regardless of the
    /// session's total duration; the streaming loop strings these together at
    /// real-time pace. Both channels are scaled by the configured volume.
    pub fn generate_binaural_beats(&self, config: &BeatConfig) -> AppResult<AudioBuffer> {
        let left_freq = config.carrier_freq;
        let right_freq = config.carrier_freq + config.beat_freq;

        let buffer_duration = self.buffer_size as f64 / self.sample_rate as f64;

        let nyquist = self.sample_rate as f64 / 2.0;
        if config.carrier_freq > nyquist * 0.8 {
            // Advisory only; generation proceeds.
            warn!(
                carrier_freq = config.carrier_freq,
                nyquist, "Carrier frequency near Nyquist limit"
            );
        }

        let mut left_channel = self.generate_waveform(left_freq, buffer_duration, config.waveform)?;
        let mut right_channel =
            self.generate_waveform(right_freq, buffer_duration, config.waveform)?;

        for sample in left_channel.iter_mut().chain(right_channel.iter_mut()) {
            *sample *= config.volume;
            if !sample.is_finite() {
                return Err(AppError::Synthesis(format!(
                    "non-finite sample generated at {} Hz",
                    config.carrier_freq
                )));
            }
        }

        Ok(AudioBuffer {
            left_channel,
            right_channel,
            timestamp: unix_timestamp_seconds(),
        })
    }
}

fn unix_timestamp_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BeatConfig {
        BeatConfig {
            carrier_freq: 200.0,
            beat_freq: 10.0,
            waveform: Waveform::Sine,
            duration: 60,
            volume: 1.0,
        }
    }

    #[test]
    fn test_sample_count_is_floor_of_duration_times_rate() {
        let generator = BinauralGenerator::new();
        for waveform in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Sawtooth,
            Waveform::Triangle,
        ] {
            let samples = generator.generate_waveform(200.0, 0.0232, waveform).unwrap();
            // floor(0.0232 * 44100) = 1023
            assert_eq!(samples.len(), 1023);

            let samples = generator.generate_waveform(200.0, 1.0, waveform).unwrap();
            assert_eq!(samples.len(), 44100);
        }
    }

    #[test]
    fn test_sine_bounded_and_periodic() {
        let generator = BinauralGenerator::new();
        // 100 Hz has an exact integer period of 441 samples at 44.1 kHz.
        let samples = generator
            .generate_waveform(100.0, 0.05, Waveform::Sine)
            .unwrap();

        for &s in &samples {
            assert!((-1.0..=1.0).contains(&s));
        }

        let period = 441;
        for i in 0..(samples.len() - period) {
            assert!(
                (samples[i] - samples[i + period]).abs() < 1e-6,
                "sine not periodic at sample {}",
                i
            );
        }
    }

    #[test]
    fn test_square_takes_only_plus_minus_one() {
        let generator = BinauralGenerator::new();
        let samples = generator
            .generate_waveform(250.0, 0.1, Waveform::Square)
            .unwrap();

        for &s in &samples {
            assert!(s == 1.0 || s == -1.0, "unexpected square value {}", s);
        }
        // signum convention: sin(0) = +0.0 maps to +1
        assert_eq!(samples[0], 1.0);
    }

    #[test]
    fn test_sawtooth_and_triangle_ranges() {
        let generator = BinauralGenerator::new();

        let saw = generator
            .generate_waveform(150.0, 0.1, Waveform::Sawtooth)
            .unwrap();
        for &s in &saw {
            assert!((-1.0..1.0).contains(&s), "sawtooth out of range: {}", s);
        }

        let tri = generator
            .generate_waveform(150.0, 0.1, Waveform::Triangle)
            .unwrap();
        for &s in &tri {
            assert!((-1.0..=1.0).contains(&s), "triangle out of range: {}", s);
        }
    }

    #[test]
    fn test_non_positive_inputs_rejected() {
        let generator = BinauralGenerator::new();
        assert!(generator
            .generate_waveform(0.0, 1.0, Waveform::Sine)
            .is_err());
        assert!(generator
            .generate_waveform(-100.0, 1.0, Waveform::Sine)
            .is_err());
        assert!(generator
            .generate_waveform(100.0, 0.0, Waveform::Sine)
            .is_err());
    }

    #[test]
    fn test_binaural_pairing() {
        let generator = BinauralGenerator::new();
        let config = test_config();
        let buffer = generator.generate_binaural_beats(&config).unwrap();

        // BUFFER_SIZE / SAMPLE_RATE seconds at SAMPLE_RATE yields exactly
        // BUFFER_SIZE samples per channel.
        assert_eq!(buffer.left_channel.len(), BUFFER_SIZE);
        assert_eq!(buffer.right_channel.len(), BUFFER_SIZE);

        // Left is the carrier, right is carrier + beat.
        let left_ref = generator
            .generate_waveform(200.0, 1024.0 / 44100.0, Waveform::Sine)
            .unwrap();
        let right_ref = generator
            .generate_waveform(210.0, 1024.0 / 44100.0, Waveform::Sine)
            .unwrap();
        assert_eq!(buffer.left_channel, left_ref);
        assert_eq!(buffer.right_channel, right_ref);
    }

    #[test]
    fn test_volume_scales_output() {
        let generator = BinauralGenerator::new();
        let mut config = test_config();
        config.volume = 0.25;

        let buffer = generator.generate_binaural_beats(&config).unwrap();
        for &s in buffer.left_channel.iter().chain(buffer.right_channel.iter()) {
            assert!((-0.25..=0.25).contains(&s));
        }
    }

    #[test]
    fn test_non_finite_samples_are_synthesis_failure() {
        let generator = BinauralGenerator::new();
        // Bypasses BeatConfig::validate on purpose: sin(inf) is NaN, which the
        // generator must report rather than ship to a client.
        let config = BeatConfig {
            carrier_freq: f64::INFINITY,
            beat_freq: 10.0,
            waveform: Waveform::Sine,
            duration: 60,
            volume: 1.0,
        };

        match generator.generate_binaural_beats(&config) {
            Err(AppError::Synthesis(_)) => {}
            other => panic!("expected synthesis failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_config_validation_ranges() {
        let mut config = test_config();
        assert!(config.validate().is_ok());

        config.carrier_freq = 30.0;
        assert!(config.validate().is_err());

        config = test_config();
        config.beat_freq = 50.0;
        assert!(config.validate().is_err());

        config = test_config();
        config.duration = 0;
        assert!(config.validate().is_err());

        config = test_config();
        config.volume = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_combined_frequency_limit() {
        let mut config = test_config();
        config.carrier_freq = 900.0;
        config.beat_freq = 200.0;
        assert!(config.validate().is_err());

        // In-range components whose sum exceeds the cap hit the dedicated check.
        config.carrier_freq = 980.0;
        config.beat_freq = 40.0;
        match config.validate() {
            Err(AppError::InvalidConfiguration(msg)) => {
                assert!(msg.contains("1000"));
            }
            other => panic!("expected invalid configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_waveform_deserialization_rejects_unknown_kind() {
        let ok: Result<Waveform, _> = serde_json::from_str("\"sawtooth\"");
        assert!(ok.is_ok());

        let bad: Result<Waveform, _> = serde_json::from_str("\"noise\"");
        assert!(bad.is_err());
    }
}
