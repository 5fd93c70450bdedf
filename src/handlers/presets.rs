//! Curated beat presets for the control panel.

use crate::audio::{BeatConfig, Waveform};
use actix_web::HttpResponse;
use serde_json::json;

/// Named preset configurations, tuned for common listening goals.
pub fn preset_catalog() -> Vec<(&'static str, BeatConfig)> {
    let sine = |carrier_freq: f64, beat_freq: f64, duration: u32| BeatConfig {
        carrier_freq,
        beat_freq,
        waveform: Waveform::Sine,
        duration,
        volume: 0.5,
    };

    vec![
        ("focus", sine(200.0, 40.0, 1800)),
        ("relaxation", sine(150.0, 8.0, 1800)),
        ("deep_sleep", sine(100.0, 2.0, 3600)),
        ("creativity", sine(180.0, 6.0, 1800)),
        ("meditation", sine(120.0, 4.0, 2400)),
    ]
}

/// `GET /beats/presets`
pub async fn get_presets() -> HttpResponse {
    let mut presets = serde_json::Map::new();
    for (name, config) in preset_catalog() {
        presets.insert(
            name.to_string(),
            json!({
                "carrier_freq": config.carrier_freq,
                "beat_freq": config.beat_freq,
                "waveform": config.waveform,
                "duration": config.duration,
                "description": format!("Optimized for {}", name.replace('_', " "))
            }),
        );
    }

    HttpResponse::Ok().json(json!({ "presets": presets }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_presets_are_valid_configs() {
        let catalog = preset_catalog();
        assert_eq!(catalog.len(), 5);
        for (name, config) in catalog {
            assert!(config.validate().is_ok(), "preset {} invalid", name);
        }
    }
}
