use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the studio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Loads a configuration file, falling back to defaults for any
    /// omitted section.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Configuration for the spectral analysis window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub sample_rate: u32,
    /// Power-of-two history window analysed on each tick.
    pub window_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            window_size: 2048,
        }
    }
}

/// Tuning constants for the parameter mapper.
///
/// The gaze bin indices are a heuristic carried over from the reference
/// tuning; they are configuration, not semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Sensitivity gain applied to the RMS energy before clamping. Chosen
    /// so conversational-volume speech saturates mouth openness near its
    /// ceiling while silence stays at rest.
    pub mouth_gain: f32,
    pub jaw_gain: f32,
    pub brow_gain: f32,
    /// A fresh gesture impulse is drawn once every this many ticks.
    pub impulse_period: u64,
    /// Exponential decay factor applied to the hand value on the ticks
    /// between impulses.
    pub hand_decay: f32,
    pub gaze_x_bins: (usize, usize),
    pub gaze_y_bins: (usize, usize),
    pub gaze_x_gain: f32,
    pub gaze_y_gain: f32,
    pub gaze_x_limit: f32,
    pub gaze_y_limit: f32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            mouth_gain: 3.0,
            jaw_gain: 1.4,
            brow_gain: 0.9,
            impulse_period: 12,
            hand_decay: 0.92,
            gaze_x_bins: (2, 40),
            gaze_y_bins: (10, 70),
            gaze_x_gain: 1.275,
            gaze_y_gain: 0.85,
            gaze_x_limit: 0.4,
            gaze_y_limit: 0.3,
        }
    }
}

/// Configuration for the capture pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Fixed output rate of the capturable frame stream.
    pub fps: u32,
    /// Number of frames grouped into one recorded chunk.
    pub frames_per_chunk: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            frames_per_chunk: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_reference_tuning() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.window_size, 2048);
        assert_eq!(config.mapping.impulse_period, 12);
        assert!((config.mapping.hand_decay - 0.92).abs() < f32::EPSILON);
        assert_eq!(config.capture.fps, 60);
    }

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"capture": {"fps": 30, "frames_per_chunk": 10}}"#).unwrap();
        assert_eq!(config.capture.fps, 30);
        assert_eq!(config.analysis.sample_rate, 48_000);
    }
}
