use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::MappingConfig;

/// Canonical animation state published once per tick.
///
/// Every field stays inside its declared bound after each update: mouth,
/// jaw, brow and hand on [0, 1], gaze_x on [-0.4, 0.4] and gaze_y on
/// [-0.3, 0.3] under the default tuning. The set is a value type — each
/// tick produces a fresh snapshot and published snapshots are never
/// mutated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationParameters {
    /// Mouth-opening intensity.
    pub mouth: f32,
    /// Jaw drop, tracking mouth with amplified swing.
    pub jaw: f32,
    /// Brow-raise intensity, tracking mouth with damped swing.
    pub brow: f32,
    /// Gesture intensity, decaying between periodic impulses.
    pub hand: f32,
    /// Horizontal eye offset.
    pub gaze_x: f32,
    /// Vertical eye offset.
    pub gaze_y: f32,
}

impl AnimationParameters {
    /// The resting pose used before the first tick and after a reset.
    pub fn rest() -> Self {
        Self::default()
    }
}

/// Explicit fold state for the periodic gesture impulse, threaded through
/// the mapper instead of hidden in mutable closures.
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureState {
    ticks: u64,
}

/// Maps one frequency-domain magnitude vector to a bounded parameter set.
///
/// Pure given its inputs apart from the gesture fold: an internal tick
/// counter schedules a randomised hand impulse once per period, and the
/// ticks in between decay the previous hand value exponentially so gesture
/// motion settles instead of jumping.
pub struct ParameterMapper {
    config: MappingConfig,
    gesture: GestureState,
    rng: SmallRng,
}

impl ParameterMapper {
    pub fn new(config: MappingConfig) -> Self {
        Self {
            config,
            gesture: GestureState::default(),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Creates a mapper with a fixed impulse seed so runs are reproducible.
    pub fn with_seed(config: MappingConfig, seed: u64) -> Self {
        Self {
            config,
            gesture: GestureState::default(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Clears the gesture fold so a fresh run starts from rest.
    pub fn reset(&mut self) {
        self.gesture = GestureState::default();
    }

    /// Produces the parameter set for one tick from the current magnitude
    /// snapshot and the previously published set.
    pub fn map(&mut self, spectrum: &[f32], previous: &AnimationParameters) -> AnimationParameters {
        let config = &self.config;
        let rms = root_mean_square(spectrum);

        let mouth = (rms * config.mouth_gain).clamp(0.0, 1.0);
        let jaw = (mouth * config.jaw_gain).clamp(0.0, 1.0);
        let brow = (mouth * config.brow_gain).clamp(0.0, 1.0);

        self.gesture.ticks += 1;
        let hand = if self.gesture.ticks % config.impulse_period == 0 {
            // Fresh impulse bounded by the current vocal energy.
            let ceiling = (mouth + 0.2).min(0.8);
            0.3 + self.rng.gen::<f32>() * ceiling
        } else {
            previous.hand * config.hand_decay
        };
        let hand = hand.clamp(0.0, 1.0);

        let gaze_x = (bin_difference(spectrum, config.gaze_x_bins) * config.gaze_x_gain)
            .clamp(-config.gaze_x_limit, config.gaze_x_limit);
        let gaze_y = (bin_difference(spectrum, config.gaze_y_bins) * config.gaze_y_gain)
            .clamp(-config.gaze_y_limit, config.gaze_y_limit);

        AnimationParameters {
            mouth,
            jaw,
            brow,
            hand,
            gaze_x,
            gaze_y,
        }
    }
}

impl std::fmt::Debug for ParameterMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterMapper")
            .field("config", &self.config)
            .field("gesture", &self.gesture)
            .finish()
    }
}

fn root_mean_square(spectrum: &[f32]) -> f32 {
    if spectrum.is_empty() {
        return 0.0;
    }

    let sum: f32 = spectrum.iter().map(|magnitude| magnitude * magnitude).sum();
    (sum / spectrum.len() as f32).sqrt()
}

fn bin_difference(spectrum: &[f32], (low, high): (usize, usize)) -> f32 {
    let low = spectrum.get(low).copied().unwrap_or(0.0);
    let high = spectrum.get(high).copied().unwrap_or(0.0);
    low - high
}
