use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{audio::AudioTrack, config::AnalysisConfig, Result};

/// Converts a rolling window of recently played samples into a
/// frequency-domain magnitude vector.
///
/// The analyzer never blocks waiting for audio: when no track is bound, or
/// the track has not played enough history yet, the missing samples are
/// treated as silence and the snapshot degrades to an all-zero vector. The
/// snapshot is idempotent within a tick — repeated calls during the same
/// tick return the same vector, and it advances only when a new tick begins.
pub struct SpectralAnalyzer {
    config: AnalysisConfig,
    planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
    window: Vec<f32>,
    snapshot: Vec<f32>,
    snapshot_tick: Option<u64>,
}

impl SpectralAnalyzer {
    /// Creates an analyzer for the given window configuration. The window
    /// length must be a power of two.
    pub fn new(config: AnalysisConfig) -> Self {
        debug_assert!(config.window_size.is_power_of_two());
        let bins = config.window_size / 2 + 1;
        Self {
            window: vec![0.0; config.window_size],
            snapshot: vec![0.0; bins],
            snapshot_tick: None,
            planner: RealFftPlanner::new(),
            fft: None,
            config,
        }
    }

    /// Number of frequency bins in each snapshot.
    pub fn bin_count(&self) -> usize {
        self.config.window_size / 2 + 1
    }

    /// Returns the magnitude snapshot for the given tick, computing it on
    /// first request and serving the cached vector on repeat calls within
    /// the same tick. Magnitudes are normalised to [0, 1].
    pub fn sample(&mut self, source: Option<&AudioTrack>, tick: u64) -> Result<&[f32]> {
        if self.snapshot_tick == Some(tick) {
            return Ok(&self.snapshot);
        }

        match source {
            Some(track) => {
                track.window_into(&mut self.window);
                self.compute_snapshot()?;
            }
            None => self.snapshot.fill(0.0),
        }

        self.snapshot_tick = Some(tick);
        Ok(&self.snapshot)
    }

    /// Clears all derived state and releases the FFT resources so a
    /// subsequent run starts from a clean slate.
    pub fn reset(&mut self) {
        self.window.fill(0.0);
        self.snapshot.fill(0.0);
        self.snapshot_tick = None;
        self.fft = None;
    }

    fn compute_snapshot(&mut self) -> Result<()> {
        let len = self.config.window_size;
        // A Hann-windowed full-scale sine concentrates roughly len / 4 of
        // magnitude into its peak bin; dividing by that puts bins on [0, 1].
        let scale = 4.0 / len as f32;

        let fft = prepare_fft(&mut self.planner, &mut self.fft, len);
        for (index, slot) in fft.input.iter_mut().enumerate() {
            *slot = self.window[index] * hann_value(index, len);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        for (magnitude, bin) in self.snapshot.iter_mut().zip(fft.spectrum.iter()) {
            *magnitude = (bin.norm() * scale).clamp(0.0, 1.0);
        }

        Ok(())
    }
}

fn prepare_fft<'a>(
    planner: &mut RealFftPlanner<f32>,
    slot: &'a mut Option<FftResources>,
    size: usize,
) -> &'a mut FftResources {
    let rebuild = slot.as_ref().map(|fft| fft.size != size).unwrap_or(true);

    if rebuild {
        let plan = planner.plan_fft_forward(size);
        let scratch = plan.make_scratch_vec();
        let spectrum = plan.make_output_vec();
        let input = plan.make_input_vec();
        *slot = Some(FftResources {
            size,
            plan,
            scratch,
            spectrum,
            input,
        });
    }

    slot.as_mut().expect("fft resources must exist")
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("config", &self.config)
            .field("snapshot_tick", &self.snapshot_tick)
            .finish()
    }
}

impl fmt::Debug for FftResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftResources")
            .field("size", &self.size)
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer(window_size: usize) -> SpectralAnalyzer {
        SpectralAnalyzer::new(AnalysisConfig {
            sample_rate: 1024,
            window_size,
        })
    }

    fn sine_track(frequency_bin: usize, window_size: usize) -> AudioTrack {
        let samples: Vec<f32> = (0..window_size * 2)
            .map(|i| {
                (2.0 * PI * frequency_bin as f32 * i as f32 / window_size as f32).sin()
            })
            .collect();
        let mut track = AudioTrack::from_samples(samples, 1024).unwrap();
        track.advance(10.0);
        track
    }

    #[test]
    fn unbound_source_yields_silence() {
        let mut analyzer = analyzer(256);
        let snapshot = analyzer.sample(None, 1).unwrap();
        assert!(snapshot.iter().all(|magnitude| *magnitude == 0.0));
    }

    #[test]
    fn snapshot_is_idempotent_within_a_tick() {
        let mut analyzer = analyzer(256);
        let track = sine_track(8, 256);

        let first = analyzer.sample(Some(&track), 1).unwrap().to_vec();
        let second = analyzer.sample(Some(&track), 1).unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn sine_energy_lands_in_its_bin() {
        let mut analyzer = analyzer(256);
        let track = sine_track(8, 256);

        let snapshot = analyzer.sample(Some(&track), 1).unwrap();
        let peak = snapshot
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(bin, _)| bin)
            .unwrap();
        assert_eq!(peak, 8);
        assert!(snapshot[peak] > 0.5);
        assert!(snapshot.iter().all(|magnitude| (0.0..=1.0).contains(magnitude)));
    }

    #[test]
    fn reset_returns_to_silence() {
        let mut analyzer = analyzer(256);
        let track = sine_track(4, 256);
        analyzer.sample(Some(&track), 1).unwrap();

        analyzer.reset();
        let snapshot = analyzer.sample(None, 2).unwrap();
        assert!(snapshot.iter().all(|magnitude| *magnitude == 0.0));
    }
}
