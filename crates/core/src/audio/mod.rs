use std::io::Cursor;

use crate::{Result, StudioError};

/// A playable speech take decoded to mono PCM.
///
/// The track owns a playback cursor that the animation clock advances once
/// per rendered frame, so "playback" progresses in lockstep with the visual
/// consumer rather than against a wall clock. Downstream analysis reads a
/// rolling window of the most recently played samples.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    samples: Vec<f32>,
    sample_rate: u32,
    cursor: usize,
}

impl AudioTrack {
    /// Creates a track from raw mono samples.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(StudioError::precondition("audio take contains no samples"));
        }
        if sample_rate == 0 {
            return Err(StudioError::precondition("audio take has a zero sample rate"));
        }

        Ok(Self {
            samples,
            sample_rate,
            cursor: 0,
        })
    }

    /// Decodes a WAV byte buffer, downmixing interleaved channels to mono.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, hound::Error>>()?,
            hound::SampleFormat::Int => {
                let full_scale = (1u32 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / full_scale))
                    .collect::<std::result::Result<_, hound::Error>>()?
            }
        };

        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        Self::from_samples(samples, spec.sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Seconds of audio played so far.
    pub fn position_seconds(&self) -> f32 {
        self.cursor as f32 / self.sample_rate as f32
    }

    /// Rewinds playback to the beginning of the take.
    pub fn seek_start(&mut self) {
        self.cursor = 0;
    }

    /// Advances the playback cursor by the given interval, saturating at the
    /// end of the take.
    pub fn advance(&mut self, seconds: f32) {
        let step = (seconds.max(0.0) * self.sample_rate as f32).round() as usize;
        self.cursor = (self.cursor + step).min(self.samples.len());
    }

    /// Whether playback has reached the natural end of the take.
    pub fn ended(&self) -> bool {
        self.cursor >= self.samples.len()
    }

    /// Fills `window` with the most recent samples ending at the playback
    /// cursor. Missing history is zero-padded silence, so reads never block
    /// and never fail.
    pub fn window_into(&self, window: &mut [f32]) {
        let available = self.cursor.min(window.len());
        let lead = window.len() - available;
        window[..lead].fill(0.0);
        window[lead..].copy_from_slice(&self.samples[self.cursor - available..self.cursor]);
    }
}
