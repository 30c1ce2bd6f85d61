use std::sync::Arc;

use crate::{audio::AudioTrack, Result};

/// A generated speech take: the raw WAV bytes handed back by the synthesis
/// collaborator plus the metadata needed without re-decoding.
///
/// The raw bytes are kept because the exporter muxes this full-fidelity
/// asset as the deliverable's audio track; the capture path must not be the
/// source of the final audio.
#[derive(Debug, Clone)]
pub struct AudioAsset {
    bytes: Vec<u8>,
    sample_rate: u32,
    duration_seconds: f32,
}

impl AudioAsset {
    /// Validates and wraps a WAV byte buffer.
    pub fn from_wav_bytes(bytes: Vec<u8>) -> Result<Self> {
        let track = AudioTrack::from_wav_bytes(&bytes)?;
        Ok(Self {
            sample_rate: track.sample_rate(),
            duration_seconds: track.duration_seconds(),
            bytes,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration_seconds
    }

    /// Decodes a fresh playable track positioned at the start of the take.
    pub fn decode(&self) -> Result<AudioTrack> {
        AudioTrack::from_wav_bytes(&self.bytes)
    }
}

/// Holds the current generated take for preview and export.
///
/// Regenerating speech replaces the take; consumers that captured the
/// previous `Arc` keep a consistent asset for the duration of their session.
#[derive(Debug, Default)]
pub struct TakeStore {
    current: Option<Arc<AudioAsset>>,
}

impl TakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new take and returns the shared handle.
    pub fn replace(&mut self, asset: AudioAsset) -> Arc<AudioAsset> {
        let shared = Arc::new(asset);
        self.current = Some(shared.clone());
        shared
    }

    /// The take currently available for preview or export, if any.
    pub fn current(&self) -> Option<Arc<AudioAsset>> {
        self.current.clone()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn wav_fixture() -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 200,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..100 {
                writer.write_sample((i * 300) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn wraps_and_decodes_a_take() {
        let asset = AudioAsset::from_wav_bytes(wav_fixture()).unwrap();
        assert_eq!(asset.sample_rate(), 200);
        assert!((asset.duration_seconds() - 0.5).abs() < 1e-6);

        let track = asset.decode().unwrap();
        assert!(!track.ended());
    }

    #[test]
    fn replacing_a_take_keeps_existing_handles_alive() {
        let mut store = TakeStore::new();
        assert!(store.current().is_none());

        let first = store.replace(AudioAsset::from_wav_bytes(wav_fixture()).unwrap());
        let second = store.replace(AudioAsset::from_wav_bytes(wav_fixture()).unwrap());

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&store.current().unwrap(), &second));
        // The superseded handle still reads its own asset.
        assert_eq!(first.sample_rate(), 200);
    }
}
