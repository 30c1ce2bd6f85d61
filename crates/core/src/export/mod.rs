use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::{assets::AudioAsset, capture::RecordedChunk, Result, StudioError};

/// A container/codec combination the exporter may target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecProfile {
    pub container: String,
    pub video_codec: String,
    pub audio_codec: String,
}

impl CodecProfile {
    pub fn new(container: &str, video_codec: &str, audio_codec: &str) -> Self {
        Self {
            container: container.to_string(),
            video_codec: video_codec.to_string(),
            audio_codec: audio_codec.to_string(),
        }
    }

    /// MIME-style identifier, e.g. `video/webm;codecs=vp9,opus`.
    pub fn mime(&self) -> String {
        format!(
            "video/{};codecs={},{}",
            self.container, self.video_codec, self.audio_codec
        )
    }

    pub fn extension(&self) -> &str {
        &self.container
    }
}

/// The fallback order tried when the primary combination is unsupported.
pub fn default_profiles() -> Vec<CodecProfile> {
    vec![
        CodecProfile::new("webm", "vp9", "opus"),
        CodecProfile::new("webm", "vp8", "opus"),
        CodecProfile::new("mp4", "h264", "aac"),
    ]
}

/// The finished muxed artifact.
#[derive(Debug, Clone, Serialize)]
pub struct Deliverable {
    pub path: PathBuf,
    pub profile: CodecProfile,
    pub chunk_count: usize,
    pub duration_seconds: f32,
}

/// Everything a backend needs to produce one container file.
#[derive(Debug)]
pub struct MuxJob<'a> {
    pub profile: &'a CodecProfile,
    pub chunks: &'a [RecordedChunk],
    pub reference_audio: &'a AudioAsset,
    pub output: &'a Path,
}

/// Backend seam that turns a mux job into container bytes on disk. The
/// concrete container format is an environment capability, not a fixed bit
/// format, so the exporter only negotiates profiles and delegates the
/// byte-level work here.
pub trait MuxBackend {
    /// Whether this backend can encode the given profile in the current
    /// environment.
    fn supports(&self, profile: &CodecProfile) -> bool;

    /// Writes the muxed container to `job.output`.
    fn mux(&self, job: &MuxJob<'_>) -> Result<()>;
}

/// Combines recorded visual chunks with the full-fidelity reference take
/// into a single deliverable container.
pub struct Exporter {
    profiles: Vec<CodecProfile>,
    backend: Box<dyn MuxBackend>,
    output_dir: PathBuf,
}

impl Exporter {
    /// Creates an exporter with the default profile fallback order.
    pub fn new(backend: Box<dyn MuxBackend>, output_dir: PathBuf) -> Self {
        Self::with_profiles(backend, output_dir, default_profiles())
    }

    pub fn with_profiles(
        backend: Box<dyn MuxBackend>,
        output_dir: PathBuf,
        profiles: Vec<CodecProfile>,
    ) -> Self {
        Self {
            profiles,
            backend,
            output_dir,
        }
    }

    /// Muxes the ordered chunk sequence with the reference audio asset.
    ///
    /// The reference take becomes the deliverable's audio track so the
    /// final audio is not subject to any re-encoding loss introduced by the
    /// capture path. Partial output is removed on failure, never surfaced
    /// as a success.
    pub fn mux(
        &self,
        chunks: &[RecordedChunk],
        reference_audio: &AudioAsset,
        base_name: &str,
    ) -> Result<Deliverable> {
        if chunks.is_empty() {
            return Err(StudioError::encoding("no recorded chunks to mux"));
        }

        let profile = self.select_profile()?;
        let file_name = format!(
            "{base_name}-{}.{}",
            generation_timestamp_millis(),
            profile.extension()
        );
        let output = self.output_dir.join(file_name);

        let job = MuxJob {
            profile,
            chunks,
            reference_audio,
            output: &output,
        };

        if let Err(error) = self.backend.mux(&job) {
            let _ = fs::remove_file(&output);
            return Err(error);
        }

        tracing::info!(path = %output.display(), mime = profile.mime(), "deliverable written");
        Ok(Deliverable {
            path: output,
            profile: profile.clone(),
            chunk_count: chunks.len(),
            duration_seconds: reference_audio.duration_seconds(),
        })
    }

    fn select_profile(&self) -> Result<&CodecProfile> {
        for (index, profile) in self.profiles.iter().enumerate() {
            if self.backend.supports(profile) {
                if index > 0 {
                    tracing::warn!(
                        fallback = profile.mime(),
                        "primary codec profile unsupported, falling back"
                    );
                }
                return Ok(profile);
            }
        }

        Err(StudioError::encoding(
            "no supported codec profile in the current environment",
        ))
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("profiles", &self.profiles)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

fn generation_timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}

/// Production backend that drives the ffmpeg command line tool.
///
/// The recorded chunks are concatenated into an intermediate stream file,
/// the reference take is written beside it, and ffmpeg remuxes the two into
/// the requested container with the video stream copied as-is.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    binary: PathBuf,
}

impl FfmpegMuxer {
    pub fn new() -> Self {
        Self::with_binary(PathBuf::from("ffmpeg"))
    }

    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    fn available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl MuxBackend for FfmpegMuxer {
    fn supports(&self, profile: &CodecProfile) -> bool {
        matches!(profile.container.as_str(), "webm" | "mp4") && self.available()
    }

    fn mux(&self, job: &MuxJob<'_>) -> Result<()> {
        let video_path = job.output.with_extension("video.tmp");
        let audio_path = job.output.with_extension("audio.wav");

        let mut stream = Vec::new();
        for chunk in job.chunks {
            stream.extend_from_slice(&chunk.data);
        }
        fs::write(&video_path, stream)?;
        fs::write(&audio_path, job.reference_audio.bytes())?;

        let status = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(&video_path)
            .arg("-i")
            .arg(&audio_path)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy"])
            .args(["-c:a", job.profile.audio_codec.as_str()])
            .arg(job.output)
            .status();

        let _ = fs::remove_file(&video_path);
        let _ = fs::remove_file(&audio_path);

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(StudioError::encoding(format!(
                "ffmpeg exited with status {status}"
            ))),
            Err(error) => Err(StudioError::encoding(format!(
                "failed to launch ffmpeg: {error}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    struct MemoryMuxer {
        supported: Vec<CodecProfile>,
        fail: bool,
    }

    impl MemoryMuxer {
        fn supporting(supported: Vec<CodecProfile>) -> Self {
            Self {
                supported,
                fail: false,
            }
        }
    }

    impl MuxBackend for MemoryMuxer {
        fn supports(&self, profile: &CodecProfile) -> bool {
            self.supported.contains(profile)
        }

        fn mux(&self, job: &MuxJob<'_>) -> Result<()> {
            if self.fail {
                return Err(StudioError::encoding("simulated encoder failure"));
            }
            let bytes: Vec<u8> = job
                .chunks
                .iter()
                .flat_map(|chunk| chunk.data.clone())
                .collect();
            fs::write(job.output, bytes)?;
            Ok(())
        }
    }

    fn reference_audio() -> AudioAsset {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..50 {
                writer.write_sample(1000_i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        AudioAsset::from_wav_bytes(cursor.into_inner()).unwrap()
    }

    fn chunk(sequence: u64) -> RecordedChunk {
        RecordedChunk {
            sequence,
            data: vec![sequence as u8; 4],
        }
    }

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("avatar-studio-export-{label}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn rejects_an_empty_chunk_sequence() {
        let exporter = Exporter::new(
            Box::new(MemoryMuxer::supporting(default_profiles())),
            temp_dir("empty"),
        );

        let err = exporter.mux(&[], &reference_audio(), "take").unwrap_err();
        assert!(matches!(err, StudioError::Encoding(_)));
    }

    #[test]
    fn names_embed_base_and_timestamp() {
        let exporter = Exporter::new(
            Box::new(MemoryMuxer::supporting(default_profiles())),
            temp_dir("naming"),
        );

        let deliverable = exporter
            .mux(&[chunk(0), chunk(1)], &reference_audio(), "performance")
            .unwrap();

        let name = deliverable.path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("performance-"));
        assert!(name.ends_with(".webm"));
        let millis: u128 = name
            .trim_start_matches("performance-")
            .trim_end_matches(".webm")
            .parse()
            .expect("timestamp suffix");
        assert!(millis > 0);
        assert!(deliverable.path.exists());
        assert_eq!(deliverable.chunk_count, 2);
    }

    #[test]
    fn falls_back_in_priority_order() {
        let mp4_only = vec![CodecProfile::new("mp4", "h264", "aac")];
        let exporter = Exporter::new(
            Box::new(MemoryMuxer::supporting(mp4_only)),
            temp_dir("fallback"),
        );

        let deliverable = exporter
            .mux(&[chunk(0)], &reference_audio(), "clip")
            .unwrap();
        assert_eq!(deliverable.profile.mime(), "video/mp4;codecs=h264,aac");
    }

    #[test]
    fn fails_when_no_profile_is_supported() {
        let exporter = Exporter::new(
            Box::new(MemoryMuxer::supporting(Vec::new())),
            temp_dir("unsupported"),
        );

        let err = exporter
            .mux(&[chunk(0)], &reference_audio(), "clip")
            .unwrap_err();
        assert!(matches!(err, StudioError::Encoding(_)));
    }

    #[test]
    fn backend_failure_discards_partial_output() {
        let mut backend = MemoryMuxer::supporting(default_profiles());
        backend.fail = true;
        let dir = temp_dir("partial");
        let exporter = Exporter::new(Box::new(backend), dir.clone());

        let err = exporter
            .mux(&[chunk(0)], &reference_audio(), "broken")
            .unwrap_err();
        assert!(matches!(err, StudioError::Encoding(_)));

        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("broken-")
            })
            .collect();
        assert!(leftovers.is_empty());
    }
}
