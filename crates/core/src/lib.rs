//! Core library for the Avatar Performance Studio.
//!
//! The crate drives a virtual performer's facial and body motion from an
//! audio signal and records the rendered performance together with the
//! driving audio into one muxed deliverable. Each module owns a distinct
//! subsystem: spectral analysis, parameter mapping, the frame-synchronous
//! animation clock, the capture state machine and the export pipeline.
//! Speech synthesis and transcription are opaque external collaborators,
//! and the avatar renderer itself sits behind the [`render::VisualSurface`]
//! seam.

pub mod analysis;
pub mod assets;
pub mod audio;
pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod mapping;
pub mod render;
pub mod speech;

pub use analysis::SpectralAnalyzer;
pub use assets::{AudioAsset, TakeStore};
pub use audio::AudioTrack;
pub use capture::{
    Capabilities, CaptureCoordinator, CaptureEnvironment, CaptureSession, FrameEncoder,
    RecordedChunk, SessionState, StaticEnvironment,
};
pub use clock::AnimationClock;
pub use config::{AnalysisConfig, AppConfig, CaptureConfig, MappingConfig};
pub use error::{Result, StudioError};
pub use export::{default_profiles, CodecProfile, Deliverable, Exporter, FfmpegMuxer, MuxBackend, MuxJob};
pub use mapping::{AnimationParameters, GestureState, ParameterMapper};
pub use render::{SoftwareSurface, VisualSurface};
pub use speech::{voice_by_id, voices, DubResult, Emotion, SpeechSynthesizer, Transcriber, VoiceOption};
