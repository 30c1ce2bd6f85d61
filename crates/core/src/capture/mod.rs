use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    assets::AudioAsset,
    clock::AnimationClock,
    config::CaptureConfig,
    export::{Deliverable, Exporter},
    render::VisualSurface,
    Result, StudioError,
};

/// Capture life cycle. A session moves strictly forward and is never
/// reused: `Idle → Recording → Finalizing → Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Finalizing,
    Completed,
    Failed,
}

/// Environment probe for capture support. Some runtimes can capture a
/// rendered frame stream but not an audio track; both are required.
pub trait CaptureEnvironment {
    fn supports_frame_capture(&self) -> bool;
    fn supports_audio_capture(&self) -> bool;
}

/// A fixed capability set, usable as the host declaration or as a test
/// double for restricted environments.
#[derive(Debug, Clone, Copy)]
pub struct StaticEnvironment {
    pub frame_capture: bool,
    pub audio_capture: bool,
}

impl StaticEnvironment {
    /// An environment with every capture capability present.
    pub fn full() -> Self {
        Self {
            frame_capture: true,
            audio_capture: true,
        }
    }
}

impl CaptureEnvironment for StaticEnvironment {
    fn supports_frame_capture(&self) -> bool {
        self.frame_capture
    }

    fn supports_audio_capture(&self) -> bool {
        self.audio_capture
    }
}

/// Typed result of the capability-detection step.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub frame_capture: bool,
    pub audio_capture: bool,
}

impl Capabilities {
    pub fn detect(environment: &dyn CaptureEnvironment) -> Self {
        Self {
            frame_capture: environment.supports_frame_capture(),
            audio_capture: environment.supports_audio_capture(),
        }
    }

    /// Errors unless both capture capabilities are present. A missing audio
    /// capability is a hard failure: recording must not silently degrade to
    /// a video-only artifact.
    pub fn ensure_supported(&self) -> Result<()> {
        if !self.frame_capture {
            return Err(StudioError::capability(
                "frame capture is unavailable in this environment",
            ));
        }
        if !self.audio_capture {
            return Err(StudioError::capability(
                "audio-track capture is unavailable in this environment",
            ));
        }
        Ok(())
    }
}

/// One encoded fragment of the recorded stream. Sequence numbers are
/// monotonic within a session and the sequence is append-only.
#[derive(Debug, Clone)]
pub struct RecordedChunk {
    pub sequence: u64,
    pub data: Vec<u8>,
}

/// Groups captured frames into recorded chunks.
///
/// The encoder buffers frames until a chunk fills; `finish` drains whatever
/// is still buffered after the stop signal, so the final moment of a
/// recording is never truncated.
#[derive(Debug)]
pub struct FrameEncoder {
    frames_per_chunk: usize,
    buffer: Vec<u8>,
    buffered_frames: usize,
    next_sequence: u64,
}

impl FrameEncoder {
    pub fn new(frames_per_chunk: usize) -> Self {
        Self {
            frames_per_chunk: frames_per_chunk.max(1),
            buffer: Vec::new(),
            buffered_frames: 0,
            next_sequence: 0,
        }
    }

    /// Adds one frame, returning a chunk when the group fills.
    pub fn push_frame(&mut self, frame: &[u8]) -> Option<RecordedChunk> {
        self.buffer.extend_from_slice(frame);
        self.buffered_frames += 1;

        (self.buffered_frames >= self.frames_per_chunk).then(|| self.emit())
    }

    /// Drains the buffered tail after the stop signal.
    pub fn finish(&mut self) -> Option<RecordedChunk> {
        (self.buffered_frames > 0).then(|| self.emit())
    }

    fn emit(&mut self) -> RecordedChunk {
        let data = std::mem::take(&mut self.buffer);
        self.buffered_frames = 0;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        RecordedChunk { sequence, data }
    }
}

/// Admits at most one live capture session at a time.
///
/// The slot is held for the whole session and freed when the session ends,
/// whether it completed or failed, so repeated record/stop cycles never leak
/// the admission.
#[derive(Debug, Clone, Default)]
pub struct CaptureCoordinator {
    active: Arc<AtomicBool>,
}

impl CaptureCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session currently holds the recording slot.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Begins a capture session: checks preconditions, detects capture
    /// capabilities, claims the single recording slot and starts the clock
    /// on a fresh decode of the take.
    ///
    /// Failures before the slot is claimed, and any failure afterwards,
    /// leave the coordinator free for a corrected retry and leave an
    /// in-progress session untouched.
    pub fn begin<'a>(
        &self,
        clock: &'a mut AnimationClock,
        surface: Option<&'a mut dyn VisualSurface>,
        take: Option<Arc<AudioAsset>>,
        environment: &dyn CaptureEnvironment,
        config: &CaptureConfig,
    ) -> Result<CaptureSession<'a>> {
        let take = take.ok_or_else(|| {
            StudioError::precondition("no generated audio take; synthesize speech before exporting")
        })?;
        let surface = surface.ok_or_else(|| {
            StudioError::precondition("no live visual surface to capture")
        })?;

        Capabilities::detect(environment).ensure_supported()?;

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StudioError::precondition(
                "a capture session is already active",
            ));
        }
        let slot = SessionSlot {
            flag: self.active.clone(),
            released: false,
        };

        let track = take.decode()?;
        clock.start(track);
        tracing::info!(
            duration_seconds = take.duration_seconds(),
            fps = surface.frame_rate(),
            "capture session recording"
        );

        Ok(CaptureSession {
            state: SessionState::Recording,
            clock,
            surface,
            take,
            encoder: FrameEncoder::new(config.frames_per_chunk),
            chunks: Vec::new(),
            slot,
        })
    }
}

/// Coordinates the simultaneous capture of rendered output and the driving
/// audio, and hands the result to the exporter.
///
/// The clock and surface are borrowed for the session's lifetime; the
/// session owns only its chunk buffer and encoder. Stopping the animation
/// clock out-of-band while a session is recording is not supported — the
/// drive loop is the sole owner of the tick cadence during capture.
pub struct CaptureSession<'a> {
    state: SessionState,
    clock: &'a mut AnimationClock,
    surface: &'a mut dyn VisualSurface,
    take: Arc<AudioAsset>,
    encoder: FrameEncoder,
    chunks: Vec<RecordedChunk>,
    slot: SessionSlot,
}

impl CaptureSession<'_> {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn chunks(&self) -> &[RecordedChunk] {
        &self.chunks
    }

    /// Records until the take reaches its natural end, then finalizes and
    /// muxes the deliverable.
    ///
    /// This is the single long-lived wait in the system: the call blocks
    /// the caller until playback ends. Clip length is caller-determined, so
    /// there is no implicit timeout.
    pub fn run(&mut self, exporter: &Exporter, base_name: &str) -> Result<Deliverable> {
        if self.state != SessionState::Recording {
            return Err(StudioError::precondition(
                "capture session has already finished",
            ));
        }

        if let Err(error) = self.record() {
            self.fail();
            return Err(error);
        }

        self.finalize(exporter, base_name)
    }

    fn record(&mut self) -> Result<()> {
        while !self.clock.track_ended() {
            let params = self.clock.tick()?.ok_or_else(|| {
                StudioError::precondition(
                    "animation clock stopped while a capture session was recording",
                )
            })?;
            self.surface.apply(&params);
            let frame = self.surface.capture_frame()?;
            if let Some(chunk) = self.encoder.push_frame(&frame) {
                self.chunks.push(chunk);
            }
        }
        Ok(())
    }

    fn finalize(&mut self, exporter: &Exporter, base_name: &str) -> Result<Deliverable> {
        self.state = SessionState::Finalizing;
        tracing::info!(chunks = self.chunks.len(), "playback ended, finalizing capture");

        // Stop the sink first, then drain: a chunk buffered after the stop
        // signal still belongs to the recording.
        self.clock.stop();
        if let Some(tail) = self.encoder.finish() {
            self.chunks.push(tail);
        }

        match exporter.mux(&self.chunks, &self.take, base_name) {
            Ok(deliverable) => {
                self.state = SessionState::Completed;
                self.slot.release();
                Ok(deliverable)
            }
            Err(error) => {
                tracing::warn!(error = %error, "capture finalize failed, discarding chunks");
                self.chunks.clear();
                self.fail();
                Err(error)
            }
        }
    }

    fn fail(&mut self) {
        self.state = SessionState::Failed;
        self.clock.stop();
        self.slot.release();
    }
}

impl std::fmt::Debug for CaptureSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("state", &self.state)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

#[derive(Debug)]
struct SessionSlot {
    flag: Arc<AtomicBool>,
    released: bool,
}

impl SessionSlot {
    fn release(&mut self) {
        if !self.released {
            self.flag.store(false, Ordering::SeqCst);
            self.released = true;
        }
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.release();
    }
}
