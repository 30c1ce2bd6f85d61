/// Result alias that carries the custom [`StudioError`] type.
pub type Result<T> = std::result::Result<T, StudioError>;

/// Common error type for the core crate.
///
/// Every variant renders as a human-readable status line so the application
/// can surface failures directly without crashing the animation loop.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// A capture capability (frame capture, audio-track capture, codec
    /// support) is unavailable in the current environment. Not retryable
    /// without a different environment.
    #[error("capability unavailable: {0}")]
    Capability(String),
    /// Capture was requested before its inputs existed. The caller can
    /// correct the precondition and retry.
    #[error("precondition failed: {0}")]
    Precondition(String),
    /// The finalize/mux step could not produce a valid deliverable.
    #[error("encoding failed: {0}")]
    Encoding(String),
    /// An upstream synthesis or transcription collaborator failed. The
    /// message is surfaced verbatim as the current status.
    #[error("{0}")]
    Source(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around FFT planning and processing errors.
    #[error("{0}")]
    Fft(#[from] realfft::FftError),
    /// Wrapper around WAV decode errors raised while loading a take.
    #[error("{0}")]
    Wav(#[from] hound::Error),
    /// Wrapper around JSON errors raised while loading configuration or
    /// dumping parameter traces.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl StudioError {
    /// Creates a new capability error from the provided message.
    pub fn capability<T: Into<String>>(msg: T) -> Self {
        Self::Capability(msg.into())
    }

    /// Creates a new precondition error from the provided message.
    pub fn precondition<T: Into<String>>(msg: T) -> Self {
        Self::Precondition(msg.into())
    }

    /// Creates a new encoding error from the provided message.
    pub fn encoding<T: Into<String>>(msg: T) -> Self {
        Self::Encoding(msg.into())
    }

    /// Creates a new source error wrapping a collaborator failure.
    pub fn source<T: Into<String>>(msg: T) -> Self {
        Self::Source(msg.into())
    }
}
