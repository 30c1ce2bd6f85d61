use serde::{Deserialize, Serialize};

use crate::{assets::AudioAsset, Result};

/// Emotional register requested from the synthesis voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
}

/// Catalog entry for a synthesis voice.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiceOption {
    pub id: &'static str,
    pub label: &'static str,
    /// Voice identifier understood by the synthesis provider.
    pub provider_voice: &'static str,
    /// Emotions this voice is suited for.
    pub suggested_for: &'static [Emotion],
}

const VOICES: &[VoiceOption] = &[
    VoiceOption {
        id: "brian",
        label: "Brian · Warm Male",
        provider_voice: "Brian",
        suggested_for: &[Emotion::Neutral, Emotion::Happy],
    },
    VoiceOption {
        id: "joanna",
        label: "Joanna · Crisp Female",
        provider_voice: "Joanna",
        suggested_for: &[Emotion::Happy, Emotion::Surprised],
    },
    VoiceOption {
        id: "amy",
        label: "Amy · Friendly",
        provider_voice: "Amy",
        suggested_for: &[Emotion::Neutral, Emotion::Happy],
    },
    VoiceOption {
        id: "justin",
        label: "Justin · Youthful",
        provider_voice: "Justin",
        suggested_for: &[Emotion::Surprised, Emotion::Happy],
    },
    VoiceOption {
        id: "matthew",
        label: "Matthew · Calm Male",
        provider_voice: "Matthew",
        suggested_for: &[Emotion::Neutral, Emotion::Sad],
    },
    VoiceOption {
        id: "salli",
        label: "Salli · Confident",
        provider_voice: "Salli",
        suggested_for: &[Emotion::Angry, Emotion::Surprised],
    },
];

/// The built-in voice catalog.
pub fn voices() -> &'static [VoiceOption] {
    VOICES
}

/// Looks up a catalog voice by its id.
pub fn voice_by_id(id: &str) -> Option<&'static VoiceOption> {
    VOICES.iter().find(|voice| voice.id == id)
}

/// Opaque text-to-speech collaborator. Implementations are remote services;
/// their failures surface as [`StudioError::Source`] statuses and leave the
/// animation state untouched.
///
/// [`StudioError::Source`]: crate::StudioError::Source
pub trait SpeechSynthesizer {
    /// Synthesizes the script with the given voice and emotion, returning
    /// the take as a WAV asset.
    fn synthesize(&self, script: &str, voice: &VoiceOption, emotion: Emotion)
        -> Result<AudioAsset>;
}

/// Opaque transcription collaborator: plain text from an uploaded audio
/// byte buffer. The core does not validate or parse the text.
pub trait Transcriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Result of re-voicing an uploaded clip.
#[derive(Debug)]
pub struct DubResult {
    pub transcript: String,
    pub take: AudioAsset,
}

/// Transcribes an uploaded clip and synthesizes it again with the selected
/// voice and emotion. Errors from either collaborator are passed through
/// verbatim; no retry is attempted here.
pub fn dub(
    transcriber: &dyn Transcriber,
    synthesizer: &dyn SpeechSynthesizer,
    audio: &[u8],
    voice: &VoiceOption,
    emotion: Emotion,
) -> Result<DubResult> {
    let transcript = transcriber.transcribe(audio)?;
    tracing::debug!(chars = transcript.len(), "transcription received, generating dub");
    let take = synthesizer.synthesize(&transcript, voice, emotion)?;
    Ok(DubResult { transcript, take })
}
