//! Speaker speech output

use super::playback::AudioPlayback;
use super::tts::{TextToSpeech, TtsProvider};
use super::SpeechOutput;
use crate::Result;

/// Settings for speech synthesis
#[derive(Debug, Clone)]
pub struct SpeakSettings {
    /// TTS backend
    pub provider: TtsProvider,
    /// API key for the backend
    pub api_key: String,
    /// TTS model
    pub model: String,
    /// Requested voice
    pub voice: String,
    /// Speed multiplier
    pub speed: f32,
    /// Playback volume, 0.0 to 1.0
    pub volume: f32,
}

/// Speaks through the default output device
///
/// Builds a fresh synthesizer and output stream for every utterance, so voice
/// selection happens per call and no two calls share an engine.
pub struct SpeakerOutput {
    settings: SpeakSettings,
}

impl SpeakerOutput {
    #[must_use]
    pub const fn new(settings: SpeakSettings) -> Self {
        Self { settings }
    }

    fn try_speak(&self, text: &str) -> Result<()> {
        let tts = TextToSpeech::new(
            self.settings.provider,
            self.settings.api_key.clone(),
            &self.settings.voice,
            self.settings.speed,
            self.settings.model.clone(),
        )?;

        let audio = tts.synthesize(text)?;
        tracing::debug!(bytes = audio.len(), voice = tts.voice(), "synthesized speech");

        AudioPlayback::new(self.settings.volume)?.play_mp3(&audio)
    }
}

impl SpeechOutput for SpeakerOutput {
    fn speak(&self, text: &str) {
        tracing::debug!(text, "speaking");

        if let Err(e) = self.try_speak(text) {
            tracing::error!(error = %e, "could not speak");
        }
    }
}
