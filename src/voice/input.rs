//! Microphone speech input

use std::time::{Duration, Instant};

use super::capture::{MicStream, SAMPLE_RATE, samples_to_wav};
use super::segmenter::{SegmentLimits, SpeechSegmenter};
use super::stt::{SpeechToText, SttProvider};
use super::SpeechInput;
use crate::Result;

/// How often the capture buffer is drained while listening
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Settings for one listening attempt
#[derive(Debug, Clone)]
pub struct ListenSettings {
    /// STT backend
    pub provider: SttProvider,
    /// API key for the backend
    pub api_key: String,
    /// STT model
    pub model: String,
    /// Spoken language (e.g. "en-US")
    pub language: String,
    /// How long to wait for speech to begin
    pub timeout: Duration,
    /// Ambient noise sampling window
    pub calibration: Duration,
    /// Phrase endpointing limits
    pub limits: SegmentLimits,
}

/// Listens on the default microphone and transcribes one phrase per call
///
/// Opens the microphone, calibrates and builds the STT client per utterance,
/// all on the calling thread.
pub struct MicrophoneInput {
    settings: ListenSettings,
}

impl MicrophoneInput {
    #[must_use]
    pub const fn new(settings: ListenSettings) -> Self {
        Self { settings }
    }

    /// Record one phrase; `None` when no speech began before the timeout
    fn record_phrase(&self) -> Result<Option<Vec<f32>>> {
        let mic = MicStream::open()?;
        let ambient = mic.ambient(self.settings.calibration);
        let mut segmenter = SpeechSegmenter::calibrated(&ambient, SAMPLE_RATE, self.settings.limits);

        tracing::info!("listening");
        let started = Instant::now();

        loop {
            std::thread::sleep(POLL_INTERVAL);

            if segmenter.process(&mic.drain()) {
                break;
            }

            if segmenter.buffered() == 0 && started.elapsed() > self.settings.timeout {
                return Ok(None);
            }
        }

        Ok(Some(segmenter.take_phrase()))
    }

    fn transcribe(&self, samples: &[f32]) -> Result<String> {
        let wav = samples_to_wav(samples, SAMPLE_RATE)?;
        let stt = SpeechToText::new(
            self.settings.provider,
            self.settings.api_key.clone(),
            self.settings.model.clone(),
            self.settings.language.clone(),
        )?;

        tracing::debug!("recognizing");
        stt.transcribe(&wav)
    }
}

impl SpeechInput for MicrophoneInput {
    fn acquire_utterance(&self) -> Option<String> {
        let samples = match self.record_phrase() {
            Ok(Some(samples)) => samples,
            Ok(None) => {
                tracing::debug!("no speech before timeout");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio capture failed");
                return None;
            }
        };

        match self.transcribe(&samples) {
            Ok(text) if text.trim().is_empty() => {
                tracing::debug!("speech not understood");
                None
            }
            Ok(text) => {
                tracing::debug!(transcript = %text, "recognized");
                Some(text.trim().to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                None
            }
        }
    }
}
