//! Text-to-speech (TTS) processing

use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Upper bound on one synthesis request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Voices offered by the `OpenAI` speech endpoint
const OPENAI_VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

/// Default `OpenAI` voice
const OPENAI_DEFAULT_VOICE: &str = "alloy";

/// Default `ElevenLabs` voice ("Rachel")
const ELEVENLABS_DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

/// TTS provider backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TtsProvider {
    #[default]
    OpenAI,
    ElevenLabs,
}

impl TtsProvider {
    /// Default model for the provider
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI => "tts-1",
            Self::ElevenLabs => "eleven_monolingual_v1",
        }
    }
}

impl FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

/// Pick the voice to synthesize with
///
/// Unknown or empty requests fall back to the provider's default voice.
#[must_use]
pub fn select_voice(provider: TtsProvider, requested: &str) -> String {
    let requested = requested.trim();

    let selected = match provider {
        TtsProvider::OpenAI => {
            let lowered = requested.to_lowercase();
            OPENAI_VOICES
                .iter()
                .find(|v| **v == lowered)
                .copied()
                .unwrap_or(OPENAI_DEFAULT_VOICE)
                .to_string()
        }
        // ElevenLabs voice ids are opaque, anything non-empty is passed through
        TtsProvider::ElevenLabs if requested.is_empty() => ELEVENLABS_DEFAULT_VOICE.to_string(),
        TtsProvider::ElevenLabs => requested.to_string(),
    };

    if selected.eq_ignore_ascii_case(requested) {
        tracing::debug!(voice = %selected, "selected voice");
    } else {
        tracing::debug!(requested, voice = %selected, "voice not found, using default");
    }

    selected
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::blocking::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a new TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(
        provider: TtsProvider,
        api_key: String,
        voice: &str,
        speed: f32,
        model: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(match provider {
                TtsProvider::OpenAI => "OpenAI API key required for TTS".to_string(),
                TtsProvider::ElevenLabs => "ElevenLabs API key required for TTS".to_string(),
            }));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key,
            voice: select_voice(provider, voice),
            speed,
            model,
            provider,
        })
    }

    /// The voice this instance speaks with
    #[must_use]
    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Synthesize text to speech
    ///
    /// Returns MP3 audio bytes.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::OpenAI => self.synthesize_openai(text),
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text),
        }
    }

    /// Synthesize using `OpenAI` TTS
    fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        Ok(response.bytes()?.to_vec())
    }

    /// Synthesize using `ElevenLabs` TTS
    fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{}", self.voice);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        Ok(response.bytes()?.to_vec())
    }
}
