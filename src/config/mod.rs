//! Configuration management for NURA
//!
//! Resolved with priority env > `~/.config/nura/config.toml` > defaults.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::interpreter::{CannedKnowledge, DEFAULT_WEATHER};
use crate::session::{DEFAULT_EXIT_PHRASES, DEFAULT_WAKE_PHRASES, Pacing, PhraseMatcher};
use crate::voice::{ListenSettings, SegmentLimits, SpeakSettings, SttProvider, TtsProvider};
use crate::{Error, Result};

use file::NuraConfigFile;

/// Database file name used when none is configured
pub const DEFAULT_DATABASE: &str = "nura_personal_data.db";

/// NURA configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the fact database
    pub data_dir: PathBuf,

    /// Fact database file
    pub db_path: PathBuf,

    /// Phrases that activate the assistant
    pub wake_phrases: Vec<String>,

    /// Phrases that end a conversation
    pub exit_phrases: Vec<String>,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Pauses between turns
    pub pacing: Pacing,

    /// Weather sentence for weather queries
    pub weather: String,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// Spoken language
    pub language: String,

    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Playback volume (0.0 to 1.0)
    pub volume: f32,

    /// How long to wait for speech to begin
    pub listen_timeout: Duration,

    /// Longest phrase captured per utterance
    pub phrase_time_limit: Duration,

    /// Ambient noise sampling window
    pub calibration: Duration,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,
}

/// Default data directory: `~/.local/share/nura/` on Linux
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/nura"),
        |d| d.data_dir().join("nura"),
    )
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// `db_override` replaces the configured database path.
    ///
    /// # Errors
    ///
    /// Returns error if a setting is out of range
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let fc = file::load_config_file();
        let mut config = Self::from_sources(fc, |key| std::env::var(key).ok(), default_data_dir())?;

        if let Some(path) = db_override {
            config.db_path = path;
        }

        tracing::debug!(
            data_dir = %config.data_dir.display(),
            db = %config.db_path.display(),
            "configuration loaded"
        );

        Ok(config)
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a setting is out of range
    pub fn from_sources(
        fc: NuraConfigFile,
        env: impl Fn(&str) -> Option<String>,
        default_data_dir: PathBuf,
    ) -> Result<Self> {
        // Empty variables count as unset
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
        };

        let data_dir = env("NURA_DATA_DIR")
            .or(fc.data_dir)
            .map_or(default_data_dir, PathBuf::from);

        let database = fc.database.unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let db_path = resolve_db_path(&data_dir, &database);

        let session = fc.session;
        let wake_phrases = session.wake_phrases.unwrap_or_else(|| owned(DEFAULT_WAKE_PHRASES));
        let exit_phrases = session.exit_phrases.unwrap_or_else(|| owned(DEFAULT_EXIT_PHRASES));

        if PhraseMatcher::new(&wake_phrases).phrases().is_empty() {
            return Err(Error::Config("at least one wake phrase is required".to_string()));
        }
        if PhraseMatcher::new(&exit_phrases).phrases().is_empty() {
            return Err(Error::Config("at least one exit phrase is required".to_string()));
        }

        let defaults = Pacing::default();
        let pacing = Pacing {
            retry: session.retry_pause_ms.map_or(defaults.retry, Duration::from_millis),
            missed: session.missed_pause_ms.map_or(defaults.missed, Duration::from_millis),
            response: session
                .response_pause_ms
                .map_or(defaults.response, Duration::from_millis),
        };

        let fv = fc.voice;

        let stt_provider = env("NURA_STT_PROVIDER")
            .or(fv.stt_provider)
            .map(|p| p.parse::<SttProvider>())
            .transpose()?
            .unwrap_or_default();

        let tts_provider = env("NURA_TTS_PROVIDER")
            .or(fv.tts_provider)
            .map(|p| p.parse::<TtsProvider>())
            .transpose()?
            .unwrap_or_default();

        let tts_speed = fv.tts_speed.unwrap_or(1.0);
        if !(0.25..=4.0).contains(&tts_speed) {
            return Err(Error::Config(format!(
                "tts_speed must be between 0.25 and 4.0, got {tts_speed}"
            )));
        }

        let volume = fv.volume.unwrap_or(0.9);
        if !(0.0..=1.0).contains(&volume) {
            return Err(Error::Config(format!(
                "volume must be between 0.0 and 1.0, got {volume}"
            )));
        }

        let voice = VoiceConfig {
            stt_provider,
            stt_model: env("NURA_STT_MODEL")
                .or(fv.stt_model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            language: fv.language.unwrap_or_else(|| "en-US".to_string()),
            tts_provider,
            tts_model: env("NURA_TTS_MODEL")
                .or(fv.tts_model)
                .unwrap_or_else(|| tts_provider.default_model().to_string()),
            tts_voice: env("NURA_TTS_VOICE").or(fv.tts_voice).unwrap_or_default(),
            tts_speed,
            volume,
            listen_timeout: seconds("listen_timeout_secs", fv.listen_timeout_secs, 5.0)?,
            phrase_time_limit: seconds("phrase_time_limit_secs", fv.phrase_time_limit_secs, 5.0)?,
            calibration: Duration::from_millis(fv.calibration_ms.unwrap_or(500)),
        };

        Ok(Self {
            data_dir,
            db_path,
            wake_phrases,
            exit_phrases,
            voice,
            pacing,
            weather: fc.knowledge.weather.unwrap_or_else(|| DEFAULT_WEATHER.to_string()),
            api_keys,
        })
    }

    /// Matcher for the configured wake phrases
    #[must_use]
    pub fn wake_matcher(&self) -> PhraseMatcher {
        PhraseMatcher::new(&self.wake_phrases)
    }

    /// Matcher for the configured exit phrases
    #[must_use]
    pub fn exit_matcher(&self) -> PhraseMatcher {
        PhraseMatcher::new(&self.exit_phrases)
    }

    /// Canned answers with the configured weather sentence
    #[must_use]
    pub fn knowledge(&self) -> CannedKnowledge {
        CannedKnowledge::new(self.weather.clone())
    }

    /// Microphone settings
    ///
    /// # Errors
    ///
    /// Returns error if the STT provider's API key is missing
    pub fn listen_settings(&self) -> Result<ListenSettings> {
        let (key, name) = match self.voice.stt_provider {
            SttProvider::Whisper => (&self.api_keys.openai, "OPENAI_API_KEY"),
            SttProvider::Deepgram => (&self.api_keys.deepgram, "DEEPGRAM_API_KEY"),
        };

        Ok(ListenSettings {
            provider: self.voice.stt_provider,
            api_key: require_key(key.as_ref(), name)?,
            model: self.voice.stt_model.clone(),
            language: self.voice.language.clone(),
            timeout: self.voice.listen_timeout,
            calibration: self.voice.calibration,
            limits: SegmentLimits {
                phrase_limit: self.voice.phrase_time_limit,
                ..SegmentLimits::default()
            },
        })
    }

    /// Speaker settings
    ///
    /// # Errors
    ///
    /// Returns error if the TTS provider's API key is missing
    pub fn speak_settings(&self) -> Result<SpeakSettings> {
        let (key, name) = match self.voice.tts_provider {
            TtsProvider::OpenAI => (&self.api_keys.openai, "OPENAI_API_KEY"),
            TtsProvider::ElevenLabs => (&self.api_keys.elevenlabs, "ELEVENLABS_API_KEY"),
        };

        Ok(SpeakSettings {
            provider: self.voice.tts_provider,
            api_key: require_key(key.as_ref(), name)?,
            model: self.voice.tts_model.clone(),
            voice: self.voice.tts_voice.clone(),
            speed: self.voice.tts_speed,
            volume: self.voice.volume,
        })
    }
}

fn owned(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(ToString::to_string).collect()
}

fn resolve_db_path(data_dir: &Path, database: &str) -> PathBuf {
    let path = Path::new(database);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

fn seconds(name: &str, value: Option<f32>, default: f32) -> Result<Duration> {
    let secs = value.unwrap_or(default);
    Duration::try_from_secs_f32(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| Error::Config(format!("{name} must be a positive number, got {secs}")))
}

fn require_key(key: Option<&String>, name: &str) -> Result<String> {
    key.cloned()
        .ok_or_else(|| Error::Config(format!("{name} is not set")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolve(fc: NuraConfigFile, vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_sources(fc, |k| vars.get(k).cloned(), PathBuf::from("/data/nura"))
    }

    #[test]
    fn test_defaults() {
        let config = resolve(NuraConfigFile::default(), &[]).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/nura/nura_personal_data.db"));
        assert_eq!(config.wake_phrases, vec!["nura", "hey nura", "ok nura"]);
        assert_eq!(config.exit_phrases, vec!["exit", "quit", "goodbye", "bye bye"]);
        assert_eq!(config.pacing, Pacing::default());
        assert_eq!(config.weather, DEFAULT_WEATHER);
        assert_eq!(config.voice.stt_model, "whisper-1");
        assert_eq!(config.voice.tts_model, "tts-1");
        assert_eq!(config.voice.listen_timeout, Duration::from_secs(5));
        assert_eq!(config.voice.calibration, Duration::from_millis(500));
        assert!((config.voice.volume - 0.9).abs() < f32::EPSILON);
        assert!(config.api_keys.openai.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut fc = NuraConfigFile::default();
        fc.api_keys.openai = Some("from-file".to_string());
        fc.database = Some("facts.db".to_string());
        fc.voice.stt_provider = Some("whisper".to_string());

        let config = resolve(
            fc,
            &[
                ("OPENAI_API_KEY", "from-env"),
                ("NURA_DATA_DIR", "/tmp/nura"),
                ("NURA_STT_PROVIDER", "deepgram"),
                ("DEEPGRAM_API_KEY", ""),
            ],
        )
        .unwrap();

        assert_eq!(config.api_keys.openai.as_deref(), Some("from-env"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/nura/facts.db"));
        assert_eq!(config.voice.stt_provider, SttProvider::Deepgram);
        assert_eq!(config.voice.stt_model, "nova-2");
        // Empty variables are ignored
        assert!(config.api_keys.deepgram.is_none());
    }

    #[test]
    fn test_absolute_database_path() {
        let mut fc = NuraConfigFile::default();
        fc.database = Some("/var/lib/facts.db".to_string());

        let config = resolve(fc, &[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/facts.db"));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut fc = NuraConfigFile::default();
        fc.voice.volume = Some(1.5);
        assert!(matches!(resolve(fc, &[]), Err(Error::Config(_))));

        let mut fc = NuraConfigFile::default();
        fc.voice.tts_speed = Some(0.0);
        assert!(matches!(resolve(fc, &[]), Err(Error::Config(_))));

        let mut fc = NuraConfigFile::default();
        fc.voice.listen_timeout_secs = Some(-1.0);
        assert!(matches!(resolve(fc, &[]), Err(Error::Config(_))));

        let mut fc = NuraConfigFile::default();
        fc.session.wake_phrases = Some(vec!["  ".to_string()]);
        assert!(matches!(resolve(fc, &[]), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(resolve(NuraConfigFile::default(), &[("NURA_TTS_PROVIDER", "espeak")]).is_err());
    }

    #[test]
    fn test_settings_need_keys() {
        let config = resolve(NuraConfigFile::default(), &[]).unwrap();
        assert!(config.listen_settings().is_err());
        assert!(config.speak_settings().is_err());

        let config = resolve(NuraConfigFile::default(), &[("OPENAI_API_KEY", "sk-test")]).unwrap();
        let listen = config.listen_settings().unwrap();
        assert_eq!(listen.api_key, "sk-test");
        assert_eq!(listen.limits.phrase_limit, Duration::from_secs(5));

        let speak = config.speak_settings().unwrap();
        assert_eq!(speak.provider, TtsProvider::OpenAI);
        assert_eq!(speak.api_key, "sk-test");
    }

    #[test]
    fn test_custom_pacing_and_phrases() {
        let mut fc = NuraConfigFile::default();
        fc.session.retry_pause_ms = Some(0);
        fc.session.wake_phrases = Some(vec!["Computer".to_string()]);

        let config = resolve(fc, &[]).unwrap();
        assert_eq!(config.pacing.retry, Duration::ZERO);
        assert_eq!(config.pacing.missed, Duration::from_secs(2));
        assert!(config.wake_matcher().matches("computer, wake up"));
        assert!(!config.wake_matcher().matches("hey nura"));
    }
}
