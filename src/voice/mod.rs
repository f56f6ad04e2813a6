//! Voice processing module
//!
//! Speech input and output collaborators. Both block the calling thread and
//! never fail: problems are logged here and surface as "nothing heard" or
//! silence.

mod capture;
mod console;
mod input;
mod output;
mod playback;
mod segmenter;
mod stt;
mod tts;

pub use capture::{MicStream, SAMPLE_RATE, rms, samples_to_wav};
pub use console::{ConsoleInput, ConsoleOutput};
pub use input::{ListenSettings, MicrophoneInput};
pub use output::{SpeakSettings, SpeakerOutput};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3};
pub use segmenter::{ENERGY_FLOOR, SegmentLimits, SegmenterState, SpeechSegmenter};
pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider, select_voice};

/// Source of transcribed utterances
pub trait SpeechInput: Send + Sync {
    /// Block until one utterance is heard
    ///
    /// Returns `None` when nothing usable was heard: timeout, unintelligible
    /// speech or a recognition failure.
    fn acquire_utterance(&self) -> Option<String>;

    /// Whether input has ended for good, e.g. a closed terminal
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Speaks text aloud
pub trait SpeechOutput: Send + Sync {
    /// Speak `text`, blocking until playback finishes or fails
    fn speak(&self, text: &str);
}
