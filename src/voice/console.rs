//! Terminal stand-ins for the microphone and speaker

use std::io::{BufRead, BufReader, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{SpeechInput, SpeechOutput};

/// Reads one typed line per utterance
///
/// End of input marks the source exhausted, which stops the assistant.
pub struct ConsoleInput {
    reader: Mutex<Box<dyn BufRead + Send>>,
    closed: AtomicBool,
}

impl ConsoleInput {
    /// Read from stdin
    #[must_use]
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(std::io::stdin()))
    }

    /// Read from any line source
    #[must_use]
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self {
            reader: Mutex::new(Box::new(reader)),
            closed: AtomicBool::new(false),
        }
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechInput for ConsoleInput {
    fn acquire_utterance(&self) -> Option<String> {
        if self.is_exhausted() {
            return None;
        }

        let mut line = String::new();
        let read = match self.reader.lock() {
            Ok(mut reader) => reader.read_line(&mut line),
            Err(_) => Ok(0),
        };

        match read {
            Ok(0) => {
                tracing::info!("input closed");
                self.closed.store(true, Ordering::Release);
                None
            }
            Ok(_) => {
                let line = line.trim();
                (!line.is_empty()).then(|| line.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                None
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Prints what would be spoken
#[derive(Debug, Default)]
pub struct ConsoleOutput;

impl SpeechOutput for ConsoleOutput {
    fn speak(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "(speaking) {text}") {
            tracing::warn!(error = %e, "failed to write speech");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_lines_then_exhausted() {
        let input = ConsoleInput::from_reader(Cursor::new("hey nura\n\n  what is the time  \n"));

        assert_eq!(input.acquire_utterance().as_deref(), Some("hey nura"));
        assert_eq!(input.acquire_utterance(), None);
        assert!(!input.is_exhausted());
        assert_eq!(input.acquire_utterance().as_deref(), Some("what is the time"));

        assert_eq!(input.acquire_utterance(), None);
        assert!(input.is_exhausted());
        assert_eq!(input.acquire_utterance(), None);
    }
}
