//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nura::session::Pacing;
use nura::{
    Assistant, AssistantParts, FactStore, Interpreter, Shell, SpeechInput, SpeechOutput,
    StatusDisplay,
};

/// Set up an in-memory fact store
#[must_use]
pub fn setup_test_store() -> Arc<FactStore> {
    Arc::new(FactStore::in_memory().expect("failed to init test store"))
}

/// Hears each scripted line once; empty lines and the end of the script are
/// silence
pub struct ScriptedInput {
    lines: Mutex<VecDeque<Option<String>>>,
}

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: Mutex::new(
                lines
                    .iter()
                    .map(|l| (!l.is_empty()).then(|| (*l).to_string()))
                    .collect(),
            ),
        }
    }
}

impl SpeechInput for ScriptedInput {
    fn acquire_utterance(&self) -> Option<String> {
        let next = self.lines.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            std::thread::sleep(Duration::from_millis(5));
            None
        })
    }
}

/// Remembers everything spoken
#[derive(Default)]
pub struct RecordingOutput {
    spoken: Mutex<Vec<String>>,
}

impl RecordingOutput {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    /// Wait up to a second for `text` to be spoken
    pub async fn wait_for(&self, text: &str) -> bool {
        for _ in 0..100 {
            if self.spoken().iter().any(|s| s == text) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl SpeechOutput for RecordingOutput {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Assistant with a scripted microphone, no pauses and a display that writes
/// nowhere
pub fn scripted_assistant(
    lines: &[&str],
    output: Arc<RecordingOutput>,
    store: Arc<FactStore>,
) -> Assistant {
    Assistant::new(
        AssistantParts {
            input: Arc::new(ScriptedInput::new(lines)),
            output,
            interpreter: Interpreter::new(),
            store,
            wake: nura::session::PhraseMatcher::wake(),
            exit: nura::session::PhraseMatcher::exit(),
            pacing: Pacing::none(),
        },
        Shell::new(StatusDisplay::new(Box::new(std::io::sink()), "NURA")),
    )
}
