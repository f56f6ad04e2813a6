//! Wake-word and command listening loops
//!
//! Each loop blocks on speech input and runs on a worker thread. It returns a
//! [`LoopOutcome`] to the coordinator instead of switching modes itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::PhraseMatcher;
use crate::db::FactStore;
use crate::interpreter::Interpreter;
use crate::ui::{Color, Presentation};
use crate::voice::{SpeechInput, SpeechOutput};

pub const INTRO: &str =
    "Hello, I am NURA, your neural personal assistant. To activate me, say 'NURA' or 'Hey NURA'.";
pub const GREETING: &str = "I'm listening. What do you want me to do?";
pub const FAREWELL: &str = "Goodbye! Have a great day!";
pub const RETRY_PROMPT: &str = "I didn't hear the wake word. Please try again.";
pub const MISSED_COMMAND: &str = "I didn't catch that. Please try again.";
pub const RECOVERY: &str = "Sorry, something went wrong. Say 'NURA' when you need me again.";

const STATUS_WAITING: &str = "NURA: Waiting for activation...";
const STATUS_PROMPT: &str = "NURA: Say 'NURA' to activate...";
const STATUS_RETRY: &str = "NURA: Didn't hear the wake word. Trying again...";
const STATUS_ACTIVE: &str = "NURA: Active. Listening for commands...";
const STATUS_LISTENING: &str = "NURA: Listening for commands...";
const STATUS_UNDEFINED: &str = "NURA: Undefined command...";
const STATUS_DEACTIVATED: &str = "NURA: Deactivated. Waiting for activation...";

/// Pauses between turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After a non-matching wake attempt
    pub retry: Duration,
    /// After an empty command
    pub missed: Duration,
    /// After speaking a response
    pub response: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            retry: Duration::from_secs(1),
            missed: Duration::from_secs(2),
            response: Duration::from_secs(3),
        }
    }
}

impl Pacing {
    /// No pauses at all
    #[must_use]
    pub const fn none() -> Self {
        Self {
            retry: Duration::ZERO,
            missed: Duration::ZERO,
            response: Duration::ZERO,
        }
    }
}

/// How a wake loop opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opening {
    /// First start: introduce the assistant
    Introduce,
    /// After a conversation ended
    Farewell,
    /// After a loop failed
    Recover,
}

/// Why a loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// A wake phrase was heard
    Woke,
    /// An exit phrase was heard
    Exited,
    /// The stop flag was raised or input ended
    Stopped,
}

/// Everything a loop needs, shared with the coordinator
#[derive(Clone)]
pub struct LoopContext {
    pub input: Arc<dyn SpeechInput>,
    pub output: Arc<dyn SpeechOutput>,
    pub ui: Arc<dyn Presentation>,
    pub interpreter: Arc<Interpreter>,
    pub store: Arc<FactStore>,
    pub wake: PhraseMatcher,
    pub exit: PhraseMatcher,
    pub pacing: Pacing,
    pub stop: Arc<AtomicBool>,
}

impl LoopContext {
    /// Stop flag raised or input gone for good
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire) || self.input.is_exhausted()
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Listen until a wake phrase is heard
pub fn run_wake_loop(ctx: &LoopContext, opening: Opening) -> LoopOutcome {
    match opening {
        Opening::Introduce => {
            ctx.ui.update_status(STATUS_WAITING, Color::Black, Color::Grey);
            ctx.output.speak(INTRO);
        }
        Opening::Farewell => {
            ctx.ui.update_status(STATUS_DEACTIVATED, Color::Black, Color::Grey);
            ctx.output.speak(FAREWELL);
        }
        Opening::Recover => {
            ctx.ui.update_status(STATUS_WAITING, Color::Black, Color::Grey);
            ctx.output.speak(RECOVERY);
        }
    }

    loop {
        if ctx.stopped() {
            return LoopOutcome::Stopped;
        }

        ctx.ui.update_status(STATUS_PROMPT, Color::Blue, Color::Grey);

        let Some(heard) = ctx.input.acquire_utterance() else {
            continue;
        };

        if let Some(phrase) = ctx.wake.find(&heard) {
            tracing::info!(phrase, "wake phrase detected");
            return LoopOutcome::Woke;
        }

        tracing::debug!(heard = %heard, "not a wake phrase");
        ctx.ui.update_status(STATUS_RETRY, Color::Orange, Color::Grey);
        ctx.output.speak(RETRY_PROMPT);
        ctx.pause(ctx.pacing.retry);
    }
}

/// Take commands until an exit phrase is heard
pub fn run_command_loop(ctx: &LoopContext) -> LoopOutcome {
    ctx.ui.update_status(STATUS_ACTIVE, Color::Green, Color::Red);
    ctx.output.speak(GREETING);

    loop {
        if ctx.stopped() {
            return LoopOutcome::Stopped;
        }

        ctx.ui.update_status(STATUS_LISTENING, Color::Green, Color::Red);

        let Some(command) = ctx.input.acquire_utterance() else {
            if ctx.input.is_exhausted() {
                return LoopOutcome::Stopped;
            }
            ctx.ui.update_status(STATUS_UNDEFINED, Color::Orange, Color::Red);
            ctx.output.speak(MISSED_COMMAND);
            ctx.ui.show_exchange("", MISSED_COMMAND);
            ctx.pause(ctx.pacing.missed);
            continue;
        };

        ctx.ui.show_exchange(&command, "");

        if let Some(phrase) = ctx.exit.find(&command) {
            tracing::info!(phrase, "exit phrase detected");
            return LoopOutcome::Exited;
        }

        let response = ctx.interpreter.interpret(&command, &ctx.store);
        tracing::debug!(command = %command, response = %response, "answered");

        ctx.ui.show_exchange(&command, &response);
        ctx.output.speak(&response);
        ctx.pause(ctx.pacing.response);
    }
}
