//! Session state machine
//!
//! The assistant is either waiting for a wake phrase (inactive) or taking
//! commands (active). Only the coordinator holds the [`Session`] and it moves
//! between modes only through [`SessionEvent`]s.

mod coordinator;
mod loops;
mod phrases;

pub use coordinator::{Assistant, AssistantParts};
pub use loops::{
    FAREWELL, GREETING, INTRO, LoopContext, LoopOutcome, MISSED_COMMAND, Opening, Pacing, RECOVERY,
    RETRY_PROMPT, run_command_loop, run_wake_loop,
};
pub use phrases::{DEFAULT_EXIT_PHRASES, DEFAULT_WAKE_PHRASES, PhraseMatcher};

/// Listening mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Waiting for a wake phrase
    #[default]
    Inactive,
    /// Taking commands
    Active,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Something that may change the mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A wake phrase was heard
    WakeDetected,
    /// An exit phrase was heard
    ExitDetected,
    /// A listening loop died unexpectedly
    LoopFailed,
}

/// A mode change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
    pub event: SessionEvent,
}

/// The in-memory session
#[derive(Debug, Default)]
pub struct Session {
    mode: Mode,
}

impl Session {
    /// A new session starts inactive
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: Mode::Inactive,
        }
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Apply `event`; returns the transition, or `None` if the event does not
    /// apply in the current mode
    pub fn handle(&mut self, event: SessionEvent) -> Option<Transition> {
        let to = match (self.mode, event) {
            (Mode::Inactive, SessionEvent::WakeDetected) => Mode::Active,
            (Mode::Active, SessionEvent::ExitDetected | SessionEvent::LoopFailed) => {
                Mode::Inactive
            }
            (mode, event) => {
                tracing::debug!(%mode, ?event, "event ignored");
                return None;
            }
        };

        let transition = Transition {
            from: self.mode,
            to,
            event,
        };
        self.mode = to;

        tracing::info!(from = %transition.from, to = %transition.to, ?event, "session transition");
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_inactive() {
        assert_eq!(Session::new().mode(), Mode::Inactive);
    }

    #[test]
    fn test_wake_then_exit() {
        let mut session = Session::new();

        let t = session.handle(SessionEvent::WakeDetected).unwrap();
        assert_eq!((t.from, t.to), (Mode::Inactive, Mode::Active));
        assert_eq!(session.mode(), Mode::Active);

        let t = session.handle(SessionEvent::ExitDetected).unwrap();
        assert_eq!((t.from, t.to), (Mode::Active, Mode::Inactive));
        assert_eq!(session.mode(), Mode::Inactive);
    }

    #[test]
    fn test_irrelevant_events_ignored() {
        let mut session = Session::new();
        assert!(session.handle(SessionEvent::ExitDetected).is_none());
        assert!(session.handle(SessionEvent::LoopFailed).is_none());
        assert_eq!(session.mode(), Mode::Inactive);

        session.handle(SessionEvent::WakeDetected);
        assert!(session.handle(SessionEvent::WakeDetected).is_none());
        assert_eq!(session.mode(), Mode::Active);
    }

    #[test]
    fn test_loop_failure_deactivates() {
        let mut session = Session::new();
        session.handle(SessionEvent::WakeDetected);

        let t = session.handle(SessionEvent::LoopFailed).unwrap();
        assert_eq!(t.to, Mode::Inactive);
    }
}
