//! NURA - Neural personal assistant
//!
//! A voice assistant that sleeps until it hears its wake phrase, then answers
//! spoken commands until told goodbye:
//! - Session state machine (inactive/active) driven by wake and exit phrases
//! - Rule-based query interpreter for time, date, weather and personal facts
//! - `SQLite` fact store for remembered facts
//! - Voice collaborators (microphone + STT, TTS + speaker, or the terminal)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │            Foreground (tokio task)               │
//! │   Assistant coordinator  │  Shell / display      │
//! └──────────────┬───────────────────▲───────────────┘
//!        outcome │ (oneshot)  UiUpdate│ (mpsc)
//! ┌──────────────▼───────────────────┴───────────────┐
//! │            Worker thread (one at a time)         │
//! │   Wake loop  │  Command loop  │  Interpreter     │
//! └──────────────┬───────────────────────────────────┘
//!                │
//! ┌──────────────▼───────────────────────────────────┐
//! │   Speech input/output  │  Fact store (SQLite)    │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod interpreter;
pub mod session;
pub mod ui;
pub mod voice;

pub use config::Config;
pub use db::{DbConn, DbPool, Fact, FactStore};
pub use error::{Error, Result};
pub use interpreter::{CannedKnowledge, Clock, Interpreter, KnowledgeSource};
pub use session::{Assistant, AssistantParts, Mode, Session, SessionEvent, Transition};
pub use ui::{Color, Presentation, Shell, StatusDisplay, UiHandle};
pub use voice::{SpeechInput, SpeechOutput};
