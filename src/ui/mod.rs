//! Presentation layer
//!
//! Background loops talk to the display only through [`UiHandle`], which
//! queues updates for the foreground task that owns the [`Shell`].

mod display;
mod shell;

use tokio::sync::mpsc;

pub use display::{DisplayState, StatusDisplay};
pub use shell::Shell;

/// Colors used for the status line and the microphone indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Black,
    Blue,
    Green,
    Orange,
    Red,
    Grey,
}

/// One queued change to the display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// Replace the status line and clear the exchange
    Status {
        text: String,
        color: Color,
        indicator: Color,
    },
    /// Show what was heard and what was answered
    Exchange { user: String, response: String },
}

/// Thread-safe access to the display
pub trait Presentation: Send + Sync {
    fn update_status(&self, text: &str, color: Color, indicator: Color);

    fn show_exchange(&self, user_text: &str, response_text: &str);
}

/// Cloneable sender side of the display queue
#[derive(Debug, Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiUpdate>,
}

impl UiHandle {
    fn send(&self, update: UiUpdate) {
        // The shell is gone during shutdown; late updates are dropped
        if self.tx.send(update).is_err() {
            tracing::trace!("display closed, update dropped");
        }
    }
}

impl Presentation for UiHandle {
    fn update_status(&self, text: &str, color: Color, indicator: Color) {
        self.send(UiUpdate::Status {
            text: text.to_string(),
            color,
            indicator,
        });
    }

    fn show_exchange(&self, user_text: &str, response_text: &str) {
        self.send(UiUpdate::Exchange {
            user: user_text.to_string(),
            response: response_text.to_string(),
        });
    }
}
