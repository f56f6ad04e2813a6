//! Terminal status display

use std::io::Write;

use colored::{ColoredString, Colorize};

use super::{Color, UiUpdate};

/// Microphone glyph shown next to the status
const MIC: &str = "\u{1F3A4}";

/// What the display currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub status: String,
    pub status_color: Color,
    pub indicator: Color,
    pub user_line: String,
    pub response_line: String,
}

/// Renders status and transcript lines to a terminal
pub struct StatusDisplay {
    out: Box<dyn Write + Send>,
    name: String,
    state: DisplayState,
}

impl StatusDisplay {
    /// Display writing to `out`, labelling responses with `name`
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>, name: impl Into<String>) -> Self {
        Self {
            out,
            name: name.into(),
            state: DisplayState::default(),
        }
    }

    /// Display on stdout
    #[must_use]
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(Box::new(std::io::stdout()), name)
    }

    /// Current contents
    #[must_use]
    pub const fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Apply one update and redraw the changed lines
    pub fn apply(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::Status {
                text,
                color,
                indicator,
            } => {
                self.state.status = text;
                self.state.status_color = color;
                self.state.indicator = indicator;
                self.state.user_line.clear();
                self.state.response_line.clear();

                let line = format!(
                    "{} {}",
                    paint(MIC, indicator),
                    paint(&self.state.status, color)
                );
                self.write_line(&line);
            }
            UiUpdate::Exchange { user, response } => {
                self.state.user_line = format!("You: {user}");
                self.state.response_line = format!("{}: {response}", self.name);

                if !user.is_empty() {
                    let line = self.state.user_line.clone();
                    self.write_line(&line);
                }
                if !response.is_empty() {
                    let line = self.state.response_line.italic().to_string();
                    self.write_line(&line);
                }
            }
        }
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to draw status");
        }
    }
}

fn paint(text: &str, color: Color) -> ColoredString {
    match color {
        Color::Black => text.normal(),
        Color::Blue => text.blue(),
        Color::Green => text.green(),
        Color::Orange => text.yellow(),
        Color::Red => text.red(),
        Color::Grey => text.dimmed(),
    }
}
