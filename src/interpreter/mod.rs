//! Query interpreter
//!
//! Maps one transcribed utterance to a spoken response. Matching is an ordered
//! table of literal, case-insensitive substring rules; the first rule with a
//! matching pattern wins.

mod knowledge;

use chrono::{DateTime, Local};

use crate::db::FactStore;

pub use knowledge::{CannedKnowledge, DEFAULT_WEATHER, KnowledgeSource};

/// Format used when speaking the time of day (e.g. `03:07 PM`)
pub const TIME_FORMAT: &str = "%I:%M %p";

/// Format used when speaking the date (e.g. `Friday, March 1, 2024`)
pub const DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A personal fact slot the interpreter knows how to fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Name,
    FavoriteColor,
}

impl Slot {
    /// Key phrase the slot is stored under
    #[must_use]
    pub const fn key_phrase(self) -> &'static str {
        match self {
            Self::Name => "my name",
            Self::FavoriteColor => "my favorite color",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::FavoriteColor => "favorite color",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Remember(Slot),
    Recall(Slot),
    Date,
    Time,
    Weather,
    WhoIs,
}

struct Rule {
    patterns: &'static [&'static str],
    action: Action,
}

/// Phrase prefix that selects the "noted" confirmation wording
const REMEMBER_PREFIX: &str = "remember that ";

const RULES: &[Rule] = &[
    Rule {
        patterns: &["remember that my name is", "my name is"],
        action: Action::Remember(Slot::Name),
    },
    Rule {
        patterns: &["remember that my favorite color is", "my favorite color is"],
        action: Action::Remember(Slot::FavoriteColor),
    },
    Rule {
        patterns: &["what is my name"],
        action: Action::Recall(Slot::Name),
    },
    Rule {
        patterns: &["what is my favorite color"],
        action: Action::Recall(Slot::FavoriteColor),
    },
    Rule {
        patterns: &["what is the date", "today's date"],
        action: Action::Date,
    },
    Rule {
        patterns: &["what is the time", "current time"],
        action: Action::Time,
    },
    Rule {
        patterns: &["what is the weather", "tell me about the weather"],
        action: Action::Weather,
    },
    Rule {
        patterns: &["who is "],
        action: Action::WhoIs,
    },
];

/// Turns utterances into responses, reading and writing personal facts
pub struct Interpreter {
    knowledge: Box<dyn KnowledgeSource>,
    clock: Box<dyn Clock>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter with canned knowledge and the system clock
    #[must_use]
    pub fn new() -> Self {
        Self {
            knowledge: Box::new(CannedKnowledge::default()),
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the weather/biography source
    #[must_use]
    pub fn with_knowledge(mut self, knowledge: impl KnowledgeSource + 'static) -> Self {
        self.knowledge = Box::new(knowledge);
        self
    }

    /// Replace the clock used for date and time answers
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Produce the response for `query`
    ///
    /// Store failures are logged and answered with an apology; this never fails.
    pub fn interpret(&self, query: &str, store: &FactStore) -> String {
        let lowered = query.to_ascii_lowercase();

        for rule in RULES {
            let Some((pattern, pos)) = rule
                .patterns
                .iter()
                .find_map(|p| lowered.find(p).map(|pos| (*p, pos)))
            else {
                continue;
            };

            tracing::debug!(pattern, "query matched");
            let rest = &query[pos + pattern.len()..];

            let response = match rule.action {
                Action::Remember(slot) => {
                    remember(store, slot, rest, pattern.starts_with(REMEMBER_PREFIX))
                }
                Action::Recall(slot) => recall(store, slot),
                Action::Date => format!(
                    "Today's date is {}.",
                    self.clock.now().format(DATE_FORMAT)
                ),
                Action::Time => format!(
                    "The current time is {}.",
                    self.clock.now().format(TIME_FORMAT)
                ),
                Action::Weather => self.knowledge.weather(),
                Action::WhoIs => match self.knowledge.biography(clean_value(rest)) {
                    Some(bio) => bio,
                    None => break,
                },
            };

            return response;
        }

        fallback(query)
    }
}

fn remember(store: &FactStore, slot: Slot, rest: &str, noted: bool) -> String {
    let value = clean_value(rest);

    if value.is_empty() {
        return match (slot, noted) {
            (Slot::Name, false) => {
                "I didn't understand your name. Could you please state it clearly?".to_string()
            }
            (Slot::Name, true) => "I didn't catch the name to remember.".to_string(),
            (Slot::FavoriteColor, false) => "I didn't understand your favorite color.".to_string(),
            (Slot::FavoriteColor, true) => "I didn't catch the color to remember.".to_string(),
        };
    }

    if let Err(e) = store.store(slot.key_phrase(), value) {
        tracing::warn!(error = %e, key_phrase = slot.key_phrase(), "failed to store fact");
        return format!(
            "Sorry, I couldn't save your {} right now. Please try again later.",
            slot.label()
        );
    }

    match (slot, noted) {
        (Slot::Name, false) => format!("Okay, I will remember that your name is {value}."),
        (Slot::Name, true) => format!("Okay, I've noted that your name is {value}."),
        (Slot::FavoriteColor, false) => {
            format!("Alright, your favorite color is {value}. I'll remember that.")
        }
        (Slot::FavoriteColor, true) => {
            format!("Got it, I'll remember your favorite color is {value}.")
        }
    }
}

fn recall(store: &FactStore, slot: Slot) -> String {
    match store.get(slot.key_phrase()) {
        Ok(Some(value)) => format!("Your {} is {value}.", slot.label()),
        Ok(None) => format!(
            "I don't remember your {}. Would you like to tell me?",
            slot.label()
        ),
        Err(e) => {
            tracing::warn!(error = %e, key_phrase = slot.key_phrase(), "failed to read fact");
            format!(
                "Sorry, I couldn't look up your {} right now.",
                slot.label()
            )
        }
    }
}

/// Trim whitespace and trailing sentence punctuation added by transcription
fn clean_value(rest: &str) -> &str {
    rest.trim()
        .trim_end_matches(['.', '!', '?', ','])
        .trim_end()
}

fn fallback(query: &str) -> String {
    format!(
        "I can help you with date, time, weather, and remember your name or favorite color. \
         You said: '{query}'."
    )
}
