//! Canned answers for weather and "who is" questions
//!
//! These are placeholders, not authoritative data. Swap in a live source by
//! implementing [`KnowledgeSource`].

/// Source of general-knowledge answers
pub trait KnowledgeSource: Send + Sync {
    /// Current weather summary
    fn weather(&self) -> String;

    /// Short biography for `subject`, `None` if unknown
    fn biography(&self, subject: &str) -> Option<String>;
}

/// Default weather placeholder
pub const DEFAULT_WEATHER: &str =
    "The weather in Kolkata is pleasant today, with a temperature of 28 degrees Celsius.";

/// Fixed answers compiled into the binary
#[derive(Debug, Clone)]
pub struct CannedKnowledge {
    weather: String,
    biographies: Vec<(String, String)>,
}

impl CannedKnowledge {
    /// Canned knowledge with a custom weather line
    #[must_use]
    pub fn new(weather: impl Into<String>) -> Self {
        Self {
            weather: weather.into(),
            biographies: default_biographies(),
        }
    }

    /// Add or replace a biography
    #[must_use]
    pub fn with_biography(mut self, subject: &str, text: impl Into<String>) -> Self {
        let subject = subject.trim().to_lowercase();
        self.biographies.retain(|(s, _)| *s != subject);
        self.biographies.push((subject, text.into()));
        self
    }
}

impl Default for CannedKnowledge {
    fn default() -> Self {
        Self::new(DEFAULT_WEATHER)
    }
}

impl KnowledgeSource for CannedKnowledge {
    fn weather(&self) -> String {
        self.weather.clone()
    }

    fn biography(&self, subject: &str) -> Option<String> {
        let subject = subject.trim().to_lowercase();
        self.biographies
            .iter()
            .find(|(s, _)| *s == subject)
            .map(|(_, text)| text.clone())
    }
}

fn default_biographies() -> Vec<(String, String)> {
    vec![
        (
            "elon musk".to_string(),
            "Elon Musk is an entrepreneur and investor. He is the founder, CEO, and chief \
             designer of SpaceX, Tesla, Neuralink, and The Boring Company."
                .to_string(),
        ),
        (
            "donald trump".to_string(),
            "Donald Trump was the 45th President of the United States.".to_string(),
        ),
    ]
}
