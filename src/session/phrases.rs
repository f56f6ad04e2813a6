//! Wake and exit phrase detection on transcripts

/// Default phrases that wake the assistant
pub const DEFAULT_WAKE_PHRASES: &[&str] = &["nura", "hey nura", "ok nura"];

/// Default phrases that end a conversation
pub const DEFAULT_EXIT_PHRASES: &[&str] = &["exit", "quit", "goodbye", "bye bye"];

/// Case-insensitive containment test against a fixed phrase list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatcher {
    phrases: Vec<String>,
}

impl PhraseMatcher {
    /// Create a matcher; phrases are lowercased and trimmed, blanks dropped
    #[must_use]
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Self { phrases }
    }

    /// Matcher for the default wake phrases
    #[must_use]
    pub fn wake() -> Self {
        Self::new(DEFAULT_WAKE_PHRASES)
    }

    /// Matcher for the default exit phrases
    #[must_use]
    pub fn exit() -> Self {
        Self::new(DEFAULT_EXIT_PHRASES)
    }

    /// The first phrase contained in `transcript`
    #[must_use]
    pub fn find(&self, transcript: &str) -> Option<&str> {
        let normalized = transcript.to_lowercase();

        self.phrases
            .iter()
            .find(|p| normalized.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Whether `transcript` contains any phrase
    #[must_use]
    pub fn matches(&self, transcript: &str) -> bool {
        self.find(transcript).is_some()
    }

    /// The configured phrases
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}
