//! Error types for the NURA assistant

use thiserror::Error;

/// Result type alias for NURA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or stream error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// The fact store was used after `close`
    #[error("fact store is closed")]
    StoreClosed,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_convert() {
        let io: Error = std::io::Error::other("disk gone").into();
        assert!(matches!(io, Error::Io(_)));

        let sqlite: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(sqlite, Error::Sqlite(_)));

        assert_eq!(Error::StoreClosed.to_string(), "fact store is closed");
    }
}
