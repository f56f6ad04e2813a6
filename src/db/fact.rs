//! Personal fact store: one value per key phrase, last write wins

use std::path::Path;
use std::sync::RwLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::OptionalExtension;

use super::{DbConn, DbPool};
use crate::{Error, Result};

/// A remembered fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub id: i64,
    pub key_phrase: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Durable key/value store for personal facts
///
/// Shared between the listening loops and the shutdown hook; every call checks
/// out the single pooled connection, so concurrent callers are serialized.
pub struct FactStore {
    pool: RwLock<Option<DbPool>>,
}

impl FactStore {
    /// Wrap an initialized pool
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self {
            pool: RwLock::new(Some(pool)),
        }
    }

    /// Open (or create) the store backed by the database file at `path`
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        super::init(path).map(Self::new)
    }

    /// Open a store backed by an in-memory database
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be initialized
    pub fn in_memory() -> Result<Self> {
        super::init_memory().map(Self::new)
    }

    fn conn(&self) -> Result<DbConn> {
        let guard = self
            .pool
            .read()
            .map_err(|_| Error::Database("fact store lock poisoned".to_string()))?;
        let pool = guard.as_ref().ok_or(Error::StoreClosed)?;

        pool.get().map_err(|e| Error::Database(e.to_string()))
    }

    /// Store `value` under `key_phrase`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed or the write fails
    pub fn store(&self, key_phrase: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE personal_info SET value = ?1, timestamp = CURRENT_TIMESTAMP WHERE key_phrase = ?2",
            [value, key_phrase],
        )?;

        if updated == 0 {
            conn.execute(
                "INSERT INTO personal_info (key_phrase, value) VALUES (?1, ?2)",
                [key_phrase, value],
            )?;
        }

        tracing::info!(key_phrase, "stored fact");
        tracing::debug!(key_phrase, value, "stored value");
        Ok(())
    }

    /// Get the current value for `key_phrase`, `None` if never stored
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed or the read fails
    pub fn get(&self, key_phrase: &str) -> Result<Option<String>> {
        let conn = self.conn()?;

        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM personal_info WHERE key_phrase = ?1",
                [key_phrase],
                |row| row.get(0),
            )
            .optional()?;

        match &value {
            Some(v) => tracing::debug!(key_phrase, value = %v, "retrieved fact"),
            None => tracing::debug!(key_phrase, "no fact stored"),
        }

        Ok(value)
    }

    /// Get the full record for `key_phrase`
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed or the read fails
    pub fn fact(&self, key_phrase: &str) -> Result<Option<Fact>> {
        let conn = self.conn()?;

        let fact = conn
            .query_row(
                "SELECT id, key_phrase, value, timestamp FROM personal_info WHERE key_phrase = ?1",
                [key_phrase],
                row_to_fact,
            )
            .optional()?;

        Ok(fact)
    }

    /// List every stored fact, oldest key first
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed or the read fails
    pub fn list(&self) -> Result<Vec<Fact>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare("SELECT id, key_phrase, value, timestamp FROM personal_info ORDER BY id")?;

        let facts = stmt
            .query_map([], row_to_fact)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(facts)
    }

    /// Release the underlying connection
    ///
    /// Later calls fail with [`Error::StoreClosed`].
    pub fn close(&self) {
        let pool = match self.pool.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if pool.is_some() {
            tracing::info!("fact store closed");
        } else {
            tracing::debug!("fact store already closed");
        }
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.read().map_or(true, |guard| guard.is_none())
    }
}

fn row_to_fact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Fact> {
    let raw: String = row.get(3)?;
    let updated_at = parse_timestamp(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Fact {
        id: row.get(0)?,
        key_phrase: row.get(1)?,
        value: row.get(2)?,
        updated_at,
    })
}

/// Parse `SQLite`'s `CURRENT_TIMESTAMP` format (UTC, second precision)
fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> FactStore {
        FactStore::in_memory().unwrap()
    }

    #[test]
    fn test_store_and_get() {
        let store = setup();
        store.store("my name", "Alice").unwrap();

        assert_eq!(store.get("my name").unwrap().as_deref(), Some("Alice"));
    }

    #[test]
    fn test_last_write_wins() {
        let store = setup();
        store.store("my favorite color", "blue").unwrap();
        store.store("my favorite color", "green").unwrap();

        assert_eq!(
            store.get("my favorite color").unwrap().as_deref(),
            Some("green")
        );

        let rows: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .filter(|f| f.key_phrase == "my favorite color")
            .collect();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_update_keeps_row_id() {
        let store = setup();
        store.store("my name", "Alice").unwrap();
        let first = store.fact("my name").unwrap().unwrap();

        store.store("my name", "Bob").unwrap();
        let second = store.fact("my name").unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.value, "Bob");
        assert!(second.updated_at >= first.updated_at);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = setup();
        assert_eq!(store.get("my name").unwrap(), None);
        assert!(store.fact("my name").unwrap().is_none());
    }

    #[test]
    fn test_store_accepts_any_key() {
        let store = setup();
        store.store("my dog's name", "Rex").unwrap();

        assert_eq!(store.get("my dog's name").unwrap().as_deref(), Some("Rex"));
    }

    #[test]
    fn test_list_orders_by_insertion() {
        let store = setup();
        store.store("my name", "Alice").unwrap();
        store.store("my favorite color", "red").unwrap();
        store.store("my name", "Alicia").unwrap();

        let keys: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|f| f.key_phrase)
            .collect();
        assert_eq!(keys, vec!["my name", "my favorite color"]);
    }

    #[test]
    fn test_close_then_use_fails() {
        let store = setup();
        store.store("my name", "Alice").unwrap();

        store.close();
        assert!(store.is_closed());
        assert!(matches!(store.get("my name"), Err(Error::StoreClosed)));
        assert!(matches!(
            store.store("my name", "Bob"),
            Err(Error::StoreClosed)
        ));

        // second close is harmless
        store.close();
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.db");

        let store = FactStore::open(&path).unwrap();
        store.store("my name", "Alice").unwrap();
        store.close();

        let reopened = FactStore::open(&path).unwrap();
        assert_eq!(reopened.get("my name").unwrap().as_deref(), Some("Alice"));
    }

    #[test]
    fn test_concurrent_writers_serialize() {
        let store = std::sync::Arc::new(setup());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        store.store("counter", &format!("{i}-{j}")).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let rows = store.list().unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2024-03-01 12:30:45").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:45+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_values_stay_out_of_info_logs() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let store = setup();
            store.store("my name", "Zebediah").unwrap();
        });

        let logged = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("stored fact"));
        assert!(!logged.contains("Zebediah"));
    }

    #[test]
    fn test_corrupt_timestamp_is_reported() {
        let pool = crate::db::init_memory().unwrap();
        pool.get()
            .unwrap()
            .execute(
                "INSERT INTO personal_info (key_phrase, value, timestamp) VALUES ('my name', 'Alice', 'not a time')",
                [],
            )
            .unwrap();

        let store = FactStore::new(pool);
        assert!(matches!(store.list(), Err(Error::Sqlite(_))));
        assert!(matches!(store.fact("my name"), Err(Error::Sqlite(_))));
        // The value itself is still readable
        assert_eq!(store.get("my name").unwrap().as_deref(), Some("Alice"));
    }
}
