//! Database schema

use rusqlite::Connection;

use crate::Result;

/// Table holding one row per remembered key phrase
pub const FACTS_TABLE: &str = "personal_info";

/// Create the facts table if it does not exist yet
///
/// # Errors
///
/// Returns error if the statement fails
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS personal_info (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key_phrase TEXT UNIQUE,
            value TEXT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        ",
    )?;

    tracing::debug!(table = FACTS_TABLE, "facts table checked/created");
    Ok(())
}
