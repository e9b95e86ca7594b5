use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Default busy_timeout (milliseconds) applied to every connection.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply the per-connection settings every store relies on.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a fresh connection. Stores call this once per operation and drop the
/// connection afterwards, so no transaction ever spans more than one row.
pub fn open_sqlite_connection(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create the tables used by the config store and the history log.
/// Idempotent; run once at startup.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS api_config (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS translation_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name TEXT NOT NULL,
            original_text TEXT NOT NULL,
            translated_text TEXT NOT NULL,
            translation_time TEXT NOT NULL,
            model TEXT NOT NULL DEFAULT '',
            success INTEGER NOT NULL
        );
        "#,
    )
}

/// Open `db_path`, creating parent directories as needed, and apply the schema.
pub fn bootstrap(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    tracing::debug!("SQLite schema ready at {:?}", db_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_init_schema_is_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        bootstrap(temp.path()).unwrap();
        bootstrap(temp.path()).unwrap();

        let conn = open_sqlite_connection(temp.path()).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('api_config', 'translation_history')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
