use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db::open_sqlite_connection;
use crate::error::PersistResult;

/// Text longer than this many characters is cut before storage.
pub const MAX_STORED_CHARS: usize = 500;
pub const TRUNCATION_MARKER: &str = "...";

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One stored translation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: i64,
    pub file_name: String,
    pub original_text: String,
    pub translated_text: String,
    pub translation_time: DateTime<Utc>,
    pub model: String,
    pub success: bool,
}

/// What a caller reports about one attempt.
#[derive(Debug, Clone, Copy)]
pub struct HistoryEntry<'a> {
    pub file_name: &'a str,
    pub original_text: &'a str,
    pub translated_text: &'a str,
    pub model: Option<&'a str>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub total: usize,
    pub records: Vec<TranslationRecord>,
}

/// Receiver of translation attempts. Recording is fire-and-forget: an
/// implementation deals with its own failures and never reports them back.
pub trait HistorySink: Send + Sync {
    fn record(&self, entry: HistoryEntry<'_>);
}

/// Cut `text` to [`MAX_STORED_CHARS`] characters plus a marker.
pub fn truncate_for_storage(text: &str) -> String {
    match text.char_indices().nth(MAX_STORED_CHARS) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// History backed by the `translation_history` table.
pub struct HistoryLog {
    db_path: PathBuf,
}

impl HistoryLog {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Insert one record, returning its id.
    pub fn try_record(&self, entry: HistoryEntry<'_>) -> PersistResult<i64> {
        let conn = open_sqlite_connection(&self.db_path)?;
        conn.execute(
            r#"
            INSERT INTO translation_history (
                file_name, original_text, translated_text, translation_time, model, success
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.file_name,
                truncate_for_storage(entry.original_text),
                truncate_for_storage(entry.translated_text),
                Utc::now().to_rfc3339(),
                entry.model.unwrap_or(""),
                entry.success,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Newest records first.
    pub fn query(&self, limit: usize, offset: usize) -> PersistResult<HistoryPage> {
        let conn = open_sqlite_connection(&self.db_path)?;

        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM translation_history", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, file_name, original_text, translated_text, translation_time, model, success
            FROM translation_history
            ORDER BY id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
            let raw_time: String = row.get(4)?;
            let translation_time = DateTime::parse_from_rfc3339(&raw_time)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
            Ok(TranslationRecord {
                id: row.get(0)?,
                file_name: row.get(1)?,
                original_text: row.get(2)?,
                translated_text: row.get(3)?,
                translation_time,
                model: row.get(5)?,
                success: row.get(6)?,
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(HistoryPage {
            total: total as usize,
            records,
        })
    }
}

impl HistorySink for HistoryLog {
    fn record(&self, entry: HistoryEntry<'_>) {
        match self.try_record(entry) {
            Ok(id) => debug!(id, file_name = entry.file_name, success = entry.success, "Recorded translation"),
            Err(e) => warn!(
                file_name = entry.file_name,
                error = %e,
                "Failed to record translation history"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn open_log() -> (NamedTempFile, HistoryLog) {
        let temp = NamedTempFile::new().unwrap();
        crate::db::bootstrap(temp.path()).unwrap();
        let log = HistoryLog::new(temp.path());
        (temp, log)
    }

    fn entry(text: &str) -> HistoryEntry<'_> {
        HistoryEntry {
            file_name: "book.xlsx",
            original_text: text,
            translated_text: text,
            model: Some("qwen-plus"),
            success: true,
        }
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_for_storage("hello"), "hello");
        let exact = "a".repeat(MAX_STORED_CHARS);
        assert_eq!(truncate_for_storage(&exact), exact);
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let long = "译".repeat(MAX_STORED_CHARS + 10);
        let stored = truncate_for_storage(&long);
        assert!(stored.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            stored.chars().count(),
            MAX_STORED_CHARS + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_query_pages_newest_first() {
        let (_temp, log) = open_log();
        for i in 0..5 {
            log.record(entry(&format!("row {}", i)));
        }

        let page = log.query(2, 0).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].original_text, "row 4");
        assert_eq!(page.records[1].original_text, "row 3");

        let tail = log.query(20, 4).unwrap();
        assert_eq!(tail.records.len(), 1);
        assert_eq!(tail.records[0].original_text, "row 0");
    }

    #[test]
    fn test_record_stores_truncated_text_and_empty_model() {
        let (_temp, log) = open_log();
        let long = "x".repeat(MAX_STORED_CHARS * 2);
        log.record(HistoryEntry {
            file_name: "a.xlsx",
            original_text: &long,
            translated_text: "翻译错误: boom",
            model: None,
            success: false,
        });

        let record = &log.query(1, 0).unwrap().records[0];
        assert_eq!(record.original_text.len(), MAX_STORED_CHARS + TRUNCATION_MARKER.len());
        assert_eq!(record.model, "");
        assert!(!record.success);
    }

    #[test]
    fn test_record_failure_is_swallowed() {
        // No schema: the insert fails, record() must still return normally.
        let temp = NamedTempFile::new().unwrap();
        let log = HistoryLog::new(temp.path());
        log.record(entry("lost"));
        assert!(log.try_record(entry("lost")).is_err());
    }
}
