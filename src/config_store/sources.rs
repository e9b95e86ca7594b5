use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::params;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::model::{ConfigField, ConfigUpdate, DEFAULT_PROMPT};
use crate::db::open_sqlite_connection;
use crate::error::{PersistError, PersistResult};

/// One layer of configuration. The store asks every layer for what it holds
/// and takes each field from the first layer that has it.
pub trait ConfigSource: Send + Sync {
    /// Short name reported by diagnostics.
    fn name(&self) -> &'static str;

    /// Fields this source currently holds. Missing fields are `None`.
    fn read(&self) -> PersistResult<ConfigUpdate>;

    /// Persist the named fields of `update`, leaving others untouched.
    fn write(&self, _update: &ConfigUpdate) -> PersistResult<()> {
        Err(PersistError::ReadOnly(self.name()))
    }
}

/// Primary durable store: the `api_config` key-value table.
pub struct DatabaseSource {
    db_path: PathBuf,
}

impl DatabaseSource {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl ConfigSource for DatabaseSource {
    fn name(&self) -> &'static str {
        "database"
    }

    fn read(&self) -> PersistResult<ConfigUpdate> {
        let conn = open_sqlite_connection(&self.db_path)?;
        let mut stmt = conn.prepare("SELECT key, value FROM api_config")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut update = ConfigUpdate::default();
        for row in rows {
            let (key, value) = row?;
            match ConfigField::from_key(&key) {
                Some(field) => update.set(field, value),
                None => debug!("Ignoring unknown api_config key: {}", key),
            }
        }
        Ok(update)
    }

    fn write(&self, update: &ConfigUpdate) -> PersistResult<()> {
        let mut conn = open_sqlite_connection(&self.db_path)?;
        let tx = conn.transaction()?;
        for (field, value) in update.named() {
            tx.execute(
                r#"
                INSERT INTO api_config (key, value, updated_at)
                VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![field.as_str(), value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Fallback store: a JSON file holding the same four fields. Also receives a
/// mirror of the database contents on every save.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn read(&self) -> PersistResult<ConfigUpdate> {
        if !self.path.exists() {
            return Ok(ConfigUpdate::default());
        }
        let content = load_text_file_with_guess_encoding(&self.path)
            .map_err(|e| PersistError::file(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(ConfigUpdate::default());
        }
        serde_json::from_str(&content).map_err(|e| PersistError::file(&self.path, e))
    }

    fn write(&self, update: &ConfigUpdate) -> PersistResult<()> {
        let mut current = match self.read() {
            Ok(current) => current,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Replacing unreadable config file");
                ConfigUpdate::default()
            }
        };
        current.merge(update);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| PersistError::file(&self.path, e))?;

        let json = serde_json::to_string_pretty(&current)
            .map_err(|e| PersistError::file(&self.path, e))?;

        // Readers see either the old file or the new one, never a partial write.
        let mut staged =
            NamedTempFile::new_in(dir).map_err(|e| PersistError::file(&self.path, e))?;
        staged
            .write_all(json.as_bytes())
            .map_err(|e| PersistError::file(&self.path, e))?;
        staged
            .persist(&self.path)
            .map_err(|e| PersistError::file(&self.path, e.error))?;
        Ok(())
    }
}

/// Process environment, captured once at construction so the store never
/// reaches for globals afterwards.
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn from_process_env() -> Self {
        let vars = ConfigField::ALL
            .iter()
            .filter_map(|f| {
                std::env::var(f.env_var())
                    .ok()
                    .map(|v| (f.env_var().to_string(), v))
            })
            .collect();
        Self { vars }
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn read(&self) -> PersistResult<ConfigUpdate> {
        let mut update = ConfigUpdate::default();
        for field in ConfigField::ALL {
            if let Some(value) = self.vars.get(field.env_var()) {
                update.set(field, value.clone());
            }
        }
        Ok(update)
    }
}

/// Last layer: built-in defaults.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
    fn name(&self) -> &'static str {
        "default"
    }

    fn read(&self) -> PersistResult<ConfigUpdate> {
        Ok(ConfigUpdate {
            prompt: Some(DEFAULT_PROMPT.to_string()),
            ..Default::default()
        })
    }
}

/// Read a text file written by hand on any desktop: strips a UTF-8 BOM and
/// falls back to GBK when the bytes are not valid UTF-8.
pub fn load_text_file_with_guess_encoding(path: &Path) -> std::io::Result<String> {
    let mut bytes = fs::read(path)?;
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(0..3);
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            let bytes = e.into_bytes();
            let (cow, _, had_errors) = encoding_rs::GBK.decode(&bytes);
            if had_errors {
                debug!("Config file {:?} decoded with replacement characters", path);
            }
            Ok(cow.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    fn database() -> (NamedTempFile, DatabaseSource) {
        let temp = NamedTempFile::new().unwrap();
        crate::db::bootstrap(temp.path()).unwrap();
        let source = DatabaseSource::new(temp.path());
        (temp, source)
    }

    #[test]
    fn test_database_upsert_overwrites_only_named_keys() {
        let (_temp, source) = database();
        source
            .write(&ConfigUpdate {
                url: Some("http://a".to_string()),
                key: Some("k1".to_string()),
                ..Default::default()
            })
            .unwrap();
        source
            .write(&ConfigUpdate {
                key: Some("k2".to_string()),
                ..Default::default()
            })
            .unwrap();

        let read = source.read().unwrap();
        assert_eq!(read.url.as_deref(), Some("http://a"));
        assert_eq!(read.key.as_deref(), Some("k2"));
        assert!(read.prompt.is_none());
    }

    #[test]
    fn test_database_without_schema_is_an_error() {
        let temp = NamedTempFile::new().unwrap();
        let source = DatabaseSource::new(temp.path());
        assert!(matches!(source.read(), Err(PersistError::Database(_))));
    }

    #[test]
    fn test_file_source_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let source = FileSource::new(dir.path().join("api_config.json"));
        assert!(source.read().unwrap().is_empty());
    }

    #[test]
    fn test_file_source_merges_writes() {
        let dir = tempdir().unwrap();
        let source = FileSource::new(dir.path().join("nested").join("api_config.json"));
        source
            .write(&ConfigUpdate {
                url: Some("http://a".to_string()),
                ..Default::default()
            })
            .unwrap();
        source
            .write(&ConfigUpdate {
                model: Some("m".to_string()),
                ..Default::default()
            })
            .unwrap();

        let read = source.read().unwrap();
        assert_eq!(read.url.as_deref(), Some("http://a"));
        assert_eq!(read.model.as_deref(), Some("m"));
    }

    #[test]
    fn test_file_source_write_replaces_file_in_one_step() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("api_config.json");
        fs::write(&path, "{ not json").unwrap();
        let source = FileSource::new(&path);
        assert!(source.read().is_err());

        source
            .write(&ConfigUpdate {
                key: Some("k".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(source.read().unwrap().key.as_deref(), Some("k"));
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_file_source_reads_bom_and_gbk() {
        let dir = tempdir().unwrap();
        let bom_path = dir.path().join("bom.json");
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(r#"{"prompt": "翻译："}"#.as_bytes());
        fs::write(&bom_path, bytes).unwrap();
        assert_eq!(
            FileSource::new(&bom_path).read().unwrap().prompt.as_deref(),
            Some("翻译：")
        );

        let gbk_path = dir.path().join("gbk.json");
        let (encoded, _, _) = encoding_rs::GBK.encode(r#"{"prompt": "翻译："}"#);
        fs::write(&gbk_path, encoded.as_ref()).unwrap();
        assert_eq!(
            FileSource::new(&gbk_path).read().unwrap().prompt.as_deref(),
            Some("翻译：")
        );
    }

    #[test]
    fn test_env_source_reads_known_variables() {
        let mut vars = HashMap::new();
        vars.insert("TRANSLATION_API_URL".to_string(), "http://env".to_string());
        vars.insert("UNRELATED".to_string(), "x".to_string());
        let read = EnvSource::new(vars).read().unwrap();
        assert_eq!(read.url.as_deref(), Some("http://env"));
        assert_eq!(read.named().count(), 1);
    }

    #[test]
    fn test_env_source_is_read_only() {
        let source = EnvSource::new(HashMap::new());
        assert!(matches!(
            source.write(&ConfigUpdate::default()),
            Err(PersistError::ReadOnly("environment"))
        ));
    }
}
