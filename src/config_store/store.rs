use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{info, warn};

use super::model::{ConfigField, ConfigUpdate, TranslationConfig};
use super::sources::{ConfigSource, DatabaseSource, DefaultsSource, EnvSource, FileSource};
use crate::error::{PersistError, PersistResult};

/// Layered configuration: primary store, then backup store, then read-only
/// fallbacks, queried field by field.
pub struct ConfigStore {
    primary: Box<dyn ConfigSource>,
    backup: Box<dyn ConfigSource>,
    fallbacks: Vec<Box<dyn ConfigSource>>,
}

impl ConfigStore {
    pub fn new(
        primary: Box<dyn ConfigSource>,
        backup: Box<dyn ConfigSource>,
        fallbacks: Vec<Box<dyn ConfigSource>>,
    ) -> Self {
        Self {
            primary,
            backup,
            fallbacks,
        }
    }

    /// SQLite table, then JSON file, then the given environment snapshot, then
    /// built-in defaults.
    pub fn open(db_path: impl Into<PathBuf>, file_path: impl Into<PathBuf>, env: EnvSource) -> Self {
        Self::new(
            Box::new(DatabaseSource::new(db_path)),
            Box::new(FileSource::new(file_path)),
            vec![Box::new(env), Box::new(DefaultsSource)],
        )
    }

    fn sources(&self) -> impl Iterator<Item = &dyn ConfigSource> {
        std::iter::once(self.primary.as_ref())
            .chain(std::iter::once(self.backup.as_ref()))
            .chain(self.fallbacks.iter().map(|s| s.as_ref()))
    }

    /// Read every source once, skipping (and logging) sources that fail.
    fn snapshots(&self) -> Vec<(&'static str, ConfigUpdate)> {
        self.sources()
            .filter_map(|source| match source.read() {
                Ok(update) => Some((source.name(), update)),
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Config source unavailable, skipping");
                    None
                }
            })
            .collect()
    }

    fn resolve(&self) -> (TranslationConfig, BTreeMap<&'static str, &'static str>) {
        let snapshots = self.snapshots();
        let mut resolved = ConfigUpdate::default();
        let mut origins = BTreeMap::new();

        for field in ConfigField::ALL {
            if let Some((name, value)) = snapshots
                .iter()
                .find_map(|(name, update)| update.get(field).map(|v| (*name, v)))
            {
                resolved.set(field, value);
                origins.insert(field.as_str(), name);
            }
        }

        let config = TranslationConfig {
            url: resolved.url.unwrap_or_default(),
            key: resolved.key.unwrap_or_default(),
            prompt: resolved.prompt.unwrap_or_default(),
            model: resolved.model.filter(|m| !m.is_empty()),
        };
        (config, origins)
    }

    pub fn load(&self) -> TranslationConfig {
        self.resolve().0
    }

    /// Which source supplied each field. Fields nobody supplies are absent.
    pub fn describe(&self) -> BTreeMap<&'static str, &'static str> {
        self.resolve().1
    }

    /// Persist the named fields of `update`.
    ///
    /// Writes go to the primary store, whose contents are then mirrored to the
    /// backup. Fields only the fallbacks supply are never copied, so they keep
    /// following their source. When the primary write fails the update is
    /// merged into the backup alone, and the save still succeeds if that
    /// works.
    pub fn save(&self, update: impl Into<ConfigUpdate>) -> PersistResult<()> {
        let update = update.into();

        match self.primary.write(&update) {
            Ok(()) => {
                let mirrored = self
                    .primary
                    .read()
                    .and_then(|persisted| self.backup.write(&persisted));
                if let Err(e) = mirrored {
                    warn!(error = %e, "Failed to mirror config to backup store");
                }
                info!(fields = update.named().count(), "Saved translation API config");
                Ok(())
            }
            Err(primary_err) => {
                warn!(error = %primary_err, "Primary config store write failed, using backup only");
                self.backup.write(&update).map_err(|backup_err| {
                    PersistError::AllWritesFailed {
                        primary: primary_err.to_string(),
                        backup: backup_err.to_string(),
                    }
                })?;
                info!(fields = update.named().count(), "Saved translation API config to backup store");
                Ok(())
            }
        }
    }
}
