use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::config_store::{ConfigStore, EnvSource};
use crate::history::HistoryLog;
use crate::sheet::SheetProcessor;
use crate::translate::{HttpTranslationApi, TranslationApi, Translator};

/// Everything a request handler needs, built once at startup and injected
/// into the router.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub config_store: Arc<ConfigStore>,
    pub history: Arc<HistoryLog>,
    pub translator: Translator,
}

impl AppState {
    /// Build state that talks to the real translation API over HTTP.
    pub fn new(settings: Settings, env: EnvSource) -> anyhow::Result<Self> {
        let api = HttpTranslationApi::new(
            settings.translation.target_language.clone(),
            Duration::from_secs(settings.translation.request_timeout_secs),
        )?;
        Self::with_api(settings, env, Arc::new(api))
    }

    /// Build state around any translation API implementation.
    pub fn with_api(
        settings: Settings,
        env: EnvSource,
        api: Arc<dyn TranslationApi>,
    ) -> anyhow::Result<Self> {
        crate::db::bootstrap(&settings.storage.database_path)?;
        std::fs::create_dir_all(&settings.storage.upload_dir)?;

        let config_store = Arc::new(ConfigStore::open(
            settings.storage.database_path.clone(),
            settings.storage.config_file.clone(),
            env,
        ));
        let history = Arc::new(HistoryLog::new(settings.storage.database_path.clone()));
        let translator = Translator::new(api, history.clone());

        Ok(Self {
            settings: Arc::new(settings),
            config_store,
            history,
            translator,
        })
    }

    pub fn processor(&self) -> SheetProcessor {
        SheetProcessor::new(self.translator.clone())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.settings.storage.upload_dir
    }
}
