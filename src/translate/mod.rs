pub mod client;
pub mod error;
pub mod interface;

use std::sync::Arc;
use tracing::warn;

use crate::config_store::TranslationConfig;
use crate::history::{HistoryEntry, HistorySink};

pub use client::HttpTranslationApi;
pub use error::TranslationError;
pub use interface::{TranslateRequest, TranslationApi, TranslationOutcome, ERROR_PREFIX};

/// Runs one translation per call against a [`TranslationApi`] and reports
/// every attempt to the history sink.
#[derive(Clone)]
pub struct Translator {
    api: Arc<dyn TranslationApi>,
    history: Arc<dyn HistorySink>,
}

impl Translator {
    pub fn new(api: Arc<dyn TranslationApi>, history: Arc<dyn HistorySink>) -> Self {
        Self { api, history }
    }

    pub async fn translate(
        &self,
        file_name: &str,
        text: &str,
        config: &TranslationConfig,
    ) -> TranslationOutcome {
        let outcome = if !config.is_complete() {
            TranslationOutcome::Failed(TranslationError::Configuration)
        } else {
            match self.api.translate(text, config).await {
                Ok(translated) => TranslationOutcome::Translated(translated),
                Err(e) => {
                    warn!(file_name, error = %e, "Translation call failed");
                    TranslationOutcome::Failed(e)
                }
            }
        };

        self.record(file_name, text, config, &outcome).await;
        outcome
    }

    /// Hand the attempt to the history sink on the blocking pool. The sink may
    /// wait on a SQLite lock.
    async fn record(
        &self,
        file_name: &str,
        text: &str,
        config: &TranslationConfig,
        outcome: &TranslationOutcome,
    ) {
        let history = self.history.clone();
        let file_name = file_name.to_string();
        let original_text = text.to_string();
        let translated_text = outcome.text().into_owned();
        let model = config.model().map(|m| m.to_string());
        let success = outcome.is_success();

        let recorded = tokio::task::spawn_blocking(move || {
            history.record(HistoryEntry {
                file_name: &file_name,
                original_text: &original_text,
                translated_text: &translated_text,
                model: model.as_deref(),
                success,
            })
        })
        .await;
        if let Err(e) = recorded {
            warn!(error = %e, "History recording task failed");
        }
    }

    pub async fn list_models(&self, config: &TranslationConfig) -> Result<Vec<String>, TranslationError> {
        if !config.is_complete() {
            return Err(TranslationError::Configuration);
        }
        self.api.list_models(config).await
    }
}
