use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::error::TranslationError;
use crate::config_store::TranslationConfig;

/// Prefix put in front of every failure written into a result cell.
pub const ERROR_PREFIX: &str = "翻译错误: ";

/// Body sent to the translation endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Result of one translation call.
#[derive(Debug)]
pub enum TranslationOutcome {
    Translated(String),
    Failed(TranslationError),
}

impl TranslationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TranslationOutcome::Translated(_))
    }

    /// Text written into the result cell: the translation, or the error
    /// message behind [`ERROR_PREFIX`].
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            TranslationOutcome::Translated(text) => Cow::Borrowed(text),
            TranslationOutcome::Failed(err) => Cow::Owned(format!("{}{}", ERROR_PREFIX, err)),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            TranslationOutcome::Translated(text) => text,
            failed => failed.text().into_owned(),
        }
    }
}

/// An external translation API.
///
/// Implementations only perform the call; precondition checks and history
/// recording happen in [`super::Translator`].
#[async_trait]
pub trait TranslationApi: Send + Sync {
    /// Translate `text` (the prompt is applied by the implementation).
    async fn translate(
        &self,
        text: &str,
        config: &TranslationConfig,
    ) -> Result<String, TranslationError>;

    /// Model ids offered by the API.
    async fn list_models(&self, config: &TranslationConfig) -> Result<Vec<String>, TranslationError>;
}
