use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker shown in place of a non-empty API key on diagnostic views.
pub const REDACTED: &str = "******";

/// Prompt used when no source supplies one.
pub const DEFAULT_PROMPT: &str = "请将以下文本翻译成中文：";

/// Resolved translation API configuration.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationConfig {
    pub url: String,
    pub key: String,
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl TranslationConfig {
    /// Both url and key are needed before any outbound call is attempted.
    pub fn is_complete(&self) -> bool {
        !self.url.trim().is_empty() && !self.key.trim().is_empty()
    }

    /// Configured model, treating an empty string as unset.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.is_empty())
    }

    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            url: self.url.clone(),
            key: if self.key.is_empty() {
                String::new()
            } else {
                REDACTED.to_string()
            },
            prompt: self.prompt.clone(),
            model: self.model.clone(),
        }
    }
}

impl fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = self.redacted();
        f.debug_struct("TranslationConfig")
            .field("url", &redacted.url)
            .field("key", &redacted.key)
            .field("prompt", &redacted.prompt)
            .field("model", &redacted.model)
            .finish()
    }
}

/// Read-only view safe to return from diagnostic endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactedConfig {
    pub url: String,
    pub key: String,
    pub prompt: String,
    pub model: Option<String>,
}

/// Field names double as the keys in the `api_config` table and the JSON
/// backup file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    Url,
    Key,
    Prompt,
    Model,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        ConfigField::Url,
        ConfigField::Key,
        ConfigField::Prompt,
        ConfigField::Model,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::Url => "url",
            ConfigField::Key => "key",
            ConfigField::Prompt => "prompt",
            ConfigField::Model => "model",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            ConfigField::Url => "TRANSLATION_API_URL",
            ConfigField::Key => "TRANSLATION_API_KEY",
            ConfigField::Prompt => "TRANSLATION_PROMPT",
            ConfigField::Model => "TRANSLATION_MODEL",
        }
    }
}

/// A partial configuration. `None` means "not named": sources report it for
/// fields they do not hold, and `save` leaves such fields untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ConfigUpdate {
    pub fn get(&self, field: ConfigField) -> Option<&str> {
        match field {
            ConfigField::Url => self.url.as_deref(),
            ConfigField::Key => self.key.as_deref(),
            ConfigField::Prompt => self.prompt.as_deref(),
            ConfigField::Model => self.model.as_deref(),
        }
    }

    pub fn set(&mut self, field: ConfigField, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            ConfigField::Url => self.url = value,
            ConfigField::Key => self.key = value,
            ConfigField::Prompt => self.prompt = value,
            ConfigField::Model => self.model = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        ConfigField::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Named fields of `other` overwrite the fields of `self`.
    pub fn merge(&mut self, other: &ConfigUpdate) {
        for field in ConfigField::ALL {
            if let Some(value) = other.get(field) {
                self.set(field, value);
            }
        }
    }

    /// Named fields as `(field, value)` pairs.
    pub fn named(&self) -> impl Iterator<Item = (ConfigField, &str)> + '_ {
        ConfigField::ALL
            .into_iter()
            .filter_map(move |f| self.get(f).map(|v| (f, v)))
    }
}

impl From<&TranslationConfig> for ConfigUpdate {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            url: Some(config.url.clone()),
            key: Some(config.key.clone()),
            prompt: Some(config.prompt.clone()),
            model: Some(config.model.clone().unwrap_or_default()),
        }
    }
}

impl From<TranslationConfig> for ConfigUpdate {
    fn from(config: TranslationConfig) -> Self {
        ConfigUpdate::from(&config)
    }
}
