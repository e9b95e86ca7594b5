use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an explicit settings file.
pub const SETTINGS_PATH_ENV: &str = "SHEET_TRANSLATOR_CONFIG";

const DEFAULT_SETTINGS_FILE: &str = "translator.toml";
const ENV_PREFIX: &str = "SHEET_TRANSLATOR";

/// Process-level settings. Everything about the translation API itself lives
/// in the config store, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub translation: TranslationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSettings {
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("translator.db")
}

fn default_config_file() -> PathBuf {
    PathBuf::from("api_config.json")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Settings {
    /// Load settings from the optional file at `path` (or the file named by
    /// `SHEET_TRANSLATOR_CONFIG`, or `translator.toml`), then apply
    /// `SHEET_TRANSLATOR__SECTION__FIELD` environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var(SETTINGS_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());

        config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            config_file: default_config_file(),
            upload_dir: default_upload_dir(),
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
