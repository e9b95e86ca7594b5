pub mod model;
pub mod sources;
pub mod store;

pub use model::{ConfigField, ConfigUpdate, RedactedConfig, TranslationConfig, DEFAULT_PROMPT, REDACTED};
pub use sources::{ConfigSource, DatabaseSource, DefaultsSource, EnvSource, FileSource};
pub use store::ConfigStore;
