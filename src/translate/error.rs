use thiserror::Error;

/// Why a single translation call did not produce text. None of these are
/// retried, and none abort a batch.
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("translation API url or key is not configured")]
    Configuration,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("response body has no '{0}' field")]
    ResponseFormat(&'static str),
}
