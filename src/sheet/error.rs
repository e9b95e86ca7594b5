use thiserror::Error;

/// Request-level failures. Raised before any row is translated (or, for
/// `Write`, after all rows are done) and abort the whole upload.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("spreadsheet has no columns or no data rows")]
    EmptyInput,

    #[error("unsupported file type '{0}', only .xlsx and .xls are accepted")]
    UnsupportedExtension(String),

    #[error("failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    #[error("failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}
