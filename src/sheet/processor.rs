use tracing::{info, warn};

use super::error::SheetError;
use super::table::Table;
use crate::config_store::TranslationConfig;
use crate::translate::{TranslationOutcome, Translator, ERROR_PREFIX};

/// Column translated when present.
pub const SOURCE_COLUMN: &str = "A";
/// Header of the appended result column.
pub const RESULT_COLUMN: &str = "翻译结果";

/// Per-upload tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetResult {
    pub success_count: usize,
    pub error_count: usize,
    /// `(original, translated or error text)` in row order.
    pub output_rows: Vec<(String, String)>,
}

/// True when a result cell holds an error message rather than a translation.
///
/// A genuine translation that happens to start with [`ERROR_PREFIX`] is
/// counted as an error too.
pub fn classify_text(text: &str) -> bool {
    text.starts_with(ERROR_PREFIX)
}

/// Column to translate: [`SOURCE_COLUMN`] if present, else the first one.
/// The flag is true when the fallback was taken.
pub fn select_source_column(table: &Table) -> (usize, bool) {
    match table.column_index(SOURCE_COLUMN) {
        Some(idx) => (idx, false),
        None => (0, true),
    }
}

pub struct SheetProcessor {
    translator: Translator,
}

impl SheetProcessor {
    pub fn new(translator: Translator) -> Self {
        Self { translator }
    }

    /// Translate the source column of `table` row by row and append the
    /// results as [`RESULT_COLUMN`]. Row failures are written into the result
    /// column and never stop the loop.
    pub async fn process(
        &self,
        mut table: Table,
        file_name: &str,
        config: &TranslationConfig,
    ) -> Result<(Table, SheetResult), SheetError> {
        if table.column_count() == 0 || table.row_count() == 0 {
            return Err(SheetError::EmptyInput);
        }

        let (source, fell_back) = select_source_column(&table);
        if fell_back {
            info!(
                file_name,
                column = %table.columns[source],
                "No column named '{}', translating the first column instead",
                SOURCE_COLUMN
            );
        }

        let mut result = SheetResult::default();
        let mut translated = Vec::with_capacity(table.row_count());

        for row in 0..table.row_count() {
            let original = table.cell(row, source).to_string();
            let outcome = self.translator.translate(file_name, &original, config).await;

            let failed = !outcome.is_success();
            if let TranslationOutcome::Failed(e) = &outcome {
                warn!(file_name, row, error = %e, "Row translation failed");
            }
            let text = outcome.into_text();

            if failed || classify_text(&text) {
                result.error_count += 1;
            } else {
                result.success_count += 1;
            }
            translated.push(text.clone());
            result.output_rows.push((original, text));
        }

        table.push_column(RESULT_COLUMN, translated);
        info!(
            file_name,
            rows = table.row_count(),
            success = result.success_count,
            errors = result.error_count,
            "Finished translating sheet"
        );
        Ok((table, result))
    }
}
