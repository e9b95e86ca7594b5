use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Workbook;

use super::error::SheetError;
use super::table::Table;

pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

const OUTPUT_PREFIX: &str = "translated_";

/// Reject anything that is not an Excel workbook, judged by extension only.
pub fn check_extension(file_name: &str) -> Result<(), SheetError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(SheetError::UnsupportedExtension(ext))
    }
}

/// `report.xls` -> `translated_report.xlsx`. Output is always written as xlsx.
pub fn output_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sheet");
    format!("{}{}.xlsx", OUTPUT_PREFIX, stem)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        other => Some(other.to_string()),
    }
}

/// Parse the first worksheet of an in-memory workbook. The first row is the
/// header; blank header cells are named `Column<n>` (1-based).
pub fn read_table(bytes: Vec<u8>) -> Result<Table, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Table::default()),
    };

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                cell_text(cell)
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| format!("Column{}", idx + 1))
            })
            .collect(),
        None => return Ok(Table::default()),
    };

    let data = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .collect();
    Ok(Table::new(columns, data))
}

/// Write `table` as a single-sheet xlsx workbook at `path`.
pub fn write_table(table: &Table, path: &Path) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, name)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                worksheet.write_string(row_idx as u32 + 1, col as u16, value)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
