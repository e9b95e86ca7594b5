pub mod error;
pub mod io;
pub mod processor;
pub mod table;

pub use error::SheetError;
pub use io::{check_extension, output_file_name, read_table, write_table};
pub use processor::{classify_text, SheetProcessor, SheetResult, RESULT_COLUMN, SOURCE_COLUMN};
pub use table::Table;
