//! Group expense export.

pub mod csv;

pub use self::csv::{
    CSV_HEADERS, ExportError, ExportRow, ExportShare, export_filename, slugify, write_expenses_csv,
};
