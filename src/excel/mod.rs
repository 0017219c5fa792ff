//! Spreadsheet output
//!
//! - Render: pipe tables → `.xlsx` worksheets with typed cells
//! - Reinject: placeholders → live formulas in the rendered workbook

pub mod address;
mod artifact;
mod reinjector;
mod renderer;

pub use address::{cell_address, column_index_to_letter, sanitize_sheet_name};
pub use artifact::{ArtifactCell, SpreadsheetArtifact, XlsxArtifact};
pub use reinjector::PlaceholderReinjector;
pub use renderer::{document_properties, excel_serial_date, XlsxRenderer, EMPTY_WORKBOOK_WARNING};
