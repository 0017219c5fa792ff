//! md2office - Markdown with YAML front matter to Office documents
//!
//! Pipe-table cells written as `{=FORMULA}` are lifted out before rendering,
//! replaced with placeholder tokens, and written back as live formulas once
//! the spreadsheet exists.
//!
//! # Features
//!
//! - Formula extraction with table/row/column coordinates
//! - Syntax-only formula validation (parentheses, known functions)
//! - Cell typing: formula, boolean, number, date (one configured format), string
//! - Front matter normalization with advisory warnings
//! - Native `.xlsx` rendering; docx, pptx and pdf through pandoc
//!
//! # Example
//!
//! ```no_run
//! use md2office::config::ConvertConfig;
//! use md2office::pipeline::Converter;
//! use md2office::types::OutputFormat;
//! use std::path::Path;
//!
//! let converter = Converter::new(ConvertConfig::default())?;
//! let report = converter.convert_file(Path::new("budget.md"), None, OutputFormat::Xlsx)?;
//!
//! println!("Formulas: {}", report.formulas.len());
//! for warning in &report.warnings {
//!     println!("warning: {}", warning);
//! }
//! # Ok::<(), md2office::error::ConvertError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod markdown;
pub mod pipeline;
pub mod render;
pub mod types;

// Re-export commonly used types
pub use error::{ConvertError, ConvertResult};
pub use types::{
    CellDataType, DateFormat, DocumentMetadata, ExtractionResult, FormulaLocation, OutputFormat,
    ProcessedCell, ReinjectionReport,
};
