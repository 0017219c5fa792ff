//! Document preparation core: cell typing, formula extraction and
//! validation, metadata normalization

pub mod classifier;
pub mod extractor;
pub mod metadata;
pub mod validator;

pub use classifier::CellClassifier;
pub use extractor::{FormulaExtractor, TableState};
pub use metadata::MetadataNormalizer;
pub use validator::FormulaValidator;
