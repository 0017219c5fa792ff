use thiserror::Error;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Front matter is present but cannot be parsed. Aborts the pipeline.
    #[error("Metadata parsing error: {0}")]
    Metadata(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A command ran to completion but reported failures
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Renderer unavailable: {0}")]
    RenderUnavailable(String),

    #[error("Conversion failed: {0}")]
    Render(String),

    #[error("Conversion timed out after {0}s")]
    RenderTimeout(u64),
}

impl ConvertError {
    /// True for failures that belong to the external render stage rather
    /// than to document preparation.
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            ConvertError::RenderUnavailable(_)
                | ConvertError::Render(_)
                | ConvertError::RenderTimeout(_)
        )
    }
}

impl From<rust_xlsxwriter::XlsxError> for ConvertError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ConvertError::Spreadsheet(e.to_string())
    }
}

impl From<calamine::XlsxError> for ConvertError {
    fn from(e: calamine::XlsxError) -> Self {
        ConvertError::Spreadsheet(e.to_string())
    }
}
