use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

//==============================================================================
// Date format configuration
//==============================================================================

/// Document-wide date format used when classifying table cells.
///
/// A cell is only ever read as a date in the configured format; there is no
/// per-cell guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "DD/MM/YYYY")]
    DdMmYyyy,
    #[serde(rename = "MM/DD/YYYY")]
    MmDdYyyy,
    #[serde(rename = "YYYY-MM-DD")]
    YyyyMmDd,
}

impl DateFormat {
    pub const ALL: [DateFormat; 3] = [
        DateFormat::DdMmYyyy,
        DateFormat::MmDdYyyy,
        DateFormat::YyyyMmDd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::DdMmYyyy => "DD/MM/YYYY",
            DateFormat::MmDdYyyy => "MM/DD/YYYY",
            DateFormat::YyyyMmDd => "YYYY-MM-DD",
        }
    }

    /// Excel number format that displays dates in this order
    pub fn excel_num_format(&self) -> &'static str {
        match self {
            DateFormat::DdMmYyyy => "dd/mm/yyyy",
            DateFormat::MmDdYyyy => "mm/dd/yyyy",
            DateFormat::YyyyMmDd => "yyyy-mm-dd",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        DateFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown date format '{}' (expected DD/MM/YYYY, MM/DD/YYYY or YYYY-MM-DD)",
                    s
                )
            })
    }
}

//==============================================================================
// Cell classification
//==============================================================================

/// Data type decided for one table cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellDataType {
    String,
    Number,
    Boolean,
    Date,
    Formula,
}

impl CellDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellDataType::String => "string",
            CellDataType::Number => "number",
            CellDataType::Boolean => "boolean",
            CellDataType::Date => "date",
            CellDataType::Formula => "formula",
        }
    }
}

impl fmt::Display for CellDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result for one table cell. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedCell {
    /// Cell text exactly as it appeared in the source table (untrimmed)
    pub raw_value: String,
    /// Trimmed text used for non-formula rendering
    pub display_value: String,
    pub data_type: CellDataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_value: Option<NaiveDate>,
    /// Formula body without braces or leading `=`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl ProcessedCell {
    /// Boolean value, only for boolean cells
    pub fn boolean_value(&self) -> Option<bool> {
        match self.data_type {
            CellDataType::Boolean => Some(self.display_value.eq_ignore_ascii_case("true")),
            _ => None,
        }
    }
}

//==============================================================================
// Formula extraction
//==============================================================================

/// One formula lifted out of a pipe table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaLocation {
    /// 0-based, in document order
    pub table_index: usize,
    /// 0-based; the header row is row 0 and separator rows are not counted
    pub row: usize,
    /// 0-based, left to right
    pub column: usize,
    /// Text between `{=` and `}`, unevaluated
    pub formula: String,
    pub placeholder: String,
}

impl FormulaLocation {
    pub fn new(table_index: usize, row: usize, column: usize, formula: impl Into<String>) -> Self {
        Self {
            table_index,
            row,
            column,
            formula: formula.into(),
            placeholder: Self::placeholder_for(table_index, row, column),
        }
    }

    /// Placeholder token for a cell coordinate
    pub fn placeholder_for(table_index: usize, row: usize, column: usize) -> String {
        format!("__FORMULA_{}_{}_{}__", table_index, row, column)
    }

    /// Coordinates as a tuple, used for uniqueness checks
    pub fn coordinates(&self) -> (usize, usize, usize) {
        (self.table_index, self.row, self.column)
    }

    /// Human readable position, used as a prefix for warnings
    pub fn describe(&self) -> String {
        format!(
            "table {}, row {}, column {}",
            self.table_index, self.row, self.column
        )
    }
}

/// Output of one extraction pass over a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// Markdown with every in-table formula replaced by its placeholder
    pub processed_content: String,
    /// Document order
    pub formulas: Vec<FormulaLocation>,
    pub table_count: usize,
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// Replace every placeholder with `=<formula>` text.
    ///
    /// Used for outputs that cannot hold live formulas (docx, pptx, pdf).
    pub fn inline_formulas(&self) -> String {
        let mut content = self.processed_content.clone();
        for location in &self.formulas {
            content = content.replace(&location.placeholder, &format!("={}", location.formula));
        }
        content
    }
}

/// Result of a syntax-only formula check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormulaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Outcome of writing formulas back into a rendered spreadsheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReinjectionReport {
    /// One entry per injected formula: `Sheet!A1: =FORMULA`
    pub modifications: Vec<String>,
    pub warnings: Vec<String>,
    pub injected: usize,
}

//==============================================================================
// Document metadata
//==============================================================================

/// Front matter fields consumed by the converter.
///
/// Unknown keys are kept in `extra` so they pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "keyword_list", skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Render any YAML scalar as a string; `null` becomes `None`.
pub(crate) fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        other => serde_yaml::to_string(other)
            .ok()
            .map(|s| s.trim_end().to_string()),
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

/// Keywords may be a comma separated string or a list
fn keyword_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    let keywords: Vec<String> = match value {
        serde_yaml::Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(&other)
            .map(|s| s.split(',').map(|k| k.trim().to_string()).collect())
            .unwrap_or_default(),
    };
    Ok(keywords.into_iter().filter(|k| !k.is_empty()).collect())
}

//==============================================================================
// Output formats and conversion reports
//==============================================================================

/// Supported conversion targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Docx,
    Xlsx,
    Pptx,
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Pptx => "pptx",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// Detect the format from an output path's extension
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "docx" | "word" => Ok(OutputFormat::Docx),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            "pptx" | "powerpoint" => Ok(OutputFormat::Pptx),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(format!("unsupported output format '{}'", other)),
        }
    }
}

/// Pipeline stage reached by a conversion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionStage {
    Extracted,
    Rendered,
    Reinjected,
    Finalized,
}

/// How a successful conversion went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome {
    Clean,
    WithWarnings(usize),
}

/// Everything a caller needs to know about one finished conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub metadata: DocumentMetadata,
    pub formulas: Vec<FormulaLocation>,
    pub table_count: usize,
    pub modifications: Vec<String>,
    pub warnings: Vec<String>,
    pub stage: ConversionStage,
}

impl ConversionReport {
    pub fn outcome(&self) -> ConversionOutcome {
        if self.warnings.is_empty() {
            ConversionOutcome::Clean
        } else {
            ConversionOutcome::WithWarnings(self.warnings.len())
        }
    }
}
