//! Formula extraction from pipe tables
//!
//! Walks LF-normalized markdown line by line. Every `{=...}` marker found in a
//! table cell is replaced with a placeholder token and recorded as a
//! [`FormulaLocation`]. Text outside tables is never modified.

use crate::core::validator::FormulaValidator;
use crate::error::ConvertResult;
use crate::markdown::{is_separator_line, is_table_line, join_cells, split_cells};
use crate::types::{ExtractionResult, FormulaLocation};
use regex::Regex;
use tracing::debug;

/// Table position while scanning a document.
///
/// Passing the same state to several [`FormulaExtractor::extract_with_state`]
/// calls continues table numbering across chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    /// Index of the current (or last seen) table
    pub table_index: Option<usize>,
    /// Next row number inside the current table
    pub row_index: usize,
    pub in_table: bool,
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables seen so far (high-water mark + 1)
    pub fn table_count(&self) -> usize {
        self.table_index.map_or(0, |idx| idx + 1)
    }

    fn enter_table(&mut self) -> usize {
        let next = self.table_index.map_or(0, |idx| idx + 1);
        self.table_index = Some(next);
        self.row_index = 0;
        self.in_table = true;
        next
    }
}

/// Extracts `{=...}` formula markers from pipe tables
#[derive(Debug, Clone)]
pub struct FormulaExtractor {
    validator: Option<FormulaValidator>,
    marker_re: Regex,
    missing_equals_re: Regex,
}

impl FormulaExtractor {
    /// Extractor that validates each formula it finds
    pub fn new() -> ConvertResult<Self> {
        Ok(Self {
            validator: Some(FormulaValidator::new()?),
            marker_re: Regex::new(r"\{=(.*?)\}")?,
            missing_equals_re: Regex::new(r"\{\s*[A-Za-z_][A-Za-z0-9_.]*\(.*?\}")?,
        })
    }

    /// Turn formula validation on or off
    pub fn with_validation(mut self, enabled: bool) -> ConvertResult<Self> {
        self.validator = match (enabled, self.validator.take()) {
            (true, Some(v)) => Some(v),
            (true, None) => Some(FormulaValidator::new()?),
            (false, _) => None,
        };
        Ok(self)
    }

    /// Extract formulas from a whole document
    pub fn extract(&self, content: &str) -> ExtractionResult {
        let mut state = TableState::new();
        self.extract_with_state(content, &mut state)
    }

    /// Extract formulas, continuing from an existing table state
    pub fn extract_with_state(&self, content: &str, state: &mut TableState) -> ExtractionResult {
        let mut formulas = Vec::new();
        let mut warnings = Vec::new();
        let mut output: Vec<String> = Vec::new();

        for line in content.split('\n') {
            if !is_table_line(line) {
                state.in_table = false;
                output.push(line.to_string());
                continue;
            }

            if !state.in_table {
                let index = state.enter_table();
                debug!(table = index, "entered table");
            }

            // Separator rows are never scanned and never numbered
            if is_separator_line(line) {
                output.push(line.to_string());
                continue;
            }

            let table_index = state.table_index.unwrap_or_default();
            let row = state.row_index;
            let mut cells = split_cells(line);
            let mut changed = false;

            for (column, cell) in cells.iter_mut().enumerate() {
                match self.extract_cell(cell, table_index, row, column) {
                    Some((location, replaced, ignored)) => {
                        for _ in 0..ignored {
                            warnings.push(format!(
                                "Additional formula marker ignored at {}",
                                location.describe()
                            ));
                        }
                        self.check_formula(&location, &mut warnings);
                        debug!(
                            table = table_index,
                            row,
                            column,
                            formula = %location.formula,
                            "extracted formula"
                        );
                        *cell = replaced;
                        formulas.push(location);
                        changed = true;
                    }
                    None => {
                        self.check_malformed(cell, table_index, row, column, &mut warnings);
                    }
                }
            }

            if changed {
                output.push(rebuild_line(line, &cells));
            } else {
                output.push(line.to_string());
            }
            state.row_index += 1;
        }

        ExtractionResult {
            processed_content: output.join("\n"),
            formulas,
            table_count: state.table_count(),
            warnings,
        }
    }

    /// Replace the first marker in a cell with its placeholder.
    ///
    /// Returns the location, the new cell text and the number of later
    /// markers dropped from the cell (a cell holds one formula).
    fn extract_cell(
        &self,
        cell: &str,
        table_index: usize,
        row: usize,
        column: usize,
    ) -> Option<(FormulaLocation, String, usize)> {
        let caps = self.marker_re.captures(cell)?;
        let span = caps.get(0)?;
        let body = caps.get(1).map_or("", |m| m.as_str());

        let tail = &cell[span.end()..];
        let ignored = self.marker_re.find_iter(tail).count();

        let location = FormulaLocation::new(table_index, row, column, body);
        let mut replaced = String::with_capacity(cell.len());
        replaced.push_str(&cell[..span.start()]);
        replaced.push_str(&location.placeholder);
        replaced.push_str(&self.marker_re.replace_all(tail, ""));
        Some((location, replaced, ignored))
    }

    fn check_formula(&self, location: &FormulaLocation, warnings: &mut Vec<String>) {
        let Some(validator) = &self.validator else {
            return;
        };
        let result = validator.validate(&location.formula);
        for error in &result.errors {
            warnings.push(format!(
                "Invalid formula at {}: {}",
                location.describe(),
                error
            ));
        }
        for warning in &result.warnings {
            warnings.push(format!(
                "Formula warning at {}: {}",
                location.describe(),
                warning
            ));
        }
    }

    /// Warn about marker-like text that is not a well-formed `{=...}`
    fn check_malformed(
        &self,
        cell: &str,
        table_index: usize,
        row: usize,
        column: usize,
        warnings: &mut Vec<String>,
    ) {
        let position = format!("table {}, row {}, column {}", table_index, row, column);
        if cell.contains("{=") {
            warnings.push(format!("Unterminated formula marker at {}", position));
        } else if self.missing_equals_re.is_match(cell) {
            warnings.push(format!("Formula marker missing '=' at {}", position));
        }
    }
}

/// Reassemble a table line, keeping the original indentation and trailing space
fn rebuild_line(original: &str, cells: &[String]) -> String {
    let indent_len = original.len() - original.trim_start().len();
    let trailing_len = original.len() - original.trim_end().len();
    format!(
        "{}{}{}",
        &original[..indent_len],
        join_cells(cells),
        &original[original.len() - trailing_len..]
    )
}
