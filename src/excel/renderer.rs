//! Native `.xlsx` rendering of a document's pipe tables

use super::address::{sanitize_sheet_name, unique_sheet_name};
use super::artifact::{ArtifactCell, XlsxArtifact};
use crate::core::CellClassifier;
use crate::error::ConvertResult;
use crate::markdown::{parse_tables, MarkdownTable};
use crate::types::{CellDataType, DateFormat, DocumentMetadata, ProcessedCell};
use chrono::NaiveDate;
use rust_xlsxwriter::DocProperties;
use std::path::Path;
use tracing::{debug, warn};

pub const EMPTY_WORKBOOK_WARNING: &str = "No tables found; spreadsheet output is empty";

/// Name of the lone worksheet written for a document without tables
const FALLBACK_SHEET_NAME: &str = "Sheet1";

/// Workbook document properties taken from front matter
pub fn document_properties(metadata: &DocumentMetadata) -> DocProperties {
    let mut properties = DocProperties::new();
    if let Some(title) = &metadata.title {
        properties = properties.set_title(title);
    }
    if let Some(author) = &metadata.author {
        properties = properties.set_author(author);
    }
    if let Some(subject) = &metadata.subject {
        properties = properties.set_subject(subject);
    }
    if !metadata.keywords.is_empty() {
        properties = properties.set_keywords(&metadata.keywords.join(", "));
    }
    if let Some(classification) = &metadata.classification {
        properties = properties.set_comment(classification);
    }
    properties
}

/// Serial number of `date` in the 1900 date system.
///
/// Excel counts a non-existent 1900-02-29 (serial 60), so dates before
/// 1900-03-01 are counted from one day later.
pub fn excel_serial_date(date: NaiveDate) -> f64 {
    let epoch = match NaiveDate::from_ymd_opt(1900, 3, 1) {
        Some(leap_bug_end) if date < leap_bug_end => NaiveDate::from_ymd_opt(1899, 12, 31),
        _ => NaiveDate::from_ymd_opt(1899, 12, 30),
    };
    epoch
        .map(|epoch| (date - epoch).num_days() as f64)
        .unwrap_or_default()
}

/// Renders every pipe table of a document as one worksheet
pub struct XlsxRenderer {
    date_format: DateFormat,
}

impl XlsxRenderer {
    pub fn new(date_format: DateFormat) -> Self {
        Self { date_format }
    }

    /// Build the workbook in memory.
    ///
    /// Returns the workbook plus render warnings.
    pub fn build(
        &self,
        body: &str,
        metadata: &DocumentMetadata,
    ) -> ConvertResult<(XlsxArtifact, Vec<String>)> {
        let classifier = CellClassifier::new(self.date_format)?;
        let tables = parse_tables(body);
        let mut warnings = Vec::new();

        let mut artifact = if tables.is_empty() {
            warn!("{}", EMPTY_WORKBOOK_WARNING);
            warnings.push(EMPTY_WORKBOOK_WARNING.to_string());
            XlsxArtifact::new([FALLBACK_SHEET_NAME])
        } else {
            let mut names: Vec<String> = Vec::with_capacity(tables.len());
            let mut sheets = Vec::with_capacity(tables.len());
            for table in &tables {
                let name = unique_sheet_name(&sheet_name(table), &names);
                debug!(table = table.index, sheet = %name, rows = table.rows.len(), "rendering table");
                names.push(name.clone());
                sheets.push((name, table_grid(table, &classifier)));
            }
            XlsxArtifact::from_sheets(sheets)
        };

        artifact
            .set_date_format(self.date_format.excel_num_format())
            .set_header_bold(true)
            .set_properties(metadata);

        Ok((artifact, warnings))
    }

    /// Build the workbook and write it to `path`
    pub fn render(
        &self,
        body: &str,
        metadata: &DocumentMetadata,
        path: &Path,
    ) -> ConvertResult<Vec<String>> {
        let (artifact, warnings) = self.build(body, metadata)?;
        artifact.save(path)?;
        Ok(warnings)
    }
}

fn sheet_name(table: &MarkdownTable) -> String {
    table
        .caption
        .as_deref()
        .and_then(sanitize_sheet_name)
        .unwrap_or_else(|| format!("Table {}", table.index + 1))
}

fn table_grid(table: &MarkdownTable, classifier: &CellClassifier) -> Vec<Vec<Option<ArtifactCell>>> {
    let header = table
        .header
        .iter()
        .map(|text| (!text.is_empty()).then(|| ArtifactCell::Text(text.clone())))
        .collect();

    std::iter::once(header)
        .chain(table.rows.iter().map(|row| {
            row.iter()
                .map(|text| body_cell(&classifier.classify(text)))
                .collect()
        }))
        .collect()
}

fn body_cell(cell: &ProcessedCell) -> Option<ArtifactCell> {
    let typed = match cell.data_type {
        CellDataType::Number => cell.numeric_value.map(ArtifactCell::Number),
        CellDataType::Boolean => cell.boolean_value().map(ArtifactCell::Bool),
        CellDataType::Date => cell
            .date_value
            .map(|date| ArtifactCell::DateTime(excel_serial_date(date))),
        CellDataType::String | CellDataType::Formula => None,
    };

    match typed {
        Some(value) => Some(value),
        None if cell.display_value.is_empty() => None,
        None => Some(ArtifactCell::Text(cell.display_value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::SpreadsheetArtifact;

    fn build(body: &str) -> (XlsxArtifact, Vec<String>) {
        XlsxRenderer::new(DateFormat::DdMmYyyy)
            .build(body, &DocumentMetadata::default())
            .unwrap()
    }

    #[test]
    fn test_excel_serial_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 28).unwrap();
        assert_eq!(excel_serial_date(date), 45685.0);
        let date = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap();
        assert_eq!(excel_serial_date(date), 61.0);
    }

    #[test]
    fn test_serial_dates_before_march_1900() {
        let feb_28 = NaiveDate::from_ymd_opt(1900, 2, 28).unwrap();
        assert_eq!(excel_serial_date(feb_28), 59.0);
        let jan_1 = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert_eq!(excel_serial_date(jan_1), 1.0);
    }

    #[test]
    fn test_typed_cells() {
        let body = "| Item | Qty | Paid | Due |\n|---|---|---|---|\n| Pens | $1,200 | true | 28/01/2025 |\n";
        let (artifact, warnings) = build(body);

        assert!(warnings.is_empty());
        assert_eq!(artifact.sheet_names(), vec!["Table 1"]);
        assert_eq!(artifact.cell(0, 0, 0), Some(&ArtifactCell::Text("Item".into())));
        assert_eq!(artifact.cell(0, 1, 0), Some(&ArtifactCell::Text("Pens".into())));
        assert_eq!(artifact.cell(0, 1, 1), Some(&ArtifactCell::Number(1200.0)));
        assert_eq!(artifact.cell(0, 1, 2), Some(&ArtifactCell::Bool(true)));
        assert_eq!(artifact.cell(0, 1, 3), Some(&ArtifactCell::DateTime(45685.0)));
    }

    #[test]
    fn test_placeholder_written_as_text() {
        let body = "| A | B |\n|---|---|\n| 1 | __FORMULA_0_1_1__ |\n";
        let (artifact, _) = build(body);
        assert_eq!(artifact.find_text(0, "__FORMULA_0_1_1__"), Some((1, 1)));
    }

    #[test]
    fn test_sheet_names_from_headings() {
        let body = "# Sales: Q1\n\n| a |\n|---|\n| 1 |\n\n| b |\n|---|\n| 2 |\n\n## Costs\n\n| c |\n|---|\n| 3 |\n";
        let (artifact, _) = build(body);
        assert_eq!(
            artifact.sheet_names(),
            vec!["Sales Q1", "Sales Q1 (2)", "Costs"]
        );
    }

    #[test]
    fn test_no_tables() {
        let (artifact, warnings) = build("Just prose.\n");
        assert_eq!(artifact.sheet_names(), vec!["Sheet1"]);
        assert_eq!(warnings, vec![EMPTY_WORKBOOK_WARNING]);
    }

    #[test]
    fn test_render_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let metadata = DocumentMetadata {
            title: Some("Budget".into()),
            keywords: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        XlsxRenderer::new(DateFormat::YyyyMmDd)
            .render("| x |\n|---|\n| 2025-01-28 |\n", &metadata, &path)
            .unwrap();

        let reopened = XlsxArtifact::open(&path).unwrap();
        assert_eq!(reopened.sheet_names(), vec!["Table 1"]);
        assert_eq!(reopened.cell(0, 0, 0), Some(&ArtifactCell::Text("x".into())));
    }
}
