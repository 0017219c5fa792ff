//! Writes extracted formulas back into a rendered spreadsheet
//!
//! Each placeholder is looked up on the worksheet matching its table index,
//! first by searching the whole sheet and then at the cell its coordinates
//! point to. A placeholder that cannot be found is reported as a warning and
//! left in place.

use super::address::cell_address;
use super::artifact::{ArtifactCell, SpreadsheetArtifact, XlsxArtifact};
use crate::error::ConvertResult;
use crate::types::{DateFormat, DocumentMetadata, FormulaLocation, ReinjectionReport};
use std::path::Path;
use tracing::{debug, info, warn};

/// Replaces formula placeholders with live formula cells
#[derive(Debug, Clone, Default)]
pub struct PlaceholderReinjector {
    styling: Option<(DateFormat, DocumentMetadata)>,
}

impl PlaceholderReinjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the renderer's date format, bold header and document
    /// properties when [`reinject_file`](Self::reinject_file) saves
    pub fn with_styling(mut self, date_format: DateFormat, metadata: &DocumentMetadata) -> Self {
        self.styling = Some((date_format, metadata.clone()));
        self
    }

    /// Patch an in-memory spreadsheet
    pub fn reinject<A: SpreadsheetArtifact + ?Sized>(
        &self,
        artifact: &mut A,
        formulas: &[FormulaLocation],
    ) -> ReinjectionReport {
        let mut report = ReinjectionReport::default();
        let sheet_names = artifact.sheet_names();

        for location in formulas {
            let Some(sheet_name) = sheet_names.get(location.table_index) else {
                report.warnings.push(format!(
                    "Worksheet not found for table {}: {}",
                    location.table_index, location.placeholder
                ));
                continue;
            };

            let Some((row, col)) = locate(artifact, location) else {
                report.warnings.push(format!(
                    "Formula placeholder not found: {}",
                    location.placeholder
                ));
                continue;
            };

            artifact.set_cell(
                location.table_index,
                row,
                col,
                ArtifactCell::Formula(location.formula.clone()),
            );
            let entry = format!(
                "{}!{}: ={}",
                sheet_name,
                cell_address(row, col),
                location.formula
            );
            debug!("{}", entry);
            report.modifications.push(entry);
            report.injected += 1;
        }

        for warning in &report.warnings {
            warn!("{}", warning);
        }
        report
    }

    /// Open `path`, patch it and save it back. The file is read once and
    /// written once; with no formulas it is not touched at all.
    pub fn reinject_file(
        &self,
        path: &Path,
        formulas: &[FormulaLocation],
    ) -> ConvertResult<ReinjectionReport> {
        if formulas.is_empty() {
            return Ok(ReinjectionReport::default());
        }

        let mut artifact = XlsxArtifact::open(path)?;
        if let Some((date_format, metadata)) = &self.styling {
            artifact
                .set_date_format(date_format.excel_num_format())
                .set_header_bold(true)
                .set_properties(metadata);
        }

        let report = self.reinject(&mut artifact, formulas);
        artifact.save(path)?;
        info!(
            path = %path.display(),
            injected = report.injected,
            missing = report.warnings.len(),
            "reinjected formulas"
        );
        Ok(report)
    }
}

/// Cell holding the placeholder: a sheet-wide search first, then the cell at
/// the formula's own coordinates (header row is sheet row 0)
fn locate<A: SpreadsheetArtifact + ?Sized>(
    artifact: &A,
    location: &FormulaLocation,
) -> Option<(u32, u16)> {
    let sheet = location.table_index;
    if let Some(found) = artifact.find_text(sheet, &location.placeholder) {
        return Some(found);
    }

    let row = u32::try_from(location.row).ok()?;
    let col = u16::try_from(location.column).ok()?;
    artifact
        .cell(sheet, row, col)
        .and_then(ArtifactCell::as_text)
        .filter(|text| text.contains(&location.placeholder))
        .map(|_| (row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_with(cells: &[(u32, u16, &str)]) -> XlsxArtifact {
        let mut artifact = XlsxArtifact::new(["Table 1"]);
        for &(row, col, text) in cells {
            artifact.set_cell(0, row, col, ArtifactCell::Text(text.to_string()));
        }
        artifact
    }

    #[test]
    fn test_reinject_found_placeholder() {
        let mut artifact = artifact_with(&[(0, 0, "Qty"), (1, 2, "__FORMULA_0_1_2__")]);
        let formulas = vec![FormulaLocation::new(0, 1, 2, "SUM(A2:B2)")];

        let report = PlaceholderReinjector::new().reinject(&mut artifact, &formulas);

        assert_eq!(report.injected, 1);
        assert!(report.warnings.is_empty());
        assert_eq!(report.modifications, vec!["Table 1!C2: =SUM(A2:B2)"]);
        assert_eq!(
            artifact.cell(0, 1, 2),
            Some(&ArtifactCell::Formula("SUM(A2:B2)".into()))
        );
    }

    #[test]
    fn test_placeholder_moved_by_renderer_is_still_found() {
        let mut artifact = artifact_with(&[(4, 0, "__FORMULA_0_1_1__")]);
        let formulas = vec![FormulaLocation::new(0, 1, 1, "A1")];

        let report = PlaceholderReinjector::new().reinject(&mut artifact, &formulas);

        assert_eq!(report.modifications, vec!["Table 1!A5: =A1"]);
    }

    #[test]
    fn test_missing_placeholder_warns() {
        let mut artifact = artifact_with(&[(1, 1, "plain")]);
        let formulas = vec![FormulaLocation::new(0, 1, 1, "A1+1")];

        let report = PlaceholderReinjector::new().reinject(&mut artifact, &formulas);

        assert_eq!(report.injected, 0);
        assert_eq!(
            report.warnings,
            vec!["Formula placeholder not found: __FORMULA_0_1_1__"]
        );
        assert_eq!(artifact.cell(0, 1, 1), Some(&ArtifactCell::Text("plain".into())));
    }

    #[test]
    fn test_missing_worksheet_warns() {
        let mut artifact = artifact_with(&[]);
        let formulas = vec![FormulaLocation::new(2, 1, 0, "B2")];

        let report = PlaceholderReinjector::new().reinject(&mut artifact, &formulas);

        assert_eq!(
            report.warnings,
            vec!["Worksheet not found for table 2: __FORMULA_2_1_0__"]
        );
    }

    #[test]
    fn test_formula_text_is_verbatim() {
        let mut artifact = artifact_with(&[(1, 0, "__FORMULA_0_1_0__")]);
        let formulas = vec![FormulaLocation::new(0, 1, 0, "IF(A1>0,\"yes\",\"no\")")];

        PlaceholderReinjector::new().reinject(&mut artifact, &formulas);

        assert_eq!(
            artifact.cell(0, 1, 0).and_then(ArtifactCell::as_formula),
            Some("IF(A1>0,\"yes\",\"no\")")
        );
    }
}
