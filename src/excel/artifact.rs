//! Rendered spreadsheet access
//!
//! The reinjector only needs to enumerate worksheets, read and write cells,
//! and save. [`XlsxArtifact`] provides that over a real `.xlsx` file: it is
//! loaded with calamine and written back with rust_xlsxwriter.

use crate::error::ConvertResult;
use crate::types::DocumentMetadata;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Format, Formula, Workbook};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Value stored in one worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactCell {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (1900 system)
    DateTime(f64),
    /// Formula body without the leading `=`
    Formula(String),
}

impl ArtifactCell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArtifactCell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            ArtifactCell::Formula(f) => Some(f),
            _ => None,
        }
    }
}

/// Operations the reinjector needs from a rendered spreadsheet.
///
/// Rows and columns are 0-based.
pub trait SpreadsheetArtifact {
    /// Worksheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    fn cell(&self, sheet: usize, row: u32, col: u16) -> Option<&ArtifactCell>;

    fn set_cell(&mut self, sheet: usize, row: u32, col: u16, value: ArtifactCell);

    /// First text cell (row-major order) containing `needle`
    fn find_text(&self, sheet: usize, needle: &str) -> Option<(u32, u16)>;
}

#[derive(Debug, Clone, Default, PartialEq)]
struct SheetData {
    name: String,
    cells: BTreeMap<(u32, u16), ArtifactCell>,
}

/// An `.xlsx` workbook held in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XlsxArtifact {
    sheets: Vec<SheetData>,
    date_num_format: String,
    bold_header: bool,
    properties: Option<DocumentMetadata>,
}

impl XlsxArtifact {
    /// Empty workbook with the given worksheet names
    pub fn new<S: Into<String>>(sheet_names: impl IntoIterator<Item = S>) -> Self {
        Self {
            sheets: sheet_names
                .into_iter()
                .map(|name| SheetData {
                    name: name.into(),
                    cells: BTreeMap::new(),
                })
                .collect(),
            date_num_format: "yyyy-mm-dd".to_string(),
            bold_header: false,
            properties: None,
        }
    }

    /// Build a workbook from in-memory rows, one entry per sheet
    pub fn from_sheets<S: Into<String>>(
        sheets: impl IntoIterator<Item = (S, Vec<Vec<Option<ArtifactCell>>>)>,
    ) -> Self {
        let mut names = Vec::new();
        let mut grids = Vec::new();
        for (name, rows) in sheets {
            names.push(name.into());
            grids.push(rows);
        }

        let mut artifact = Self::new(names);
        for (index, rows) in grids.into_iter().enumerate() {
            for (row, cells) in rows.into_iter().enumerate() {
                for (col, cell) in cells.into_iter().enumerate() {
                    if let Some(cell) = cell {
                        artifact.set_cell(index, row as u32, col as u16, cell);
                    }
                }
            }
        }
        artifact
    }

    /// Load every worksheet of an `.xlsx` file
    pub fn open(path: &Path) -> ConvertResult<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let names = workbook.sheet_names().to_vec();
        let mut artifact = Self::new(names.clone());

        for (index, name) in names.iter().enumerate() {
            let range = workbook.worksheet_range(name)?;
            load_values(&mut artifact.sheets[index], &range);

            // Formula cells carry a cached value in `range`; the formula wins
            if let Ok(formulas) = workbook.worksheet_formula(name) {
                load_formulas(&mut artifact.sheets[index], &formulas);
            }
        }

        debug!(path = %path.display(), sheets = names.len(), "loaded workbook");
        Ok(artifact)
    }

    /// Number format applied to date cells on save
    pub fn set_date_format(&mut self, num_format: &str) -> &mut Self {
        self.date_num_format = num_format.to_string();
        self
    }

    /// Write row 0 of every sheet in bold on save
    pub fn set_header_bold(&mut self, bold: bool) -> &mut Self {
        self.bold_header = bold;
        self
    }

    /// Document properties written on save
    pub fn set_properties(&mut self, metadata: &DocumentMetadata) -> &mut Self {
        self.properties = Some(metadata.clone());
        self
    }

    /// Write the workbook to disk
    pub fn save(&self, path: &Path) -> ConvertResult<()> {
        let mut workbook = Workbook::new();
        if let Some(metadata) = &self.properties {
            workbook.set_properties(&super::renderer::document_properties(metadata));
        }

        let date_format = Format::new().set_num_format(&self.date_num_format);
        let header_format = Format::new().set_bold();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (&(row, col), cell) in &sheet.cells {
                let header = self.bold_header && row == 0;
                match cell {
                    ArtifactCell::Text(s) if header => {
                        worksheet.write_string_with_format(row, col, s, &header_format)?;
                    }
                    ArtifactCell::Text(s) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    ArtifactCell::Number(n) => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    ArtifactCell::Bool(b) => {
                        worksheet.write_boolean(row, col, *b)?;
                    }
                    ArtifactCell::DateTime(serial) => {
                        worksheet.write_number_with_format(row, col, *serial, &date_format)?;
                    }
                    ArtifactCell::Formula(body) => {
                        worksheet.write_formula(row, col, Formula::new(format!("={}", body)))?;
                    }
                }
            }
            worksheet.autofit();
        }

        workbook.save(path)?;
        debug!(path = %path.display(), sheets = self.sheets.len(), "saved workbook");
        Ok(())
    }
}

impl SpreadsheetArtifact for XlsxArtifact {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn cell(&self, sheet: usize, row: u32, col: u16) -> Option<&ArtifactCell> {
        self.sheets.get(sheet)?.cells.get(&(row, col))
    }

    fn set_cell(&mut self, sheet: usize, row: u32, col: u16, value: ArtifactCell) {
        if let Some(data) = self.sheets.get_mut(sheet) {
            data.cells.insert((row, col), value);
        }
    }

    fn find_text(&self, sheet: usize, needle: &str) -> Option<(u32, u16)> {
        self.sheets
            .get(sheet)?
            .cells
            .iter()
            .find(|(_, cell)| cell.as_text().is_some_and(|text| text.contains(needle)))
            .map(|(&pos, _)| pos)
    }
}

/// Absolute (row, col) of a cell given as relative to the range start
fn absolute<T>(range: &Range<T>, row: usize, col: usize) -> (u32, u16)
where
    T: calamine::CellType,
{
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    (start_row + row as u32, (start_col as usize + col) as u16)
}

fn load_values(sheet: &mut SheetData, range: &Range<Data>) {
    for (row, col, data) in range.used_cells() {
        let value = match data {
            Data::String(s) => ArtifactCell::Text(s.clone()),
            Data::Float(f) => ArtifactCell::Number(*f),
            Data::Int(i) => ArtifactCell::Number(*i as f64),
            Data::Bool(b) => ArtifactCell::Bool(*b),
            Data::DateTime(dt) => ArtifactCell::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => ArtifactCell::Text(s.clone()),
            Data::Error(e) => ArtifactCell::Text(e.to_string()),
            _ => continue,
        };
        sheet.cells.insert(absolute(range, row, col), value);
    }
}

fn load_formulas(sheet: &mut SheetData, range: &Range<String>) {
    for (row, col, formula) in range.used_cells() {
        if formula.is_empty() {
            continue;
        }
        let body = formula.strip_prefix('=').unwrap_or(formula);
        sheet
            .cells
            .insert(absolute(range, row, col), ArtifactCell::Formula(body.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_find_text() {
        let mut artifact = XlsxArtifact::new(["Sales"]);
        artifact.set_cell(0, 0, 0, ArtifactCell::Text("Item".into()));
        artifact.set_cell(0, 2, 1, ArtifactCell::Text("x __FORMULA_0_2_1__".into()));
        artifact.set_cell(0, 1, 1, ArtifactCell::Number(3.0));

        assert_eq!(artifact.find_text(0, "__FORMULA_0_2_1__"), Some((2, 1)));
        assert_eq!(artifact.find_text(0, "missing"), None);
        assert_eq!(artifact.find_text(5, "Item"), None);
    }

    #[test]
    fn test_set_cell_on_missing_sheet_is_ignored() {
        let mut artifact = XlsxArtifact::new(["Only"]);
        artifact.set_cell(3, 0, 0, ArtifactCell::Bool(true));
        assert_eq!(artifact.cell(3, 0, 0), None);
        assert_eq!(artifact.sheet_names(), vec!["Only"]);
    }

    #[test]
    fn test_from_sheets_skips_empty_cells() {
        let artifact = XlsxArtifact::from_sheets([(
            "Data",
            vec![
                vec![Some(ArtifactCell::Text("A".into())), None],
                vec![None, Some(ArtifactCell::Number(2.0))],
            ],
        )]);
        assert_eq!(artifact.cell(0, 0, 1), None);
        assert_eq!(artifact.cell(0, 1, 1), Some(&ArtifactCell::Number(2.0)));
        assert_eq!(artifact.sheet_names(), vec!["Data"]);
    }

    #[test]
    fn test_cell_accessors() {
        assert_eq!(ArtifactCell::Text("a".into()).as_text(), Some("a"));
        assert_eq!(ArtifactCell::Formula("A1".into()).as_formula(), Some("A1"));
        assert_eq!(ArtifactCell::Number(1.0).as_text(), None);
    }
}
