//! Cell-type inference for table cells
//!
//! Precedence is fixed: formula, boolean, number, date, string. The first
//! rule that matches wins.

use crate::error::ConvertResult;
use crate::types::{CellDataType, DateFormat, ProcessedCell};
use chrono::NaiveDate;
use regex::Regex;

/// Currency markers removed before numeric parsing
const CURRENCY_TOKENS: [&str; 5] = ["AUD", "$", "€", "£", "¥"];

/// Classifies raw cell strings under one configured date format.
///
/// Owns its compiled patterns; create one per document (or share clones).
#[derive(Debug, Clone)]
pub struct CellClassifier {
    date_format: DateFormat,
    formula_re: Regex,
    number_re: Regex,
    iso_date_re: Regex,
    slash_date_re: Regex,
}

impl CellClassifier {
    pub fn new(date_format: DateFormat) -> ConvertResult<Self> {
        Ok(Self {
            date_format,
            formula_re: Regex::new(r"^\{=([^}]*)\}$")?,
            number_re: Regex::new(r"^-?\d+(\.\d+)?$")?,
            iso_date_re: Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$")?,
            slash_date_re: Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$")?,
        })
    }

    pub fn date_format(&self) -> DateFormat {
        self.date_format
    }

    /// Classify one raw cell value
    pub fn classify(&self, raw: &str) -> ProcessedCell {
        let display = raw.trim();
        let mut cell = ProcessedCell {
            raw_value: raw.to_string(),
            display_value: display.to_string(),
            data_type: CellDataType::String,
            numeric_value: None,
            date_value: None,
            formula: None,
        };

        if let Some(body) = self.formula_body(display) {
            cell.data_type = CellDataType::Formula;
            cell.formula = Some(body.to_string());
        } else if display.eq_ignore_ascii_case("true") || display.eq_ignore_ascii_case("false") {
            cell.data_type = CellDataType::Boolean;
        } else if let Some(number) = self.parse_number(display) {
            cell.data_type = CellDataType::Number;
            cell.numeric_value = Some(number);
        } else if let Some(date) = self.parse_date(display) {
            cell.data_type = CellDataType::Date;
            cell.date_value = Some(date);
        }

        cell
    }

    fn formula_body<'a>(&self, value: &'a str) -> Option<&'a str> {
        self.formula_re
            .captures(value)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Full-string numeric match after removing currency and separators.
    ///
    /// "28/01/2025" is rejected: a numeric prefix is not a number.
    pub fn parse_number(&self, value: &str) -> Option<f64> {
        let mut cleaned = value.to_string();
        for token in CURRENCY_TOKENS {
            cleaned = cleaned.replace(token, "");
        }
        cleaned.retain(|c| c != ',' && !c.is_whitespace());

        if !self.number_re.is_match(&cleaned) {
            return None;
        }
        cleaned.parse::<f64>().ok()
    }

    /// Parse a date in the configured format only
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let (year, month, day) = match self.date_format {
            DateFormat::YyyyMmDd => {
                let caps = self.iso_date_re.captures(value)?;
                (caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
            }
            DateFormat::DdMmYyyy => {
                let caps = self.slash_date_re.captures(value)?;
                (caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)
            }
            DateFormat::MmDdYyyy => {
                let caps = self.slash_date_re.captures(value)?;
                (caps[3].parse().ok()?, caps[1].parse().ok()?, caps[2].parse().ok()?)
            }
        };
        // Rejects day 32, month 13 and 29 Feb outside leap years
        NaiveDate::from_ymd_opt(year, month, day)
    }
}
