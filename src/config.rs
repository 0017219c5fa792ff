//! Converter configuration
//!
//! Read from `--config <path>` or `md2office.yaml` in the working directory.
//! Every field is optional in the file.

use crate::error::{ConvertError, ConvertResult};
use crate::types::{DateFormat, OutputFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File picked up from the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "md2office.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Used when neither the command line nor the document picks one
    pub date_format: Option<DateFormat>,
    /// Set from `--date-format` / `MD2OFFICE_DATE_FORMAT`; beats the document
    #[serde(skip)]
    pub forced_date_format: Option<DateFormat>,
    pub normalize_line_endings: bool,
    pub validate_formulas: bool,
    pub pandoc: PandocConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            date_format: None,
            forced_date_format: None,
            normalize_line_endings: true,
            validate_formulas: true,
            pandoc: PandocConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PandocConfig {
    pub binary: String,
    pub timeout_secs: u64,
    pub pdf_engine: Option<String>,
    /// `--reference-doc` template per output format
    pub reference_docs: BTreeMap<OutputFormat, PathBuf>,
}

impl Default for PandocConfig {
    fn default() -> Self {
        Self {
            binary: "pandoc".to_string(),
            timeout_secs: 120,
            pdf_engine: None,
            reference_docs: BTreeMap::new(),
        }
    }
}

impl PandocConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConvertConfig {
    pub fn from_yaml(content: &str) -> ConvertResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConvertError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ConvertResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|e| ConvertError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the explicit file if given, else `md2office.yaml` under `dir` if
    /// present, else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> ConvertResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Date format for a document: command line, then the document's own
    /// front matter, then this file, then DD/MM/YYYY
    pub fn resolve_date_format(&self, document: Option<DateFormat>) -> DateFormat {
        self.forced_date_format
            .or(document)
            .or(self.date_format)
            .unwrap_or_default()
    }

    /// Apply command line / environment overrides
    pub fn with_overrides(mut self, date_format: Option<DateFormat>, pandoc: Option<String>) -> Self {
        if date_format.is_some() {
            self.forced_date_format = date_format;
        }
        if let Some(binary) = pandoc {
            self.pandoc.binary = binary;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();
        assert!(config.normalize_line_endings);
        assert!(config.validate_formulas);
        assert_eq!(config.pandoc.binary, "pandoc");
        assert_eq!(config.pandoc.timeout(), Duration::from_secs(120));
        assert_eq!(ConvertConfig::from_yaml("").unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let yaml = "date_format: YYYY-MM-DD\npandoc:\n  timeout_secs: 30\n  reference_docs:\n    docx: templates/corp.docx\n";
        let config = ConvertConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.date_format, Some(DateFormat::YyyyMmDd));
        assert!(config.normalize_line_endings);
        assert_eq!(config.pandoc.binary, "pandoc");
        assert_eq!(config.pandoc.timeout_secs, 30);
        assert_eq!(
            config.pandoc.reference_docs.get(&OutputFormat::Docx),
            Some(&PathBuf::from("templates/corp.docx"))
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ConvertConfig::from_yaml("colour: blue\n").unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            ConvertConfig::discover(None, dir.path()).unwrap(),
            ConvertConfig::default()
        );

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "validate_formulas: false\n").unwrap();
        let config = ConvertConfig::discover(None, dir.path()).unwrap();
        assert!(!config.validate_formulas);

        let missing = dir.path().join("nope.yaml");
        assert!(ConvertConfig::discover(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ConvertConfig::default()
            .with_overrides(Some(DateFormat::MmDdYyyy), Some("/opt/pandoc".into()));
        assert_eq!(config.forced_date_format, Some(DateFormat::MmDdYyyy));
        assert_eq!(config.pandoc.binary, "/opt/pandoc");

        let kept = config.clone().with_overrides(None, None);
        assert_eq!(kept, config);
    }

    #[test]
    fn test_date_format_precedence() {
        let mut config = ConvertConfig::default();
        assert_eq!(config.resolve_date_format(None), DateFormat::DdMmYyyy);

        config.date_format = Some(DateFormat::YyyyMmDd);
        assert_eq!(config.resolve_date_format(None), DateFormat::YyyyMmDd);
        assert_eq!(
            config.resolve_date_format(Some(DateFormat::MmDdYyyy)),
            DateFormat::MmDdYyyy
        );

        let config = config.with_overrides(Some(DateFormat::DdMmYyyy), None);
        assert_eq!(
            config.resolve_date_format(Some(DateFormat::MmDdYyyy)),
            DateFormat::DdMmYyyy
        );
    }
}
