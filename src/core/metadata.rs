//! Front matter normalization
//!
//! Turns the raw YAML block into a typed [`DocumentMetadata`], applies the
//! derived-field rules and collects advisory warnings. Only unparsable YAML is
//! an error.

use crate::error::{ConvertError, ConvertResult};
use crate::types::{scalar_to_string, DateFormat, DocumentMetadata};
use serde_yaml::Value;
use tracing::warn;

/// Fields every document is expected to carry
const RECOMMENDED_FIELDS: [&str; 2] = ["title", "author"];

/// Generator stamp written into every normalized metadata record
pub fn generator_name() -> String {
    format!("md2office {}", env!("CARGO_PKG_VERSION"))
}

/// Stateless normalizer for document front matter
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataNormalizer;

impl MetadataNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize an optional front matter block.
    ///
    /// Returns the metadata plus warnings, or `ConvertError::Metadata` when
    /// the block is present but is not a valid YAML mapping.
    pub fn normalize(&self, raw: Option<&str>) -> ConvertResult<(DocumentMetadata, Vec<String>)> {
        let mut warnings = Vec::new();

        let raw = match raw {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                warnings.push("No metadata found.".to_string());
                let metadata = DocumentMetadata {
                    generator: Some(generator_name()),
                    ..Default::default()
                };
                return Ok((metadata, warnings));
            }
        };

        let value: Value =
            serde_yaml::from_str(raw).map_err(|e| ConvertError::Metadata(e.to_string()))?;
        let mut mapping = match value {
            Value::Mapping(map) => map,
            Value::Null => serde_yaml::Mapping::new(),
            other => {
                return Err(ConvertError::Metadata(format!(
                    "front matter must be a mapping, found {}",
                    yaml_kind(&other)
                )))
            }
        };

        // date_format is resolved by hand so a bad value only warns
        let date_format = match mapping.remove("date_format") {
            Some(value) => match scalar_to_string(&value) {
                Some(text) => match text.parse::<DateFormat>() {
                    Ok(format) => Some(format),
                    Err(_) => {
                        warnings.push(format!(
                            "Unknown date_format '{}', using {}",
                            text,
                            DateFormat::default()
                        ));
                        None
                    }
                },
                None => None,
            },
            None => None,
        };

        let mut metadata: DocumentMetadata = serde_yaml::from_value(Value::Mapping(mapping))
            .map_err(|e| ConvertError::Metadata(e.to_string()))?;
        metadata.date_format = date_format;

        if metadata.subject.is_none() {
            metadata.subject = metadata.classification.clone();
        }
        metadata.generator = Some(generator_name());

        for field in RECOMMENDED_FIELDS {
            let missing = match field {
                "title" => metadata.title.is_none(),
                _ => metadata.author.is_none(),
            };
            if missing {
                warnings.push(format!("Missing recommended metadata field: {}", field));
            }
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok((metadata, warnings))
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
