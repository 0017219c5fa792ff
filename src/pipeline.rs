//! End-to-end document conversion
//!
//! Extracted → Rendered → Reinjected → Finalized. Preparation is pure; the
//! render and reinjection stages touch the filesystem. Formulas only become
//! live cells in `.xlsx` output; other formats show them as `=FORMULA` text.

use crate::config::ConvertConfig;
use crate::core::{FormulaExtractor, MetadataNormalizer};
use crate::error::{ConvertError, ConvertResult};
use crate::excel::{PlaceholderReinjector, XlsxRenderer};
use crate::markdown::{normalize_line_endings, split_front_matter};
use crate::render::PandocRenderer;
use crate::types::{
    ConversionReport, ConversionStage, DateFormat, DocumentMetadata, ExtractionResult,
    OutputFormat,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A document after metadata normalization and formula extraction
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub metadata: DocumentMetadata,
    /// Effective date format for cell classification
    pub date_format: DateFormat,
    /// Front matter block as written, delimiters included; empty if none
    pub front_matter: String,
    /// Extraction over the body (front matter excluded)
    pub extraction: ExtractionResult,
    /// Metadata warnings followed by extraction warnings
    pub warnings: Vec<String>,
}

impl PreparedDocument {
    /// Full markdown for pandoc: front matter plus the body with formulas
    /// written out as `=FORMULA` text
    pub fn pandoc_input(&self) -> String {
        format!("{}{}", self.front_matter, self.extraction.inline_formulas())
    }
}

/// One entry of a batch conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    /// Defaults to the input path with the format's extension
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

impl ConversionJob {
    pub fn new(input: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            input: input.into(),
            output: None,
            format,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        default_output(&self.input, self.output.as_deref(), self.format)
    }
}

fn default_output(input: &Path, output: Option<&Path>, format: OutputFormat) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension(format.extension()))
}

/// Runs documents through the pipeline; shareable across threads
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConvertConfig,
    normalizer: MetadataNormalizer,
    extractor: FormulaExtractor,
    pandoc: PandocRenderer,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> ConvertResult<Self> {
        let extractor = FormulaExtractor::new()?.with_validation(config.validate_formulas)?;
        let pandoc = PandocRenderer::from_config(&config.pandoc);
        Ok(Self {
            config,
            normalizer: MetadataNormalizer::new(),
            extractor,
            pandoc,
        })
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Normalize metadata and extract formulas. No I/O.
    pub fn prepare(&self, content: &str) -> ConvertResult<PreparedDocument> {
        let content = if self.config.normalize_line_endings {
            normalize_line_endings(content)
        } else {
            content.into()
        };

        let parts = split_front_matter(&content);
        let (metadata, mut warnings) = self.normalizer.normalize(parts.yaml)?;
        let date_format = self.config.resolve_date_format(metadata.date_format);

        let front_matter = content[..content.len() - parts.body.len()].to_string();
        let extraction = self.extractor.extract(parts.body);
        warnings.extend(extraction.warnings.iter().cloned());

        info!(
            tables = extraction.table_count,
            formulas = extraction.formulas.len(),
            %date_format,
            "document prepared"
        );

        Ok(PreparedDocument {
            metadata,
            date_format,
            front_matter,
            extraction,
            warnings,
        })
    }

    /// Convert one file. `output` defaults to `input` with the format's
    /// extension.
    pub fn convert_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        format: OutputFormat,
    ) -> ConvertResult<ConversionReport> {
        let content = std::fs::read_to_string(input)?;
        let prepared = self.prepare(&content)?;
        let output = default_output(input, output, format);

        let mut report = ConversionReport {
            input: input.to_path_buf(),
            output: output.clone(),
            format,
            metadata: prepared.metadata.clone(),
            formulas: prepared.extraction.formulas.clone(),
            table_count: prepared.extraction.table_count,
            modifications: Vec::new(),
            warnings: prepared.warnings.clone(),
            stage: ConversionStage::Extracted,
        };

        match format {
            OutputFormat::Xlsx => {
                let renderer = XlsxRenderer::new(prepared.date_format);
                let render_warnings = renderer.render(
                    &prepared.extraction.processed_content,
                    &prepared.metadata,
                    &output,
                )?;
                report.warnings.extend(render_warnings);
                report.stage = ConversionStage::Rendered;
                info!(output = %output.display(), "xlsx rendered");

                let reinjection = PlaceholderReinjector::new()
                    .with_styling(prepared.date_format, &prepared.metadata)
                    .reinject_file(&output, &prepared.extraction.formulas)?;
                report.modifications = reinjection.modifications;
                report.warnings.extend(reinjection.warnings);
                report.stage = ConversionStage::Reinjected;
            }
            _ => {
                if let Err(e) = self.pandoc.render(&prepared.pandoc_input(), format, &output) {
                    remove_partial_output(&output, &e);
                    return Err(e);
                }
                report.stage = ConversionStage::Rendered;
            }
        }

        report.stage = ConversionStage::Finalized;
        info!(
            input = %input.display(),
            output = %output.display(),
            warnings = report.warnings.len(),
            "conversion finished"
        );
        Ok(report)
    }

    /// Convert several documents in parallel. Results keep the job order.
    pub fn convert_batch(
        &self,
        jobs: &[ConversionJob],
    ) -> Vec<(ConversionJob, ConvertResult<ConversionReport>)> {
        jobs.par_iter()
            .map(|job| {
                let result = self.convert_file(&job.input, job.output.as_deref(), job.format);
                (job.clone(), result)
            })
            .collect()
    }
}

fn remove_partial_output(output: &Path, error: &ConvertError) {
    if error.is_render_failure() && output.exists() {
        warn!(output = %output.display(), "removing partial output after failed render");
        let _ = std::fs::remove_file(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn converter() -> Converter {
        Converter::new(ConvertConfig::default()).unwrap()
    }

    #[test]
    fn test_prepare_orders_warnings() {
        let doc = "---\ntitle: Budget\n---\n| a | b |\n|---|---|\n| 1 | {=FOO(A1)} |\n";
        let prepared = converter().prepare(doc).unwrap();

        assert_eq!(
            prepared.warnings,
            vec![
                "Missing recommended metadata field: author".to_string(),
                "Formula warning at table 0, row 1, column 1: Unknown function: FOO".to_string(),
            ]
        );
        assert_eq!(prepared.front_matter, "---\ntitle: Budget\n---\n");
        assert_eq!(prepared.extraction.formulas.len(), 1);
    }

    #[test]
    fn test_prepare_normalizes_line_endings() {
        let doc = "| a |\r\n|---|\r\n| {=A1} |\r\n";
        let prepared = converter().prepare(doc).unwrap();
        assert_eq!(
            prepared.extraction.processed_content,
            "| a |\n|---|\n| __FORMULA_0_1_0__ |\n"
        );
    }

    #[test]
    fn test_pandoc_input_inlines_formulas() {
        let doc = "---\ntitle: t\nauthor: a\n---\n| x |\n|---|\n| {=SUM(A1:A2)} |\n";
        let prepared = converter().prepare(doc).unwrap();
        let input = prepared.pandoc_input();
        assert!(input.starts_with("---\ntitle: t\n"));
        assert!(input.contains("| =SUM(A1:A2) |"));
        assert!(!input.contains("__FORMULA_"));
    }

    #[test]
    fn test_document_date_format_beats_config() {
        let config = ConvertConfig {
            date_format: Some(DateFormat::YyyyMmDd),
            ..Default::default()
        };
        let converter = Converter::new(config).unwrap();
        let prepared = converter
            .prepare("---\ndate_format: MM/DD/YYYY\n---\nbody\n")
            .unwrap();
        assert_eq!(prepared.date_format, DateFormat::MmDdYyyy);
    }

    #[test]
    fn test_fatal_metadata_stops_preparation() {
        let err = converter().prepare("---\ntitle: [x\n---\nbody\n").unwrap_err();
        assert!(matches!(err, ConvertError::Metadata(_)));
    }

    #[test]
    fn test_default_output_path() {
        let job = ConversionJob::new("docs/report.md", OutputFormat::Pptx);
        assert_eq!(job.output_path(), PathBuf::from("docs/report.pptx"));
    }
}
