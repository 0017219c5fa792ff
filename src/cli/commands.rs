use crate::config::ConvertConfig;
use crate::core::CellClassifier;
use crate::error::{ConvertError, ConvertResult};
use crate::pipeline::{ConversionJob, Converter};
use crate::types::{ConversionOutcome, ConversionReport, DateFormat, OutputFormat};
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Options shared by every command that runs the conversion pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub config: Option<PathBuf>,
    pub date_format: Option<DateFormat>,
    pub pandoc: Option<String>,
    pub no_normalize: bool,
}

impl PipelineOptions {
    /// Config file, then command line and environment overrides
    pub fn load_config(&self) -> ConvertResult<ConvertConfig> {
        let cwd = std::env::current_dir()?;
        let mut config = ConvertConfig::discover(self.config.as_deref(), &cwd)?
            .with_overrides(self.date_format, self.pandoc.clone());
        if self.no_normalize {
            config.normalize_line_endings = false;
        }
        Ok(config)
    }

    fn converter(&self) -> ConvertResult<Converter> {
        Converter::new(self.load_config()?)
    }
}

/// Output path for `input` inside `dir`, keeping the file stem
fn output_in_dir(input: &Path, dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    dir.join(format!("{}.{}", stem.to_string_lossy(), format.extension()))
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("   {} {}", "⚠️ ".yellow(), warning.yellow());
    }
}

fn print_report(report: &ConversionReport, verbose: bool) {
    match report.outcome() {
        ConversionOutcome::Clean => println!(
            "{} {} → {}",
            "✅".green(),
            report.input.display(),
            report.output.display().to_string().bold()
        ),
        ConversionOutcome::WithWarnings(count) => println!(
            "{} {} → {} ({} warnings)",
            "⚠️ ".yellow(),
            report.input.display(),
            report.output.display().to_string().bold(),
            count
        ),
    }
    if verbose {
        println!(
            "   {} tables, {} formulas",
            report.table_count,
            report.formulas.len()
        );
        for modification in &report.modifications {
            println!("   {} {}", "ƒ".cyan(), modification);
        }
    }
    print_warnings(&report.warnings);
}

/// Execute the convert command
pub fn convert(
    files: Vec<PathBuf>,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
    options: PipelineOptions,
    verbose: bool,
) -> ConvertResult<()> {
    println!("{}", "📄 md2office - Convert".bold().green());
    println!("   Format: {}", format.to_string().bold());
    if let Some(dir) = &output_dir {
        println!("   Output: {}", dir.display());
        fs::create_dir_all(dir)?;
    }
    println!();

    let converter = options.converter()?;
    let jobs: Vec<ConversionJob> = files
        .iter()
        .map(|input| ConversionJob {
            input: input.clone(),
            output: output_dir
                .as_deref()
                .map(|dir| output_in_dir(input, dir, format)),
            format,
        })
        .collect();

    let results = converter.convert_batch(&jobs);
    let mut failed = 0;
    for (job, result) in &results {
        match result {
            Ok(report) => print_report(report, verbose),
            Err(e) => {
                failed += 1;
                println!(
                    "{} {}: {}",
                    "❌".red(),
                    job.input.display(),
                    e.to_string().red()
                );
            }
        }
    }

    println!();
    if failed == 0 {
        println!(
            "{}",
            format!("✅ Converted {} document(s)", results.len())
                .bold()
                .green()
        );
        Ok(())
    } else {
        println!(
            "{}",
            format!("❌ {} of {} document(s) failed", failed, results.len())
                .bold()
                .red()
        );
        Err(ConvertError::Validation(format!(
            "{} of {} document(s) failed",
            failed,
            results.len()
        )))
    }
}

/// Execute the extract command
pub fn extract(file: PathBuf, json: bool, options: PipelineOptions) -> ConvertResult<()> {
    let content = fs::read_to_string(&file)?;
    let prepared = options.converter()?.prepare(&content)?;

    if json {
        let value = serde_json::json!({
            "metadata": prepared.metadata,
            "date_format": prepared.date_format,
            "processed_content": prepared.extraction.processed_content,
            "formulas": prepared.extraction.formulas,
            "table_count": prepared.extraction.table_count,
            "warnings": prepared.warnings,
        });
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| ConvertError::Validation(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!("{}", "🔍 md2office - Extract".bold().green());
    println!("   File: {}", file.display());
    println!(
        "   Found {} tables, {} formulas\n",
        prepared.extraction.table_count,
        prepared.extraction.formulas.len()
    );

    println!("{}", "Processed content:".bold());
    println!("{}", prepared.extraction.processed_content);

    if !prepared.extraction.formulas.is_empty() {
        println!("{}", "Formulas:".bold());
        for location in &prepared.extraction.formulas {
            println!(
                "   {}  ={}  ({})",
                location.placeholder.bright_blue(),
                location.formula,
                location.describe()
            );
        }
    }
    print_warnings(&prepared.warnings);
    Ok(())
}

/// Execute the validate command
pub fn validate(files: Vec<PathBuf>, options: PipelineOptions) -> ConvertResult<()> {
    println!("{}", "✅ md2office - Validate".bold().green());
    let converter = options.converter()?;
    let mut failed = 0;

    for file in &files {
        println!("\n   File: {}", file.display());
        let prepared = fs::read_to_string(file)
            .map_err(ConvertError::from)
            .and_then(|content| converter.prepare(&content));

        match prepared {
            Ok(doc) => {
                println!(
                    "   Found {} tables, {} formulas",
                    doc.extraction.table_count,
                    doc.extraction.formulas.len()
                );
                if doc.warnings.is_empty() {
                    println!("   {}", "No issues found".green());
                } else {
                    print_warnings(&doc.warnings);
                }
            }
            Err(e) => {
                failed += 1;
                println!("   {} {}", "❌".red(), e.to_string().red());
            }
        }
    }

    println!();
    if failed == 0 {
        println!("{}", "✅ All documents are valid!".bold().green());
        Ok(())
    } else {
        Err(ConvertError::Validation(format!(
            "{} of {} document(s) could not be prepared",
            failed,
            files.len()
        )))
    }
}

/// Execute the classify command
pub fn classify(values: Vec<String>, date_format: Option<DateFormat>) -> ConvertResult<()> {
    let classifier = CellClassifier::new(date_format.unwrap_or_default())?;
    for value in &values {
        let cell = classifier.classify(value);
        let detail = match (&cell.formula, cell.numeric_value, cell.date_value) {
            (Some(formula), _, _) => format!(" ={}", formula),
            (_, Some(number), _) => format!(" {}", number),
            (_, _, Some(date)) => format!(" {}", date),
            _ => String::new(),
        };
        println!(
            "{:<24} {}{}",
            format!("'{}'", value),
            cell.data_type.to_string().bright_blue().bold(),
            detail
        );
    }
    Ok(())
}

/// Execute the watch command
pub fn watch(
    file: PathBuf,
    format: OutputFormat,
    options: PipelineOptions,
    verbose: bool,
) -> ConvertResult<()> {
    println!("{}", "👁️  md2office - Watch Mode".bold().green());
    println!("   Watching: {}", file.display());
    println!("   Format: {}", format);
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !file.exists() {
        return Err(ConvertError::Validation(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let canonical_path = file.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| ConvertError::Validation("Cannot determine parent directory".to_string()))?;

    let converter = options.converter()?;
    let (tx, rx) = channel();

    // Debounced so an editor's save burst triggers a single conversion
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| ConvertError::Validation(format!("Failed to create file watcher: {}", e)))?;
    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| ConvertError::Validation(format!("Failed to watch directory: {}", e)))?;

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(&converter, &file, format, verbose);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && (event.path.canonicalize().ok().as_ref() == Some(&canonical_path)
                            || event.path.file_name() == canonical_path.file_name())
                });

                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_action(&converter, &file, format, verbose);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn run_watch_action(converter: &Converter, file: &Path, format: OutputFormat, verbose: bool) {
    match converter.convert_file(file, None, format) {
        Ok(report) => print_report(&report, verbose),
        Err(e) => println!("{} {}", "❌ Conversion failed:".bold().red(), e),
    }
}
