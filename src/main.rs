use clap::{Parser, Subcommand};
use md2office::cli::{self, PipelineOptions};
use md2office::error::ConvertResult;
use md2office::types::{DateFormat, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "md2office")]
#[command(about = "Markdown with YAML front matter to Word, Excel, PowerPoint and PDF")]
#[command(long_about = "md2office - Markdown to Office documents with live Excel formulas

Pipe-table cells written as {=FORMULA} become real formulas in .xlsx output
and stay readable as =FORMULA text in .docx, .pptx and .pdf output.

COMMANDS:
  convert   - Convert documents (docx, xlsx, pptx, pdf)
  extract   - Show the formula map and processed markdown
  validate  - Check metadata and formulas without rendering
  classify  - Show how cell values would be typed
  watch     - Re-convert a document whenever it changes

EXAMPLES:
  md2office convert report.md -f xlsx
  md2office convert docs/*.md -f docx -o build/
  md2office extract budget.md --json
  md2office classify 42 '$1,200' 28/01/2025 '{=SUM(A1:A3)}'

Word, PowerPoint and PDF output need pandoc on PATH (or MD2OFFICE_PANDOC).")]
#[command(version)]
struct Cli {
    /// Show debug logging and per-document detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Default)]
struct PipelineArgs {
    /// Configuration file (default: ./md2office.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Date format for table cells: DD/MM/YYYY, MM/DD/YYYY or YYYY-MM-DD
    #[arg(long, env = "MD2OFFICE_DATE_FORMAT")]
    date_format: Option<DateFormat>,

    /// Path to the pandoc binary
    #[arg(long, env = "MD2OFFICE_PANDOC")]
    pandoc: Option<String>,

    /// Keep CR / CRLF line endings instead of normalizing to LF
    #[arg(long)]
    no_normalize: bool,
}

impl From<PipelineArgs> for PipelineOptions {
    fn from(args: PipelineArgs) -> Self {
        PipelineOptions {
            config: args.config,
            date_format: args.date_format,
            pandoc: args.pandoc,
            no_normalize: args.no_normalize,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Convert markdown documents to Office formats.

Documents are converted in parallel. Each one is reported as converted,
converted with warnings, or failed; the exit code is non-zero if any failed.

XLSX OUTPUT:
  Every pipe table becomes a worksheet. Numbers, booleans and dates are
  typed cells; {=...} markers become live formulas.

DOCX / PPTX / PDF OUTPUT:
  Rendered by pandoc. Formulas appear as =FORMULA text.")]
    /// Convert documents
    Convert {
        /// Markdown files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "docx")]
        format: OutputFormat,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show the formula map and processed markdown for a document
    Extract {
        /// Markdown file
        file: PathBuf,

        /// Print machine readable JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Check metadata and formulas without rendering
    Validate {
        /// Markdown files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show the data type each value would get in a spreadsheet
    Classify {
        /// Cell values
        #[arg(required = true)]
        values: Vec<String>,

        /// Date format used to recognise dates
        #[arg(long, env = "MD2OFFICE_DATE_FORMAT")]
        date_format: Option<DateFormat>,
    },

    /// Re-convert a document whenever it is saved
    Watch {
        /// Markdown file to watch
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "docx")]
        format: OutputFormat,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "md2office=debug" } else { "md2office=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ConvertResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert {
            files,
            format,
            output,
            pipeline,
        } => cli::convert(files, format, output, pipeline.into(), cli.verbose),
        Commands::Extract {
            file,
            json,
            pipeline,
        } => cli::extract(file, json, pipeline.into()),
        Commands::Validate { files, pipeline } => cli::validate(files, pipeline.into()),
        Commands::Classify {
            values,
            date_format,
        } => cli::classify(values, date_format),
        Commands::Watch {
            file,
            format,
            pipeline,
        } => cli::watch(file, format, pipeline.into(), cli.verbose),
    }
}
