//! docx / pptx / pdf rendering through the pandoc binary

use crate::config::PandocConfig;
use crate::error::{ConvertError, ConvertResult};
use crate::types::OutputFormat;
use std::collections::BTreeMap;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct PandocRenderer {
    binary: String,
    timeout: Duration,
    pdf_engine: Option<String>,
    reference_docs: BTreeMap<OutputFormat, PathBuf>,
}

impl Default for PandocRenderer {
    fn default() -> Self {
        Self::from_config(&PandocConfig::default())
    }
}

impl PandocRenderer {
    pub fn from_config(config: &PandocConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: config.timeout(),
            pdf_engine: config.pdf_engine.clone(),
            reference_docs: config.reference_docs.clone(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// True if the binary can be started
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Command line arguments for one conversion
    pub fn arguments(&self, format: OutputFormat, output: &Path) -> ConvertResult<Vec<String>> {
        if format == OutputFormat::Xlsx {
            return Err(ConvertError::UnsupportedFormat(
                "xlsx is rendered natively, not through pandoc".to_string(),
            ));
        }

        let mut args = vec![
            "--from".to_string(),
            "markdown".to_string(),
            "--to".to_string(),
            pandoc_writer(format).to_string(),
            "--output".to_string(),
            output.display().to_string(),
        ];
        if let Some(template) = self.reference_docs.get(&format) {
            args.push("--reference-doc".to_string());
            args.push(template.display().to_string());
        }
        if format == OutputFormat::Pdf {
            if let Some(engine) = &self.pdf_engine {
                args.push("--pdf-engine".to_string());
                args.push(engine.clone());
            }
        }
        Ok(args)
    }

    /// Render `content` (markdown, front matter included) into `output`
    pub fn render(&self, content: &str, format: OutputFormat, output: &Path) -> ConvertResult<()> {
        let args = self.arguments(format, output)?;
        debug!(binary = %self.binary, ?args, "starting pandoc");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ConvertError::RenderUnavailable(format!(
                    "'{}' not found; install pandoc or set MD2OFFICE_PANDOC",
                    self.binary
                )),
                _ => ConvertError::RenderUnavailable(format!("{}: {}", self.binary, e)),
            })?;

        // Feed stdin and drain stderr on their own threads so a full pipe
        // never blocks the child
        let stdin = child.stdin.take();
        let input = content.to_string();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(input.as_bytes());
            }
        });
        let stderr = child.stderr.take();
        let reader = thread::spawn(move || {
            let mut buffer = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buffer);
            }
            buffer
        });

        let status = match wait_with_timeout(&mut child, self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConvertError::RenderTimeout(self.timeout.as_secs()));
            }
        };
        let _ = writer.join();
        let stderr = reader.join().unwrap_or_default();

        if !status.success() {
            let message = stderr.trim();
            return Err(ConvertError::Render(if message.is_empty() {
                format!("pandoc exited with {}", status)
            } else {
                message.to_string()
            }));
        }

        info!(output = %output.display(), %format, "pandoc render complete");
        Ok(())
    }
}

fn pandoc_writer(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Docx => "docx",
        OutputFormat::Pptx => "pptx",
        // pandoc has no pdf writer; latex plus a .pdf output runs the engine
        OutputFormat::Pdf => "latex",
        OutputFormat::Xlsx => "xlsx",
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> ConvertResult<Option<std::process::ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
