//! md2office API Server binary
//!
//! HTTP REST API for formula extraction, validation and cell classification.

use clap::Parser;
use md2office::api::{run_api_server, ApiConfig};
use md2office::config::ConvertConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "md2office-server")]
#[command(version)]
#[command(about = "md2office API Server - HTTP REST API for markdown formula extraction")]
#[command(long_about = r#"
md2office API Server - HTTP REST API

Provides RESTful endpoints over the document preparation core:
  - POST /api/v1/extract   - Extract table formulas from markdown content
  - POST /api/v1/validate  - Syntax-check a formula
  - POST /api/v1/classify  - Classify cell values

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Features:
  - CORS enabled for cross-origin requests
  - Graceful shutdown on SIGINT/SIGTERM
  - JSON response format with request IDs
  - Tracing and structured logging

Example usage:
  md2office-server                           # Start on localhost:8080
  md2office-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/extract \
    -H "Content-Type: application/json" \
    -d '{"content": "| a |\n|---|\n| {=SUM(A1:A3)} |"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "MD2OFFICE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "MD2OFFICE_PORT")]
    port: u16,

    /// Configuration file (default: ./md2office.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let convert = ConvertConfig::discover(args.config.as_deref(), &std::env::current_dir()?)?;
    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config, convert).await
}
