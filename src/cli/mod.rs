//! CLI command handlers

pub mod commands;

pub use commands::{classify, convert, extract, validate, watch, PipelineOptions};
