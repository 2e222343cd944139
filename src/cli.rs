//! CLI interface for the resume ranker

use crate::config::OutputFormat;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-ranker")]
#[command(about = "Rank PDF resumes against a job description")]
#[command(long_about = "Rank PDF resumes by semantic similarity to a job description using sentence embeddings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank resumes against a job description
    #[command(group(ArgGroup::new("job_source").required(true).args(["job", "job_file"])))]
    Rank {
        /// Resume PDF files to rank
        resumes: Vec<PathBuf>,

        /// Job description text
        #[arg(short, long)]
        job: Option<String>,

        /// Path to job description file (TXT, MD)
        #[arg(short = 'f', long)]
        job_file: Option<PathBuf>,

        /// Embedding model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Output format: console, json, markdown, html, csv
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Export the ranking table as CSV, optionally to a path given as `--csv=<path>`
        #[arg(long, num_args = 0..=1, require_equals = true)]
        csv: Option<Option<PathBuf>>,

        /// Preview one resume, by file name or by rank
        #[arg(long)]
        preview: Option<String>,

        /// Number of characters shown in the preview
        #[arg(long)]
        preview_chars: Option<usize>,
    },

    /// Model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available models
    List,

    /// Download a model
    Download {
        /// Model ID or HuggingFace repo ID
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a downloaded model
    Remove {
        /// Model ID to remove
        model: String,
    },

    /// Show model information
    Info {
        /// Model ID
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        "csv" => Ok(OutputFormat::Csv),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown, html, csv",
            format
        )),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

/// A CSV export must never land on one of the resumes being ranked.
pub fn validate_csv_path(csv_path: &Path, resumes: &[PathBuf]) -> Result<(), String> {
    if validate_file_extension(csv_path, &["pdf"]).is_ok() {
        return Err(format!("Refusing to write CSV to a PDF file: {}", csv_path.display()));
    }
    if resumes.iter().any(|resume| resume == csv_path) {
        return Err(format!("CSV path is one of the resumes: {}", csv_path.display()));
    }
    Ok(())
}
