//! Error handling for the resume ranker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeRankerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Text processing error: {0}")]
    TextProcessing(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Embedding dimensions don't match: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Document not found in ranking: {0}")]
    DocumentNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ResumeRankerError>;

impl From<candle_core::Error> for ResumeRankerError {
    fn from(err: candle_core::Error) -> Self {
        ResumeRankerError::Embedding(err.to_string())
    }
}
