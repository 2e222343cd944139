//! Report structures built from a finished ranking pass

use crate::processing::document::{DocumentFailure, DocumentPreview};
use crate::processing::pipeline::RankingResult;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Everything the formatters render for one ranking pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub metadata: ReportMetadata,

    /// Ranked resumes, best match first
    pub rankings: Vec<RankedDocument>,

    /// Resumes excluded from the ranking and why
    pub failures: Vec<DocumentFailure>,

    /// Optional preview of one selected resume
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub preview: Option<DocumentPreview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: SystemTime,
    pub ranker_version: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    /// Resumes that made it into the ranking
    pub document_count: usize,
    /// Resumes submitted, before dedupe and extraction
    pub upload_count: usize,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    /// 1-based position in the ranking
    pub rank: usize,
    pub name: String,
    pub score: f32,
}

impl RankingReport {
    pub fn from_result(result: &RankingResult) -> Self {
        let rankings = result
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| RankedDocument {
                rank: index + 1,
                name: entry.name.clone(),
                score: entry.score,
            })
            .collect();

        Self {
            metadata: ReportMetadata {
                generated_at: SystemTime::now(),
                ranker_version: env!("CARGO_PKG_VERSION").to_string(),
                embedding_model: result.model_name.clone(),
                embedding_dimension: result.dimension,
                document_count: result.entries.len(),
                upload_count: result.upload_count,
                processing_time_ms: result.processing_time_ms,
            },
            rankings,
            failures: result.failures.clone(),
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: DocumentPreview) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn best_match(&self) -> Option<&RankedDocument> {
        self.rankings.first()
    }
}
