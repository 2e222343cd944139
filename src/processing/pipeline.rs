//! One ranking pass: normalize, embed, score, sort

use crate::error::{Result, ResumeRankerError};
use crate::input::text_extractor::TextExtractor;
use crate::processing::document::{dedupe_uploads, Document, DocumentFailure, DocumentPreview};
use crate::processing::embeddings::{Embedder, EmbeddingVector};
use crate::processing::normalizer::TextNormalizer;
use crate::processing::ranker::{RankingEntry, SimilarityRanker};
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::time::Instant;

pub use crate::processing::document::Upload;

/// Everything one ranking pass needs. Owned by the caller, dropped afterwards.
#[derive(Debug, Clone, Default)]
pub struct RankingRequest {
    pub job_description: String,
    pub uploads: Vec<Upload>,
}

impl RankingRequest {
    pub fn new(job_description: impl Into<String>, uploads: Vec<Upload>) -> Self {
        Self {
            job_description: job_description.into(),
            uploads,
        }
    }

    /// Both a job description and at least one upload are required.
    pub fn validate(&self) -> Result<()> {
        if self.job_description.trim().is_empty() {
            return Err(ResumeRankerError::MissingInput(
                "a job description is required before ranking".to_string(),
            ));
        }
        if self.uploads.is_empty() {
            return Err(ResumeRankerError::MissingInput(
                "upload at least one resume before ranking".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one ranking pass.
#[derive(Debug, Clone)]
pub struct RankingResult {
    pub entries: Vec<RankingEntry>,
    pub documents: IndexMap<String, Document>,
    pub failures: Vec<DocumentFailure>,
    pub upload_count: usize,
    pub model_name: String,
    pub dimension: usize,
    pub processing_time_ms: u64,
}

impl RankingResult {
    /// Find a ranked document by exact name, or by its 1-based rank.
    pub fn select(&self, selector: &str) -> Result<&Document> {
        if let Some(document) = self.documents.get(selector) {
            return Ok(document);
        }

        selector
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|rank| rank.checked_sub(1))
            .and_then(|index| self.entries.get(index))
            .and_then(|entry| self.documents.get(&entry.name))
            .ok_or_else(|| ResumeRankerError::DocumentNotFound(selector.to_string()))
    }

    pub fn score_of(&self, name: &str) -> Option<f32> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.score)
    }

    pub fn preview(&self, selector: &str, max_chars: usize) -> Result<DocumentPreview> {
        let document = self.select(selector)?;
        Ok(document.preview(max_chars, self.score_of(&document.name)))
    }
}

/// Runs ranking passes with a request-scoped embedder and text extractor.
pub struct RankingPipeline<'a> {
    embedder: &'a dyn Embedder,
    extractor: &'a dyn TextExtractor,
    normalizer: TextNormalizer,
    ranker: SimilarityRanker,
    show_progress: bool,
}

impl<'a> RankingPipeline<'a> {
    pub fn new(embedder: &'a dyn Embedder, extractor: &'a dyn TextExtractor) -> Self {
        Self {
            embedder,
            extractor,
            normalizer: TextNormalizer::new(),
            ranker: SimilarityRanker::new(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn run(&self, request: RankingRequest) -> Result<RankingResult> {
        request.validate()?;
        let start_time = Instant::now();
        let upload_count = request.uploads.len();

        let (documents, failures) = self.extract_documents(request.uploads);

        let job_text = self.normalizer.normalize(&request.job_description);
        let mut texts = Vec::with_capacity(documents.len() + 1);
        texts.push(job_text);
        texts.extend(documents.values().map(|d| d.normalized_text.clone()));

        info!(
            "Embedding job description and {} resumes with {}",
            documents.len(),
            self.embedder.model_name()
        );
        let mut vectors = self.embedder.embed(&texts)?.into_iter();
        if vectors.len() != texts.len() {
            return Err(ResumeRankerError::Embedding(format!(
                "Embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        let reference = vectors.next().unwrap_or_else(|| EmbeddingVector::zeros(0));
        let dimension = reference.dimension();
        let candidates: IndexMap<String, EmbeddingVector> =
            documents.keys().cloned().zip(vectors).collect();

        let entries = self.ranker.rank(&reference, &candidates)?;
        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        debug!("Ranking pass finished in {}ms", processing_time_ms);

        Ok(RankingResult {
            entries,
            documents,
            failures,
            upload_count,
            model_name: self.embedder.model_name().to_string(),
            dimension,
            processing_time_ms,
        })
    }

    /// Extract and normalize each unique upload. A document that fails is
    /// reported and left out; the rest of the batch continues.
    fn extract_documents(
        &self,
        uploads: Vec<Upload>,
    ) -> (IndexMap<String, Document>, Vec<DocumentFailure>) {
        let unique = dedupe_uploads(uploads);
        let progress = self.progress_bar(unique.len());

        let mut documents = IndexMap::with_capacity(unique.len());
        let mut failures = Vec::new();

        for (name, bytes) in unique {
            progress.set_message(name.clone());
            match self.extractor.extract(&bytes) {
                Ok(extracted_text) => {
                    let normalized_text = self.normalizer.normalize(&extracted_text);
                    if normalized_text.is_empty() {
                        warn!("No usable text in {}; it will score 0", name);
                    }
                    documents.insert(
                        name.clone(),
                        Document {
                            name,
                            bytes,
                            extracted_text,
                            normalized_text,
                        },
                    );
                }
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    failures.push(DocumentFailure {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        (documents, failures)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} resumes {msg}")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::embeddings::HashingEmbedder;

    /// Treats upload bytes as UTF-8 text; bytes starting with "corrupt" fail.
    struct FakeExtractor;

    impl TextExtractor for FakeExtractor {
        fn extract(&self, bytes: &[u8]) -> Result<String> {
            if bytes.starts_with(b"corrupt") {
                return Err(ResumeRankerError::PdfExtraction("broken xref table".to_string()));
            }
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }

    /// Returns fixed vectors keyed by normalized text.
    struct FixedEmbedder {
        vectors: Vec<(&'static str, Vec<f32>)>,
    }

    impl Embedder for FixedEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
            Ok(texts
                .iter()
                .map(|text| {
                    self.vectors
                        .iter()
                        .find(|(key, _)| key == text)
                        .map(|(_, v)| EmbeddingVector::new(v.clone()))
                        .unwrap_or_else(|| EmbeddingVector::zeros(2))
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> Option<usize> {
            Some(2)
        }
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn embed(&self, _texts: &[String]) -> Result<Vec<EmbeddingVector>> {
            Ok(vec![EmbeddingVector::new(vec![1.0])])
        }

        fn model_name(&self) -> &str {
            "short"
        }

        fn dimension(&self) -> Option<usize> {
            Some(1)
        }
    }

    fn hashing() -> HashingEmbedder {
        HashingEmbedder::new(384).unwrap()
    }

    #[test]
    fn test_aligned_resume_ranks_above_recipe() {
        let embedder = hashing();
        let pipeline = RankingPipeline::new(&embedder, &FakeExtractor);
        let request = RankingRequest::new(
            "senior backend engineer with distributed systems experience",
            vec![
                Upload::new(
                    "recipe.pdf",
                    "Chocolate cake: whisk flour, sugar, eggs and butter; bake 35 minutes.",
                ),
                Upload::new(
                    "backend.pdf",
                    "Senior Backend Engineer. 8 years of experience building distributed \
                     systems in Rust and Go.",
                ),
            ],
        );

        let result = pipeline.run(request).unwrap();
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].name, "backend.pdf");
        assert!(result.entries[0].score > result.entries[1].score);
        assert_eq!(result.dimension, 384);
        assert_eq!(result.model_name, "hashing");
    }

    #[test]
    fn test_empty_job_description_is_blocked() {
        let embedder = hashing();
        let pipeline = RankingPipeline::new(&embedder, &FakeExtractor);
        let request = RankingRequest::new("   \n", vec![Upload::new("a.pdf", "rust")]);

        assert!(matches!(pipeline.run(request), Err(ResumeRankerError::MissingInput(_))));
    }

    #[test]
    fn test_no_uploads_is_blocked() {
        let embedder = hashing();
        let pipeline = RankingPipeline::new(&embedder, &FakeExtractor);

        let result = pipeline.run(RankingRequest::new("backend engineer", Vec::new()));
        assert!(matches!(result, Err(ResumeRankerError::MissingInput(_))));
    }

    #[test]
    fn test_duplicate_names_collapse_to_later_upload() {
        let embedder = hashing();
        let pipeline = RankingPipeline::new(&embedder, &FakeExtractor);
        let request = RankingRequest::new(
            "rust engineer",
            vec![
                Upload::new("cv.pdf", "pastry chef"),
                Upload::new("other.pdf", "gardener"),
                Upload::new("cv.pdf", "rust engineer"),
            ],
        );

        let result = pipeline.run(request).unwrap();
        assert_eq!(result.upload_count, 3);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.documents["cv.pdf"].extracted_text, "rust engineer");
        assert_eq!(result.entries[0].name, "cv.pdf");
        assert!((result.entries[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_corrupt_document_is_isolated() {
        let embedder = hashing();
        let pipeline = RankingPipeline::new(&embedder, &FakeExtractor);
        let request = RankingRequest::new(
            "data engineer",
            vec![
                Upload::new("good.pdf", "data engineer with spark"),
                Upload::new("broken.pdf", "corrupt bytes"),
            ],
        );

        let result = pipeline.run(request).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].name, "good.pdf");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].name, "broken.pdf");
        assert!(result.failures[0].reason.contains("broken xref table"));
        assert!(result.select("broken.pdf").is_err());
    }

    #[test]
    fn test_all_documents_failing_gives_empty_ranking() {
        let embedder = hashing();
        let pipeline = RankingPipeline::new(&embedder, &FakeExtractor);
        let request = RankingRequest::new("data engineer", vec![Upload::new("x.pdf", "corrupt")]);

        let result = pipeline.run(request).unwrap();
        assert!(result.entries.is_empty());
        assert_eq!(result.failures.len(), 1);
    }

    #[test]
    fn test_job_description_is_normalized_before_embedding() {
        let embedder = FixedEmbedder {
            vectors: vec![
                ("backend engineer", vec![1.0, 0.0]),
                ("backend dev", vec![0.8, 0.6]),
                ("chef", vec![0.0, 1.0]),
            ],
        };
        let pipeline = RankingPipeline::new(&embedder, &FakeExtractor);
        let request = RankingRequest::new(
            "BACKEND Engineer (2024)!",
            vec![
                Upload::new("chef.pdf", "Chef"),
                Upload::new("dev.pdf", "Backend dev"),
                Upload::new("blank.pdf", "1234"),
            ],
        );

        let result = pipeline.run(request).unwrap();
        let names: Vec<&str> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["dev.pdf", "chef.pdf", "blank.pdf"]);
        assert!((result.entries[0].score - 0.8).abs() < 1e-6);
        assert_eq!(result.entries[2].score, 0.0);
    }

    #[test]
    fn test_embedder_returning_too_few_vectors() {
        let pipeline = RankingPipeline::new(&ShortEmbedder, &FakeExtractor);
        let request = RankingRequest::new("rust", vec![Upload::new("a.pdf", "rust")]);

        assert!(matches!(pipeline.run(request), Err(ResumeRankerError::Embedding(_))));
    }

    #[test]
    fn test_select_and_preview() {
        let embedder = hashing();
        let pipeline = RankingPipeline::new(&embedder, &FakeExtractor);
        let request = RankingRequest::new(
            "platform engineer kubernetes",
            vec![
                Upload::new("ops.pdf", "Platform engineer running Kubernetes clusters"),
                Upload::new("art.pdf", "Watercolour painter"),
            ],
        );
        let result = pipeline.run(request).unwrap();

        assert_eq!(result.select("1").unwrap().name, "ops.pdf");
        assert_eq!(result.select("art.pdf").unwrap().name, "art.pdf");
        assert!(result.select("0").is_err());
        assert!(result.select("3").is_err());
        assert!(matches!(result.select("nobody.pdf"), Err(ResumeRankerError::DocumentNotFound(_))));

        let preview = result.preview("ops.pdf", 17).unwrap();
        assert_eq!(preview.text_prefix, "Platform engineer");
        assert!(preview.truncated);
        assert_eq!(preview.score, result.score_of("ops.pdf"));
    }
}
