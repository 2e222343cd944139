//! Resume ranker library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod output;

pub use error::{Result, ResumeRankerError};
pub use config::Config;
pub use processing::embeddings::{Embedder, EmbeddingVector, HashingEmbedder};
pub use processing::normalizer::TextNormalizer;
pub use processing::pipeline::{RankingPipeline, RankingRequest, RankingResult, Upload};
pub use processing::ranker::{cosine_similarity, RankingEntry, SimilarityRanker};
