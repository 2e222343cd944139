//! Text normalization, embedding, and similarity ranking

pub mod bert;
pub mod document;
pub mod embedding_manager;
pub mod embeddings;
pub mod normalizer;
pub mod pipeline;
pub mod ranker;
