//! Cosine-similarity ranking of candidate documents against a reference vector

use crate::error::{Result, ResumeRankerError};
use crate::processing::embeddings::EmbeddingVector;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub score: f32,
}

/// Cosine similarity of two vectors of equal dimension.
///
/// A zero-magnitude vector on either side gives 0 rather than an error, so a
/// ranking always has a score for every candidate.
pub fn cosine_similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> Result<f32> {
    if a.dimension() != b.dimension() {
        return Err(ResumeRankerError::DimensionMismatch {
            expected: a.dimension(),
            found: b.dimension(),
        });
    }

    let norm_a = a.magnitude();
    let norm_b = b.magnitude();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let dot_product: f64 = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum();

    let score = dot_product / (norm_a * norm_b);
    if !score.is_finite() {
        return Ok(0.0);
    }
    Ok(score.clamp(-1.0, 1.0) as f32)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityRanker;

impl SimilarityRanker {
    pub fn new() -> Self {
        Self
    }

    /// Score every candidate against `reference` and sort by descending score.
    /// Equal scores keep their input order.
    pub fn rank(
        &self,
        reference: &EmbeddingVector,
        candidates: &IndexMap<String, EmbeddingVector>,
    ) -> Result<Vec<RankingEntry>> {
        let mut entries = candidates
            .iter()
            .map(|(name, vector)| {
                Ok(RankingEntry {
                    name: name.clone(),
                    score: cosine_similarity(reference, vector)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vector(values: &[f32]) -> EmbeddingVector {
        EmbeddingVector::new(values.to_vec())
    }

    fn candidates(items: &[(&str, &[f32])]) -> IndexMap<String, EmbeddingVector> {
        items
            .iter()
            .map(|(name, values)| (name.to_string(), vector(values)))
            .collect()
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let a = vector(&[0.2, -0.4, 0.9]);
        let score = cosine_similarity(&a, &a).unwrap();
        assert!((score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        let a = vector(&[1.0, 0.0]);
        assert!(cosine_similarity(&a, &vector(&[0.0, 2.0])).unwrap().abs() < 1e-6);
        assert!((cosine_similarity(&a, &vector(&[-3.0, 0.0])).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let a = vector(&[1.0, 2.0, 3.0]);
        let zero = EmbeddingVector::zeros(3);
        assert_eq!(cosine_similarity(&a, &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &a).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = cosine_similarity(&vector(&[1.0, 2.0]), &vector(&[1.0, 2.0, 3.0]));
        assert!(matches!(
            result,
            Err(ResumeRankerError::DimensionMismatch { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn test_rank_orders_descending() {
        let reference = vector(&[1.0, 0.0]);
        let ranked = SimilarityRanker::new()
            .rank(
                &reference,
                &candidates(&[
                    ("far.pdf", &[0.0, 1.0]),
                    ("exact.pdf", &[2.0, 0.0]),
                    ("close.pdf", &[1.0, 0.5]),
                ]),
            )
            .unwrap();

        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["exact.pdf", "close.pdf", "far.pdf"]);
        assert!((ranked[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let reference = vector(&[1.0, 1.0]);
        let ranked = SimilarityRanker::new()
            .rank(
                &reference,
                &candidates(&[
                    ("b.pdf", &[1.0, 1.0]),
                    ("zero.pdf", &[0.0, 0.0]),
                    ("a.pdf", &[1.0, 1.0]),
                    ("empty.pdf", &[0.0, 0.0]),
                ]),
            )
            .unwrap();

        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf", "zero.pdf", "empty.pdf"]);
    }

    #[test]
    fn test_rank_fails_on_mismatched_candidate() {
        let reference = vector(&[1.0, 0.0]);
        let result = SimilarityRanker::new().rank(
            &reference,
            &candidates(&[("ok.pdf", &[1.0, 0.0]), ("bad.pdf", &[1.0, 0.0, 0.0])]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rank_empty_candidates() {
        let ranked = SimilarityRanker::new()
            .rank(&vector(&[1.0]), &IndexMap::new())
            .unwrap();
        assert!(ranked.is_empty());
    }

    fn sorted_by_score_then_index(
        reference: &EmbeddingVector,
        candidates: &IndexMap<String, EmbeddingVector>,
    ) -> Vec<RankingEntry> {
        let mut scored: Vec<(usize, RankingEntry)> = candidates
            .iter()
            .enumerate()
            .map(|(index, (name, v))| {
                (
                    index,
                    RankingEntry {
                        name: name.clone(),
                        score: cosine_similarity(reference, v).unwrap(),
                    },
                )
            })
            .collect();
        scored.sort_by(|(ia, a), (ib, b)| b.score.total_cmp(&a.score).then(ia.cmp(ib)));
        scored.into_iter().map(|(_, entry)| entry).collect()
    }

    proptest! {
        #[test]
        fn rank_matches_score_then_input_order(
            reference in prop::collection::vec(-1.0f32..1.0, 4),
            rows in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 0..12),
            seed in any::<u64>(),
        ) {
            let reference = EmbeddingVector::new(reference);
            let original: IndexMap<String, EmbeddingVector> = rows
                .into_iter()
                .enumerate()
                .map(|(i, values)| (format!("doc-{i}.pdf"), EmbeddingVector::new(values)))
                .collect();

            // Deterministic permutation of the candidate order
            let mut permuted = original.clone();
            let len = permuted.len();
            if len > 1 {
                let mut state = seed;
                for i in (1..len).rev() {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    let j = (state >> 33) as usize % (i + 1);
                    permuted.swap_indices(i, j);
                }
            }

            let ranker = SimilarityRanker::new();
            for input in [&original, &permuted] {
                let ranked = ranker.rank(&reference, input).unwrap();
                prop_assert_eq!(ranked, sorted_by_score_then_index(&reference, input));
            }

            // Same (name, score) pairs regardless of input order
            let mut a = ranker.rank(&reference, &original).unwrap();
            let mut b = ranker.rank(&reference, &permuted).unwrap();
            a.sort_by(|x, y| x.name.cmp(&y.name));
            b.sort_by(|x, y| x.name.cmp(&y.name));
            prop_assert_eq!(a, b);
        }

        #[test]
        fn reference_equal_to_candidate_ranks_first(
            reference in prop::collection::vec(0.1f32..1.0, 8),
            others in prop::collection::vec(prop::collection::vec(-1.0f32..0.0, 8), 0..6),
        ) {
            let reference = EmbeddingVector::new(reference);
            let mut input: IndexMap<String, EmbeddingVector> = others
                .into_iter()
                .enumerate()
                .map(|(i, values)| (format!("other-{i}.pdf"), EmbeddingVector::new(values)))
                .collect();
            input.insert("match.pdf".to_string(), reference.clone());

            let ranked = SimilarityRanker::new().rank(&reference, &input).unwrap();
            prop_assert_eq!(ranked[0].name.as_str(), "match.pdf");
            prop_assert!((ranked[0].score - 1.0).abs() < 1e-5);
        }
    }
}
