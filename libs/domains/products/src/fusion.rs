//! Reciprocal Rank Fusion of keyword and vector rankings.

use std::collections::HashMap;
use std::hash::Hash;

/// RRF smoothing constant
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Fuse ranked lists of keys, best first.
///
/// Each key scores `Σ 1 / (k + rank)` over the lists it appears in, with
/// 1-based ranks. Ties keep the order in which keys were first seen.
pub fn reciprocal_rank_fusion<K>(ranked_lists: &[Vec<K>], k: f32) -> Vec<(K, f32)>
where
    K: Eq + Hash + Clone,
{
    let mut scores: HashMap<K, (usize, f32)> = HashMap::new();
    let mut first_seen = 0usize;

    for list in ranked_lists {
        for (index, key) in list.iter().enumerate() {
            let contribution = 1.0 / (k + (index + 1) as f32);
            scores
                .entry(key.clone())
                .and_modify(|(_, score)| *score += contribution)
                .or_insert_with(|| {
                    first_seen += 1;
                    (first_seen, contribution)
                });
        }
    }

    let mut fused: Vec<(K, usize, f32)> = scores
        .into_iter()
        .map(|(key, (order, score))| (key, order, score))
        .collect();
    fused.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.1.cmp(&b.1)));

    fused.into_iter().map(|(key, _, score)| (key, score)).collect()
}

/// Cosine similarity; 0 for empty, zero-norm or mismatched vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
