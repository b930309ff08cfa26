//! Reciprocal Rank Fusion (spec §4.9 step 3, §9): combine a lexical and a
//! vector ranked list into one deterministic ordering.

use std::collections::HashMap;

use qpg_model::ObjectId;

/// Pinned per spec §9; never configurable, so fused rankings are stable
/// across releases.
pub const RRF_K: f64 = 60.0;

/// `+ε` bonus applied when an object is rank 1 in either input list
/// (spec §4.9 step 3).
pub const TOP_RANK_BONUS: f64 = 1.0 / RRF_K;

#[derive(Debug, Clone, PartialEq)]
pub struct FusedHit {
    pub object_id: ObjectId,
    pub score: f64,
}

/// Fuse two rank-ordered candidate lists (best first) via RRF. Ties are
/// broken by `object_id` lexicographic order so output is deterministic
/// for a fixed index snapshot and query (spec §4.9, §5).
pub fn reciprocal_rank_fusion(lexical: &[ObjectId], vector: &[ObjectId]) -> Vec<FusedHit> {
    let lexical_ranks = rank_index(lexical);
    let vector_ranks = rank_index(vector);

    let mut all_ids: Vec<ObjectId> = lexical.iter().chain(vector.iter()).copied().collect();
    all_ids.sort();
    all_ids.dedup();

    let mut scores: HashMap<ObjectId, f64> = HashMap::new();
    for id in &all_ids {
        let mut score = 0.0;
        let mut is_top_rank = false;

        if let Some(&r) = lexical_ranks.get(id) {
            score += 1.0 / (RRF_K + r as f64);
            is_top_rank |= r == 1;
        }
        if let Some(&r) = vector_ranks.get(id) {
            score += 1.0 / (RRF_K + r as f64);
            is_top_rank |= r == 1;
        }
        if is_top_rank {
            score += TOP_RANK_BONUS;
        }
        scores.insert(*id, score);
    }

    let mut fused: Vec<FusedHit> = all_ids
        .into_iter()
        .map(|id| FusedHit {
            object_id: id,
            score: scores[&id],
        })
        .collect();

    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.object_id.cmp(&b.object_id))
    });
    fused
}

/// 1-indexed rank of each id in an already rank-ordered list.
fn rank_index(ids: &[ObjectId]) -> HashMap<ObjectId, usize> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (*id, i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpg_model::ObjectKind;

    fn id(name: &str) -> ObjectId {
        ObjectId::derive("work", ObjectKind::Table, name)
    }

    #[test]
    fn top_rank_in_both_lists_gets_highest_score() {
        let a = id("public.orders");
        let b = id("public.refunds");
        let c = id("public.customers");

        let lexical = vec![a, b, c];
        let vector = vec![a, c, b];

        let fused = reciprocal_rank_fusion(&lexical, &vector);
        assert_eq!(fused[0].object_id, a);
    }

    #[test]
    fn ties_break_by_object_id_lex_order() {
        let a = id("public.aaa");
        let b = id("public.zzz");
        // Both present in the same rank positions in both lists, so
        // their scores are identical; the tie is broken by id.
        let lexical = vec![a, b];
        let vector = vec![a, b];
        let fused = reciprocal_rank_fusion(&lexical, &vector);
        let ordered_scores: Vec<f64> = fused.iter().map(|h| h.score).collect();
        assert_eq!(ordered_scores[0], ordered_scores[1]);
        assert!(fused[0].object_id < fused[1].object_id);
    }

    #[test]
    fn absent_from_one_list_still_contributes() {
        let a = id("public.only_lexical");
        let b = id("public.only_vector");
        let fused = reciprocal_rank_fusion(&[a], &[b]);
        assert_eq!(fused.len(), 2);
    }
}
