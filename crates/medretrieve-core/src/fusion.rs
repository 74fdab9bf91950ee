//! RRF Fusion (C6): combine N ranked lists over a common id space into one.
//!
//! `score(id) = Σ 1 / (k_rrf + rank(id))` over the lists containing `id`.
//! Ties broken by `(lists_containing desc, smallest_rank asc, id asc)`
//! (§4.6, §8).

use std::collections::HashMap;

/// One ranked list, 1-indexed (`RankedList` in spec terms): `ids[0]` has rank 1.
pub type RankedList = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct FusedEntry {
    pub id: String,
    pub score: f32,
    pub lists_containing: usize,
    pub best_rank: usize,
}

/// Fuse `lists` with constant `k_rrf`, returning the top `top_k` entries.
/// A list that failed (and is simply absent from `lists`) contributes
/// nothing — fusion is robust to missing components (§4.6).
pub fn reciprocal_rank_fusion(lists: &[RankedList], k_rrf: f32, top_k: usize) -> Vec<FusedEntry> {
    let mut scores: HashMap<&str, f32> = HashMap::new();
    let mut lists_containing: HashMap<&str, usize> = HashMap::new();
    let mut best_rank: HashMap<&str, usize> = HashMap::new();

    for list in lists {
        for (idx, id) in list.iter().enumerate() {
            let rank = idx + 1;
            *scores.entry(id).or_insert(0.0) += 1.0 / (k_rrf + rank as f32);
            *lists_containing.entry(id).or_insert(0) += 1;
            best_rank
                .entry(id)
                .and_modify(|r| *r = (*r).min(rank))
                .or_insert(rank);
        }
    }

    let mut entries: Vec<FusedEntry> = scores
        .into_iter()
        .map(|(id, score)| FusedEntry {
            id: id.to_string(),
            score,
            lists_containing: lists_containing[id],
            best_rank: best_rank[id],
        })
        .collect();

    entries.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap()
            .then(b.lists_containing.cmp(&a.lists_containing))
            .then(a.best_rank.cmp(&b.best_rank))
            .then(a.id.cmp(&b.id))
    });

    entries.truncate(top_k);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[&str]) -> RankedList {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn worked_example_from_spec_matches_exactly() {
        // L1=[a,b,c], L2=[b,c,a], k=60
        // a: 1/61 + 1/63, b: 1/62 + 1/61, c: 1/63 + 1/62 -> order b, c, a
        let l1 = list(&["a", "b", "c"]);
        let l2 = list(&["b", "c", "a"]);
        let fused = reciprocal_rank_fusion(&[l1, l2], 60.0, 3);
        let order: Vec<&str> = fused.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn missing_list_contributes_nothing() {
        let l1 = list(&["x", "y"]);
        let fused = reciprocal_rank_fusion(&[l1, Vec::new()], 60.0, 2);
        assert_eq!(fused.len(), 2);
    }

    #[test]
    fn ties_break_by_list_count_then_rank_then_id() {
        // Both "m" and "n" appear once at rank 1 in disjoint lists -> equal
        // score, equal lists_containing, equal best_rank -> id order decides.
        let l1 = list(&["n"]);
        let l2 = list(&["m"]);
        let fused = reciprocal_rank_fusion(&[l1, l2], 60.0, 2);
        assert_eq!(fused[0].id, "m");
        assert_eq!(fused[1].id, "n");
    }

    #[test]
    fn top_k_truncates_output() {
        let l1 = list(&["a", "b", "c", "d"]);
        let fused = reciprocal_rank_fusion(&[l1], 60.0, 2);
        assert_eq!(fused.len(), 2);
    }
}
