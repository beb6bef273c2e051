// ============================================================
// Layer 5 — Embedding Similarity
// ============================================================
// Dot-product scoring shared by the embedding resolver and
// dataset construction.

/// Dot product; vectors of different length score 0.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Index and score of the candidate with the highest dot product
/// against `query`. The first candidate wins ties; `None` when there
/// are no candidates.
pub fn best_match(query: &[f32], candidates: &[Vec<f32>]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let score = dot(query, c);
        match best {
            Some((_, s)) if score <= s => {}
            _ => best = Some((i, score)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
        assert_eq!(dot(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_best_match_first_wins_ties() {
        let cands = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]];
        assert_eq!(best_match(&[1.0, 0.0], &cands), Some((1, 1.0)));
        assert_eq!(best_match(&[1.0, 0.0], &[]), None);
    }

    #[test]
    fn test_best_match_with_negative_scores() {
        let cands = vec![vec![-1.0], vec![-0.5]];
        assert_eq!(best_match(&[1.0], &cands), Some((1, -0.5)));
    }
}
