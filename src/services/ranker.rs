use std::cmp::Ordering;

use crate::catalog::SimilarityMatrix;

/// Every catalog index paired with its similarity to `index`, most similar first
///
/// Equal scores keep ascending index order so the ranking is reproducible.
/// The queried index itself is part of the output; callers drop it.
pub fn rank(index: usize, matrix: &SimilarityMatrix) -> Vec<(usize, f32)> {
    let Some(row) = matrix.row(index) else {
        return Vec::new();
    };

    let mut ranked: Vec<(usize, f32)> = row.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| by_score_desc(a, b).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Numeric comparison, so `-0.0` and `0.0` tie. Scores are never NaN.
fn by_score_desc(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)
}

/// Up to `limit` nearest neighbours of `index`, excluding `index` itself
pub fn top_neighbours(index: usize, matrix: &SimilarityMatrix, limit: usize) -> Vec<(usize, f32)> {
    rank(index, matrix)
        .into_iter()
        .filter(|(other, _)| *other != index)
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;

    #[test]
    fn test_rank_row_a() {
        let catalog = sample_catalog();
        let ranked = rank(0, catalog.similarity());
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 3, 5, 2, 4]);
        assert_eq!(ranked[1], (1, 0.9));
    }

    #[test]
    fn test_rank_is_sorted_permutation() {
        let catalog = sample_catalog();
        for index in 0..catalog.len() {
            let ranked = rank(index, catalog.similarity());
            assert_eq!(ranked.len(), catalog.len());

            let mut seen: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..catalog.len()).collect::<Vec<_>>());

            for pair in ranked.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert!(a.1 > b.1 || (a.1 == b.1 && a.0 < b.0));
            }
        }
    }

    #[test]
    fn test_rank_ties_ascending_index() {
        let matrix = SimilarityMatrix::new(vec![
            vec![1.0, 0.5, 0.5, 0.5],
            vec![0.5, 1.0, 0.5, 0.5],
            vec![0.5, 0.5, 1.0, 0.5],
            vec![0.5, 0.5, 0.5, 1.0],
        ])
        .unwrap();
        let order: Vec<usize> = rank(3, &matrix).iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![3, 0, 1, 2]);
    }

    #[test]
    fn test_rank_signed_zeros_tie() {
        let matrix = SimilarityMatrix::new(vec![
            vec![1.0, -0.0, 0.0],
            vec![-0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let order: Vec<usize> = rank(0, &matrix).iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(top_neighbours(0, &matrix, 5).len(), 2);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let catalog = sample_catalog();
        assert_eq!(rank(2, catalog.similarity()), rank(2, catalog.similarity()));
    }

    #[test]
    fn test_rank_out_of_range() {
        let catalog = sample_catalog();
        assert!(rank(99, catalog.similarity()).is_empty());
    }

    #[test]
    fn test_top_neighbours_drops_self() {
        let catalog = sample_catalog();
        let order: Vec<usize> = top_neighbours(0, catalog.similarity(), 5)
            .iter()
            .map(|(i, _)| *i)
            .collect();
        assert_eq!(order, vec![1, 3, 5, 2, 4]);
    }

    #[test]
    fn test_top_neighbours_drops_self_on_tie() {
        // Index 0 ties with the queried movie's self-similarity
        let matrix = SimilarityMatrix::new(vec![vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        assert_eq!(top_neighbours(1, &matrix, 5), vec![(0, 1.0)]);
    }

    #[test]
    fn test_top_neighbours_tiny_catalog() {
        let matrix = SimilarityMatrix::new(vec![
            vec![1.0, 0.2, 0.7],
            vec![0.2, 1.0, 0.4],
            vec![0.7, 0.4, 1.0],
        ])
        .unwrap();
        assert_eq!(top_neighbours(0, &matrix, 5), vec![(2, 0.7), (1, 0.2)]);
    }

    #[test]
    fn test_top_neighbours_single_movie() {
        let matrix = SimilarityMatrix::new(vec![vec![1.0]]).unwrap();
        assert!(top_neighbours(0, &matrix, 5).is_empty());
    }
}
