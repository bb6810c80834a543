//! In-memory exact nearest-neighbor index over fixed-dimension vectors.
//!
//! The index is a flat collection scanned linearly on every query: distances
//! are computed against all stored vectors and the k smallest returned.
//! Exact by design — appropriate for corpora in the low tens of thousands of
//! vectors. Nothing in the public contract assumes the flat layout, so an
//! approximate backend can replace it without touching callers.

use docqa_core::{AppError, AppResult};

/// Exact k-nearest-neighbor index using squared Euclidean distance.
///
/// The vector dimension is fixed by the first insertion; every later vector
/// must match it. Vectors are not normalized — callers wanting cosine
/// ranking must normalize before insertion and query.
#[derive(Debug, Default)]
pub struct VectorIndex {
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Create an empty index; the dimension is established by the first
    /// insertion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors.
    pub fn count(&self) -> usize {
        self.vectors.len()
    }

    /// Dimension of the stored vectors, once established.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Borrow the vector at `index`, if present.
    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        self.vectors.get(index).map(Vec::as_slice)
    }

    /// Append vectors to the index.
    ///
    /// All vectors must share the index dimension (established here for a
    /// fresh index). On `DimensionMismatch` nothing is appended: the prior
    /// contents are left unchanged.
    pub fn insert(&mut self, vectors: Vec<Vec<f32>>) -> AppResult<()> {
        let Some(first) = vectors.first() else {
            return Ok(());
        };

        let expected = self.dimension.unwrap_or(first.len());
        if expected == 0 {
            return Err(AppError::InvalidConfig(
                "cannot index zero-dimension vectors".to_string(),
            ));
        }

        // Validate the whole batch before touching the stored vectors
        for vector in &vectors {
            if vector.len() != expected {
                return Err(AppError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        self.dimension = Some(expected);
        self.vectors.extend(vectors);
        Ok(())
    }

    /// Find the `k` stored vectors nearest to `query`.
    ///
    /// Returns `(index, distance)` pairs ordered ascending by squared
    /// Euclidean distance, ties broken by insertion order (lower index
    /// first). Returns fewer than `k` results when the index holds fewer
    /// vectors, and an empty sequence for an empty index.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let expected = self.dimension.unwrap_or(0);
        if query.len() != expected {
            return Err(AppError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let mut results: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, squared_l2(query, vector)))
            .collect();

        results.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        results.truncate(k);

        tracing::debug!(
            "Scanned {} vectors, returning {} neighbors",
            self.vectors.len(),
            results.len()
        );

        Ok(results)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_establishes_dimension() {
        let mut index = VectorIndex::new();
        assert_eq!(index.dimension(), None);

        index.insert(vec![vec![1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(index.dimension(), Some(3));
        assert_eq!(index.count(), 1);
    }

    #[test]
    fn test_insert_mismatch_leaves_index_unchanged() {
        let mut index = VectorIndex::new();
        index.insert(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let result = index.insert(vec![vec![2.0, 2.0], vec![1.0, 2.0, 3.0]]);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));

        // The valid vector of the failed batch must not have been appended
        assert_eq!(index.count(), 2);
        assert_eq!(index.vector(1), Some([0.0, 1.0].as_slice()));
    }

    #[test]
    fn test_insert_mixed_first_batch_rejected() {
        let mut index = VectorIndex::new();
        let result = index.insert(vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]);
        assert!(result.is_err());
        assert_eq!(index.count(), 0);
        assert_eq!(index.dimension(), None);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let mut index = VectorIndex::new();
        index
            .insert(vec![
                vec![10.0, 0.0],
                vec![1.0, 0.0],
                vec![3.0, 0.0],
                vec![0.5, 0.0],
            ])
            .unwrap();

        let results = index.search(&[0.0, 0.0], 4).unwrap();
        let order: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![3, 1, 2, 0]);

        for pair in results.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn test_search_distance_is_squared_l2() {
        let mut index = VectorIndex::new();
        index.insert(vec![vec![3.0, 4.0]]).unwrap();

        let results = index.search(&[0.0, 0.0], 1).unwrap();
        assert_eq!(results[0].1, 25.0);
    }

    #[test]
    fn test_search_ties_broken_by_insertion_order() {
        let mut index = VectorIndex::new();
        index
            .insert(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![-1.0, 0.0]])
            .unwrap();

        // All three are at distance 1 from the origin
        let results = index.search(&[0.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_search_k_larger_than_count() {
        let mut index = VectorIndex::new();
        index.insert(vec![vec![1.0], vec![2.0]]).unwrap();

        let results = index.search(&[0.0], 4).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::new();
        assert!(index.search(&[1.0, 2.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_search_query_dimension_checked() {
        let mut index = VectorIndex::new();
        index.insert(vec![vec![1.0, 2.0]]).unwrap();

        assert!(matches!(
            index.search(&[1.0, 2.0, 3.0], 1),
            Err(AppError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }
}
