//! Flat exact inner-product index.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{MemoryError, Result};

/// Dense row-major matrix of vectors searched by brute-force inner product.
///
/// Row order is insertion order. Equal scores rank lower rows first.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    rows: Array2<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            rows: Array2::zeros((0, dimension)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.rows.ncols()
    }

    pub fn row_count(&self) -> usize {
        self.rows.nrows()
    }

    /// Check that every vector matches the index width.
    pub fn check_rows(&self, vectors: &[Vec<f32>]) -> Result<()> {
        match vectors.iter().find(|v| v.len() != self.dimension()) {
            Some(bad) => Err(MemoryError::DimensionMismatch {
                expected: self.dimension(),
                actual: bad.len(),
            }),
            None => Ok(()),
        }
    }

    /// Append rows. Either all rows are added or none.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        self.check_rows(vectors)?;
        for vector in vectors {
            self.rows
                .push_row(ArrayView1::from(vector.as_slice()))
                .map_err(|_| MemoryError::DimensionMismatch {
                    expected: self.dimension(),
                    actual: vector.len(),
                })?;
        }
        Ok(())
    }

    /// The `min(k, row_count)` rows with highest inner product against
    /// `query`, best first, as `(row, score)`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension() {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        if k == 0 || self.row_count() == 0 {
            return Ok(Vec::new());
        }

        let query = Array1::from(query.to_vec());
        let scores = self.rows.dot(&query);
        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        Ok(ranked)
    }
}
