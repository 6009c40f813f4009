//! Packed storage of symmetric element matrices
//!
//! Only the upper triangle (diagonal included) of an `n x n` symmetric
//! matrix is stored, in a flat array of `n(n+1)/2` values. Entries are
//! enumerated column by column and, within a column, by increasing row:
//!
//! ```text
//! index(row, col) = col*(col+1)/2 + row      (row <= col)
//!
//!        col:  0  1  2  3
//!   row 0:   [ 0  1  3  6 ]
//!   row 1:   [    2  4  7 ]
//!   row 2:   [       5  8 ]
//!   row 3:   [          9 ]
//! ```
//!
//! The diagonal entry of column `c` is therefore the last one of that
//! column, at `c*(c+1)/2 + c`. This is the only linearization used by
//! the elements and by the assembler.

use nalgebra::DMatrix;

/// Returns the number of packed values for an `n x n` symmetric matrix
pub fn packed_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Returns the packed index of `(row, col)`; the pair is swapped when `row > col`
pub fn packed_index(row: usize, col: usize) -> usize {
    let (r, c) = if row <= col { (row, col) } else { (col, row) };
    c * (c + 1) / 2 + r
}

/// A symmetric matrix stored as its packed upper triangle
#[derive(Clone, Debug, PartialEq)]
pub struct PackedSymmetric {
    n: usize,
    data: Vec<f64>,
}

impl PackedSymmetric {
    /// Allocates a zeroed `n x n` packed matrix
    pub fn new(n: usize) -> Self {
        PackedSymmetric {
            n,
            data: vec![0.0; packed_len(n)],
        }
    }

    /// Wraps an existing packed array
    ///
    /// # Returns
    /// `None` if `data.len()` is not a triangular number `n(n+1)/2`
    pub fn from_packed(data: Vec<f64>) -> Option<Self> {
        let mut n = 0;
        while packed_len(n) < data.len() {
            n += 1;
        }
        if packed_len(n) != data.len() {
            return None;
        }
        Some(PackedSymmetric { n, data })
    }

    /// Packs the upper triangle of a square matrix; the lower triangle is ignored
    ///
    /// # Returns
    /// `None` if the matrix is not square
    pub fn from_dense(dense: &DMatrix<f64>) -> Option<Self> {
        if dense.nrows() != dense.ncols() {
            return None;
        }
        let mut packed = PackedSymmetric::new(dense.nrows());
        for col in 0..packed.n {
            for row in 0..=col {
                packed.data[packed_index(row, col)] = dense[(row, col)];
            }
        }
        Some(packed)
    }

    /// Unpacks into a full dense symmetric matrix
    pub fn to_dense(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n, self.n, |i, j| self.get(i, j))
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// Returns the `(i, j)` entry; `get(i, j) == get(j, i)`
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[packed_index(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[packed_index(i, j)] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_index_follows_column_order() {
        let mut expected = 0;
        for col in 0..6 {
            for row in 0..=col {
                assert_eq!(packed_index(row, col), expected);
                assert_eq!(packed_index(col, row), expected);
                expected += 1;
            }
        }
        assert_eq!(expected, packed_len(6));
        assert_eq!(packed_index(3, 3), 9);
        assert_eq!(packed_index(0, 5), 15);
        assert_eq!(packed_index(5, 5), 20);
    }

    #[test]
    fn dense_matrix_is_reconstructed_from_packed_form() {
        // a known symmetric matrix with distinct entries
        let dense = DMatrix::from_fn(4, 4, |i, j| {
            let (r, c) = if i <= j { (i, j) } else { (j, i) };
            (10 * (r + 1) + c + 1) as f64
        });
        let packed = PackedSymmetric::from_dense(&dense).unwrap();
        assert_eq!(
            packed.as_slice(),
            &[11.0, 12.0, 22.0, 13.0, 23.0, 33.0, 14.0, 24.0, 34.0, 44.0]
        );
        assert_eq!(packed.to_dense(), dense);
    }

    #[test]
    fn from_dense_rejects_non_square() {
        assert_eq!(PackedSymmetric::from_dense(&DMatrix::zeros(2, 3)), None);
        assert_eq!(PackedSymmetric::from_dense(&DMatrix::zeros(0, 0)).unwrap().dim(), 0);
    }

    #[test]
    fn from_packed_works() {
        let packed = PackedSymmetric::from_packed(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(packed.dim(), 2);
        assert_eq!(packed.get(1, 0), 2.0);
        assert!(PackedSymmetric::from_packed(vec![1.0, 2.0]).is_none());
        assert_eq!(PackedSymmetric::from_packed(Vec::new()).unwrap().dim(), 0);
    }

    #[test]
    fn set_is_symmetric() {
        let mut packed = PackedSymmetric::new(3);
        packed.set(2, 0, 7.5);
        assert_eq!(packed.get(0, 2), 7.5);
        assert_eq!(packed.as_slice()[3], 7.5);
    }
}
