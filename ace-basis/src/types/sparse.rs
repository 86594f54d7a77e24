use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1, ArrayViewMut1};
use num_complex::Complex64;

/// Accumulate `(row, column, value)` triplets before creating a
/// [`SparseMatrix`]. Values added multiple times to the same `(row, column)`
/// entry are summed together.
#[derive(Debug, Clone, Default)]
pub struct TripletAccumulator {
    entries: BTreeMap<(usize, usize), f64>,
}

impl TripletAccumulator {
    /// Create a new empty `TripletAccumulator`
    pub fn new() -> TripletAccumulator {
        TripletAccumulator::default()
    }

    /// Add `value` to the entry at (`row`, `column`)
    pub fn add(&mut self, row: usize, column: usize, value: f64) {
        *self.entries.entry((row, column)).or_insert(0.0) += value;
    }

    /// Number of distinct `(row, column)` entries accumulated so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is this accumulator empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create the final sparse matrix with the given `shape`. Entries summing
    /// to exactly zero are not stored.
    ///
    /// # Panics
    ///
    /// If any accumulated entry is outside of `shape`.
    pub fn finish(self, shape: (usize, usize)) -> SparseMatrix {
        let (n_rows, n_columns) = shape;

        let mut row_offsets = Vec::with_capacity(n_rows + 1);
        let mut columns = Vec::with_capacity(self.entries.len());
        let mut values = Vec::with_capacity(self.entries.len());

        row_offsets.push(0);
        // entries are sorted by row, then by column
        for ((row, column), value) in self.entries {
            assert!(
                row < n_rows && column < n_columns,
                "entry ({}, {}) is out of bounds for a sparse matrix of shape {:?}",
                row, column, shape
            );

            if value == 0.0 {
                continue;
            }

            while row_offsets.len() <= row {
                row_offsets.push(columns.len());
            }

            columns.push(column);
            values.push(value);
        }

        while row_offsets.len() <= n_rows {
            row_offsets.push(columns.len());
        }

        return SparseMatrix {
            shape: shape,
            row_offsets: row_offsets,
            columns: columns,
            values: values,
        };
    }
}

/// Real sparse matrix in compressed sparse row (CSR) format.
///
/// This is used to store the projection from permutation-invariant
/// correlations to rotation-invariant basis functions. Once created, the
/// matrix is never modified.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SparseMatrix {
    shape: (usize, usize),
    /// `row_offsets[i]..row_offsets[i + 1]` is the range of entries in
    /// `columns`/`values` for row `i`
    row_offsets: Vec<usize>,
    columns: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Get the `(rows, columns)` shape of this matrix
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Get the number of rows in this matrix
    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    /// Get the number of columns in this matrix
    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// Get the number of explicitly stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the `(column, value)` pairs stored in the given `row`
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.row_offsets[row];
        let stop = self.row_offsets[row + 1];
        self.columns[start..stop].iter().copied().zip(self.values[start..stop].iter().copied())
    }

    /// Iterate over all `(row, column, value)` stored entries
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.nrows()).flat_map(move |row| {
            self.row(row).map(move |(column, value)| (row, column, value))
        })
    }

    /// Get the value of the entry at (`row`, `column`), including implicit
    /// zeros.
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.row(row)
            .find(|&(c, _)| c == column)
            .map_or(0.0, |(_, value)| value)
    }

    /// Compute `output = Re(self · input)` for a complex `input`. Since the
    /// matrix is real, this only needs the real part of the input.
    pub fn real_dot_into(&self, input: ArrayView1<'_, Complex64>, mut output: ArrayViewMut1<'_, f64>) {
        assert_eq!(input.len(), self.ncols(), "wrong size for the input of the sparse product");
        assert_eq!(output.len(), self.nrows(), "wrong size for the output of the sparse product");

        for (row, output) in output.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (column, value) in self.row(row) {
                sum += value * input[column].re;
            }
            *output = sum;
        }
    }

    /// Convert this matrix to a dense array
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros(self.shape);
        for (row, column, value) in self.triplets() {
            dense[[row, column]] = value;
        }
        return dense;
    }
}
