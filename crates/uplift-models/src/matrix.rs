//! Dense row-major feature matrix

use serde::{Deserialize, Serialize};
use uplift_core::{Error, Result};

/// Dense row-major matrix of encoded features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build from row-major data
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::shape(format!(
                "matrix {}x{} needs {} values, got {}",
                rows,
                cols,
                rows * cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from a slice of equally sized rows
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::shape(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Matrix with no rows and `cols` columns
    pub fn empty(cols: usize) -> Self {
        Self {
            rows: 0,
            cols,
            data: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Borrow row `i`
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Value at (`row`, `col`)
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Iterate rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// New matrix with `column` appended on the right
    pub fn with_column(&self, column: &[f64]) -> Result<Self> {
        if column.len() != self.rows {
            return Err(Error::shape(format!(
                "column has {} values, matrix has {} rows",
                column.len(),
                self.rows
            )));
        }
        let cols = self.cols + 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for (i, value) in column.iter().enumerate() {
            data.extend_from_slice(self.row(i));
            data.push(*value);
        }
        Ok(Self {
            rows: self.rows,
            cols,
            data,
        })
    }

    /// New matrix with the same value appended to every row
    pub fn with_constant_column(&self, value: f64) -> Self {
        let cols = self.cols + 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for row in self.iter_rows() {
            data.extend_from_slice(row);
            data.push(value);
        }
        Self {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// New matrix holding the selected rows, in order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Matrix::from_rows(&rows).is_err());
    }

    #[test]
    fn test_with_column_and_select() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let extended = m.with_column(&[7.0, 8.0, 9.0]).unwrap();
        assert_eq!(extended.cols(), 3);
        assert_eq!(extended.row(1), &[3.0, 4.0, 8.0]);

        let picked = extended.select_rows(&[2, 0]);
        assert_eq!(picked.rows(), 2);
        assert_eq!(picked.row(0), &[5.0, 6.0, 9.0]);
        assert_eq!(picked.get(1, 2), 7.0);
    }

    #[test]
    fn test_constant_column() {
        let m = Matrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        let treated = m.with_constant_column(1.0);
        assert_eq!(treated.row(0), &[1.0, 1.0]);
        assert_eq!(treated.row(1), &[2.0, 1.0]);
    }
}
