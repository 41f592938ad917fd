//! Dense row-major matrix.
//!
//! [`Matrix`] owns a contiguous `Vec<f64>` together with its shape. Element
//! `(r, c)` lives at `r * cols + c`. Every constructor checks that the buffer
//! length matches the declared shape, and every shape-changing operation
//! (transpose, products) allocates a fresh buffer.
//!
//! Cloning a matrix deep-copies its buffer. Read-only access to a row is
//! handed out as a borrowed `&[f64]` slice.
//!
//! ```rust
//! use kselect::Matrix;
//!
//! let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! assert_eq!(m.shape(), (2, 2));
//! assert_eq!(m.transpose().transpose(), m);
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// Dense matrix of `f64` in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Build a matrix from a row-major buffer.
    ///
    /// Fails with [`Error::DimensionMismatch`] if `data.len() != rows * cols`.
    pub fn from_shape_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = rows.checked_mul(cols).ok_or(Error::InvalidParameter {
            name: "shape",
            message: "rows * cols overflows",
        })?;
        if data.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Build a matrix from rows of equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(Error::DimensionMismatch {
                    expected: cols,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Square identity matrix (the standard basis of `R^dim`).
    pub fn identity(dim: usize) -> Self {
        let mut m = Self::zeros(dim, dim);
        for i in 0..dim {
            m.data[i * dim + i] = 1.0;
        }
        m
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of rows (samples).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (features).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// The row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the matrix and return its row-major buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    #[inline]
    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(Error::IndexOutOfRange {
                index: row,
                bound: self.rows,
            });
        }
        Ok(())
    }

    #[inline]
    fn check_column(&self, column: usize) -> Result<()> {
        if column >= self.cols {
            return Err(Error::IndexOutOfRange {
                index: column,
                bound: self.cols,
            });
        }
        Ok(())
    }

    /// Borrow a row.
    pub fn row(&self, row: usize) -> Result<&[f64]> {
        self.check_row(row)?;
        Ok(self.row_unchecked(row))
    }

    /// Borrow a row without the bounds check; callers must guarantee `row < rows`.
    #[inline]
    pub(crate) fn row_unchecked(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub(crate) fn row_mut_unchecked(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// Overwrite a row with `values`.
    pub fn set_row(&mut self, row: usize, values: &[f64]) -> Result<()> {
        self.check_row(row)?;
        if values.len() != self.cols {
            return Err(Error::DimensionMismatch {
                expected: self.cols,
                found: values.len(),
            });
        }
        self.row_mut_unchecked(row).copy_from_slice(values);
        Ok(())
    }

    /// Copy out a column.
    pub fn column(&self, column: usize) -> Result<Vec<f64>> {
        self.check_column(column)?;
        Ok(self.column_iter(column).collect())
    }

    fn column_iter(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().skip(column).step_by(self.cols.max(1)).copied()
    }

    /// Element at `(row, column)`.
    pub fn get(&self, row: usize, column: usize) -> Result<f64> {
        self.check_row(row)?;
        self.check_column(column)?;
        Ok(self.data[row * self.cols + column])
    }

    /// Sum of a row.
    pub fn sum_of_row(&self, row: usize) -> Result<f64> {
        Ok(self.row(row)?.iter().sum())
    }

    /// Sum of a column.
    pub fn sum_of_column(&self, column: usize) -> Result<f64> {
        self.check_column(column)?;
        Ok(self.column_iter(column).sum())
    }

    /// Mean of a row.
    pub fn mean_of_row(&self, row: usize) -> Result<f64> {
        Ok(self.sum_of_row(row)? / self.cols as f64)
    }

    /// Mean of a column.
    pub fn mean_of_column(&self, column: usize) -> Result<f64> {
        Ok(self.sum_of_column(column)? / self.rows as f64)
    }

    /// Sum of every element.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Euclidean length of a row.
    pub fn length_of_row(&self, row: usize) -> Result<f64> {
        Ok(norm(self.row(row)?))
    }

    /// Euclidean length of a column.
    pub fn length_of_column(&self, column: usize) -> Result<f64> {
        self.check_column(column)?;
        Ok(self.column_iter(column).map(|x| x * x).sum::<f64>().sqrt())
    }

    /// Subtract `value` from every element.
    pub fn subtract(&mut self, value: f64) {
        for x in &mut self.data {
            *x -= value;
        }
    }

    /// Subtract `value` from every element of `column`, in place.
    pub fn subtract_column(&mut self, value: f64, column: usize) -> Result<()> {
        self.check_column(column)?;
        let cols = self.cols;
        for x in self.data.iter_mut().skip(column).step_by(cols) {
            *x -= value;
        }
        Ok(())
    }

    /// Return a new buffer holding `row` with `value` subtracted from each element.
    pub fn subtract_row(&self, value: f64, row: usize) -> Result<Vec<f64>> {
        Ok(self.row(row)?.iter().map(|x| x - value).collect())
    }

    /// Divide every element of `column` by `value`, in place.
    pub fn divide_column(&mut self, value: f64, column: usize) -> Result<()> {
        self.check_column(column)?;
        if value == 0.0 {
            return Err(Error::DivisionByZero);
        }
        let cols = self.cols;
        for x in self.data.iter_mut().skip(column).step_by(cols) {
            *x /= value;
        }
        Ok(())
    }

    /// Divide every element by `value`, in place.
    pub fn divide(&mut self, value: f64) -> Result<()> {
        if value == 0.0 {
            return Err(Error::DivisionByZero);
        }
        for x in &mut self.data {
            *x /= value;
        }
        Ok(())
    }

    /// New matrix with rows and columns swapped.
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Self {
            data,
            rows: self.cols,
            cols: self.rows,
        }
    }

    /// Matrix-vector product `A x`.
    pub fn mul_vec(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.cols {
            return Err(Error::DimensionMismatch {
                expected: self.cols,
                found: x.len(),
            });
        }
        Ok((0..self.rows)
            .map(|i| dot(self.row_unchecked(i), x))
            .collect())
    }

    /// Matrix-matrix product `A B`.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::DimensionMismatch {
                expected: self.cols,
                found: other.rows,
            });
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            let a = self.row_unchecked(i);
            let c = out.row_mut_unchecked(i);
            for (k, &aik) in a.iter().enumerate() {
                for (cij, bkj) in c.iter_mut().zip(other.row_unchecked(k)) {
                    *cij += aik * bkj;
                }
            }
        }
        Ok(out)
    }

    /// Center every column on zero mean and scale it to unit standard deviation.
    ///
    /// The standard deviation is the population one, `||col - mean|| / sqrt(rows)`.
    /// A constant column cannot be scaled and fails with [`Error::DivisionByZero`].
    pub fn standardize(&self) -> Result<Matrix> {
        if self.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut out = self.clone();
        let scale = (self.rows as f64).sqrt();
        for c in 0..self.cols {
            // Rounding in the mean would leave a tiny nonzero spread.
            let mut values = self.column_iter(c);
            let first = values.next();
            if values.all(|x| Some(x) == first) {
                return Err(Error::DivisionByZero);
            }
            let mean = out.mean_of_column(c)?;
            out.subtract_column(mean, c)?;
            let std_dev = out.length_of_column(c)? / scale;
            out.divide_column(std_dev, c)?;
        }
        Ok(out)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let mut first = true;
            for x in self.row_unchecked(i) {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{x}")?;
                first = false;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub(crate) fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap()
    }

    #[test]
    fn identity_has_unit_diagonal() {
        for d in 0..6 {
            let m = Matrix::identity(d);
            assert_eq!(m.shape(), (d, d));
            for i in 0..d {
                for j in 0..d {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_eq!(m.get(i, j).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn shape_must_match_buffer() {
        assert!(matches!(
            Matrix::from_shape_vec(2, 3, vec![0.0; 5]),
            Err(Error::DimensionMismatch { expected: 6, found: 5 })
        ));
        assert!(matches!(
            Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]),
            Err(Error::DimensionMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn row_and_column_aggregates() {
        let m = sample();
        assert_eq!(m.sum_of_row(1).unwrap(), 15.0);
        assert_eq!(m.sum_of_column(2).unwrap(), 9.0);
        assert_eq!(m.mean_of_row(0).unwrap(), 2.0);
        assert_eq!(m.mean_of_column(0).unwrap(), 2.5);
        assert_eq!(m.sum(), 21.0);
    }

    #[test]
    fn out_of_range_indices_are_errors() {
        let m = sample();
        assert!(matches!(
            m.sum_of_row(2),
            Err(Error::IndexOutOfRange { index: 2, bound: 2 })
        ));
        assert!(matches!(
            m.sum_of_column(3),
            Err(Error::IndexOutOfRange { index: 3, bound: 3 })
        ));
        assert!(m.get(0, 3).is_err());
        assert!(m.row(5).is_err());
    }

    #[test]
    fn subtract_variants() {
        let mut m = sample();
        m.subtract_column(1.0, 0).unwrap();
        assert_eq!(m.column(0).unwrap(), vec![0.0, 3.0]);
        assert_eq!(m.subtract_row(2.0, 1).unwrap(), vec![1.0, 3.0, 4.0]);
        // subtract_row does not touch the matrix.
        assert_eq!(m.row(1).unwrap(), &[3.0, 5.0, 6.0]);
        m.subtract(1.0);
        assert_eq!(m.row(0).unwrap(), &[-1.0, 1.0, 2.0]);
    }

    #[test]
    fn divide_by_zero_leaves_matrix_untouched() {
        let mut m = sample();
        let before = m.clone();
        assert!(matches!(m.divide_column(0.0, 1), Err(Error::DivisionByZero)));
        assert!(matches!(m.divide(0.0), Err(Error::DivisionByZero)));
        assert_eq!(m, before);
        m.divide_column(2.0, 1).unwrap();
        assert_eq!(m.column(1).unwrap(), vec![1.0, 2.5]);
    }

    #[test]
    fn clone_is_deep() {
        let a = sample();
        let mut b = a.clone();
        b.subtract(10.0);
        assert_eq!(a.row(0).unwrap(), &[1.0, 2.0, 3.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn transpose_is_involutive() {
        let m = sample();
        let t = m.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.row(2).unwrap(), &[3.0, 6.0]);
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn products() {
        let m = sample();
        assert_eq!(m.mul_vec(&[1.0, 0.0, -1.0]).unwrap(), vec![-2.0, -2.0]);
        assert!(m.mul_vec(&[1.0]).is_err());

        let p = m.matmul(&m.transpose()).unwrap();
        assert_eq!(p.shape(), (2, 2));
        assert_eq!(p.as_slice(), &[14.0, 32.0, 32.0, 77.0]);
        assert!(m.matmul(&m).is_err());

        let i = Matrix::identity(3);
        assert_eq!(m.matmul(&i).unwrap(), m);
    }

    #[test]
    fn standardize_centers_and_scales() {
        let m = Matrix::from_rows(&[
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![4.0, 25.0],
            vec![9.0, 45.0],
        ])
        .unwrap();
        let s = m.standardize().unwrap();
        let scale = (s.rows() as f64).sqrt();
        for c in 0..s.cols() {
            assert!(s.mean_of_column(c).unwrap().abs() < 1e-12);
            let std_dev = s.length_of_column(c).unwrap() / scale;
            assert!((std_dev - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn standardize_rejects_constant_column() {
        let m = Matrix::from_rows(&[vec![1.0, 3.0], vec![2.0, 3.0]]).unwrap();
        assert!(matches!(m.standardize(), Err(Error::DivisionByZero)));
    }

    #[test]
    fn standardize_rejects_constant_column_with_inexact_mean() {
        // 0.1 has no exact binary mean; centering leaves residues near 1e-17.
        let m = Matrix::from_rows(&[vec![0.1, 1.0], vec![0.1, 2.0], vec![0.1, 3.0]]).unwrap();
        assert!(matches!(m.standardize(), Err(Error::DivisionByZero)));
    }

    #[test]
    fn display_one_row_per_line() {
        let m = Matrix::from_rows(&[vec![1.0, 2.5], vec![-3.0, 0.0]]).unwrap();
        assert_eq!(m.to_string(), "1 2.5\n-3 0\n");
    }
}
