//! Plain-text matrix loading.
//!
//! The format is one sample per line, feature values separated by single
//! spaces:
//!
//! ```text
//! 0 0
//! 0 1
//! 10 0
//! 10 1
//! ```
//!
//! Dimensions are inferred before any value is parsed: the number of lines is
//! the sample count and `(spaces + lines) / lines` is the feature count. The
//! second pass then reads `samples * features` values in row-major order and
//! checks every line against the inferred width. `NaN` and infinities are
//! rejected.

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Parse a matrix from text.
pub fn parse_matrix(text: &str) -> Result<Matrix> {
    let (rows, cols) = infer_shape(text)?;

    let mut data = Vec::with_capacity(rows * cols);
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let before = data.len();
        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|e| Error::Parse {
                line: line_no,
                message: format!("invalid number {token:?}: {e}"),
            })?;
            if !value.is_finite() {
                return Err(Error::Parse {
                    line: line_no,
                    message: format!("non-finite value {token:?}"),
                });
            }
            data.push(value);
        }
        let found = data.len() - before;
        if found != cols {
            return Err(Error::Parse {
                line: line_no,
                message: format!("expected {cols} values, found {found}"),
            });
        }
    }

    Matrix::from_shape_vec(rows, cols, data)
}

/// Read a matrix from any byte source.
pub fn read_matrix<R: Read>(mut reader: R) -> Result<Matrix> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_matrix(&text)
}

impl Matrix {
    /// Load a matrix from a text file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Matrix> {
        let file = File::open(path)?;
        read_matrix(file)
    }
}

/// First pass: infer `(samples, features)` from separator counts.
fn infer_shape(text: &str) -> Result<(usize, usize)> {
    let mut newlines = 0usize;
    let mut spaces = 0usize;
    for c in text.chars() {
        match c {
            '\n' => newlines += 1,
            ' ' => spaces += 1,
            _ => {}
        }
    }
    // A final line without its trailing newline still counts as a sample.
    if !text.is_empty() && !text.ends_with('\n') {
        newlines += 1;
    }
    if newlines == 0 {
        return Err(Error::EmptyInput);
    }
    if (spaces + newlines) % newlines != 0 {
        return Err(Error::Parse {
            line: 1,
            message: format!("{spaces} separators cannot split {newlines} lines evenly"),
        });
    }
    Ok((newlines, (spaces + newlines) / newlines))
}
