// Copyright contributors to the Logical Circuit Compiler project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::{Display, Formatter};

use sprs::{CsMat, TriMat};

/// Dense GF(2) matrix in row-major form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMatrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    DimensionMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },
    NotSquare { rows: usize, cols: usize },
    Singular { rank: usize, size: usize },
}

impl Display for MatrixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DimensionMismatch { lhs, rhs } => write!(
                f,
                "cannot multiply a {}x{} matrix with a {}x{} matrix",
                lhs.0, lhs.1, rhs.0, rhs.1
            ),
            Self::NotSquare { rows, cols } => {
                write!(f, "matrix is not square: {rows}x{cols}")
            }
            Self::Singular { rank, size } => {
                write!(f, "matrix is singular over GF(2): rank {rank} < {size}")
            }
        }
    }
}

impl std::error::Error for MatrixError {}

impl BinaryMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    pub fn identity(size: usize) -> Self {
        let mut out = Self::zeros(size, size);
        for i in 0..size {
            out.set(i, i, 1);
        }
        out
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        let idx = self.index(row, col);
        self.data[idx] = value & 1;
    }

    pub fn toggle(&mut self, row: usize, col: usize) {
        let idx = self.index(row, col);
        self.data[idx] ^= 1;
    }

    pub fn row_weight(&self, row: usize) -> usize {
        assert!(row < self.rows);
        let start = row * self.cols;
        let end = start + self.cols;
        self.data[start..end].iter().map(|v| *v as usize).sum()
    }

    pub fn col_weight(&self, col: usize) -> usize {
        assert!(col < self.cols);
        (0..self.rows).map(|row| self.get(row, col) as usize).sum()
    }

    /// Column indices of the non-zero entries of `row`.
    pub fn row_support(&self, row: usize) -> Vec<usize> {
        (0..self.cols).filter(|&col| self.get(row, col) == 1).collect()
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let out_idx = out.index(col, row);
                out.data[out_idx] = self.get(row, col);
            }
        }
        out
    }

    pub fn hstack(&self, rhs: &Self) -> Self {
        assert_eq!(
            self.rows, rhs.rows,
            "cannot hstack matrices with different rows"
        );
        let mut out = Self::zeros(self.rows, self.cols + rhs.cols);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let out_idx = out.index(row, col);
                out.data[out_idx] = self.get(row, col);
            }
            for col in 0..rhs.cols {
                let out_idx = out.index(row, self.cols + col);
                out.data[out_idx] = rhs.get(row, col);
            }
        }
        out
    }

    /// Matrix product over GF(2).
    pub fn mul(&self, rhs: &Self) -> Result<Self, MatrixError> {
        if self.cols != rhs.rows {
            return Err(MatrixError::DimensionMismatch {
                lhs: (self.rows, self.cols),
                rhs: (rhs.rows, rhs.cols),
            });
        }
        let mut out = Self::zeros(self.rows, rhs.cols);
        for row in 0..self.rows {
            for k in 0..self.cols {
                if self.get(row, k) == 0 {
                    continue;
                }
                for col in 0..rhs.cols {
                    let out_idx = out.index(row, col);
                    out.data[out_idx] ^= rhs.get(k, col);
                }
            }
        }
        Ok(out)
    }

    pub fn is_identity(&self) -> bool {
        self.rows == self.cols
            && (0..self.rows)
                .all(|row| (0..self.cols).all(|col| self.get(row, col) == u8::from(row == col)))
    }

    /// Rank over GF(2).
    pub fn rank(&self) -> usize {
        let mut work = self.clone();
        work.row_reduce(self.cols)
    }

    /// Inverse over GF(2) by Gauss-Jordan elimination on `[A | I]`.
    pub fn inverse(&self) -> Result<Self, MatrixError> {
        if self.rows != self.cols {
            return Err(MatrixError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let size = self.rows;
        let mut work = self.hstack(&Self::identity(size));
        let rank = work.row_reduce(size);
        if rank < size {
            return Err(MatrixError::Singular { rank, size });
        }

        let mut out = Self::zeros(size, size);
        for row in 0..size {
            for col in 0..size {
                out.set(row, col, work.get(row, size + col));
            }
        }
        Ok(out)
    }

    /// Convert to CSR format for sparse interoperability.
    pub fn to_csr(&self) -> CsMat<u8> {
        let mut tri = TriMat::new((self.rows, self.cols));
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.get(row, col) == 1 {
                    tri.add_triplet(row, col, 1u8);
                }
            }
        }
        tri.to_csr()
    }

    /// Build a dense matrix from a sparse one, reducing every entry mod 2.
    pub fn from_csr(sparse: &CsMat<u8>) -> Self {
        let mut out = Self::zeros(sparse.rows(), sparse.cols());
        for (value, (row, col)) in sparse.iter() {
            if value % 2 == 1 {
                out.toggle(row, col);
            }
        }
        out
    }

    /// Reduced row echelon form restricted to the first `pivot_cols` columns.
    /// Returns the number of pivots found.
    fn row_reduce(&mut self, pivot_cols: usize) -> usize {
        let mut pivot_row = 0;
        for col in 0..pivot_cols.min(self.cols) {
            if pivot_row == self.rows {
                break;
            }
            let Some(found) = (pivot_row..self.rows).find(|&row| self.get(row, col) == 1) else {
                continue;
            };
            self.swap_rows(found, pivot_row);
            for row in 0..self.rows {
                if row != pivot_row && self.get(row, col) == 1 {
                    self.add_row(pivot_row, row);
                }
            }
            pivot_row += 1;
        }
        pivot_row
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in 0..self.cols {
            let (ia, ib) = (self.index(a, col), self.index(b, col));
            self.data.swap(ia, ib);
        }
    }

    // row `dst` ^= row `src`
    fn add_row(&mut self, src: usize, dst: usize) {
        for col in 0..self.cols {
            let value = self.get(src, col);
            let idx = self.index(dst, col);
            self.data[idx] ^= value;
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(row < self.rows);
        assert!(col < self.cols);
        row * self.cols + col
    }
}
