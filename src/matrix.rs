// Copyright (c) 2026, The OnionFec Project Authors.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
//     * Redistributions of source code must retain the above copyright
//       notice, this list of conditions and the following disclaimer.
//
//     * Redistributions in binary form must reproduce the above
//       copyright notice, this list of conditions and the following disclaimer
//       in the documentation and/or other materials provided with the
//       distribution.
//
//     * Neither the name of the copyright holder nor the names of its
//       contributors may be used to endorse or promote products derived from
//       this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT
// OWNER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT
// LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE,
// DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY
// THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Coding matrix construction and inversion over GF(2^8).
//!
//! A [`CodingMatrix`] for an `(n, k)` configuration has the `k`-row
//! identity as its top block (source packets pass through unmodified)
//! and Vandermonde-style rows below it: row `r` holds the powers
//! `(r + 1)^0 .. (r + 1)^(k - 1)`. Encoder and decoder re-derive the
//! matrix purely from `(k, n)`, so no coefficients ever travel on the
//! wire. Matrices are immutable after construction and are cached
//! process-wide.

use crate::error::FecError;
use crate::gf_tables::{self, Backend, GF_ORDER};
use lazy_static::lazy_static;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The `n x k` generator matrix of a systematic `(n, k)` erasure code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingMatrix {
    k: usize,
    n: usize,
    rows: Vec<Vec<u8>>,
}

lazy_static! {
    static ref MATRIX_CACHE: Mutex<HashMap<(usize, usize), Arc<CodingMatrix>>> =
        Mutex::new(HashMap::new());
}

impl CodingMatrix {
    /// Builds the generator matrix for `k` source rows and `n` total rows.
    pub fn build(k: usize, n: usize) -> Result<Self, FecError> {
        if k == 0 {
            return Err(FecError::Config("k must be at least 1".into()));
        }
        if n < k {
            return Err(FecError::Config(format!(
                "total rows n = {n} cannot be smaller than k = {k}"
            )));
        }
        if n > GF_ORDER - 1 {
            return Err(FecError::Config(format!(
                "n = {n} exceeds the {} distinct nonzero row values of GF(2^8)",
                GF_ORDER - 1
            )));
        }

        let mut rows = Vec::with_capacity(n);
        for r in 0..k {
            let mut row = vec![0u8; k];
            row[r] = 1;
            rows.push(row);
        }
        for r in k..n {
            // Row value r + 1 stays nonzero and distinct for all n <= 255.
            let value = (r + 1) as u8;
            let mut row = Vec::with_capacity(k);
            let mut power = 1u8;
            for _ in 0..k {
                row.push(power);
                power = gf_tables::gf_mul_table(power, value);
            }
            rows.push(row);
        }

        Ok(Self { k, n, rows })
    }

    /// Returns the process-wide shared matrix for `(k, n)`, building it on
    /// first use. Encode and decode paths go through here so repeated
    /// calls with one configuration reuse a single allocation.
    pub fn shared(k: usize, n: usize) -> Result<Arc<Self>, FecError> {
        if let Some(m) = MATRIX_CACHE.lock().unwrap().get(&(k, n)) {
            return Ok(Arc::clone(m));
        }
        let built = Arc::new(Self::build(k, n)?);
        debug!("caching coding matrix for k={} n={}", k, n);
        let mut cache = MATRIX_CACHE.lock().unwrap();
        let entry = cache.entry((k, n)).or_insert(built);
        Ok(Arc::clone(entry))
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Coefficient row for packet index `row`.
    pub fn row(&self, row: usize) -> &[u8] {
        &self.rows[row]
    }

    /// The `k x k` submatrix restricted to the given row indices.
    /// Callers guarantee `rows` are distinct and within `[0, n)`.
    pub(crate) fn submatrix(&self, rows: &[usize]) -> Vec<Vec<u8>> {
        rows.iter().map(|&r| self.rows[r].clone()).collect()
    }
}

/// Gauss-Jordan inversion with partial pivoting. All arithmetic is exact,
/// so the result depends only on the row order of the input.
pub(crate) fn invert(src: &[Vec<u8>], backend: Backend) -> Result<Vec<Vec<u8>>, FecError> {
    let k = src.len();
    let mut m: Vec<Vec<u8>> = src.to_vec();
    let mut inv: Vec<Vec<u8>> = (0..k)
        .map(|r| {
            let mut row = vec![0u8; k];
            row[r] = 1;
            row
        })
        .collect();

    for col in 0..k {
        let pivot = (col..k)
            .find(|&r| m[r][col] != 0)
            .ok_or(FecError::SingularMatrix)?;
        m.swap(col, pivot);
        inv.swap(col, pivot);

        let scale = gf_tables::gf_inv(m[col][col])?;
        if scale != 1 {
            for v in m[col].iter_mut() {
                *v = backend.mul(*v, scale);
            }
            for v in inv[col].iter_mut() {
                *v = backend.mul(*v, scale);
            }
        }

        for r in 0..k {
            if r == col || m[r][col] == 0 {
                continue;
            }
            let factor = m[r][col];
            for c in 0..k {
                let t = backend.mul(factor, m[col][c]);
                m[r][c] ^= t;
                let t = backend.mul(factor, inv[col][c]);
                inv[r][c] ^= t;
            }
        }
    }

    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat_mul(a: &[Vec<u8>], b: &[Vec<u8>]) -> Vec<Vec<u8>> {
        let k = a.len();
        let mut out = vec![vec![0u8; k]; k];
        for i in 0..k {
            for j in 0..k {
                let mut acc = 0u8;
                for l in 0..k {
                    acc ^= gf_tables::gf_mul_table(a[i][l], b[l][j]);
                }
                out[i][j] = acc;
            }
        }
        out
    }

    fn identity(k: usize) -> Vec<Vec<u8>> {
        (0..k)
            .map(|r| {
                let mut row = vec![0u8; k];
                row[r] = 1;
                row
            })
            .collect()
    }

    #[test]
    fn identity_prefix_and_vandermonde_tail() {
        let m = CodingMatrix::build(3, 6).unwrap();
        assert_eq!(m.row(0), &[1, 0, 0]);
        assert_eq!(m.row(1), &[0, 1, 0]);
        assert_eq!(m.row(2), &[0, 0, 1]);
        // Row 3 has value 4: powers 1, 4, 16.
        assert_eq!(m.row(3), &[1, 4, 16]);
        // Row 4 has value 5: powers 1, 5, 5*5 = 17 under 0x11D.
        assert_eq!(m.row(4), &[1, 5, 17]);
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            CodingMatrix::build(0, 4),
            Err(FecError::Config(_))
        ));
        assert!(matches!(
            CodingMatrix::build(5, 4),
            Err(FecError::Config(_))
        ));
        assert!(matches!(
            CodingMatrix::build(4, 256),
            Err(FecError::Config(_))
        ));
        assert!(CodingMatrix::build(4, 255).is_ok());
    }

    #[test]
    fn shared_returns_same_instance() {
        let a = CodingMatrix::shared(4, 6).unwrap();
        let b = CodingMatrix::shared(4, 6).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn invert_round_trips() {
        let m = CodingMatrix::build(4, 8).unwrap();
        for rows in [[0usize, 1, 2, 3], [4, 5, 6, 7], [0, 2, 5, 7]] {
            let sub = m.submatrix(&rows);
            for backend in [Backend::Table, Backend::Reference] {
                let inv = invert(&sub, backend).unwrap();
                assert_eq!(mat_mul(&inv, &sub), identity(4), "rows {:?}", rows);
            }
        }
    }

    #[test]
    fn singular_matrix_detected() {
        let row = vec![1u8, 2, 3];
        let dependent = vec![row.clone(), row.clone(), vec![0, 1, 1]];
        assert_eq!(
            invert(&dependent, Backend::Table),
            Err(FecError::SingularMatrix)
        );
    }
}
