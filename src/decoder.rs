//! Block decoder: recovers the original bytes from any `k` distinct
//! packets of an encoded block.

use crate::config::FecConfig;
use crate::encoder::{Packet, PAR_SHARD_LEN};
use crate::error::FecError;
use crate::gf_tables::Backend;
use crate::matrix::{self, CodingMatrix};
use log::{debug, error};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Erasure decoder for a fixed `(k, r)` configuration.
///
/// Stateless per call: each `decode` builds its own [`DecodingContext`]
/// and discards it, so one decoder can serve concurrent callers.
pub struct Decoder {
    matrix: Arc<CodingMatrix>,
    backend: Backend,
}

impl Decoder {
    pub fn new(k: usize, redundancy: usize) -> Result<Self, FecError> {
        Self::with_backend(k, redundancy, Backend::default())
    }

    pub fn with_backend(k: usize, redundancy: usize, backend: Backend) -> Result<Self, FecError> {
        let n = k
            .checked_add(redundancy)
            .ok_or_else(|| FecError::Config("k + redundancy overflows".into()))?;
        Ok(Self {
            matrix: CodingMatrix::shared(k, n)?,
            backend,
        })
    }

    pub fn from_config(cfg: &FecConfig) -> Result<Self, FecError> {
        cfg.validate()?;
        Self::with_backend(cfg.k, cfg.redundancy, cfg.backend)
    }

    pub fn k(&self) -> usize {
        self.matrix.k()
    }

    pub fn n(&self) -> usize {
        self.matrix.n()
    }

    /// Reconstructs the original `original_len` bytes from the received
    /// packets. Succeeds with any `k` distinct in-range indices; duplicate
    /// indices count once. The result is exact, never an approximation.
    pub fn decode(&self, received: &[Packet], original_len: usize) -> Result<Vec<u8>, FecError> {
        let ctx = DecodingContext::select(&self.matrix, received)?;
        ctx.recover(self.backend, original_len)
    }
}

/// The per-call decoding state: the `k` packets chosen for elimination,
/// lowest indices first. Preferring low indices keeps every available
/// source packet in the set, which minimizes the recovery work.
struct DecodingContext<'a> {
    matrix: &'a CodingMatrix,
    chosen: Vec<(usize, &'a [u8])>,
    shard_len: usize,
}

impl<'a> DecodingContext<'a> {
    fn select(matrix: &'a CodingMatrix, received: &'a [Packet]) -> Result<Self, FecError> {
        let k = matrix.k();
        let n = matrix.n();

        let mut by_index: BTreeMap<usize, &[u8]> = BTreeMap::new();
        for packet in received {
            if packet.index >= n {
                error!("packet index {} outside the coding range [0, {n})", packet.index);
                return Err(FecError::Config(format!(
                    "packet index {} outside the coding range [0, {n})",
                    packet.index
                )));
            }
            by_index
                .entry(packet.index)
                .or_insert(packet.payload.as_slice());
        }

        if by_index.len() < k {
            return Err(FecError::InsufficientPackets {
                needed: k,
                available: by_index.len(),
            });
        }

        // BTreeMap iterates in ascending index order, so taking the first
        // k entries selects all source packets before any repair packet.
        let chosen: Vec<(usize, &[u8])> = by_index.into_iter().take(k).collect();

        let shard_len = chosen[0].1.len();
        if shard_len == 0 {
            return Err(FecError::Config("packet payloads must not be empty".into()));
        }
        if chosen.iter().any(|(_, payload)| payload.len() != shard_len) {
            error!("received packets disagree on payload length");
            return Err(FecError::Config(
                "received packets disagree on payload length".into(),
            ));
        }

        Ok(Self {
            matrix,
            chosen,
            shard_len,
        })
    }

    fn recover(&self, backend: Backend, original_len: usize) -> Result<Vec<u8>, FecError> {
        let k = self.matrix.k();
        let shard_len = self.shard_len;
        if original_len > k * shard_len {
            return Err(FecError::Config(format!(
                "original length {original_len} exceeds block capacity {}",
                k * shard_len
            )));
        }

        let rows: Vec<usize> = self.chosen.iter().map(|(idx, _)| *idx).collect();
        debug!("decoding with rows {:?} (shard_len {})", rows, shard_len);

        // A singular submatrix here means the received rows were linearly
        // dependent despite being distinct: an internal invariant
        // violation, surfaced rather than retried.
        let inverse = matrix::invert(&self.matrix.submatrix(&rows), backend)?;

        let mut out = vec![0u8; k * shard_len];
        let mut present = vec![false; k];
        for &(idx, payload) in &self.chosen {
            if idx < k {
                out[idx * shard_len..(idx + 1) * shard_len].copy_from_slice(payload);
                present[idx] = true;
            }
        }

        let missing: Vec<usize> = (0..k).filter(|&i| !present[i]).collect();
        let recover_shard = |i: usize| -> Vec<u8> {
            let mut acc = vec![0u8; shard_len];
            for (slot, (_, payload)) in self.chosen.iter().enumerate() {
                backend.mul_add_slice(&mut acc, payload, inverse[i][slot]);
            }
            acc
        };
        let recovered: Vec<(usize, Vec<u8>)> = if shard_len >= PAR_SHARD_LEN && missing.len() > 1 {
            missing.par_iter().map(|&i| (i, recover_shard(i))).collect()
        } else {
            missing.iter().map(|&i| (i, recover_shard(i))).collect()
        };
        for (i, shard) in recovered {
            out[i * shard_len..(i + 1) * shard_len].copy_from_slice(&shard);
        }

        out.truncate(original_len);
        Ok(out)
    }
}
