//! Block encoder: splits a data block into `k` shards and derives `n - k`
//! repair packets from the coding matrix.

use crate::config::FecConfig;
use crate::error::FecError;
use crate::gf_tables::Backend;
use crate::matrix::CodingMatrix;
use log::debug;
use rayon::prelude::*;
use std::sync::Arc;

/// Shard length above which repair rows are generated in parallel.
pub(crate) const PAR_SHARD_LEN: usize = 1024;

/// One encoded packet: its row index in the coding scheme and a payload of
/// `ceil(len / k)` bytes. Indices below `k` carry a source shard verbatim;
/// indices at or above `k` carry a linear combination of all shards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub index: usize,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(index: usize, payload: Vec<u8>) -> Self {
        Self { index, payload }
    }
}

/// Systematic erasure encoder for a fixed `(k, r)` configuration.
///
/// Construction validates the configuration once; `encode` is then a pure
/// function of its input, so a single encoder can be shared across threads.
pub struct Encoder {
    matrix: Arc<CodingMatrix>,
    backend: Backend,
}

impl Encoder {
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

    pub fn redundancy(&self) -> usize {
        self.matrix.n() - self.matrix.k()
    }

    /// Payload length every packet of a `data_len`-byte block will carry.
    pub fn shard_len(&self, data_len: usize) -> usize {
        (data_len + self.k() - 1) / self.k()
    }

    /// Splits `data` into `k` zero-padded shards and returns the lazy
    /// packet sequence. The caller must remember `data.len()` and pass it
    /// to the decoder, which strips the padding again; the padding bytes
    /// themselves never reach the caller on the decode side.
    pub fn encode(&self, data: &[u8]) -> Result<EncodedBlock, FecError> {
        if data.is_empty() {
            return Err(FecError::Config("cannot encode an empty block".into()));
        }
        let k = self.k();
        let shard_len = self.shard_len(data.len());
        let mut shards = Vec::with_capacity(k);
        for i in 0..k {
            let start = (i * shard_len).min(data.len());
            let end = ((i + 1) * shard_len).min(data.len());
            let mut shard = Vec::with_capacity(shard_len);
            shard.extend_from_slice(&data[start..end]);
            shard.resize(shard_len, 0);
            shards.push(shard);
        }
        debug!(
            "encoding {} bytes as {} packets of {} bytes (k={})",
            data.len(),
            self.n(),
            shard_len,
            k
        );
        Ok(EncodedBlock {
            shards,
            matrix: Arc::clone(&self.matrix),
            backend: self.backend,
            next: 0,
        })
    }

    /// Materializes the whole packet sequence. Repair rows are independent
    /// of one another, so large shards are generated in parallel.
    pub fn encode_all(&self, data: &[u8]) -> Result<Vec<Packet>, FecError> {
        let block = self.encode(data)?;
        if block.shard_len() >= PAR_SHARD_LEN {
            let n = self.n();
            Ok((0..n).into_par_iter().map(|row| block.packet_at(row)).collect())
        } else {
            Ok(block.collect())
        }
    }
}

/// The finite packet sequence of one encoded block.
///
/// Yields exactly `n` packets in row order. Every packet is derived from
/// the shards and the shared coding matrix alone, so re-encoding the same
/// block restarts the identical sequence.
pub struct EncodedBlock {
    shards: Vec<Vec<u8>>,
    matrix: Arc<CodingMatrix>,
    backend: Backend,
    next: usize,
}

impl EncodedBlock {
    pub fn shard_len(&self) -> usize {
        self.shards[0].len()
    }

    fn packet_at(&self, row: usize) -> Packet {
        let k = self.matrix.k();
        if row < k {
            return Packet::new(row, self.shards[row].clone());
        }
        let coeffs = self.matrix.row(row);
        let mut payload = vec![0u8; self.shard_len()];
        for (i, shard) in self.shards.iter().enumerate() {
            self.backend.mul_add_slice(&mut payload, shard, coeffs[i]);
        }
        Packet::new(row, payload)
    }
}

impl Iterator for EncodedBlock {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        if self.next >= self.matrix.n() {
            return None;
        }
        let packet = self.packet_at(self.next);
        self.next += 1;
        Some(packet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.matrix.n() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EncodedBlock {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_packets_pass_through() {
        let enc = Encoder::new(4, 2).unwrap();
        let data: Vec<u8> = (1..=12).collect();
        let packets: Vec<Packet> = enc.encode(&data).unwrap().collect();
        assert_eq!(packets.len(), 6);
        assert_eq!(packets[0].payload, vec![1, 2, 3]);
        assert_eq!(packets[1].payload, vec![4, 5, 6]);
        assert_eq!(packets[2].payload, vec![7, 8, 9]);
        assert_eq!(packets[3].payload, vec![10, 11, 12]);
    }

    #[test]
    fn tail_shard_is_zero_padded() {
        let enc = Encoder::new(3, 1).unwrap();
        let data = [9u8; 7]; // shard_len 3, one pad byte
        assert_eq!(enc.shard_len(data.len()), 3);
        let packets: Vec<Packet> = enc.encode(&data).unwrap().collect();
        assert_eq!(packets[2].payload, vec![9, 0, 0]);
    }

    #[test]
    fn sequence_is_exact_size_and_restartable() {
        let enc = Encoder::new(4, 3).unwrap();
        let data = [0xABu8; 64];
        let mut block = enc.encode(&data).unwrap();
        assert_eq!(block.len(), 7);
        let first = block.next().unwrap();
        assert_eq!(block.len(), 6);
        let again: Vec<Packet> = enc.encode(&data).unwrap().collect();
        assert_eq!(again[0], first);
    }

    #[test]
    fn encode_all_matches_iterator() {
        let enc = Encoder::new(5, 3).unwrap();
        let data: Vec<u8> = (0..200).map(|i| (i * 7 % 256) as u8).collect();
        let lazy: Vec<Packet> = enc.encode(&data).unwrap().collect();
        let eager = enc.encode_all(&data).unwrap();
        assert_eq!(lazy, eager);
    }

    #[test]
    fn encode_all_parallel_path_matches() {
        // Shards above PAR_SHARD_LEN take the rayon path.
        let enc = Encoder::new(4, 4).unwrap();
        let data: Vec<u8> = (0..4 * (PAR_SHARD_LEN + 3))
            .map(|i| (i % 251) as u8)
            .collect();
        let lazy: Vec<Packet> = enc.encode(&data).unwrap().collect();
        let eager = enc.encode_all(&data).unwrap();
        assert_eq!(lazy, eager);
    }

    #[test]
    fn empty_input_rejected() {
        let enc = Encoder::new(4, 2).unwrap();
        assert!(matches!(enc.encode(&[]), Err(FecError::Config(_))));
    }

    #[test]
    fn invalid_configuration_rejected() {
        assert!(matches!(Encoder::new(0, 2), Err(FecError::Config(_))));
        assert!(matches!(Encoder::new(200, 56), Err(FecError::Config(_))));
        assert!(Encoder::new(200, 55).is_ok());
    }
}
