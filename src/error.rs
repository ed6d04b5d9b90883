use thiserror::Error;

/// Errors surfaced by the erasure codec. None of these are retried
/// internally; `InsufficientPackets` is the only kind a transport is
/// expected to recover from (by waiting for more packets).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FecError {
    #[error("inverse of zero is undefined in GF(2^8)")]
    ZeroInverse,
    #[error("invalid coding parameters: {0}")]
    Config(String),
    #[error("coding submatrix is singular; received rows are linearly dependent")]
    SingularMatrix,
    #[error("insufficient packets for decoding: need {needed}, have {available}")]
    InsufficientPackets { needed: usize, available: usize },
}
