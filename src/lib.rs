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

//! # OnionFec
//!
//! A systematic forward-error-correction engine for erasure-coded packet
//! transport. A data block is split into `k` source shards; `r` repair
//! packets carry linear combinations of the shards over GF(2^8), and the
//! original block can be rebuilt from any `k` of the `n = k + r` packets.
//!
//! The crate defines no wire format and holds no session state: a
//! transport layer frames each [`Packet`] (index plus payload) as it sees
//! fit, collects at least `k` of them, and calls [`Decoder::decode`] with
//! the original block length it carried out-of-band.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod gf_tables;
pub mod matrix;

pub use config::FecConfig;
pub use decoder::Decoder;
pub use encoder::{EncodedBlock, Encoder, Packet};
pub use error::FecError;
pub use gf_tables::Backend;
pub use matrix::CodingMatrix;
