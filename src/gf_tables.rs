//! Finite field arithmetic over GF(2^8).
//!
//! All linear algebra in this crate runs over the 256-element field built
//! from the polynomial 0x11D. Addition is XOR; multiplication goes through
//! precomputed log/antilog tables (the `table` backend) or a portable
//! shift-and-add kernel (the `reference` backend). The tables are built
//! once and are read-only afterwards, so concurrent callers share them
//! without synchronization.

use crate::error::FecError;
use clap::ValueEnum;
use lazy_static::lazy_static;
use serde::Deserialize;

pub(crate) const GF_ORDER: usize = 256;
const IRREDUCIBLE_POLY: u16 = 0x11D; // x^8 + x^4 + x^3 + x^2 + 1

struct GfTables {
    log: [u8; GF_ORDER],
    // Doubled antilog table so `log[a] + log[b]` never needs a modulo.
    exp: [u8; 2 * GF_ORDER - 2],
}

impl GfTables {
    fn build() -> Self {
        let mut log = [0u8; GF_ORDER];
        let mut exp = [0u8; 2 * GF_ORDER - 2];
        let mut x: u16 = 1;
        for i in 0..255 {
            exp[i] = x as u8;
            exp[i + 255] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x >= 256 {
                x ^= IRREDUCIBLE_POLY;
            }
        }
        Self { log, exp }
    }
}

lazy_static! {
    static ref TABLES: GfTables = GfTables::build();
}

/// Addition in GF(2^8) is XOR and is its own inverse.
#[inline(always)]
pub fn gf_add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Subtraction coincides with addition in a binary extension field.
#[inline(always)]
pub fn gf_sub(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Table-driven multiplication: `antilog[log a + log b]`.
#[inline(always)]
pub fn gf_mul_table(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let log_a = TABLES.log[a as usize] as usize;
    let log_b = TABLES.log[b as usize] as usize;
    TABLES.exp[log_a + log_b]
}

/// Portable shift-and-add multiplication. Bit-identical to
/// [`gf_mul_table`] for every input pair; kept as the reference kernel.
#[inline(always)]
pub fn gf_mul_shift(mut a: u8, mut b: u8) -> u8 {
    let mut res = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            res ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= IRREDUCIBLE_POLY as u8;
        }
        b >>= 1;
    }
    res
}

/// Multiplicative inverse. Zero has none.
#[inline(always)]
pub fn gf_inv(a: u8) -> Result<u8, FecError> {
    if a == 0 {
        return Err(FecError::ZeroInverse);
    }
    Ok(TABLES.exp[255 - TABLES.log[a as usize] as usize])
}

/// Division as multiplication by the inverse of the divisor.
#[inline(always)]
pub fn gf_div(a: u8, b: u8) -> Result<u8, FecError> {
    Ok(gf_mul_table(a, gf_inv(b)?))
}

/// Multiplication kernel selection.
///
/// The choice between the accelerated and the portable code path is an
/// explicit constructor argument rather than a global switch, so the same
/// process can run both and tests can pin either one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Log/antilog table lookups. The fast path.
    #[default]
    Table,
    /// Shift-and-add arithmetic with no table state.
    Reference,
}

impl Backend {
    #[inline(always)]
    pub(crate) fn mul(self, a: u8, b: u8) -> u8 {
        match self {
            Backend::Table => gf_mul_table(a, b),
            Backend::Reference => gf_mul_shift(a, b),
        }
    }

    /// `acc[i] ^= coeff * src[i]` for every byte offset. This is the inner
    /// convolution of both encode and decode, so the table backend hoists
    /// the `log[coeff]` lookup out of the loop.
    pub(crate) fn mul_add_slice(self, acc: &mut [u8], src: &[u8], coeff: u8) {
        if coeff == 0 {
            return;
        }
        if coeff == 1 {
            for (d, s) in acc.iter_mut().zip(src) {
                *d ^= *s;
            }
            return;
        }
        match self {
            Backend::Table => {
                let log_c = TABLES.log[coeff as usize] as usize;
                for (d, s) in acc.iter_mut().zip(src) {
                    if *s != 0 {
                        *d ^= TABLES.exp[log_c + TABLES.log[*s as usize] as usize];
                    }
                }
            }
            Backend::Reference => {
                for (d, s) in acc.iter_mut().zip(src) {
                    *d ^= gf_mul_shift(coeff, *s);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_mul_matches_table() {
        for a in 0u8..=255 {
            for b in 0u8..=255 {
                assert_eq!(
                    gf_mul_table(a, b),
                    gf_mul_shift(a, b),
                    "a={} b={} mismatch",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn add_is_self_inverse() {
        for a in 0u8..=255 {
            assert_eq!(gf_add(a, a), 0);
            assert_eq!(gf_sub(a, a), 0);
        }
    }

    #[test]
    fn inverse_law() {
        for a in 1u8..=255 {
            let inv = gf_inv(a).unwrap();
            assert_eq!(gf_mul_table(a, inv), 1, "a={}", a);
        }
    }

    #[test]
    fn inverse_of_zero_fails() {
        assert_eq!(gf_inv(0), Err(FecError::ZeroInverse));
        assert_eq!(gf_div(7, 0), Err(FecError::ZeroInverse));
    }

    #[test]
    fn mul_commutes_and_distributes() {
        for a in [0u8, 1, 2, 53, 128, 254, 255] {
            for b in [0u8, 1, 3, 77, 200, 255] {
                assert_eq!(gf_mul_table(a, b), gf_mul_table(b, a));
                for c in [0u8, 5, 91, 255] {
                    assert_eq!(
                        gf_mul_table(a, gf_add(b, c)),
                        gf_add(gf_mul_table(a, b), gf_mul_table(a, c))
                    );
                }
            }
        }
    }

    #[test]
    fn division_round_trips() {
        for a in 1u8..=255 {
            for b in [1u8, 2, 9, 100, 255] {
                let q = gf_div(a, b).unwrap();
                assert_eq!(gf_mul_table(q, b), a);
            }
        }
    }

    #[test]
    fn backend_slice_kernels_agree() {
        let src: Vec<u8> = (0u8..=255).collect();
        for coeff in [0u8, 1, 2, 29, 142, 255] {
            let mut table = vec![0xA5u8; src.len()];
            let mut reference = vec![0xA5u8; src.len()];
            Backend::Table.mul_add_slice(&mut table, &src, coeff);
            Backend::Reference.mul_add_slice(&mut reference, &src, coeff);
            assert_eq!(table, reference, "coeff={}", coeff);
        }
    }
}
