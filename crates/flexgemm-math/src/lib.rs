//! Integer helpers shared by the flexgemm convolution planner.
//!
//! Everything here is closed-form `u32` arithmetic used when lowering a
//! convolution onto GEMM-style routines: the bit-width count, ceiling
//! division, mask-based alignment and the bounded fast-division synthesizer
//! ([`MagicDivisor`]) whose constants let compute kernels replace `/` and `%`
//! on tile indices with a multiply and a shift.

mod magic;

pub use magic::{DivisorError, MagicDivisor};

/// Number of bits needed to represent `n` (`0` for `n == 0`).
///
/// Floods every bit below the highest set bit and counts the result, which
/// equals `floor(log2(n)) + 1` for `n > 0`.
#[inline]
#[must_use]
pub const fn bit_width(n: u32) -> u32 {
    let mut n = n;
    n |= n >> 1;
    n |= n >> 2;
    n |= n >> 4;
    n |= n >> 8;
    n |= n >> 16;
    n.count_ones()
}

/// Ceiling division for positive divisors.
#[inline]
#[must_use]
pub const fn ceil_div(n: u32, d: u32) -> u32 {
    n.div_ceil(d)
}

/// Round `value` up using a `2^k - 1` mask: `(value + mask) & !mask`.
#[inline]
#[must_use]
pub const fn align_up(value: u32, mask: u32) -> u32 {
    (value + mask) & !mask
}
