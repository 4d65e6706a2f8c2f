//! Bounded magic-number division.
//!
//! Classic fixed-width magic numbers assume the dividend may span the whole
//! register. Tile indices handed to the compute kernels are bounded by a
//! known, much smaller tile count, so a tighter multiplier/shift pair exists.
//! [`MagicDivisor::synthesize`] searches for it directly.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bit_width;

/// Fast-division synthesis failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DivisorError {
    #[error("divisor must be greater than zero")]
    ZeroDivisor,

    #[error("no multiplier/shift pair divides by {divisor} for dividends up to {bound}")]
    SearchExhausted { divisor: u32, bound: u32 },

    #[error("multiplier for divisor {divisor} (bound {bound}) does not fit in 32 bits")]
    MultiplierOverflow { divisor: u32, bound: u32 },
}

/// A multiply/shift pair reproducing `n / divisor` for every `n` in `[0, bound]`.
///
/// Kernels evaluate `(n * multiplier) >> shift` with a widening multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MagicDivisor {
    pub multiplier: u32,
    pub shift: u32,
}

impl MagicDivisor {
    /// Division by one: `(1, 0)`.
    pub const IDENTITY: Self = Self { multiplier: 1, shift: 0 };

    /// Synthesize the pair for `divisor` over dividends `0..=bound`.
    ///
    /// `nc` is the top of the last complete `divisor`-aligned block inside
    /// the range (or `divisor - 1` when the range holds no complete block).
    /// The smallest shift `s` with `2^s > nc * ((divisor - 1) - (2^s - 1) % divisor)`
    /// is accepted; the search covers `2 * bit_width(bound) + 1` shifts.
    pub fn synthesize(divisor: u32, bound: u32) -> Result<Self, DivisorError> {
        if divisor == 0 {
            return Err(DivisorError::ZeroDivisor);
        }
        if divisor == 1 {
            return Ok(Self::IDENTITY);
        }

        let d = u128::from(divisor);
        let blocks = (u128::from(bound) + 1) / d;
        let nc = if blocks == 0 { d - 1 } else { blocks * d - 1 };
        let range = 2 * bit_width(bound) + 1;

        for shift in 0..range {
            let exp = 1u128 << shift;
            let rem = (d - 1) - (exp - 1) % d;
            if exp > nc * rem {
                let multiplier = u32::try_from((exp + rem) / d)
                    .map_err(|_| DivisorError::MultiplierOverflow { divisor, bound })?;
                return Ok(Self { multiplier, shift });
            }
        }

        Err(DivisorError::SearchExhausted { divisor, bound })
    }

    /// Quotient of `n` as the kernels compute it.
    #[inline]
    #[must_use]
    pub const fn divide(self, n: u32) -> u32 {
        ((n as u128 * self.multiplier as u128) >> self.shift) as u32
    }

    /// First dividend in `[0, bound]` where the pair disagrees with `n / divisor`.
    ///
    /// Exhaustive; callers decide how large a bound is worth checking.
    #[must_use]
    pub fn counterexample(self, divisor: u32, bound: u32) -> Option<u32> {
        if divisor == 0 {
            return Some(0);
        }
        (0..=bound).find(|&n| self.divide(n) != n / divisor)
    }
}

impl Default for MagicDivisor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for MagicDivisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(m={}, s={})", self.multiplier, self.shift)
    }
}
