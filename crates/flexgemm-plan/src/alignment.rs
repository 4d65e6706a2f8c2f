//! Tile alignment of the flattened row count.

use std::fmt;

use flexgemm_math::align_up;
use serde::{Deserialize, Serialize};

use crate::descriptor::Direction;
use crate::routine::RoutineId;

/// Rounding granularity for the row-tile count, stored as its mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
#[repr(u32)]
pub enum AlignmentMask {
    /// 128-row tiles.
    Tile128 = 127,
    /// 256-row tiles.
    Tile256 = 255,
}

impl AlignmentMask {
    #[inline]
    #[must_use]
    pub const fn mask(self) -> u32 {
        self as u32
    }

    /// Round `rows` up to the tile boundary, or `None` past `u32::MAX`.
    #[inline]
    #[must_use]
    pub const fn align(self, rows: u32) -> Option<u32> {
        if rows > u32::MAX - self.mask() { None } else { Some(align_up(rows, self.mask())) }
    }
}

impl From<AlignmentMask> for u32 {
    fn from(mask: AlignmentMask) -> Self {
        mask.mask()
    }
}

impl TryFrom<u32> for AlignmentMask {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            127 => Ok(Self::Tile128),
            255 => Ok(Self::Tile256),
            other => Err(format!("alignment mask must be 127 or 255, got {other}")),
        }
    }
}

impl fmt::Display for AlignmentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mask())
    }
}

/// Alignment of a generic-family routine.
///
/// Forward ids 1 and 4 and backward ids 0 and 3 tile by 128 rows; every other
/// routine tiles by 256.
#[must_use]
pub fn get_alignment(id: RoutineId, direction: Direction) -> AlignmentMask {
    let narrow = match direction {
        Direction::Forward => matches!(id.get(), 1 | 4),
        Direction::BackwardData => matches!(id.get(), 0 | 3),
    };
    if narrow { AlignmentMask::Tile128 } else { AlignmentMask::Tile256 }
}

/// Alignment of a unit-filter routine: ids 1 and 2 tile by 256, ids 0 and 3 by 128.
#[must_use]
pub fn unit_filter_alignment(id: RoutineId) -> AlignmentMask {
    if matches!(id.get(), 1 | 2) { AlignmentMask::Tile256 } else { AlignmentMask::Tile128 }
}
