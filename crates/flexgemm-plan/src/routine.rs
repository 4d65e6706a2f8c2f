//! Routine selection.
//!
//! Three cost-model-free decision tables, one per family, mapping the
//! divisibility class of the problem to a routine id. The compiled compute
//! routines are written against these exact ids, so every branch below must
//! stay bit-for-bit stable.

use std::fmt;

use flexgemm_math::ceil_div;
use serde::{Deserialize, Serialize};

use crate::descriptor::{Direction, ProblemDescriptor};

// ---------------------------------------------------------------------------
// Families and ids
// ---------------------------------------------------------------------------

/// Convolution family a routine id belongs to. Ids are not comparable across families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineFamily {
    /// 1x1 kernel, unit stride/dilation, no padding.
    UnitFilter,
    /// Generic forward convolution.
    Forward,
    /// Generic backward-data convolution.
    Backward,
}

impl RoutineFamily {
    /// Generic family for a direction.
    #[must_use]
    pub const fn generic(direction: Direction) -> Self {
        match direction {
            Direction::Forward => Self::Forward,
            Direction::BackwardData => Self::Backward,
        }
    }

    /// Family whose routines can execute `desc`.
    #[must_use]
    pub fn classify(desc: &ProblemDescriptor) -> Self {
        if desc.is_unit_filter() { Self::UnitFilter } else { Self::generic(desc.direction) }
    }

    /// Largest id the family's selector returns.
    #[must_use]
    pub const fn max_id(self) -> u8 {
        match self {
            Self::UnitFilter => 3,
            Self::Forward => 4,
            Self::Backward => 3,
        }
    }

    /// Id of the routine with the strictest alignment requirements (generic families only).
    #[must_use]
    pub const fn most_aligned(self) -> Option<RoutineId> {
        match self {
            Self::UnitFilter => None,
            Self::Forward => Some(RoutineId(4)),
            Self::Backward => Some(RoutineId(3)),
        }
    }
}

impl fmt::Display for RoutineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnitFilter => write!(f, "unit-filter"),
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
        }
    }
}

/// Per-family routine identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutineId(u8);

impl RoutineId {
    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Residue class of the unit-filter row count `m` modulo 4.
///
/// Tells the row-tiling bookkeeping how many elements each lane consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneMode {
    /// `m` odd: one element per lane.
    Single,
    /// `m ≡ 2 (mod 4)`: two elements per lane.
    Pair,
    /// `m ≡ 0 (mod 4)`: four elements per lane.
    Quad,
}

impl LaneMode {
    #[must_use]
    pub const fn of(m: u32) -> Self {
        if m % 2 != 0 {
            Self::Single
        } else if m % 4 != 0 {
            Self::Pair
        } else {
            Self::Quad
        }
    }

    /// Value packed into the high half of the routine word.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Single => 0,
            Self::Pair => 1,
            Self::Quad => 2,
        }
    }
}

/// Unit-filter selection: routine id plus the lane mode of `m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitFilterRoutine {
    pub id: RoutineId,
    pub lanes: LaneMode,
}

impl UnitFilterRoutine {
    /// Routine word as passed to the kernel: `(mode << 16) | id`.
    #[inline]
    #[must_use]
    pub const fn packed(self) -> u32 {
        (self.lanes.value() << 16) | self.id.0 as u32
    }
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Alignment class shared by the unit-filter and forward bases:
/// 2 when `blocks % 4 == 0` and `k % 16 == 0`, 1 when `blocks % 4 == 0` or
/// `blocks` is even, 0 otherwise.
const fn alignment_class(blocks: u32, k: u32) -> u8 {
    if blocks % 4 == 0 {
        if k % 16 == 0 { 2 } else { 1 }
    } else if blocks % 2 == 0 {
        1
    } else {
        0
    }
}

/// Narrow, odd-sized output-channel counts fall back to a narrow routine.
const fn is_narrow_odd(n: u32) -> bool {
    ceil_div(n, 16) % 2 != 0 && n <= 112
}

/// Unit-filter selector over rows `m`, output channels `n` and depth `k`. Ids `0..=3`.
#[must_use]
pub fn select_unit_filter(m: u32, n: u32, k: u32, direction: Direction) -> UnitFilterRoutine {
    let lanes = LaneMode::of(m);
    let mut id = 1 + alignment_class(ceil_div(n, 32), k);
    if is_narrow_odd(n) {
        id = 0;
    }
    if !direction.is_forward() && id != 0 && n % 4 != 0 {
        // Backward vectorizes over n; only n % 4 == 0 keeps the wide routine.
        id = if n % 2 != 0 { 1 } else { 2 };
    }
    UnitFilterRoutine { id: RoutineId(id), lanes }
}

/// Generic-forward selector over output channels `n` and depth `k`. Ids `0..=4`.
#[must_use]
pub fn select_forward(n: u32, k: u32) -> RoutineId {
    if is_narrow_odd(n) {
        return RoutineId(1);
    }
    if k % 8 != 0 {
        return RoutineId(0);
    }
    RoutineId(2 + alignment_class(ceil_div(n, 32), k))
}

/// Generic-backward selector over output channels `n`. Ids `0..=3`.
#[must_use]
pub fn select_backward(n: u32) -> RoutineId {
    let s = ceil_div(n, 16);
    let id = if s % 8 == 0 {
        3
    } else if s % 4 == 0 {
        2
    } else if s % 2 == 0 {
        1
    } else {
        0
    };
    RoutineId(id)
}

/// Generic selector for a direction.
#[must_use]
pub fn select_generic(direction: Direction, n: u32, k: u32) -> RoutineId {
    match direction {
        Direction::Forward => select_forward(n, k),
        Direction::BackwardData => select_backward(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::get_alignment;

    #[test]
    fn lane_mode_follows_residue() {
        assert_eq!(LaneMode::of(49), LaneMode::Single);
        assert_eq!(LaneMode::of(50), LaneMode::Pair);
        assert_eq!(LaneMode::of(3136), LaneMode::Quad);
    }

    #[test]
    fn unit_filter_table() {
        // n = 128: s = 4, t = 8.
        assert_eq!(select_unit_filter(3136, 128, 64, Direction::Forward).id, RoutineId(3));
        assert_eq!(select_unit_filter(3136, 128, 24, Direction::Forward).id, RoutineId(2));
        // n = 64: s = 2 (even), t = 4.
        assert_eq!(select_unit_filter(196, 64, 24, Direction::Forward).id, RoutineId(2));
        // n = 160: s = 5 (odd), t = 10.
        assert_eq!(select_unit_filter(196, 160, 24, Direction::Forward).id, RoutineId(1));
        // n = 48: t = 3 odd and n <= 112.
        assert_eq!(select_unit_filter(49, 48, 32, Direction::Forward).id, RoutineId(0));
        // n = 144: t = 9 odd but n > 112.
        assert_eq!(select_unit_filter(49, 144, 32, Direction::Forward).id, RoutineId(1));
    }

    #[test]
    fn unit_filter_backward_overrides() {
        // n = 114: base 3 forward, n % 4 == 2 -> 2 backward.
        assert_eq!(select_unit_filter(784, 114, 64, Direction::Forward).id, RoutineId(3));
        assert_eq!(select_unit_filter(784, 114, 64, Direction::BackwardData).id, RoutineId(2));
        // n = 113: odd -> 1.
        assert_eq!(select_unit_filter(784, 113, 64, Direction::BackwardData).id, RoutineId(1));
        // n = 116 and 128: kept.
        assert_eq!(select_unit_filter(784, 116, 64, Direction::BackwardData).id, RoutineId(3));
        assert_eq!(select_unit_filter(784, 128, 64, Direction::BackwardData).id, RoutineId(3));
        // n = 130: base 1, n % 4 == 2 -> 2.
        assert_eq!(select_unit_filter(784, 130, 64, Direction::Forward).id, RoutineId(1));
        assert_eq!(select_unit_filter(784, 130, 64, Direction::BackwardData).id, RoutineId(2));
        // id 0 is never overridden.
        assert_eq!(select_unit_filter(784, 47, 64, Direction::BackwardData).id, RoutineId(0));
    }

    #[test]
    fn unit_filter_packed_word() {
        let routine = select_unit_filter(3136, 128, 64, Direction::Forward);
        assert_eq!(routine.packed(), 0x2_0003);
        let routine = select_unit_filter(49, 48, 32, Direction::Forward);
        assert_eq!(routine.packed(), 0);
    }

    #[test]
    fn forward_table() {
        assert_eq!(select_forward(64, 27), RoutineId(0));
        assert_eq!(select_forward(128, 144), RoutineId(4));
        assert_eq!(select_forward(128, 72), RoutineId(3));
        assert_eq!(select_forward(64, 72), RoutineId(3));
        assert_eq!(select_forward(160, 72), RoutineId(2));
        assert_eq!(select_forward(16, 72), RoutineId(1));
        assert_eq!(select_forward(112, 72), RoutineId(1));
        assert_eq!(select_forward(144, 72), RoutineId(2));
    }

    #[test]
    fn forward_narrow_override_wins_over_unaligned_depth() {
        // 3 -> 16 channels with a 3x3 kernel: k = 27, narrow n keeps routine 1.
        assert_eq!(select_forward(16, 27), RoutineId(1));
        assert_eq!(get_alignment(select_forward(16, 27), Direction::Forward).mask(), 127);
        assert_eq!(select_forward(48, 27), RoutineId(1));
        assert_eq!(select_forward(128, 27), RoutineId(0));
        assert_eq!(select_forward(32, 27), RoutineId(0));
    }

    #[test]
    fn backward_ladder() {
        assert_eq!(select_backward(16), RoutineId(0));
        assert_eq!(select_backward(32), RoutineId(1));
        assert_eq!(select_backward(64), RoutineId(2));
        assert_eq!(select_backward(128), RoutineId(3));
        assert_eq!(select_backward(129), RoutineId(0));
        assert_eq!(select_backward(96), RoutineId(1));
    }

    #[test]
    fn family_most_aligned() {
        assert_eq!(RoutineFamily::Forward.most_aligned(), Some(RoutineId(4)));
        assert_eq!(RoutineFamily::Backward.most_aligned(), Some(RoutineId(3)));
        assert_eq!(RoutineFamily::UnitFilter.most_aligned(), None);
    }
}
