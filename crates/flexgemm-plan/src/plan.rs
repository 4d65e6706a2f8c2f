//! Execution plans and the builders that produce them.

use flexgemm_math::MagicDivisor;
use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentMask;
use crate::descriptor::{Direction, Extent2, ProblemDescriptor};
use crate::error::Result;
use crate::planner::Planner;
use crate::routine::{RoutineFamily, RoutineId, UnitFilterRoutine};
use crate::scratch::ScratchSizes;

/// Plan for a 1x1 convolution executed as a plain GEMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFilterPlan {
    pub direction: Direction,
    pub groups: u32,
    pub batch: u32,
    /// Pixels per image.
    pub m: u32,
    pub n: u32,
    pub k: u32,
    pub routine: UnitFilterRoutine,
    pub alignment: AlignmentMask,
    /// Shift applied to `m` and `ntidx` before synthesizing `amag`.
    pub sx: u32,
    /// Shift applied to `m` and `ntidx` before synthesizing `cmag`.
    pub sy: u32,
    /// Pixels across the batch.
    pub dimx: u32,
    pub ntidx: u32,
    pub amag: MagicDivisor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmag: Option<MagicDivisor>,
}

/// Plan for a generic convolution lowered to an implicit GEMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvPlan {
    pub direction: Direction,
    pub groups: u32,
    pub batch: u32,
    pub in_channels: u32,
    pub input: Extent2,
    pub kernel: Extent2,
    pub output: Extent2,
    pub padded: Extent2,
    pub k: u32,
    pub n: u32,
    pub m: u32,
    pub ldc: u32,
    pub routine: RoutineId,
    pub alignment: AlignmentMask,
    pub ntidx: u32,
    /// Packed effective padding, see [`crate::geometry::ConvGeometry::packed_pad`].
    pub pad: u32,
    /// Packed stride and dilation, see [`crate::geometry::pack_stride_dilation`].
    pub sd: u32,
    pub lda: u32,
    pub ags: u32,
    pub pk: u32,
    pub scratch: ScratchSizes,
    /// Tile index to image: divisor `ldc`, bound `ntidx`.
    pub amag: MagicDivisor,
    /// Pixel to output row: divisor `output.width`, bound `ldc`. Absent for single-row outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmag: Option<MagicDivisor>,
}

impl ConvPlan {
    /// Total scratch bytes the routine needs.
    #[inline]
    #[must_use]
    pub const fn aux_buffer_size(&self) -> u64 {
        self.scratch.total()
    }
}

/// A plan from either family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Plan {
    UnitFilter(UnitFilterPlan),
    Conv(ConvPlan),
}

impl Plan {
    #[must_use]
    pub fn family(&self) -> RoutineFamily {
        match self {
            Self::UnitFilter(_) => RoutineFamily::UnitFilter,
            Self::Conv(p) => RoutineFamily::generic(p.direction),
        }
    }

    #[must_use]
    pub fn routine_id(&self) -> RoutineId {
        match self {
            Self::UnitFilter(p) => p.routine.id,
            Self::Conv(p) => p.routine,
        }
    }

    #[must_use]
    pub fn ntidx(&self) -> u32 {
        match self {
            Self::UnitFilter(p) => p.ntidx,
            Self::Conv(p) => p.ntidx,
        }
    }

    /// Scratch bytes; unit-filter routines need none.
    #[must_use]
    pub fn aux_buffer_size(&self) -> u64 {
        match self {
            Self::UnitFilter(_) => 0,
            Self::Conv(p) => p.aux_buffer_size(),
        }
    }
}

/// Build the unit-filter plan for `desc` with the default planner.
pub fn build_unit_filter_plan(desc: &ProblemDescriptor) -> Result<UnitFilterPlan> {
    Planner::default().plan_unit_filter(desc)
}

/// Build the generic plan for `desc` with the default planner.
pub fn build_conv_plan(desc: &ProblemDescriptor) -> Result<ConvPlan> {
    Planner::default().plan_conv(desc)
}

/// Classify `desc` and build the matching plan with the default planner.
pub fn plan(desc: &ProblemDescriptor) -> Result<Plan> {
    Planner::default().plan(desc)
}
