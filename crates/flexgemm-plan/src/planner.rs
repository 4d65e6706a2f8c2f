//! Plan construction.
//!
//! Each builder runs the same pipeline: routine selection, alignment,
//! scratch sizing, then fast-division synthesis for the tile-index
//! decomposition the routine performs.

use flexgemm_math::MagicDivisor;
use tracing::{debug, trace, warn};

use crate::alignment::{get_alignment, unit_filter_alignment};
use crate::config::PlannerConfig;
use crate::descriptor::ProblemDescriptor;
use crate::error::{PlanError, Result};
use crate::geometry::{ConvGeometry, checked, pack_stride_dilation};
use crate::plan::{ConvPlan, Plan, UnitFilterPlan};
use crate::routine::{RoutineFamily, UnitFilterRoutine, select_generic, select_unit_filter};
use crate::scratch::scratch_layout;

/// Shift applied before synthesizing the unit-filter `amag`, by `[id][lane mode]`.
static TILE_SHIFT: [[u32; 3]; 4] = [[0, 1, 2], [0, 1, 2], [0, 1, 2], [0, 1, 2]];

/// Shift applied before synthesizing the unit-filter `cmag`, by `[id][lane mode]`.
static ROW_SHIFT: [[u32; 3]; 4] = [[0, 0, 0], [0, 0, 0], [0, 0, 0], [0, 1, 1]];

fn lane_shifts(routine: UnitFilterRoutine) -> (u32, u32) {
    let id = usize::from(routine.id.get());
    let mode = routine.lanes.value() as usize;
    (TILE_SHIFT[id][mode], ROW_SHIFT[id][mode])
}

/// Builds execution plans under a [`PlannerConfig`].
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Classify `desc` and build the matching plan.
    pub fn plan(&self, desc: &ProblemDescriptor) -> Result<Plan> {
        match RoutineFamily::classify(desc) {
            RoutineFamily::UnitFilter => self.plan_unit_filter(desc).map(Plan::UnitFilter),
            RoutineFamily::Forward | RoutineFamily::Backward => self.plan_conv(desc).map(Plan::Conv),
        }
    }

    /// Plan `desc` as a 1x1 convolution.
    ///
    /// Kernel, stride, dilation and padding are not consulted; callers
    /// use [`RoutineFamily::classify`] (or [`Planner::plan`]) to decide
    /// whether the unit-filter routines apply.
    pub fn plan_unit_filter(&self, desc: &ProblemDescriptor) -> Result<UnitFilterPlan> {
        let m = checked(desc.input.area_checked(), "pixel count")?;
        let n = desc.out_channels;
        let k = desc.in_channels;

        let routine = select_unit_filter(m, n, k, desc.direction);
        let (sx, sy) = lane_shifts(routine);
        let alignment = unit_filter_alignment(routine.id);

        let dimx = checked(m.checked_mul(desc.batch), "row count")?;
        let ntidx = checked(alignment.align(dimx), "tile count")?;

        let amag = self.divisor("unit-filter tile index", m >> sx, ntidx >> sx)?;
        let cmag = if sx != sy {
            Some(self.divisor("unit-filter row index", m >> sy, ntidx >> sy)?)
        } else {
            None
        };

        debug!(
            "Built unit-filter plan: routine={} lanes={:?} m={} n={} k={} ntidx={}",
            routine.id, routine.lanes, m, n, k, ntidx
        );

        Ok(UnitFilterPlan {
            direction: desc.direction,
            groups: desc.groups,
            batch: desc.batch,
            m,
            n,
            k,
            routine,
            alignment,
            sx,
            sy,
            dimx,
            ntidx,
            amag,
            cmag,
        })
    }

    /// Plan `desc` for the generic forward or backward-data routines.
    pub fn plan_conv(&self, desc: &ProblemDescriptor) -> Result<ConvPlan> {
        let geometry = ConvGeometry::resolve(desc)?;
        let routine = select_generic(desc.direction, geometry.n, geometry.k);
        let alignment = get_alignment(routine, desc.direction);
        let layout = scratch_layout(desc, &geometry, routine, alignment)?;

        let amag = self.divisor("image index", geometry.ldc, layout.ntidx)?;
        let cmag = if geometry.ldc != desc.output.width {
            Some(self.divisor("output row index", desc.output.width, geometry.ldc)?)
        } else {
            None
        };

        let plan = ConvPlan {
            direction: desc.direction,
            groups: desc.groups,
            batch: desc.batch,
            in_channels: desc.in_channels,
            input: desc.input,
            kernel: desc.kernel,
            output: desc.output,
            padded: geometry.padded,
            k: geometry.k,
            n: geometry.n,
            m: geometry.m,
            ldc: geometry.ldc,
            routine,
            alignment,
            ntidx: layout.ntidx,
            pad: geometry.packed_pad()?,
            sd: pack_stride_dilation(desc.stride, desc.dilation)?,
            lda: layout.lda,
            ags: layout.ags,
            pk: layout.pk,
            scratch: layout.sizes,
            amag,
            cmag,
        };

        debug!(
            "Built {} plan: routine={} k={} n={} m={} ntidx={} aux_bytes={}",
            RoutineFamily::generic(desc.direction),
            routine,
            plan.k,
            plan.n,
            plan.m,
            plan.ntidx,
            plan.aux_buffer_size()
        );

        Ok(plan)
    }

    fn divisor(&self, context: &'static str, divisor: u32, bound: u32) -> Result<MagicDivisor> {
        let magic = MagicDivisor::synthesize(divisor, bound).map_err(|source| {
            warn!("Fast-division synthesis failed for {}: {}", context, source);
            PlanError::Divisor { context, source }
        })?;
        trace!("Synthesized {} divisor {} over [0, {}]: {}", context, divisor, bound, magic);

        if self.config.verify_divisors
            && bound <= self.config.verify_limit
            && let Some(dividend) = magic.counterexample(divisor, bound)
        {
            warn!("Divisor {} for {} fails at dividend {}", magic, context, dividend);
            return Err(PlanError::DivisorMismatch {
                divisor,
                bound,
                dividend,
                multiplier: magic.multiplier,
                shift: magic.shift,
            });
        }

        Ok(magic)
    }
}
