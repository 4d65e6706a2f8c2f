//! Execution planner for GEMM-lowered convolutions.
//!
//! Given a [`ProblemDescriptor`], the planner picks the compute routine,
//! the tiled problem dimensions that routine expects, its scratch-buffer
//! sizes and the fast-division constants it uses to decompose flattened
//! tile indices. Nothing is executed or allocated.
//!
//! ```
//! use flexgemm_plan::{Extent2, ProblemDescriptor, plan};
//!
//! let desc = ProblemDescriptor::new(1, 3, 64, Extent2::square(32), Extent2::square(3), Extent2::square(32))
//!     .with_pad(Extent2::square(1));
//! let plan = plan(&desc)?;
//! assert_eq!(plan.routine_id().get(), 0);
//! assert_eq!(plan.aux_buffer_size(), 23_040);
//! # Ok::<(), flexgemm_plan::PlanError>(())
//! ```

pub mod alignment;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod geometry;
pub mod plan;
pub mod planner;
pub mod routine;
pub mod scratch;

pub use alignment::{AlignmentMask, get_alignment, unit_filter_alignment};
pub use config::{ConfigBuilder, PlannerConfig};
pub use descriptor::{Direction, Extent2, ParseExtentError, ProblemDescriptor};
pub use error::{PlanError, Result};
pub use flexgemm_math::{DivisorError, MagicDivisor};
pub use geometry::{ConvGeometry, PAD_LANE_MAX, STRIDE_LANE_MAX, pack_stride_dilation};
pub use plan::{ConvPlan, Plan, UnitFilterPlan, build_conv_plan, build_unit_filter_plan, plan};
pub use planner::Planner;
pub use routine::{
    LaneMode, RoutineFamily, RoutineId, UnitFilterRoutine, select_backward, select_forward,
    select_generic, select_unit_filter,
};
pub use scratch::{ScratchLayout, ScratchSizes, aux_buffer_size, scratch_layout};
