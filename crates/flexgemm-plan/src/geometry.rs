//! Padded GEMM geometry of a generic convolution.

use serde::{Deserialize, Serialize};

use crate::descriptor::{Direction, Extent2, ProblemDescriptor};
use crate::error::{PlanError, Result};

/// Largest value an 8-bit pad lane holds.
pub const PAD_LANE_MAX: u32 = 0xff;
/// Largest value a 6-bit stride or dilation lane holds.
pub const STRIDE_LANE_MAX: u32 = 0x3f;

/// Dimensions the generic routines see once the convolution is lowered to a GEMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConvGeometry {
    /// Effective padding. Backward-data pads by `kernel - pad - 1`.
    pub pad: Extent2,
    /// Input extents plus twice the effective padding.
    pub padded: Extent2,
    /// Reduction depth: kernel area times input channels.
    pub k: u32,
    /// Output channels.
    pub n: u32,
    /// Output pixels per image.
    pub ldc: u32,
    /// Output pixels across the batch.
    pub m: u32,
}

impl ConvGeometry {
    pub fn resolve(desc: &ProblemDescriptor) -> Result<Self> {
        let pad = match desc.direction {
            Direction::Forward => desc.pad,
            Direction::BackwardData => Extent2::new(
                desc.kernel.width.saturating_sub(desc.pad.width.saturating_add(1)),
                desc.kernel.height.saturating_sub(desc.pad.height.saturating_add(1)),
            ),
        };

        let padded_axis = |input: u32, pad: u32, quantity| {
            checked(pad.checked_mul(2).and_then(|twice| input.checked_add(twice)), quantity)
        };
        let padded = Extent2::new(
            padded_axis(desc.input.width, pad.width, "padded width")?,
            padded_axis(desc.input.height, pad.height, "padded height")?,
        );
        let k = checked(
            desc.kernel.area_checked().and_then(|area| area.checked_mul(desc.in_channels)),
            "reduction depth",
        )?;
        let ldc = checked(desc.output.area_checked(), "output area")?;
        let m = checked(ldc.checked_mul(desc.batch), "row count")?;

        Ok(Self { pad, padded, k, n: desc.out_channels, ldc, m })
    }

    #[inline]
    #[must_use]
    pub const fn has_padding(&self) -> bool {
        !self.pad.is_zero()
    }

    /// Padding word: `pv<<24 | pv<<16 | pu<<8 | pu`, one 8-bit lane per edge.
    pub fn packed_pad(&self) -> Result<u32> {
        let pu = lane(self.pad.width, PAD_LANE_MAX, "horizontal pad")?;
        let pv = lane(self.pad.height, PAD_LANE_MAX, "vertical pad")?;
        Ok((pv << 24) | (pv << 16) | (pu << 8) | pu)
    }
}

/// Stride/dilation word: `dv<<18 | du<<12 | sv<<6 | su`, one 6-bit lane each.
pub fn pack_stride_dilation(stride: Extent2, dilation: Extent2) -> Result<u32> {
    let su = lane(stride.width, STRIDE_LANE_MAX, "horizontal stride")?;
    let sv = lane(stride.height, STRIDE_LANE_MAX, "vertical stride")?;
    let du = lane(dilation.width, STRIDE_LANE_MAX, "horizontal dilation")?;
    let dv = lane(dilation.height, STRIDE_LANE_MAX, "vertical dilation")?;
    Ok((dv << 18) | (du << 12) | (sv << 6) | su)
}

fn lane(value: u32, max: u32, quantity: &'static str) -> Result<u32> {
    if value > max { Err(PlanError::LaneOverflow { quantity, value, max }) } else { Ok(value) }
}

pub(crate) fn checked(value: Option<u32>, quantity: &'static str) -> Result<u32> {
    value.ok_or(PlanError::Overflow { quantity })
}
