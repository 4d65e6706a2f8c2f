//! Scratch-buffer sizing for the generic routines.
//!
//! A generic routine may need up to three device buffers:
//!
//! - a padding buffer holding the zero-padded input (only when padding is present),
//! - a permutation buffer holding the re-laid-out filter (backward-data only),
//! - an index buffer holding per-tile offsets (always).
//!
//! All sizes are in bytes.

use serde::{Deserialize, Serialize};

use crate::alignment::{AlignmentMask, get_alignment};
use crate::descriptor::ProblemDescriptor;
use crate::error::Result;
use crate::geometry::{ConvGeometry, checked};
use crate::routine::{RoutineFamily, RoutineId, select_generic};

/// Padding-buffer pitches above this many elements are re-strided.
const LDA_RESTRIDE_THRESHOLD: u32 = 1024;

/// Byte sizes of the three scratch buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScratchSizes {
    pub padding: u64,
    pub permutation: u64,
    pub index: u64,
}

impl ScratchSizes {
    #[inline]
    #[must_use]
    pub const fn total(self) -> u64 {
        self.padding + self.permutation + self.index
    }
}

/// Tiling quantities derived alongside the scratch sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScratchLayout {
    /// Row count rounded to the routine's tile alignment.
    pub ntidx: u32,
    /// Padding-buffer row pitch.
    pub lda: u32,
    /// Padding-buffer pitch per input channel group: `lda * in_channels`.
    pub ags: u32,
    /// Reduction depth rounded to the routine's granularity.
    pub pk: u32,
    pub sizes: ScratchSizes,
}

/// Size the scratch buffers for a generic routine.
pub fn scratch_layout(
    desc: &ProblemDescriptor,
    geometry: &ConvGeometry,
    id: RoutineId,
    mask: AlignmentMask,
) -> Result<ScratchLayout> {
    let family = RoutineFamily::generic(desc.direction);
    let padded = geometry.has_padding();

    let ntidx = checked(mask.align(geometry.m), "tile count")?;

    let mut lda = checked(geometry.padded.area_checked(), "padded area")?;
    if padded {
        lda = checked(lda.checked_mul(desc.batch), "padding pitch")?;
        if lda > LDA_RESTRIDE_THRESHOLD {
            // Round up to an odd multiple of 64.
            let mut blocks = lda.div_ceil(64);
            if blocks % 2 == 0 {
                blocks += 1;
            }
            lda = checked(blocks.checked_mul(64), "padding pitch")?;
        }
    }

    let granularity = if family.most_aligned() == Some(id) { 16 } else { 8 };
    let pk = checked(geometry.k.checked_next_multiple_of(granularity), "padded depth")?;
    let ags = checked(lda.checked_mul(desc.in_channels), "padding group pitch")?;

    let groups = u64::from(desc.groups);
    let padding = if padded { groups * 4 * u64::from(ags) } else { 0 };
    let permutation = if desc.direction.is_forward() {
        0
    } else {
        groups * 4 * u64::from(pk) * u64::from(geometry.n).next_multiple_of(4)
    };
    let index = u64::from(ntidx) * 8 + u64::from(pk) * 4 + 128;

    Ok(ScratchLayout { ntidx, lda, ags, pk, sizes: ScratchSizes { padding, permutation, index } })
}

/// Total scratch bytes a generic routine needs for `desc`, without building the plan.
pub fn aux_buffer_size(desc: &ProblemDescriptor) -> Result<u64> {
    let geometry = ConvGeometry::resolve(desc)?;
    let id = select_generic(desc.direction, geometry.n, geometry.k);
    let layout = scratch_layout(desc, &geometry, id, get_alignment(id, desc.direction))?;
    Ok(layout.sizes.total())
}
