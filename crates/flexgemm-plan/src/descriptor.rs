//! Convolution problem descriptors as supplied by the tensor layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convolution direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    BackwardData,
}

impl Direction {
    #[inline]
    #[must_use]
    pub const fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }

    /// Kernel-argument flag: 0 forward, 1 backward-data.
    #[inline]
    #[must_use]
    pub const fn flag(self) -> u32 {
        match self {
            Self::Forward => 0,
            Self::BackwardData => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::BackwardData => write!(f, "backward-data"),
        }
    }
}

/// A pair of per-axis values, `width` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2 {
    pub width: u32,
    pub height: u32,
}

impl Extent2 {
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    #[must_use]
    pub const fn square(side: u32) -> Self {
        Self { width: side, height: side }
    }

    /// `width * height`, `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn area_checked(self) -> Option<u32> {
        self.width.checked_mul(self.height)
    }

    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.width == 0 && self.height == 0
    }
}

impl fmt::Display for Extent2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Failure parsing an [`Extent2`] from `"WxH"` or `"N"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid extent '{input}', expected WxH or N")]
pub struct ParseExtentError {
    pub input: String,
}

impl FromStr for Extent2 {
    type Err = ParseExtentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseExtentError { input: s.to_string() };
        let lower = s.trim().to_ascii_lowercase();
        match lower.split_once('x') {
            Some((w, h)) => {
                let width = w.trim().parse().map_err(|_| err())?;
                let height = h.trim().parse().map_err(|_| err())?;
                Ok(Self { width, height })
            }
            None => lower.parse().map(Self::square).map_err(|_| err()),
        }
    }
}

/// Shape, geometry and direction of one convolution.
///
/// Read-only to the planner. Counts are expected to be positive and kernel
/// extents at least one; the planner does not re-validate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProblemDescriptor {
    pub batch: u32,
    pub in_channels: u32,
    pub out_channels: u32,
    pub input: Extent2,
    pub kernel: Extent2,
    pub output: Extent2,
    #[serde(default)]
    pub pad: Extent2,
    #[serde(default = "unit_extent")]
    pub stride: Extent2,
    #[serde(default = "unit_extent")]
    pub dilation: Extent2,
    #[serde(default = "one")]
    pub groups: u32,
    #[serde(default)]
    pub direction: Direction,
}

fn unit_extent() -> Extent2 {
    Extent2::square(1)
}

fn one() -> u32 {
    1
}

impl ProblemDescriptor {
    /// Descriptor with unit stride and dilation, no padding, one group, forward.
    #[must_use]
    pub fn new(
        batch: u32,
        in_channels: u32,
        out_channels: u32,
        input: Extent2,
        kernel: Extent2,
        output: Extent2,
    ) -> Self {
        Self {
            batch,
            in_channels,
            out_channels,
            input,
            kernel,
            output,
            pad: Extent2::default(),
            stride: unit_extent(),
            dilation: unit_extent(),
            groups: 1,
            direction: Direction::Forward,
        }
    }

    #[must_use]
    pub fn with_pad(mut self, pad: Extent2) -> Self {
        self.pad = pad;
        self
    }

    #[must_use]
    pub fn with_stride(mut self, stride: Extent2) -> Self {
        self.stride = stride;
        self
    }

    #[must_use]
    pub fn with_dilation(mut self, dilation: Extent2) -> Self {
        self.dilation = dilation;
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: u32) -> Self {
        self.groups = groups;
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// 1x1 kernel, unit stride and dilation, no padding, input extents equal output extents.
    #[must_use]
    pub fn is_unit_filter(&self) -> bool {
        self.kernel == Extent2::square(1)
            && self.stride == Extent2::square(1)
            && self.dilation == Extent2::square(1)
            && self.pad.is_zero()
            && self.input == self.output
    }
}
