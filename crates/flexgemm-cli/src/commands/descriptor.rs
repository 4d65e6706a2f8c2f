//! Problem descriptor arguments shared by `plan` and `aux-size`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use flexgemm_plan::{Direction, Extent2, ProblemDescriptor};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DirectionArg {
    #[default]
    Forward,
    #[value(alias = "backward")]
    BackwardData,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Forward => Direction::Forward,
            DirectionArg::BackwardData => Direction::BackwardData,
        }
    }
}

/// A convolution given either as a JSON/TOML file or as geometry flags.
#[derive(Debug, Clone, Args)]
pub struct DescriptorArgs {
    /// Read the descriptor from a JSON or TOML file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["in_channels", "out_channels", "input"])]
    pub descriptor: Option<PathBuf>,

    /// Batch size
    #[arg(short = 'b', long, default_value_t = 1)]
    pub batch: u32,

    /// Input channels
    #[arg(long, value_name = "N", required_unless_present = "descriptor")]
    pub in_channels: Option<u32>,

    /// Output channels
    #[arg(long, value_name = "N", required_unless_present = "descriptor")]
    pub out_channels: Option<u32>,

    /// Input extent, WxH or N
    #[arg(long, value_name = "WxH", required_unless_present = "descriptor")]
    pub input: Option<Extent2>,

    /// Kernel extent, WxH or N
    #[arg(long, value_name = "WxH", default_value = "1")]
    pub kernel: Extent2,

    /// Output extent, WxH or N (derived from the other geometry when omitted)
    #[arg(long, value_name = "WxH")]
    pub output: Option<Extent2>,

    /// Padding per axis, WxH or N (at most 255 for the generic routines)
    #[arg(long, value_name = "WxH", default_value = "0")]
    pub pad: Extent2,

    /// Stride per axis, WxH or N (at most 63)
    #[arg(long, value_name = "WxH", default_value = "1")]
    pub stride: Extent2,

    /// Dilation per axis, WxH or N (at most 63)
    #[arg(long, value_name = "WxH", default_value = "1")]
    pub dilation: Extent2,

    /// Group count
    #[arg(short = 'g', long, default_value_t = 1)]
    pub groups: u32,

    /// Convolution direction
    #[arg(long, value_enum, default_value_t = DirectionArg::Forward)]
    pub direction: DirectionArg,
}

impl DescriptorArgs {
    pub fn resolve(&self) -> Result<ProblemDescriptor> {
        if let Some(path) = &self.descriptor {
            return load_descriptor(path);
        }

        let (Some(in_channels), Some(out_channels), Some(input)) =
            (self.in_channels, self.out_channels, self.input)
        else {
            bail!("--in-channels, --out-channels and --input are required without --descriptor");
        };

        let output = match self.output {
            Some(output) => output,
            None => self.derived_output(input)?,
        };

        Ok(ProblemDescriptor::new(self.batch, in_channels, out_channels, input, self.kernel, output)
            .with_pad(self.pad)
            .with_stride(self.stride)
            .with_dilation(self.dilation)
            .with_groups(self.groups)
            .with_direction(self.direction.into()))
    }

    fn derived_output(&self, input: Extent2) -> Result<Extent2> {
        let width = output_extent(
            input.width,
            self.kernel.width,
            self.pad.width,
            self.stride.width,
            self.dilation.width,
        )
        .context("Cannot derive output width")?;
        let height = output_extent(
            input.height,
            self.kernel.height,
            self.pad.height,
            self.stride.height,
            self.dilation.height,
        )
        .context("Cannot derive output height")?;
        Ok(Extent2::new(width, height))
    }
}

/// Output size along one axis: `(input + 2*pad - dilation*(kernel-1) - 1) / stride + 1`.
pub fn output_extent(input: u32, kernel: u32, pad: u32, stride: u32, dilation: u32) -> Result<u32> {
    if stride == 0 {
        bail!("stride must be at least 1");
    }
    if kernel == 0 {
        bail!("kernel extent must be at least 1");
    }
    let span = u64::from(input) + 2 * u64::from(pad);
    let reach = u64::from(dilation) * u64::from(kernel - 1) + 1;
    if span < reach {
        bail!("kernel reach {reach} exceeds padded input {span}");
    }
    let out = (span - reach) / u64::from(stride) + 1;
    u32::try_from(out).context("output extent overflows 32 bits")
}

fn load_descriptor(path: &Path) -> Result<ProblemDescriptor> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor {}", path.display()))?;
    let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    debug!("Loading descriptor from {} ({})", path.display(), if is_toml { "toml" } else { "json" });
    let desc = if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse descriptor {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse descriptor {}", path.display()))?
    };
    Ok(desc)
}
