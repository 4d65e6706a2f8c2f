//! Rendering of command results.
//!
//! `--format json` writes pretty JSON to stdout; `--format text` writes an
//! aligned key/value listing. Logs always go to stderr.

use std::fmt::Write as _;
use std::io::Write;

use clap::ValueEnum;
use flexgemm_plan::{ConvPlan, MagicDivisor, Plan, UnitFilterPlan};
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable key/value text.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Write `value` to stdout in `format`; text mode uses `render`.
pub fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    render: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            writeln!(stdout, "{json}")?;
        }
        OutputFormat::Text => {
            write!(stdout, "{}", render(value))?;
        }
    }
    Ok(())
}

fn field(out: &mut String, key: &str, value: impl std::fmt::Display) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "  {key:<14}{value}");
}

fn optional_magic(magic: Option<MagicDivisor>) -> String {
    magic.map_or_else(|| "-".to_string(), |m| m.to_string())
}

pub fn render_plan(plan: &Plan) -> String {
    match plan {
        Plan::UnitFilter(p) => render_unit_filter(p),
        Plan::Conv(p) => render_conv(p),
    }
}

pub fn render_unit_filter(plan: &UnitFilterPlan) -> String {
    let mut out = String::from("Unit-filter plan\n");
    field(&mut out, "direction", format!("{} (flag {})", plan.direction, plan.direction.flag()));
    field(&mut out, "routine", format!("{} ({:?} lanes)", plan.routine.id, plan.routine.lanes));
    field(&mut out, "routine word", format!("{:#x}", plan.routine.packed()));
    field(&mut out, "m x n x k", format!("{} x {} x {}", plan.m, plan.n, plan.k));
    field(&mut out, "groups", plan.groups);
    field(&mut out, "dimx", plan.dimx);
    field(&mut out, "ntidx", plan.ntidx);
    field(&mut out, "alignment", plan.alignment);
    field(&mut out, "shifts", format!("sx={} sy={}", plan.sx, plan.sy));
    field(&mut out, "amag", plan.amag);
    field(&mut out, "cmag", optional_magic(plan.cmag));
    out
}

pub fn render_conv(plan: &ConvPlan) -> String {
    let mut out = format!("Generic {} plan\n", plan.direction);
    field(&mut out, "dir flag", plan.direction.flag());
    field(&mut out, "routine", plan.routine);
    field(&mut out, "m x n x k", format!("{} x {} x {}", plan.m, plan.n, plan.k));
    field(&mut out, "groups", plan.groups);
    field(&mut out, "input", plan.input);
    field(&mut out, "kernel", plan.kernel);
    field(&mut out, "output", plan.output);
    field(&mut out, "padded", plan.padded);
    field(&mut out, "pad word", format!("{:#010x}", plan.pad));
    field(&mut out, "sd word", format!("{:#010x}", plan.sd));
    field(&mut out, "ldc", plan.ldc);
    field(&mut out, "ntidx", plan.ntidx);
    field(&mut out, "alignment", plan.alignment);
    field(&mut out, "lda", plan.lda);
    field(&mut out, "ags", plan.ags);
    field(&mut out, "pk", plan.pk);
    field(&mut out, "amag", plan.amag);
    field(&mut out, "cmag", optional_magic(plan.cmag));
    out.push_str("Scratch (bytes)\n");
    field(&mut out, "padding", plan.scratch.padding);
    field(&mut out, "permutation", plan.scratch.permutation);
    field(&mut out, "index", plan.scratch.index);
    field(&mut out, "total", plan.aux_buffer_size());
    out
}
