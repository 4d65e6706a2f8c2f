//! CLI command implementations

pub mod descriptor;
pub mod magic;
pub mod plan;

pub use descriptor::{DescriptorArgs, DirectionArg};
pub use magic::MagicCommand;
pub use plan::{AuxSizeCommand, FamilyArg, PlanCommand};
