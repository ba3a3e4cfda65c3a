mod delta;
mod select;

pub use delta::{DeltaResolver, SectionDecision};
pub use select::{select_target, TargetCriteria};
