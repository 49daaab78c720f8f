//! Unit stats and the dynamic stat dependency graph.

mod dependency;
mod stat;

pub use dependency::{StatDepDef, StatDepKind};
pub use stat::{PseudoStats, Stat, Stats};
