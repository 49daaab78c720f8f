//! Dynamic stat dependencies.
//!
//! A dependency is a reversible modifier on one stat of one unit. Enabling it
//! computes a delta against the stat's value at that moment and records it;
//! disabling subtracts exactly the recorded delta. Repeated or overlapping
//! enable/disable cycles therefore never drift, whatever else touched the
//! stat in between.

use tracing::trace;

use super::Stat;
use crate::engine::Sim;
use crate::types::{StatDepId, UnitId};

/// How a dependency derives its delta when enabled.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatDepKind {
    /// Adds a fixed amount.
    Add(f64),
    /// Scales the stat's current value by a factor.
    Multiply(f64),
}

impl StatDepKind {
    /// Delta this dependency would apply to a stat currently at `current`.
    pub fn delta(self, current: f64) -> f64 {
        match self {
            Self::Add(amount) => amount,
            Self::Multiply(factor) => current * (factor - 1.0),
        }
    }
}

/// Immutable definition of one dependency.
#[derive(Clone, Debug, PartialEq)]
pub struct StatDepDef {
    pub unit: UnitId,
    pub stat: Stat,
    pub kind: StatDepKind,
}

impl Sim {
    /// Applies a dependency. Enabling an enabled dependency is a no-op.
    pub fn enable_stat_dep(&mut self, dep: StatDepId) {
        let def = self.blueprint_ref().stat_dep(dep).clone();
        let slot = self.stat_dep_slot(dep);
        if slot.is_some() {
            return;
        }
        let stats = &mut self.unit_state_mut(def.unit).stats;
        let delta = def.kind.delta(stats[def.stat]);
        stats[def.stat] += delta;
        *self.stat_dep_slot_mut(dep) = Some(delta);
        trace!(
            target: "sim::stats",
            dep = %dep,
            unit = %def.unit,
            stat = def.stat.name(),
            delta,
            "stat dependency enabled"
        );
    }

    /// Reverses exactly the delta recorded at enable. Disabling a disabled
    /// dependency is a no-op.
    pub fn disable_stat_dep(&mut self, dep: StatDepId) {
        let Some(delta) = self.stat_dep_slot_mut(dep).take() else {
            return;
        };
        let def = self.blueprint_ref().stat_dep(dep).clone();
        self.unit_state_mut(def.unit).stats[def.stat] -= delta;
        trace!(
            target: "sim::stats",
            dep = %dep,
            unit = %def.unit,
            stat = def.stat.name(),
            delta,
            "stat dependency disabled"
        );
    }

    pub fn is_stat_dep_enabled(&self, dep: StatDepId) -> bool {
        self.stat_dep_slot(dep).is_some()
    }

    fn stat_dep_slot(&self, dep: StatDepId) -> Option<f64> {
        *self
            .stat_deps
            .get(dep.index())
            .unwrap_or_else(|| panic!("unknown stat dependency handle {dep}"))
    }

    fn stat_dep_slot_mut(&mut self, dep: StatDepId) -> &mut Option<f64> {
        self.stat_deps
            .get_mut(dep.index())
            .unwrap_or_else(|| panic!("unknown stat dependency handle {dep}"))
    }
}
