//! Combat participants: base definitions and per-trial mutable state.

use std::time::Duration;

use strum::EnumCount;
use tracing::trace;

use crate::engine::Sim;
use crate::stats::{PseudoStats, Stat, Stats};
use crate::types::UnitId;

/// Weapon slot whose speed drives swing timers and PPM procs.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumCount, strum::EnumIter, strum::Display,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Hand {
    MainHand,
    OffHand,
    Ranged,
}

impl Hand {
    #[inline]
    pub const fn as_index(self) -> usize {
        self as usize
    }
}

/// Setup-time description of a unit.
#[derive(Clone, Debug)]
pub struct UnitDef {
    pub label: String,
    pub base_stats: Stats,
    pub pseudo_stats: PseudoStats,
    /// Base weapon speeds in seconds, `None` for an empty slot.
    pub weapon_speeds: [Option<f64>; Hand::COUNT],
}

impl UnitDef {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            base_stats: Stats::zero(),
            pseudo_stats: PseudoStats::default(),
            weapon_speeds: [None; Hand::COUNT],
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct UnitState {
    pub(crate) stats: Stats,
    pub(crate) pseudo_stats: PseudoStats,
    pub(crate) mana: f64,
    pub(crate) weapon_speeds: [Option<f64>; Hand::COUNT],
    pub(crate) damage_done: f64,
    pub(crate) threat: f64,
    pub(crate) healing_done: f64,
    pub(crate) resource_spent: f64,
}

impl UnitState {
    pub(crate) fn from_def(def: &UnitDef) -> Self {
        Self {
            stats: def.base_stats,
            pseudo_stats: def.pseudo_stats,
            mana: def.base_stats[Stat::Mana],
            weapon_speeds: def.weapon_speeds,
            damage_done: 0.0,
            threat: 0.0,
            healing_done: 0.0,
            resource_spent: 0.0,
        }
    }
}

impl Sim {
    pub fn unit_label(&self, unit: UnitId) -> &str {
        &self.blueprint_ref().unit(unit).label
    }

    pub fn stat(&self, unit: UnitId, stat: Stat) -> f64 {
        self.unit_state(unit).stats[stat]
    }

    pub fn stats(&self, unit: UnitId) -> &Stats {
        &self.unit_state(unit).stats
    }

    pub fn pseudo_stats(&self, unit: UnitId) -> &PseudoStats {
        &self.unit_state(unit).pseudo_stats
    }

    pub fn pseudo_stats_mut(&mut self, unit: UnitId) -> &mut PseudoStats {
        &mut self.unit_state_mut(unit).pseudo_stats
    }

    /// Adds `amount` to one stat for the rest of the trial (or until reversed
    /// by the caller).
    pub fn add_stat_dynamic(&mut self, unit: UnitId, stat: Stat, amount: f64) {
        self.unit_state_mut(unit).stats[stat] += amount;
        trace!(target: "sim::stats", unit = %unit, stat = stat.name(), amount, "stat changed");
    }

    pub fn add_stats_dynamic(&mut self, unit: UnitId, stats: &Stats) {
        self.unit_state_mut(unit).stats += *stats;
    }

    /// Scales the unit's attack speed. Divide by the same factor to undo.
    pub fn multiply_attack_speed(&mut self, unit: UnitId, factor: f64) {
        self.unit_state_mut(unit).pseudo_stats.attack_speed_multiplier *= factor;
    }

    /// Base speed in seconds of the weapon in `hand`.
    pub fn weapon_speed(&self, unit: UnitId, hand: Hand) -> Option<f64> {
        self.unit_state(unit).weapon_speeds[hand.as_index()]
    }

    /// Equips (or empties) a weapon slot mid-trial. PPM procs pick up the new
    /// speed on their next evaluation.
    pub fn set_weapon_speed(&mut self, unit: UnitId, hand: Hand, speed: Option<f64>) {
        self.unit_state_mut(unit).weapon_speeds[hand.as_index()] = speed.filter(|s| *s > 0.0);
    }

    /// Time between swings of `hand` after attack speed modifiers.
    pub fn swing_interval(&self, unit: UnitId, hand: Hand) -> Option<Duration> {
        let state = self.unit_state(unit);
        let speed = state.weapon_speeds[hand.as_index()]?;
        let multiplier = state.pseudo_stats.attack_speed_multiplier;
        if multiplier <= 0.0 || !multiplier.is_finite() {
            return None;
        }
        Some(Duration::from_secs_f64(speed / multiplier))
    }

    /// Current mana pool.
    pub fn mana(&self, unit: UnitId) -> f64 {
        self.unit_state(unit).mana
    }

    /// Restores (or drains, for negative amounts) mana. Never drops below zero.
    pub fn add_mana(&mut self, unit: UnitId, amount: f64) {
        let state = self.unit_state_mut(unit);
        state.mana = (state.mana + amount).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::Registry;

    #[test]
    fn swing_interval_honours_attack_speed() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Warrior");
        registry.set_weapon_speed(unit, Hand::MainHand, 3.0).unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        assert_eq!(sim.swing_interval(unit, Hand::MainHand), Some(Duration::from_secs(3)));
        assert_eq!(sim.swing_interval(unit, Hand::OffHand), None);

        sim.multiply_attack_speed(unit, 1.5);
        assert_eq!(sim.swing_interval(unit, Hand::MainHand), Some(Duration::from_secs(2)));
    }

    #[test]
    fn mana_starts_from_base_stat_and_floors_at_zero() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Paladin");
        registry.add_stat(unit, Stat::Mana, 500.0).unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        assert_eq!(sim.mana(unit), 500.0);
        sim.add_mana(unit, -800.0);
        assert_eq!(sim.mana(unit), 0.0);
    }
}
