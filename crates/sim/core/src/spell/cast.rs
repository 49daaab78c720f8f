use std::time::Duration;

use tracing::trace;

use crate::engine::{Pending, Sim};
use crate::proc::{CombatEvent, EventKind, Outcome, ProcMask};
use crate::types::{SimTime, SpellId, UnitId};

/// Upper bound applied to cast-time and cooldown multipliers before they
/// scale a [`Duration`].
pub const MAX_DURATION_MULTIPLIER: f64 = 1.0e6;

/// Scales `base` by a composed multiplier clamped into
/// `[0, MAX_DURATION_MULTIPLIER]`. NaN counts as zero.
fn scaled(base: Duration, multiplier: f64) -> Duration {
    let factor = if multiplier.is_nan() {
        0.0
    } else {
        multiplier.clamp(0.0, MAX_DURATION_MULTIPLIER)
    };
    Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Result of [`Sim::cast`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastOutcome {
    /// Instant cast; the effect has already run.
    Completed,
    /// Cast in progress; the effect runs at `completes_at`.
    Started { completes_at: SimTime },
    OnCooldown { ready_at: SimTime },
    InsufficientResource,
}

impl CastOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Completed | Self::Started { .. })
    }
}

impl Sim {
    /// Starts casting `spell` at `target`.
    ///
    /// Pays `base_cost × cost_multiplier`, starts a cooldown of
    /// `cooldown × cooldown_multiplier`, then waits
    /// `cast_time × cast_time_multiplier`. Duration multipliers are clamped
    /// to `[0, MAX_DURATION_MULTIPLIER]` and NaN counts as zero. On completion a [`EventKind::CastComplete`] event is
    /// emitted and the spell's effect runs.
    pub fn cast(&mut self, spell: SpellId, target: UnitId) -> CastOutcome {
        let bp = self.blueprint();
        let def = bp.spell(spell);
        let now = self.now();

        let state = self.spell_state(spell);
        if now < state.ready_at {
            return CastOutcome::OnCooldown {
                ready_at: state.ready_at,
            };
        }
        let props = state.props;

        let cost = def.base_cost * props.cost_multiplier.max(0.0);
        if cost > 0.0 {
            let caster = self.unit_state_mut(def.unit);
            if caster.mana < cost {
                return CastOutcome::InsufficientResource;
            }
            caster.mana -= cost;
            caster.resource_spent += cost;
        }
        let cooldown = scaled(def.cooldown, props.cooldown_multiplier);
        if !cooldown.is_zero() {
            self.spell_state_mut(spell).ready_at = SimTime(now.0.saturating_add(cooldown));
        }

        let cast_time = scaled(def.cast_time, props.cast_time_multiplier);
        trace!(
            target: "sim::spell",
            spell = %def.label,
            unit = %def.unit,
            at = %now,
            cost,
            cast_ms = cast_time.as_millis() as u64,
            "cast started"
        );
        if cast_time.is_zero() {
            self.complete_cast(spell, target);
            CastOutcome::Completed
        } else {
            let completes_at = SimTime(now.0.saturating_add(cast_time));
            self.schedule_pending(completes_at, Pending::CastComplete { spell, target });
            CastOutcome::Started { completes_at }
        }
    }

    pub(crate) fn complete_cast(&mut self, spell: SpellId, target: UnitId) {
        let bp = self.blueprint();
        let def = bp.spell(spell);
        self.spell_state_mut(spell).casts += 1;
        trace!(target: "sim::spell", spell = %def.label, at = %self.now(), "cast complete");

        self.emit(CombatEvent {
            kind: EventKind::CastComplete,
            unit: def.unit,
            target,
            spell: Some(spell),
            proc_mask: def.proc_mask,
            outcome: Outcome::empty(),
            amount: 0.0,
        });
        if let Some(effect) = &def.effect {
            effect(self, spell, target);
        }
    }

    pub fn is_ready(&self, spell: SpellId) -> bool {
        self.now() >= self.spell_state(spell).ready_at
    }

    pub fn cooldown_remaining(&self, spell: SpellId) -> Duration {
        self.spell_state(spell).ready_at.since(self.now())
    }

    /// Makes the spell castable immediately.
    pub fn reset_cooldown(&mut self, spell: SpellId) {
        let now = self.now();
        self.spell_state_mut(spell).ready_at = now;
    }

    /// Scales `base` by the spell's damage multiplier and the caster's
    /// damage-dealt multipliers. Weapon spells also take the physical one.
    pub fn spell_damage(&self, spell: SpellId, base: f64) -> f64 {
        let def = self.blueprint_ref().spell(spell);
        let pseudo = self.pseudo_stats(def.unit);
        let mut amount = base * self.spell_props(spell).damage_multiplier * pseudo.damage_dealt_multiplier;
        if def.proc_mask.intersects(ProcMask::WEAPON) {
            amount *= pseudo.physical_damage_dealt_multiplier;
        }
        amount
    }

    /// Records a direct hit and emits it from both sides.
    ///
    /// Landed weapon hits are scaled by the target's physical damage-taken
    /// multiplier; misses record zero damage.
    pub fn deal_spell_hit(&mut self, spell: SpellId, target: UnitId, outcome: Outcome, amount: f64) {
        let bp = self.blueprint();
        let def = bp.spell(spell);
        let amount = if !outcome.landed() {
            0.0
        } else if def.proc_mask.intersects(ProcMask::WEAPON) {
            amount.max(0.0) * self.pseudo_stats(target).physical_damage_taken_multiplier
        } else {
            amount.max(0.0)
        };
        self.record_damage(spell, def.unit, outcome, amount);
        self.emit_with_mirror(CombatEvent {
            kind: EventKind::SpellHitDealt,
            unit: def.unit,
            target,
            spell: Some(spell),
            proc_mask: def.proc_mask,
            outcome,
            amount,
        });
    }

    /// Records one periodic tick of damage.
    pub fn deal_periodic(&mut self, spell: SpellId, target: UnitId, amount: f64) {
        let bp = self.blueprint();
        let def = bp.spell(spell);
        let amount = amount.max(0.0);
        self.spell_state_mut(spell).damage += amount;
        self.credit_damage(def.unit, amount);
        self.emit(CombatEvent {
            kind: EventKind::PeriodicDamageDealt,
            unit: def.unit,
            target,
            spell: Some(spell),
            proc_mask: def.proc_mask,
            outcome: Outcome::HIT,
            amount,
        });
    }

    pub fn deal_heal(&mut self, spell: SpellId, target: UnitId, outcome: Outcome, amount: f64) {
        let bp = self.blueprint();
        let def = bp.spell(spell);
        let amount = amount.max(0.0);
        let state = self.spell_state_mut(spell);
        state.healing += amount;
        if outcome.contains(Outcome::CRIT) {
            state.crits += 1;
        }
        self.unit_state_mut(def.unit).healing_done += amount;
        self.emit(CombatEvent {
            kind: EventKind::HealDealt,
            unit: def.unit,
            target,
            spell: Some(spell),
            proc_mask: def.proc_mask,
            outcome,
            amount,
        });
    }

    fn record_damage(&mut self, spell: SpellId, unit: UnitId, outcome: Outcome, amount: f64) {
        let state = self.spell_state_mut(spell);
        if outcome.landed() {
            state.hits += 1;
        }
        if outcome.contains(Outcome::CRIT) {
            state.crits += 1;
        }
        state.damage += amount;
        self.credit_damage(unit, amount);
    }

    fn credit_damage(&mut self, unit: UnitId, amount: f64) {
        let state = self.unit_state_mut(unit);
        state.damage_done += amount;
        state.threat += amount * state.pseudo_stats.threat_multiplier;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::registry::Registry;
    use crate::spell::SpellConfig;
    use crate::stats::Stat;

    #[test]
    fn cooldown_and_cost_gate_casts() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Shaman");
        let target = registry.add_unit("Target");
        registry.add_stat(unit, Stat::Mana, 100.0).unwrap();
        let shock = registry
            .register_spell(
                unit,
                SpellConfig::new("Earth Shock")
                    .cost(60.0)
                    .cooldown(Duration::from_secs(6)),
            )
            .unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        assert_eq!(sim.cast(shock, target), CastOutcome::Completed);
        assert_eq!(sim.mana(unit), 40.0);
        assert_eq!(
            sim.cast(shock, target),
            CastOutcome::OnCooldown { ready_at: SimTime::from_millis(6000) }
        );

        sim.reset_cooldown(shock);
        assert!(sim.is_ready(shock));
        assert_eq!(sim.cast(shock, target), CastOutcome::InsufficientResource);
        assert_eq!(sim.metrics().units[0].resource_spent, 60.0);
    }

    #[test]
    fn cast_time_scales_with_multiplier() {
        let effects = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&effects);
        let mut registry = Registry::new();
        let unit = registry.add_unit("Shaman");
        let bolt = registry
            .register_spell(
                unit,
                SpellConfig::new("Lightning Bolt")
                    .cast_time(Duration::from_secs(2))
                    .on_cast(move |_, _, _| {
                        counter.fetch_add(1, Ordering::Relaxed);
                    }),
            )
            .unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        sim.spell_props_mut(bolt).cast_time_multiplier = 0.5;
        assert_eq!(
            sim.cast(bolt, unit),
            CastOutcome::Started { completes_at: SimTime::from_millis(1000) }
        );
        assert_eq!(effects.load(Ordering::Relaxed), 0);
        sim.run_until(SimTime::from_millis(1000));
        assert_eq!(effects.load(Ordering::Relaxed), 1);

        // Stacked reductions past zero clamp to an instant cast.
        sim.spell_props_mut(bolt).cast_time_multiplier = -0.5;
        assert_eq!(sim.cast(bolt, unit), CastOutcome::Completed);
        assert_eq!(effects.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn cooldown_follows_the_composed_multiplier() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Paladin");
        let target = registry.add_unit("Target");
        let exorcism = registry
            .register_spell(unit, SpellConfig::new("Exorcism").cooldown(Duration::from_secs(6)))
            .unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        sim.spell_props_mut(exorcism).cooldown_multiplier = 0.5;
        assert_eq!(sim.cast(exorcism, target), CastOutcome::Completed);
        assert_eq!(sim.cooldown_remaining(exorcism), Duration::from_secs(3));

        sim.reset_cooldown(exorcism);
        sim.spell_props_mut(exorcism).cooldown_multiplier = -1.0;
        assert_eq!(sim.cast(exorcism, target), CastOutcome::Completed);
        assert!(sim.is_ready(exorcism));
    }

    #[test]
    fn unbounded_multipliers_do_not_overflow() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Shaman");
        let target = registry.add_unit("Target");
        let bolt = registry
            .register_spell(
                unit,
                SpellConfig::new("Chain Lightning")
                    .cast_time(Duration::from_secs(2))
                    .cooldown(Duration::from_secs(6)),
            )
            .unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        sim.spell_props_mut(bolt).cast_time_multiplier = f64::NAN;
        sim.spell_props_mut(bolt).cooldown_multiplier = f64::INFINITY;
        assert_eq!(sim.cast(bolt, target), CastOutcome::Completed);
        assert_eq!(sim.cooldown_remaining(bolt), Duration::from_secs(6_000_000));

        sim.reset_cooldown(bolt);
        sim.spell_props_mut(bolt).cast_time_multiplier = f64::INFINITY;
        sim.spell_props_mut(bolt).cooldown_multiplier = f64::NAN;
        assert_eq!(
            sim.cast(bolt, target),
            CastOutcome::Started {
                completes_at: SimTime::from_millis(2_000_000_000)
            }
        );
        assert!(sim.is_ready(bolt));
    }

    #[test]
    fn hits_feed_metrics() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Rogue");
        let target = registry.add_unit("Target");
        let strike = registry.register_spell(unit, SpellConfig::new("Sinister Strike")).unwrap();
        registry.pseudo_stats_mut(unit).unwrap().damage_dealt_multiplier = 1.1;
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        let damage = sim.spell_damage(strike, 100.0);
        assert!((damage - 110.0).abs() < 1e-9);
        sim.deal_spell_hit(strike, target, Outcome::CRIT, damage);
        sim.deal_spell_hit(strike, target, Outcome::DODGE, damage);

        let metrics = sim.metrics();
        let spell = &metrics.units[0].spells[0];
        assert_eq!(spell.hits, 1);
        assert_eq!(spell.crits, 1);
        assert!((metrics.units[0].damage_done - 110.0).abs() < 1e-9);
        assert!((metrics.units[0].threat - 110.0).abs() < 1e-9);
    }

    #[test]
    fn physical_multipliers_only_touch_weapon_spells() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Shaman");
        let target = registry.add_unit("Target");
        let auto = registry
            .register_spell(unit, SpellConfig::new("Main Hand").proc_mask(ProcMask::MELEE_MH_AUTO))
            .unwrap();
        let shock = registry
            .register_spell(unit, SpellConfig::new("Earth Shock").proc_mask(ProcMask::SPELL_DAMAGE))
            .unwrap();
        registry.pseudo_stats_mut(unit).unwrap().physical_damage_dealt_multiplier = 1.05;
        registry.pseudo_stats_mut(target).unwrap().physical_damage_taken_multiplier = 1.02;
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        assert!((sim.spell_damage(auto, 100.0) - 105.0).abs() < 1e-9);
        assert_eq!(sim.spell_damage(shock, 100.0), 100.0);

        sim.deal_spell_hit(auto, target, Outcome::HIT, 100.0);
        sim.deal_spell_hit(shock, target, Outcome::HIT, 100.0);
        let metrics = sim.metrics();
        let shaman = metrics.unit("Shaman").unwrap();
        assert!((shaman.spell("Main Hand").unwrap().damage - 102.0).abs() < 1e-9);
        assert_eq!(shaman.spell("Earth Shock").unwrap().damage, 100.0);
    }

    #[test]
    fn threat_follows_the_multiplier_at_hit_time() {
        let mut registry = Registry::new();
        let unit = registry.add_unit("Shaman");
        let target = registry.add_unit("Target");
        let strike = registry.register_spell(unit, SpellConfig::new("Stormstrike")).unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);

        sim.deal_spell_hit(strike, target, Outcome::HIT, 100.0);
        sim.pseudo_stats_mut(unit).threat_multiplier = 1.5;
        sim.deal_periodic(strike, target, 100.0);
        sim.deal_spell_hit(strike, target, Outcome::MISS, 100.0);

        let metrics = sim.metrics();
        let shaman = metrics.unit("Shaman").unwrap();
        assert_eq!(shaman.damage_done, 200.0);
        assert!((shaman.threat - 250.0).abs() < 1e-9);
    }
}
