//! Encounter drivers: the minimal combat that feeds events into a trial.
//!
//! A driver schedules its first actions when a trial starts; everything
//! after that is self-rescheduling callbacks inside the sim. Drivers are
//! shared by every trial of a run, so they hold only immutable settings.

use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use sim_core::{Hand, Outcome, Sim, SpellId, UnitId};

/// Starts the scripted combat of one trial.
pub trait EncounterDriver: Send + Sync {
    /// Schedules the driver's opening actions on a freshly reset sim.
    fn start(&self, sim: &mut Sim);
}

impl EncounterDriver for Vec<Box<dyn EncounterDriver>> {
    fn start(&self, sim: &mut Sim) {
        for driver in self {
            driver.start(sim);
        }
    }
}

impl<D: EncounterDriver + ?Sized> EncounterDriver for Arc<D> {
    fn start(&self, sim: &mut Sim) {
        (**self).start(sim);
    }
}

/// Attack table shared by every hand of an [`AutoAttackDriver`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackTable {
    pub miss_chance: f64,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
}

impl Default for AttackTable {
    fn default() -> Self {
        Self {
            miss_chance: 0.0,
            crit_chance: 0.0,
            crit_multiplier: 2.0,
        }
    }
}

impl AttackTable {
    fn roll(&self, draw: f64) -> Outcome {
        if draw < self.miss_chance {
            Outcome::MISS
        } else if draw < self.miss_chance + self.crit_chance {
            Outcome::CRIT
        } else {
            Outcome::HIT
        }
    }
}

#[derive(Debug)]
struct Swing {
    unit: UnitId,
    target: UnitId,
    hand: Hand,
    spell: SpellId,
    damage: (f64, f64),
    table: AttackTable,
    stream: String,
    damage_stream: String,
}

impl Swing {
    fn schedule(self: Arc<Self>, sim: &mut Sim, delay: Duration) {
        sim.schedule_after(delay, move |sim| self.fire(sim));
    }

    fn fire(self: Arc<Self>, sim: &mut Sim) {
        // An emptied slot stops the timer for the rest of the trial.
        let Some(interval) = sim.swing_interval(self.unit, self.hand) else {
            return;
        };
        let draw = sim.rng_mut().draw(&self.stream);
        let outcome = self.table.roll(draw);
        let (min, max) = self.damage;
        let base = sim.rng_mut().draw_range(&self.damage_stream, min, max);
        let mut amount = sim.spell_damage(self.spell, base);
        if outcome.contains(Outcome::CRIT) {
            amount *= self.table.crit_multiplier;
        }
        trace!(
            target: "runtime::driver",
            hand = %self.hand,
            at = %sim.now(),
            ?outcome,
            amount,
            "swing"
        );
        sim.deal_spell_hit(self.spell, self.target, outcome, amount);
        // Read the interval after the hit so attack speed procs apply to the next swing.
        let next = sim.swing_interval(self.unit, self.hand).unwrap_or(interval);
        self.schedule(sim, next);
    }
}

/// White-hit swing timers, one per equipped hand.
///
/// Each hand swings at trial start and then every
/// [`Sim::swing_interval`], so weapon swaps and attack speed changes apply
/// from the next swing on. Outcomes are rolled on a stream per hand.
#[derive(Debug)]
pub struct AutoAttackDriver {
    unit: UnitId,
    target: UnitId,
    table: AttackTable,
    swings: Vec<(Hand, SpellId, (f64, f64))>,
}

impl AutoAttackDriver {
    pub fn new(unit: UnitId, target: UnitId) -> Self {
        Self {
            unit,
            target,
            table: AttackTable::default(),
            swings: Vec::new(),
        }
    }

    /// Adds a swing timer for `hand`, dealing `base_damage` through `spell`.
    ///
    /// The spell's proc mask decides which weapon triggers see the hit.
    pub fn hand(self, hand: Hand, spell: SpellId, base_damage: f64) -> Self {
        self.hand_range(hand, spell, base_damage, base_damage)
    }

    /// Like [`Self::hand`], with base damage drawn uniformly from
    /// `[min, max)` on a per-hand damage stream.
    pub fn hand_range(mut self, hand: Hand, spell: SpellId, min: f64, max: f64) -> Self {
        self.swings.push((hand, spell, (min, max)));
        self
    }

    pub fn table(mut self, table: AttackTable) -> Self {
        self.table = table;
        self
    }
}

impl EncounterDriver for AutoAttackDriver {
    fn start(&self, sim: &mut Sim) {
        for &(hand, spell, damage) in &self.swings {
            let swing = Arc::new(Swing {
                unit: self.unit,
                target: self.target,
                hand,
                spell,
                damage,
                table: self.table,
                stream: format!("auto_attack.{hand}"),
                damage_stream: format!("auto_attack.{hand}.damage"),
            });
            swing.schedule(sim, Duration::ZERO);
        }
    }
}

/// Casts the first castable spell of a priority list on a fixed global
/// cooldown.
///
/// A spell is skipped while on cooldown or unaffordable. A cast with a cast
/// time delays the next decision until it completes.
#[derive(Clone, Debug)]
pub struct RotationDriver {
    target: UnitId,
    priority: Arc<[SpellId]>,
    gcd: Duration,
}

impl RotationDriver {
    pub const DEFAULT_GCD: Duration = Duration::from_millis(1500);

    pub fn new(target: UnitId, priority: impl Into<Vec<SpellId>>) -> Self {
        Self {
            target,
            priority: priority.into().into(),
            gcd: Self::DEFAULT_GCD,
        }
    }

    pub fn gcd(mut self, gcd: Duration) -> Self {
        self.gcd = gcd;
        self
    }

    fn decide(&self, sim: &mut Sim) {
        let now = sim.now();
        let mut next = now + self.gcd;
        for &spell in self.priority.iter() {
            let outcome = sim.cast(spell, self.target);
            if !outcome.is_success() {
                continue;
            }
            if let sim_core::CastOutcome::Started { completes_at } = outcome {
                next = next.max(completes_at);
            }
            break;
        }
        let rotation = self.clone();
        sim.schedule(next, move |sim| rotation.decide(sim));
    }
}

impl EncounterDriver for RotationDriver {
    fn start(&self, sim: &mut Sim) {
        let rotation = self.clone();
        sim.schedule(sim.now(), move |sim| rotation.decide(sim));
    }
}
