//! Per-trial simulation state and the event loop.
//!
//! A [`Sim`] owns every piece of mutable state for one trial: the scheduler,
//! the random streams, and the runtime side of every unit, aura, spell, dot,
//! stat dependency, spell modifier and trigger. Definitions and hooks are
//! read from the shared [`Blueprint`], so any number of trials can run in
//! parallel from one blueprint without locking.
//!
//! Hooks receive `&mut Sim`. To call a hook stored in the blueprint while
//! mutating the sim, callers clone the `Arc<Blueprint>` first.

mod scheduler;

pub use scheduler::{EventHandle, Scheduler};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::aura::AuraState;
use crate::config::SimConfig;
use crate::dot::DotState;
use crate::proc::TriggerState;
use crate::registry::Blueprint;
use crate::rng::RandomStreams;
use crate::spell::SpellState;
use crate::types::{AuraId, DotId, SimTime, SpellId, UnitId};
use crate::unit::UnitState;

/// Work item stored in the scheduler.
pub(crate) enum Pending {
    AuraExpire(AuraId),
    DotTick(DotId),
    CastComplete { spell: SpellId, target: UnitId },
    Callback(Box<dyn FnOnce(&mut Sim)>),
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuraExpire(aura) => f.debug_tuple("AuraExpire").field(aura).finish(),
            Self::DotTick(dot) => f.debug_tuple("DotTick").field(dot).finish(),
            Self::CastComplete { spell, target } => f
                .debug_struct("CastComplete")
                .field("spell", spell)
                .field("target", target)
                .finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// One trial's mutable world.
pub struct Sim {
    bp: Arc<Blueprint>,
    config: SimConfig,
    scheduler: Scheduler<Pending>,
    rng: RandomStreams,
    pub(crate) event_depth: usize,
    pub(crate) units: Vec<UnitState>,
    pub(crate) auras: Vec<AuraState>,
    pub(crate) spells: Vec<SpellState>,
    pub(crate) dots: Vec<DotState>,
    pub(crate) stat_deps: Vec<Option<f64>>,
    pub(crate) spell_mods: Vec<Option<Vec<f64>>>,
    pub(crate) triggers: Vec<TriggerState>,
}

impl Sim {
    /// Builds a sim from a finished blueprint and resets it for a trial.
    pub fn new(bp: Arc<Blueprint>, seed: u64) -> Self {
        Self::with_config(bp, seed, SimConfig::default())
    }

    pub fn with_config(bp: Arc<Blueprint>, seed: u64, config: SimConfig) -> Self {
        let mut sim = Self {
            bp,
            config,
            scheduler: Scheduler::new(),
            rng: RandomStreams::new(seed),
            event_depth: 0,
            units: Vec::new(),
            auras: Vec::new(),
            spells: Vec::new(),
            dots: Vec::new(),
            stat_deps: Vec::new(),
            spell_mods: Vec::new(),
            triggers: Vec::new(),
        };
        sim.reset(seed);
        sim
    }

    /// Restores base state for a new trial.
    ///
    /// Clears the clock and every pending event, reseeds the random streams,
    /// rebuilds unit and spell state from their definitions, marks every
    /// aura inactive, and then runs each aura's reset hook in registration
    /// order, activating permanent auras right after their own hook.
    pub fn reset(&mut self, seed: u64) {
        let bp = Arc::clone(&self.bp);
        self.scheduler.clear();
        self.rng.reseed(seed);
        self.event_depth = 0;
        self.units = bp.units().map(|(_, def)| UnitState::from_def(def)).collect();
        self.spells = bp.spells().map(SpellState::from_def).collect();
        self.auras = vec![AuraState::default(); bp.aura_count()];
        self.dots = vec![DotState::default(); bp.dot_count()];
        self.stat_deps = vec![None; bp.stat_dep_count()];
        self.spell_mods = vec![None; bp.spell_mod_count()];
        self.triggers = vec![TriggerState::default(); bp.trigger_count()];
        self.reset_auras();
        debug!(target: "sim::engine", seed, "trial reset");
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Shared blueprint handle; clone it to read definitions while mutating the sim.
    pub fn blueprint(&self) -> Arc<Blueprint> {
        Arc::clone(&self.bp)
    }

    pub(crate) fn blueprint_ref(&self) -> &Blueprint {
        &self.bp
    }

    pub fn rng_mut(&mut self) -> &mut RandomStreams {
        &mut self.rng
    }

    /// Runs `callback` at `at`. Times in the past run at the current instant.
    pub fn schedule<F>(&mut self, at: SimTime, callback: F) -> EventHandle
    where
        F: FnOnce(&mut Sim) + 'static,
    {
        self.schedule_pending(at, Pending::Callback(Box::new(callback)))
    }

    pub fn schedule_after<F>(&mut self, delay: Duration, callback: F) -> EventHandle
    where
        F: FnOnce(&mut Sim) + 'static,
    {
        let at = self.now() + delay;
        self.schedule(at, callback)
    }

    /// Cancels a scheduled event. Fired or cancelled handles are ignored.
    pub fn cancel(&mut self, handle: EventHandle) {
        self.scheduler.cancel(handle);
    }

    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.scheduler.is_pending(handle)
    }

    pub(crate) fn schedule_pending(&mut self, at: SimTime, pending: Pending) -> EventHandle {
        self.scheduler.schedule(at, pending)
    }

    /// Fires the earliest pending event. Returns `false` when none is left.
    pub fn advance_to_next_event(&mut self) -> bool {
        let Some((_, pending)) = self.scheduler.pop_next() else {
            return false;
        };
        match pending {
            Pending::AuraExpire(aura) => self.expire_aura(aura),
            Pending::DotTick(dot) => self.tick_dot(dot),
            Pending::CastComplete { spell, target } => self.complete_cast(spell, target),
            Pending::Callback(callback) => callback(self),
        }
        true
    }

    /// Fires every event due at or before `end`, then moves the clock to `end`.
    pub fn run_until(&mut self, end: SimTime) {
        while self.scheduler.peek_time().is_some_and(|at| at <= end) {
            self.advance_to_next_event();
        }
        self.scheduler.advance_to(end);
    }

    /// Runs until the configured encounter length has elapsed since trial start.
    pub fn run_encounter(&mut self) {
        let end = SimTime::ZERO + self.config.encounter_duration;
        self.run_until(end);
    }

    pub(crate) fn unit_state(&self, unit: UnitId) -> &UnitState {
        self.units
            .get(unit.index())
            .unwrap_or_else(|| panic!("unknown unit handle {unit}"))
    }

    pub(crate) fn unit_state_mut(&mut self, unit: UnitId) -> &mut UnitState {
        self.units
            .get_mut(unit.index())
            .unwrap_or_else(|| panic!("unknown unit handle {unit}"))
    }

    pub(crate) fn aura_state(&self, aura: AuraId) -> &AuraState {
        self.auras
            .get(aura.index())
            .unwrap_or_else(|| panic!("unknown aura handle {aura}"))
    }

    pub(crate) fn aura_state_mut(&mut self, aura: AuraId) -> &mut AuraState {
        self.auras
            .get_mut(aura.index())
            .unwrap_or_else(|| panic!("unknown aura handle {aura}"))
    }

    pub(crate) fn spell_state(&self, spell: SpellId) -> &SpellState {
        self.spells
            .get(spell.index())
            .unwrap_or_else(|| panic!("unknown spell handle {spell}"))
    }

    pub(crate) fn spell_state_mut(&mut self, spell: SpellId) -> &mut SpellState {
        self.spells
            .get_mut(spell.index())
            .unwrap_or_else(|| panic!("unknown spell handle {spell}"))
    }

    pub(crate) fn dot_state(&self, dot: DotId) -> &DotState {
        self.dots
            .get(dot.index())
            .unwrap_or_else(|| panic!("unknown dot handle {dot}"))
    }

    pub(crate) fn dot_state_mut(&mut self, dot: DotId) -> &mut DotState {
        self.dots
            .get_mut(dot.index())
            .unwrap_or_else(|| panic!("unknown dot handle {dot}"))
    }
}

impl fmt::Debug for Sim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sim")
            .field("now", &self.now())
            .field("seed", &self.seed())
            .field("pending", &self.scheduler.len())
            .field("units", &self.units.len())
            .field("auras", &self.auras.len())
            .finish_non_exhaustive()
    }
}
