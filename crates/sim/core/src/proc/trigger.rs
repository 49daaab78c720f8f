use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::{Callbacks, CombatEvent, Outcome, ProcMask};
use crate::engine::Sim;
use crate::error::SetupError;
use crate::types::{AuraId, SimTime, SpellId, TriggerId, UnitId};

/// Hook run by [`ProcAction::Custom`].
pub type ProcHook = Arc<dyn Fn(&mut Sim, AuraId, &CombatEvent) + Send + Sync>;

/// Probability model of a trigger, resolved at validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProcChance {
    Always,
    /// Fixed probability per eligible event.
    Flat(f64),
    /// Procs per minute, normalised by the observer's weapon speed.
    Ppm(f64),
}

/// What a trigger does when it fires.
#[derive(Clone)]
pub enum ProcAction {
    Activate(AuraId),
    AddStack(AuraId),
    /// Activates the aura when inactive, otherwise adds one stack.
    Stack(AuraId),
    /// Casts a spell at the event's counterpart.
    Cast(SpellId),
    Custom(ProcHook),
}

impl fmt::Debug for ProcAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate(aura) => f.debug_tuple("Activate").field(aura).finish(),
            Self::AddStack(aura) => f.debug_tuple("AddStack").field(aura).finish(),
            Self::Stack(aura) => f.debug_tuple("Stack").field(aura).finish(),
            Self::Cast(spell) => f.debug_tuple("Cast").field(spell).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Proc chance per eligible event for a `ppm` rate and an average
/// `interval_secs` between events.
pub fn ppm_chance(ppm: f64, interval_secs: f64) -> f64 {
    ppm * interval_secs / 60.0
}

/// Builder describing a proc trigger. Validated by
/// [`crate::Registry::make_proc_trigger_aura`].
#[derive(Clone, Debug)]
pub struct ProcTrigger {
    name: String,
    callbacks: Callbacks,
    proc_mask: ProcMask,
    outcome: Outcome,
    flat: Option<f64>,
    ppm: Option<f64>,
    icd: Option<Duration>,
    stream: Option<String>,
    action: Option<ProcAction>,
}

impl ProcTrigger {
    pub fn new(name: impl Into<String>, callbacks: Callbacks) -> Self {
        Self {
            name: name.into(),
            callbacks,
            proc_mask: ProcMask::empty(),
            outcome: Outcome::empty(),
            flat: None,
            ppm: None,
            icd: None,
            stream: None,
            action: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Restricts the trigger to events whose proc mask intersects `mask`.
    /// An empty mask matches every event.
    pub fn proc_mask(mut self, mask: ProcMask) -> Self {
        self.proc_mask = mask;
        self
    }

    /// Restricts the trigger to events whose outcome intersects `outcome`.
    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn chance(mut self, chance: f64) -> Self {
        self.flat = Some(chance);
        self
    }

    pub fn ppm(mut self, ppm: f64) -> Self {
        self.ppm = Some(ppm);
        self
    }

    /// Minimum time between two fires.
    pub fn icd(mut self, icd: Duration) -> Self {
        self.icd = Some(icd);
        self
    }

    /// Names the random stream rolls are drawn from. Defaults to the trigger name.
    pub fn stream(mut self, label: impl Into<String>) -> Self {
        self.stream = Some(label.into());
        self
    }

    pub fn action(mut self, action: ProcAction) -> Self {
        self.action = Some(action);
        self
    }

    pub(crate) fn validate(self, carrier: AuraId) -> Result<TriggerDef, SetupError> {
        let name = self.name;
        if self.callbacks.is_empty() {
            return Err(SetupError::invalid_trigger(&name, "callback set is empty"));
        }
        let chance = match (self.flat, self.ppm) {
            (Some(_), Some(_)) => {
                return Err(SetupError::invalid_trigger(&name, "both flat chance and PPM set"));
            }
            (Some(chance), None) => {
                if !(0.0..=1.0).contains(&chance) {
                    return Err(SetupError::invalid_trigger(&name, "chance must be within [0, 1]"));
                }
                if chance >= 1.0 {
                    ProcChance::Always
                } else {
                    ProcChance::Flat(chance)
                }
            }
            (None, Some(ppm)) => {
                if !ppm.is_finite() || ppm <= 0.0 {
                    return Err(SetupError::invalid_trigger(&name, "PPM must be positive"));
                }
                if self.proc_mask.is_empty() || !ProcMask::WEAPON.contains(self.proc_mask) {
                    return Err(SetupError::invalid_trigger(&name, "PPM requires a weapon proc mask"));
                }
                ProcChance::Ppm(ppm)
            }
            (None, None) => ProcChance::Always,
        };
        let Some(action) = self.action else {
            return Err(SetupError::invalid_trigger(&name, "no action bound"));
        };
        Ok(TriggerDef {
            stream: self.stream.unwrap_or_else(|| name.clone()),
            name,
            carrier,
            callbacks: self.callbacks,
            proc_mask: self.proc_mask,
            outcome: self.outcome,
            chance,
            icd: self.icd,
            action,
        })
    }
}

/// Validated trigger stored in the blueprint.
#[derive(Clone, Debug)]
pub struct TriggerDef {
    pub name: String,
    pub carrier: AuraId,
    pub callbacks: Callbacks,
    pub proc_mask: ProcMask,
    pub outcome: Outcome,
    pub chance: ProcChance,
    pub icd: Option<Duration>,
    pub stream: String,
    pub action: ProcAction,
}

impl TriggerDef {
    /// Static filter: event kind, proc mask and outcome.
    pub fn matches(&self, event: &CombatEvent) -> bool {
        self.callbacks.contains(event.kind.callback())
            && (self.proc_mask.is_empty() || self.proc_mask.intersects(event.proc_mask))
            && (self.outcome.is_empty() || self.outcome.intersects(event.outcome))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TriggerState {
    pub(crate) ready_at: Option<SimTime>,
}

impl Sim {
    /// Rolls a PPM proc for `unit` using the current speed of the weapon
    /// that produced `proc_mask`. Units without such a weapon never proc.
    pub fn ppm_proc(&mut self, unit: UnitId, ppm: f64, proc_mask: ProcMask, stream: &str) -> bool {
        let chance = self.ppm_chance_for(unit, ppm, proc_mask);
        self.roll(stream, chance)
    }

    /// Draws from `stream` and reports whether the draw fell under `chance`.
    /// Certain and impossible outcomes consume no draw.
    pub fn roll(&mut self, stream: &str, chance: f64) -> bool {
        if chance >= 1.0 {
            return true;
        }
        if chance <= 0.0 || chance.is_nan() {
            return false;
        }
        self.rng_mut().draw(stream) < chance
    }

    fn ppm_chance_for(&self, unit: UnitId, ppm: f64, proc_mask: ProcMask) -> f64 {
        proc_mask
            .hand()
            .and_then(|hand| self.weapon_speed(unit, hand))
            .map_or(0.0, |speed| ppm_chance(ppm, speed))
    }

    pub(crate) fn evaluate_trigger(&mut self, trigger: TriggerId, event: &CombatEvent) {
        let bp = self.blueprint();
        let def = bp.trigger(trigger);
        if !def.matches(event) || !self.is_aura_active(def.carrier) {
            return;
        }
        let now = self.now();
        let state = &mut self.triggers[trigger.index()];
        if state.ready_at.is_some_and(|ready| now < ready) {
            return;
        }
        let chance = match def.chance {
            ProcChance::Always => 1.0,
            ProcChance::Flat(chance) => chance,
            ProcChance::Ppm(ppm) => self.ppm_chance_for(event.observer(), ppm, event.proc_mask),
        };
        if !self.roll(&def.stream, chance) {
            return;
        }
        if let Some(icd) = def.icd {
            self.triggers[trigger.index()].ready_at = Some(now + icd);
        }
        self.aura_state_mut(def.carrier).procs += 1;
        trace!(
            target: "sim::proc",
            trigger = %def.name,
            at = %now,
            kind = %event.kind,
            "proc fired"
        );

        match &def.action {
            ProcAction::Activate(aura) => self.activate_aura(*aura),
            ProcAction::AddStack(aura) => self.add_stack(*aura, 1),
            ProcAction::Stack(aura) => {
                if self.is_aura_active(*aura) {
                    self.add_stack(*aura, 1);
                } else {
                    self.activate_aura(*aura);
                }
            }
            ProcAction::Cast(spell) => {
                self.cast(*spell, event.counterpart());
            }
            ProcAction::Custom(hook) => hook(self, def.carrier, event),
        }
    }
}
