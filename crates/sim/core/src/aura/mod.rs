//! Auras: named, optionally stacking, optionally timed effects on a unit.
//!
//! An aura's behaviour is a fixed table of optional hooks ([`AuraHooks`]).
//! Definitions live in the shared [`crate::Blueprint`]; active flags, stack
//! counts and expiry handles live in each trial's [`crate::Sim`].

mod lifecycle;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use strum::EnumCount;

use crate::engine::{EventHandle, Sim};
use crate::error::SetupError;
use crate::proc::{CombatEvent, EventKind};
use crate::registry::Registry;
use crate::types::{ActionId, AuraId, DotId, SimTime, SpellId, SpellModId, StatDepId, TriggerId, UnitId};

pub type AuraHook = Arc<dyn Fn(&mut Sim, AuraId) + Send + Sync>;
/// Receives `(sim, aura, old_stacks, new_stacks)`.
pub type StacksHook = Arc<dyn Fn(&mut Sim, AuraId, u32, u32) + Send + Sync>;
pub type EventHook = Arc<dyn Fn(&mut Sim, AuraId, &CombatEvent) + Send + Sync>;
/// Runs once at [`Registry::finish`] and resolves what the aura acts on.
pub type InitHook = Box<dyn FnOnce(&mut Registry, AuraId) -> Result<AuraRefs, SetupError>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraDuration {
    Finite(Duration),
    #[default]
    NeverExpires,
}

/// What [`Sim::activate_aura`] does on an aura that is already active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reactivation {
    #[default]
    Ignore,
    Refresh,
}

/// Handles resolved by an aura's init hook, immutable afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuraRefs {
    pub spells: Vec<SpellId>,
    pub stat_deps: Vec<StatDepId>,
    pub spell_mods: Vec<SpellModId>,
}

impl AuraRefs {
    pub fn spells(spells: Vec<SpellId>) -> Self {
        Self {
            spells,
            ..Self::default()
        }
    }

    pub fn stat_deps(stat_deps: Vec<StatDepId>) -> Self {
        Self {
            stat_deps,
            ..Self::default()
        }
    }
}

/// Lifecycle and combat-event hooks of one aura.
#[derive(Clone)]
pub struct AuraHooks {
    pub on_reset: Option<AuraHook>,
    pub on_gain: Option<AuraHook>,
    pub on_expire: Option<AuraHook>,
    pub on_refresh: Option<AuraHook>,
    pub on_stacks_change: Option<StacksHook>,
    on_event: [Option<EventHook>; EventKind::COUNT],
}

impl Default for AuraHooks {
    fn default() -> Self {
        Self {
            on_reset: None,
            on_gain: None,
            on_expire: None,
            on_refresh: None,
            on_stacks_change: None,
            on_event: std::array::from_fn(|_| None),
        }
    }
}

impl AuraHooks {
    pub fn event(&self, kind: EventKind) -> Option<&EventHook> {
        self.on_event[kind.as_index()].as_ref()
    }

    pub fn set_event(&mut self, kind: EventKind, hook: EventHook) {
        self.on_event[kind.as_index()] = Some(hook);
    }
}

impl fmt::Debug for AuraHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<EventKind> = self
            .on_event
            .iter()
            .zip(<EventKind as strum::IntoEnumIterator>::iter())
            .filter_map(|(hook, kind)| hook.as_ref().map(|_| kind))
            .collect();
        f.debug_struct("AuraHooks")
            .field("on_reset", &self.on_reset.is_some())
            .field("on_gain", &self.on_gain.is_some())
            .field("on_expire", &self.on_expire.is_some())
            .field("on_refresh", &self.on_refresh.is_some())
            .field("on_stacks_change", &self.on_stacks_change.is_some())
            .field("events", &events)
            .finish()
    }
}

/// Builder passed to [`Registry::register_aura`].
pub struct AuraConfig {
    pub(crate) label: String,
    pub(crate) action: ActionId,
    pub(crate) duration: AuraDuration,
    pub(crate) max_stacks: u32,
    pub(crate) reactivation: Reactivation,
    pub(crate) on_init: Option<InitHook>,
    pub(crate) hooks: AuraHooks,
}

impl AuraConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ActionId::NONE,
            duration: AuraDuration::NeverExpires,
            max_stacks: 0,
            reactivation: Reactivation::Ignore,
            on_init: None,
            hooks: AuraHooks::default(),
        }
    }

    pub fn action(mut self, action: ActionId) -> Self {
        self.action = action;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = AuraDuration::Finite(duration);
        self
    }

    pub fn never_expires(mut self) -> Self {
        self.duration = AuraDuration::NeverExpires;
        self
    }

    /// 0 and 1 both mean non-stacking.
    pub fn max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn reactivation(mut self, reactivation: Reactivation) -> Self {
        self.reactivation = reactivation;
        self
    }

    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut Registry, AuraId) -> Result<AuraRefs, SetupError> + 'static,
    {
        self.on_init = Some(Box::new(hook));
        self
    }

    pub fn on_reset<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId) + Send + Sync + 'static,
    {
        self.hooks.on_reset = Some(Arc::new(hook));
        self
    }

    pub fn on_gain<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId) + Send + Sync + 'static,
    {
        self.hooks.on_gain = Some(Arc::new(hook));
        self
    }

    pub fn on_expire<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId) + Send + Sync + 'static,
    {
        self.hooks.on_expire = Some(Arc::new(hook));
        self
    }

    pub fn on_refresh<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId) + Send + Sync + 'static,
    {
        self.hooks.on_refresh = Some(Arc::new(hook));
        self
    }

    pub fn on_stacks_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId, u32, u32) + Send + Sync + 'static,
    {
        self.hooks.on_stacks_change = Some(Arc::new(hook));
        self
    }

    pub fn on_event<F>(mut self, kind: EventKind, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId, &CombatEvent) + Send + Sync + 'static,
    {
        self.hooks.set_event(kind, Arc::new(hook));
        self
    }

    pub fn on_spell_hit_dealt<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId, &CombatEvent) + Send + Sync + 'static,
    {
        self.on_event(EventKind::SpellHitDealt, hook)
    }

    pub fn on_spell_hit_taken<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId, &CombatEvent) + Send + Sync + 'static,
    {
        self.on_event(EventKind::SpellHitTaken, hook)
    }

    pub fn on_periodic_damage_dealt<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId, &CombatEvent) + Send + Sync + 'static,
    {
        self.on_event(EventKind::PeriodicDamageDealt, hook)
    }

    pub fn on_heal_dealt<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId, &CombatEvent) + Send + Sync + 'static,
    {
        self.on_event(EventKind::HealDealt, hook)
    }

    pub fn on_cast_complete<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Sim, AuraId, &CombatEvent) + Send + Sync + 'static,
    {
        self.on_event(EventKind::CastComplete, hook)
    }
}

impl fmt::Debug for AuraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuraConfig")
            .field("label", &self.label)
            .field("duration", &self.duration)
            .field("max_stacks", &self.max_stacks)
            .field("reactivation", &self.reactivation)
            .field("on_init", &self.on_init.is_some())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Registered aura definition.
#[derive(Clone, Debug)]
pub struct AuraDef {
    pub id: AuraId,
    pub unit: UnitId,
    pub label: String,
    pub action: ActionId,
    pub duration: AuraDuration,
    pub max_stacks: u32,
    pub reactivation: Reactivation,
    /// Never expires; deactivation is ignored for the rest of the trial.
    pub permanent: bool,
    /// Activated at trial reset, after its own `on_reset` hook.
    pub auto_activate: bool,
    pub refs: AuraRefs,
    pub(crate) hooks: AuraHooks,
    pub(crate) dot: Option<DotId>,
    pub(crate) triggers: Vec<TriggerId>,
}

impl AuraDef {
    /// Effective stack ceiling; never below one.
    pub fn stack_limit(&self) -> u32 {
        self.max_stacks.max(1)
    }

    pub fn dot(&self) -> Option<DotId> {
        self.dot
    }

    pub fn triggers(&self) -> &[TriggerId] {
        &self.triggers
    }

    pub(crate) fn listens_to(&self, kind: EventKind, triggers: &[crate::proc::TriggerDef]) -> bool {
        self.hooks.event(kind).is_some()
            || self
                .triggers
                .iter()
                .any(|t| triggers[t.index()].callbacks.contains(kind.callback()))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AuraState {
    pub(crate) active: bool,
    pub(crate) stacks: u32,
    pub(crate) expires: Option<EventHandle>,
    pub(crate) gained_at: SimTime,
    pub(crate) activations: u32,
    pub(crate) procs: u32,
    pub(crate) uptime: Duration,
}
