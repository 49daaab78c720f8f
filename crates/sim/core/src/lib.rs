//! Event-driven effect engine for repeated combat simulation trials.
//!
//! `sim-core` provides the mechanism every piece of combat content is built
//! on: a time-ordered scheduler, auras with lifecycle hooks and stacks, dots
//! bound to auras, probabilistic proc triggers, reversible stat dependencies
//! and spell property modifiers.
//!
//! Content registers itself once into a [`Registry`]; [`Registry::finish`]
//! yields an immutable [`Blueprint`] that any number of [`Sim`] trials share.
//! A trial's outcome depends only on its seed and the blueprint.
pub mod aura;
pub mod config;
pub mod dot;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod proc;
pub mod registry;
pub mod rng;
pub mod spell;
pub mod stats;
pub mod types;
pub mod unit;

pub use aura::{
    AuraConfig, AuraDef, AuraDuration, AuraHook, AuraHooks, AuraRefs, EventHook, InitHook,
    Reactivation, StacksHook,
};
pub use config::SimConfig;
pub use dot::{DotConfig, DotDef, DotRefreshPolicy, DotTick, DotTickHook};
pub use engine::{EventHandle, Scheduler, Sim};
pub use error::{EngineError, ErrorSeverity, SetupError};
pub use metrics::{AuraMetrics, SpellMetrics, TrialMetrics, UnitMetrics};
pub use proc::{
    Callbacks, CombatEvent, EventKind, Outcome, ProcAction, ProcChance, ProcHook, ProcMask,
    ProcTrigger, TriggerDef, ppm_chance,
};
pub use registry::{Blueprint, Registry};
pub use rng::{RandomStreams, stream_seed, trial_seed};
pub use spell::{
    CastOutcome, ModOp, SpellConfig, SpellDef, SpellEffect, SpellModDef, SpellProperties,
    SpellProperty,
};
pub use stats::{PseudoStats, Stat, StatDepDef, StatDepKind, Stats};
pub use types::{
    ActionId, AuraId, DotId, SimTime, SpellCode, SpellId, SpellModId, StatDepId, TriggerId, UnitId,
};
pub use unit::{Hand, UnitDef};
