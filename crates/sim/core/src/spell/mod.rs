//! Spells, their mutable property sets, and the cast pipeline.

mod cast;
mod composer;

pub use cast::{CastOutcome, MAX_DURATION_MULTIPLIER};
pub use composer::{ModOp, SpellModDef};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Sim;
use crate::proc::ProcMask;
use crate::types::{ActionId, SimTime, SpellCode, SpellId, UnitId};

/// Effect run when a cast completes: `(sim, spell, target)`.
pub type SpellEffect = Arc<dyn Fn(&mut Sim, SpellId, UnitId) + Send + Sync>;

/// Composable numeric properties of a spell.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellProperties {
    pub damage_multiplier: f64,
    pub cast_time_multiplier: f64,
    pub cost_multiplier: f64,
    pub cooldown_multiplier: f64,
    pub bonus_crit_rating: f64,
    pub bonus_hit_rating: f64,
}

impl Default for SpellProperties {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            cast_time_multiplier: 1.0,
            cost_multiplier: 1.0,
            cooldown_multiplier: 1.0,
            bonus_crit_rating: 0.0,
            bonus_hit_rating: 0.0,
        }
    }
}

/// Selects one field of [`SpellProperties`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SpellProperty {
    DamageMultiplier,
    CastTimeMultiplier,
    CostMultiplier,
    CooldownMultiplier,
    BonusCritRating,
    BonusHitRating,
}

impl SpellProperties {
    pub fn get(&self, property: SpellProperty) -> f64 {
        match property {
            SpellProperty::DamageMultiplier => self.damage_multiplier,
            SpellProperty::CastTimeMultiplier => self.cast_time_multiplier,
            SpellProperty::CostMultiplier => self.cost_multiplier,
            SpellProperty::CooldownMultiplier => self.cooldown_multiplier,
            SpellProperty::BonusCritRating => self.bonus_crit_rating,
            SpellProperty::BonusHitRating => self.bonus_hit_rating,
        }
    }

    pub fn get_mut(&mut self, property: SpellProperty) -> &mut f64 {
        match property {
            SpellProperty::DamageMultiplier => &mut self.damage_multiplier,
            SpellProperty::CastTimeMultiplier => &mut self.cast_time_multiplier,
            SpellProperty::CostMultiplier => &mut self.cost_multiplier,
            SpellProperty::CooldownMultiplier => &mut self.cooldown_multiplier,
            SpellProperty::BonusCritRating => &mut self.bonus_crit_rating,
            SpellProperty::BonusHitRating => &mut self.bonus_hit_rating,
        }
    }
}

/// Setup-time description of a spell.
#[derive(Clone)]
pub struct SpellConfig {
    pub label: String,
    pub action: ActionId,
    pub code: SpellCode,
    pub proc_mask: ProcMask,
    pub base_cost: f64,
    pub cast_time: Duration,
    pub cooldown: Duration,
    pub props: SpellProperties,
    pub effect: Option<SpellEffect>,
}

impl SpellConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ActionId::NONE,
            code: SpellCode::NONE,
            proc_mask: ProcMask::empty(),
            base_cost: 0.0,
            cast_time: Duration::ZERO,
            cooldown: Duration::ZERO,
            props: SpellProperties::default(),
            effect: None,
        }
    }

    pub fn action(mut self, action: ActionId) -> Self {
        self.action = action;
        self
    }

    pub fn code(mut self, code: SpellCode) -> Self {
        self.code = code;
        self
    }

    pub fn proc_mask(mut self, mask: ProcMask) -> Self {
        self.proc_mask = mask;
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.base_cost = cost;
        self
    }

    pub fn cast_time(mut self, cast_time: Duration) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn props(mut self, props: SpellProperties) -> Self {
        self.props = props;
        self
    }

    pub fn on_cast<F>(mut self, effect: F) -> Self
    where
        F: Fn(&mut Sim, SpellId, UnitId) + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }
}

/// Registered spell. Mutable only during setup, through
/// [`crate::Registry::spell_mut`] and spell-registered callbacks.
#[derive(Clone)]
pub struct SpellDef {
    pub id: SpellId,
    pub unit: UnitId,
    pub label: String,
    pub action: ActionId,
    pub code: SpellCode,
    pub proc_mask: ProcMask,
    pub base_cost: f64,
    pub cast_time: Duration,
    /// Base cooldown, scaled at cast time by `props.cooldown_multiplier`.
    pub cooldown: Duration,
    /// Values every trial starts from.
    pub props: SpellProperties,
    pub(crate) effect: Option<SpellEffect>,
}

impl SpellDef {
    pub(crate) fn new(id: SpellId, unit: UnitId, config: SpellConfig) -> Self {
        Self {
            id,
            unit,
            label: config.label,
            action: config.action,
            code: config.code,
            proc_mask: config.proc_mask,
            base_cost: config.base_cost,
            cast_time: config.cast_time,
            cooldown: config.cooldown,
            props: config.props,
            effect: config.effect,
        }
    }
}

impl fmt::Debug for SpellDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellDef")
            .field("id", &self.id)
            .field("unit", &self.unit)
            .field("label", &self.label)
            .field("code", &self.code)
            .field("cooldown", &self.cooldown)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SpellState {
    pub(crate) props: SpellProperties,
    pub(crate) ready_at: SimTime,
    pub(crate) casts: u32,
    pub(crate) hits: u32,
    pub(crate) crits: u32,
    pub(crate) damage: f64,
    pub(crate) healing: f64,
}

impl SpellState {
    pub(crate) fn from_def(def: &SpellDef) -> Self {
        Self {
            props: def.props,
            ready_at: SimTime::ZERO,
            casts: 0,
            hits: 0,
            crits: 0,
            damage: 0.0,
            healing: 0.0,
        }
    }
}

impl Sim {
    /// Current property values of a spell.
    pub fn spell_props(&self, spell: SpellId) -> &SpellProperties {
        &self.spell_state(spell).props
    }

    /// Direct access for hooks that own their own apply/undo pairing.
    pub fn spell_props_mut(&mut self, spell: SpellId) -> &mut SpellProperties {
        &mut self.spell_state_mut(spell).props
    }

    pub fn spell_label(&self, spell: SpellId) -> &str {
        &self.blueprint_ref().spell(spell).label
    }
}
