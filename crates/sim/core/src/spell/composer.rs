//! Reversible spell property modifiers.
//!
//! A modifier targets one property on a list of spells. Enabling it records
//! the delta applied to each spell; disabling subtracts those recorded
//! deltas. Permanent changes are made at setup on [`super::SpellDef::props`]
//! and are never reversed.

use tracing::trace;

use super::SpellProperty;
use crate::engine::Sim;
use crate::types::{SpellId, SpellModId};

/// How a modifier combines with the property's current value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModOp {
    Add(f64),
    Multiply(f64),
}

impl ModOp {
    pub fn delta(self, current: f64) -> f64 {
        match self {
            Self::Add(amount) => amount,
            Self::Multiply(factor) => current * (factor - 1.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpellModDef {
    pub spells: Vec<SpellId>,
    pub property: SpellProperty,
    pub op: ModOp,
}

impl Sim {
    /// Applies a modifier to every spell it targets. No-op when enabled.
    pub fn enable_spell_mod(&mut self, modifier: SpellModId) {
        if self.spell_mod_slot(modifier).is_some() {
            return;
        }
        let bp = self.blueprint();
        let def = bp.spell_mod(modifier);
        let deltas: Vec<f64> = def
            .spells
            .iter()
            .map(|&spell| {
                let value = self.spell_props_mut(spell).get_mut(def.property);
                let delta = def.op.delta(*value);
                *value += delta;
                delta
            })
            .collect();
        *self.spell_mod_slot_mut(modifier) = Some(deltas);
        trace!(
            target: "sim::spell",
            modifier = %modifier,
            property = %def.property,
            "spell modifier enabled"
        );
    }

    /// Subtracts the deltas recorded at enable. No-op when disabled.
    pub fn disable_spell_mod(&mut self, modifier: SpellModId) {
        let Some(deltas) = self.spell_mod_slot_mut(modifier).take() else {
            return;
        };
        let bp = self.blueprint();
        let def = bp.spell_mod(modifier);
        for (&spell, delta) in def.spells.iter().zip(deltas) {
            *self.spell_props_mut(spell).get_mut(def.property) -= delta;
        }
        trace!(
            target: "sim::spell",
            modifier = %modifier,
            property = %def.property,
            "spell modifier disabled"
        );
    }

    pub fn is_spell_mod_enabled(&self, modifier: SpellModId) -> bool {
        self.spell_mod_slot(modifier).is_some()
    }

    fn spell_mod_slot(&self, modifier: SpellModId) -> &Option<Vec<f64>> {
        self.spell_mods
            .get(modifier.index())
            .unwrap_or_else(|| panic!("unknown spell modifier handle {modifier}"))
    }

    fn spell_mod_slot_mut(&mut self, modifier: SpellModId) -> &mut Option<Vec<f64>> {
        self.spell_mods
            .get_mut(modifier.index())
            .unwrap_or_else(|| panic!("unknown spell modifier handle {modifier}"))
    }
}
