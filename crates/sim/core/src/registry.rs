//! Setup phase: content registers units, spells, auras and effects into a
//! [`Registry`], which [`Registry::finish`] freezes into an immutable
//! [`Blueprint`] shared by every trial.
//!
//! All configuration errors surface here, before any trial runs.

use std::time::Duration;

use strum::{EnumCount, IntoEnumIterator};
use tracing::debug;

use crate::aura::{AuraConfig, AuraDef, AuraDuration, AuraRefs, InitHook, Reactivation};
use crate::dot::{DotConfig, DotDef};
use crate::error::SetupError;
use crate::proc::{EventKind, ProcAction, ProcTrigger, TriggerDef};
use crate::spell::{ModOp, SpellConfig, SpellDef, SpellModDef, SpellProperty};
use crate::stats::{PseudoStats, Stat, StatDepDef, StatDepKind, Stats};
use crate::types::{ActionId, AuraId, DotId, SpellCode, SpellId, SpellModId, StatDepId, TriggerId, UnitId};
use crate::unit::{Hand, UnitDef};

type SpellCallback = Box<dyn FnMut(&mut SpellDef)>;

/// Mutable registration surface used by content at setup.
pub struct Registry {
    units: Vec<UnitDef>,
    auras: Vec<AuraDef>,
    inits: Vec<Option<InitHook>>,
    spells: Vec<SpellDef>,
    spell_callbacks: Vec<(UnitId, SpellCallback)>,
    dots: Vec<DotDef>,
    triggers: Vec<TriggerDef>,
    stat_deps: Vec<StatDepDef>,
    spell_mods: Vec<SpellModDef>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            auras: Vec::new(),
            inits: Vec::new(),
            spells: Vec::new(),
            spell_callbacks: Vec::new(),
            dots: Vec::new(),
            triggers: Vec::new(),
            stat_deps: Vec::new(),
            spell_mods: Vec::new(),
        }
    }

    // ===== units and stats =====

    pub fn add_unit(&mut self, label: impl Into<String>) -> UnitId {
        let id = UnitId::from_index(self.units.len());
        self.units.push(UnitDef::new(label));
        id
    }

    pub fn unit(&self, unit: UnitId) -> Result<&UnitDef, SetupError> {
        self.units.get(unit.index()).ok_or(SetupError::UnknownUnit(unit))
    }

    fn unit_mut(&mut self, unit: UnitId) -> Result<&mut UnitDef, SetupError> {
        self.units
            .get_mut(unit.index())
            .ok_or(SetupError::UnknownUnit(unit))
    }

    pub fn find_unit(&self, label: &str) -> Option<UnitId> {
        self.units
            .iter()
            .position(|u| u.label == label)
            .map(UnitId::from_index)
    }

    pub fn add_stat(&mut self, unit: UnitId, stat: Stat, amount: f64) -> Result<(), SetupError> {
        self.unit_mut(unit)?.base_stats[stat] += amount;
        Ok(())
    }

    pub fn add_stats(&mut self, unit: UnitId, stats: &Stats) -> Result<(), SetupError> {
        self.unit_mut(unit)?.base_stats += *stats;
        Ok(())
    }

    /// Adds `amount` to every magic school resistance.
    pub fn add_resistances(&mut self, unit: UnitId, amount: f64) -> Result<(), SetupError> {
        let def = self.unit_mut(unit)?;
        for stat in Stat::RESISTANCES {
            def.base_stats[stat] += amount;
        }
        Ok(())
    }

    pub fn pseudo_stats_mut(&mut self, unit: UnitId) -> Result<&mut PseudoStats, SetupError> {
        Ok(&mut self.unit_mut(unit)?.pseudo_stats)
    }

    pub fn set_weapon_speed(&mut self, unit: UnitId, hand: Hand, speed: f64) -> Result<(), SetupError> {
        self.unit_mut(unit)?.weapon_speeds[hand.as_index()] = Some(speed).filter(|s| *s > 0.0);
        Ok(())
    }

    pub fn new_dynamic_add_stat(
        &mut self,
        unit: UnitId,
        stat: Stat,
        amount: f64,
    ) -> Result<StatDepId, SetupError> {
        self.new_stat_dep(unit, stat, StatDepKind::Add(amount))
    }

    pub fn new_dynamic_multiply_stat(
        &mut self,
        unit: UnitId,
        stat: Stat,
        factor: f64,
    ) -> Result<StatDepId, SetupError> {
        self.new_stat_dep(unit, stat, StatDepKind::Multiply(factor))
    }

    fn new_stat_dep(
        &mut self,
        unit: UnitId,
        stat: Stat,
        kind: StatDepKind,
    ) -> Result<StatDepId, SetupError> {
        self.unit(unit)?;
        let id = StatDepId::from_index(self.stat_deps.len());
        self.stat_deps.push(StatDepDef { unit, stat, kind });
        Ok(id)
    }

    // ===== spells =====

    /// Registers a spell and runs every spell-registered callback of its
    /// unit on it.
    pub fn register_spell(&mut self, unit: UnitId, config: SpellConfig) -> Result<SpellId, SetupError> {
        self.unit(unit)?;
        if self
            .spells
            .iter()
            .any(|s| s.unit == unit && s.label == config.label)
        {
            return Err(SetupError::DuplicateSpellLabel {
                unit,
                label: config.label,
            });
        }
        let id = SpellId::from_index(self.spells.len());
        let mut def = SpellDef::new(id, unit, config);
        for (owner, callback) in &mut self.spell_callbacks {
            if *owner == unit {
                callback(&mut def);
            }
        }
        self.spells.push(def);
        Ok(id)
    }

    /// Runs `callback` once on every spell of `unit`: immediately for spells
    /// already registered, and at registration for later ones.
    pub fn on_spell_registered<F>(&mut self, unit: UnitId, mut callback: F) -> Result<(), SetupError>
    where
        F: FnMut(&mut SpellDef) + 'static,
    {
        self.unit(unit)?;
        for spell in self.spells.iter_mut().filter(|s| s.unit == unit) {
            callback(spell);
        }
        self.spell_callbacks.push((unit, Box::new(callback)));
        Ok(())
    }

    pub fn spell(&self, spell: SpellId) -> Result<&SpellDef, SetupError> {
        self.spells
            .get(spell.index())
            .ok_or(SetupError::UnknownSpell(spell))
    }

    /// Permanent, setup-time access to a spell's definition.
    pub fn spell_mut(&mut self, spell: SpellId) -> Result<&mut SpellDef, SetupError> {
        self.spells
            .get_mut(spell.index())
            .ok_or(SetupError::UnknownSpell(spell))
    }

    pub fn find_spell(&self, unit: UnitId, label: &str) -> Result<SpellId, SetupError> {
        self.spells
            .iter()
            .find(|s| s.unit == unit && s.label == label)
            .map(|s| s.id)
            .ok_or_else(|| SetupError::SpellNotFound {
                unit,
                label: label.to_owned(),
            })
    }

    /// Every spell of `unit` sharing `code`, in registration order.
    pub fn spells_with_code(&self, unit: UnitId, code: SpellCode) -> Vec<SpellId> {
        self.spells
            .iter()
            .filter(|s| s.unit == unit && s.code == code)
            .map(|s| s.id)
            .collect()
    }

    pub fn new_spell_modifier(
        &mut self,
        spells: Vec<SpellId>,
        property: SpellProperty,
        op: ModOp,
    ) -> Result<SpellModId, SetupError> {
        if spells.is_empty() {
            return Err(SetupError::EmptySpellModifier);
        }
        for &spell in &spells {
            self.spell(spell)?;
        }
        let id = SpellModId::from_index(self.spell_mods.len());
        self.spell_mods.push(SpellModDef { spells, property, op });
        Ok(id)
    }

    // ===== auras =====

    pub fn register_aura(&mut self, unit: UnitId, config: AuraConfig) -> Result<AuraId, SetupError> {
        self.unit(unit)?;
        if self.find_aura(unit, &config.label).is_some() {
            return Err(SetupError::DuplicateAuraLabel {
                unit,
                label: config.label,
            });
        }
        if config.duration == AuraDuration::Finite(Duration::ZERO) {
            return Err(SetupError::ZeroDuration {
                label: config.label,
            });
        }
        let id = AuraId::from_index(self.auras.len());
        self.auras.push(AuraDef {
            id,
            unit,
            label: config.label,
            action: config.action,
            duration: config.duration,
            max_stacks: config.max_stacks,
            reactivation: config.reactivation,
            permanent: false,
            auto_activate: false,
            refs: AuraRefs::default(),
            hooks: config.hooks,
            dot: None,
            triggers: Vec::new(),
        });
        self.inits.push(config.on_init);
        Ok(id)
    }

    pub fn aura(&self, aura: AuraId) -> Result<&AuraDef, SetupError> {
        self.auras
            .get(aura.index())
            .ok_or(SetupError::UnknownAura(aura))
    }

    fn aura_mut(&mut self, aura: AuraId) -> Result<&mut AuraDef, SetupError> {
        self.auras
            .get_mut(aura.index())
            .ok_or(SetupError::UnknownAura(aura))
    }

    pub fn find_aura(&self, unit: UnitId, label: &str) -> Option<AuraId> {
        self.auras
            .iter()
            .find(|a| a.unit == unit && a.label == label)
            .map(|a| a.id)
    }

    /// Makes an aura never expire, activate itself at every trial reset, and
    /// ignore deactivation for the rest of the trial.
    pub fn make_permanent(&mut self, aura: AuraId) -> Result<(), SetupError> {
        let def = self.aura_mut(aura)?;
        def.duration = AuraDuration::NeverExpires;
        def.permanent = true;
        Ok(())
    }

    /// Aura that adds `stats` while active. Re-activation refreshes it.
    pub fn new_temporary_stats_aura(
        &mut self,
        unit: UnitId,
        label: impl Into<String>,
        action: ActionId,
        stats: Stats,
        duration: Duration,
    ) -> Result<AuraId, SetupError> {
        let config = AuraConfig::new(label)
            .action(action)
            .duration(duration)
            .reactivation(Reactivation::Refresh)
            .on_gain(move |sim, _| sim.add_stats_dynamic(unit, &stats))
            .on_expire(move |sim, _| sim.add_stats_dynamic(unit, &-stats));
        self.register_aura(unit, config)
    }

    // ===== dots =====

    pub fn new_dot(&mut self, config: DotConfig) -> Result<DotId, SetupError> {
        let aura = config.aura;
        if let Some(spell) = config.spell {
            self.spell(spell)?;
        }
        if config.ticks == 0 || config.tick_length.is_zero() {
            return Err(SetupError::InvalidDot { aura });
        }
        let id = DotId::from_index(self.dots.len());
        let def = self.aura_mut(aura)?;
        if def.dot.is_some() {
            return Err(SetupError::DotAlreadyBound { aura });
        }
        def.dot = Some(id);
        self.dots.push(config);
        Ok(id)
    }

    // ===== proc triggers =====

    /// Creates a never-expiring aura carrying `trigger`, active from the
    /// start of every trial. Returns the carrier aura.
    pub fn make_proc_trigger_aura(
        &mut self,
        unit: UnitId,
        trigger: ProcTrigger,
    ) -> Result<AuraId, SetupError> {
        self.unit(unit)?;
        let carrier = AuraId::from_index(self.auras.len());
        let def = self.validate_trigger(trigger, carrier)?;
        let carrier = self.register_aura(unit, AuraConfig::new(def.name.clone()))?;
        self.push_trigger(carrier, def)?;
        self.aura_mut(carrier)?.auto_activate = true;
        Ok(carrier)
    }

    /// Attaches `trigger` to an existing aura; it only fires while that aura
    /// is active.
    pub fn add_proc_trigger(
        &mut self,
        aura: AuraId,
        trigger: ProcTrigger,
    ) -> Result<TriggerId, SetupError> {
        self.aura(aura)?;
        let def = self.validate_trigger(trigger, aura)?;
        self.push_trigger(aura, def)
    }

    fn validate_trigger(&self, trigger: ProcTrigger, carrier: AuraId) -> Result<TriggerDef, SetupError> {
        let def = trigger.validate(carrier)?;
        match &def.action {
            ProcAction::Activate(aura) | ProcAction::AddStack(aura) | ProcAction::Stack(aura) => {
                self.aura(*aura)?;
            }
            ProcAction::Cast(spell) => {
                self.spell(*spell)?;
            }
            ProcAction::Custom(_) => {}
        }
        Ok(def)
    }

    fn push_trigger(&mut self, carrier: AuraId, def: TriggerDef) -> Result<TriggerId, SetupError> {
        let id = TriggerId::from_index(self.triggers.len());
        self.aura_mut(carrier)?.triggers.push(id);
        self.triggers.push(def);
        Ok(id)
    }

    // ===== finish =====

    /// Runs every aura's init hook once, in registration order, and freezes
    /// the registry. Auras registered by an init hook are initialised in the
    /// same pass.
    pub fn finish(mut self) -> Result<Blueprint, SetupError> {
        let mut next = 0;
        while next < self.auras.len() {
            if let Some(init) = self.inits[next].take() {
                let aura = AuraId::from_index(next);
                let refs = init(&mut self, aura)?;
                self.auras[next].refs = refs;
            }
            next += 1;
        }

        let mut listeners = vec![Listeners::default(); self.units.len()];
        for def in &self.auras {
            for kind in EventKind::iter() {
                if def.listens_to(kind, &self.triggers) {
                    listeners[def.unit.index()].by_kind[kind.as_index()].push(def.id);
                }
            }
        }

        debug!(
            target: "sim::registry",
            units = self.units.len(),
            auras = self.auras.len(),
            spells = self.spells.len(),
            dots = self.dots.len(),
            triggers = self.triggers.len(),
            "blueprint finished"
        );

        Ok(Blueprint {
            units: self.units,
            auras: self.auras,
            spells: self.spells,
            dots: self.dots,
            triggers: self.triggers,
            stat_deps: self.stat_deps,
            spell_mods: self.spell_mods,
            listeners,
        })
    }
}

#[derive(Clone, Debug, Default)]
struct Listeners {
    by_kind: [Vec<AuraId>; EventKind::COUNT],
}

/// Immutable, shareable result of setup.
///
/// Lookups by handle panic on handles from another registry; that is a
/// programmer error that must abort the trial.
#[derive(Debug)]
pub struct Blueprint {
    units: Vec<UnitDef>,
    auras: Vec<AuraDef>,
    spells: Vec<SpellDef>,
    dots: Vec<DotDef>,
    triggers: Vec<TriggerDef>,
    stat_deps: Vec<StatDepDef>,
    spell_mods: Vec<SpellModDef>,
    listeners: Vec<Listeners>,
}

impl Blueprint {
    pub fn units(&self) -> impl Iterator<Item = (UnitId, &UnitDef)> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, def)| (UnitId::from_index(i), def))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn unit(&self, unit: UnitId) -> &UnitDef {
        self.units
            .get(unit.index())
            .unwrap_or_else(|| panic!("unknown unit handle {unit}"))
    }

    pub fn find_unit(&self, label: &str) -> Option<UnitId> {
        self.units
            .iter()
            .position(|u| u.label == label)
            .map(UnitId::from_index)
    }

    pub fn auras(&self) -> impl Iterator<Item = &AuraDef> {
        self.auras.iter()
    }

    pub fn auras_of(&self, unit: UnitId) -> impl Iterator<Item = &AuraDef> {
        self.auras.iter().filter(move |a| a.unit == unit)
    }

    pub fn aura_count(&self) -> usize {
        self.auras.len()
    }

    pub fn aura(&self, aura: AuraId) -> &AuraDef {
        self.auras
            .get(aura.index())
            .unwrap_or_else(|| panic!("unknown aura handle {aura}"))
    }

    pub fn aura_refs(&self, aura: AuraId) -> &AuraRefs {
        &self.aura(aura).refs
    }

    pub fn find_aura(&self, unit: UnitId, label: &str) -> Option<AuraId> {
        self.auras_of(unit).find(|a| a.label == label).map(|a| a.id)
    }

    pub fn spells(&self) -> impl Iterator<Item = &SpellDef> {
        self.spells.iter()
    }

    pub fn spells_of(&self, unit: UnitId) -> impl Iterator<Item = &SpellDef> {
        self.spells.iter().filter(move |s| s.unit == unit)
    }

    pub fn spell(&self, spell: SpellId) -> &SpellDef {
        self.spells
            .get(spell.index())
            .unwrap_or_else(|| panic!("unknown spell handle {spell}"))
    }

    pub fn find_spell(&self, unit: UnitId, label: &str) -> Option<SpellId> {
        self.spells_of(unit).find(|s| s.label == label).map(|s| s.id)
    }

    pub fn dot(&self, dot: DotId) -> &DotDef {
        self.dots
            .get(dot.index())
            .unwrap_or_else(|| panic!("unknown dot handle {dot}"))
    }

    pub fn dot_count(&self) -> usize {
        self.dots.len()
    }

    pub fn trigger(&self, trigger: TriggerId) -> &TriggerDef {
        self.triggers
            .get(trigger.index())
            .unwrap_or_else(|| panic!("unknown trigger handle {trigger}"))
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    pub fn stat_dep(&self, dep: StatDepId) -> &StatDepDef {
        self.stat_deps
            .get(dep.index())
            .unwrap_or_else(|| panic!("unknown stat dependency handle {dep}"))
    }

    pub fn stat_dep_count(&self) -> usize {
        self.stat_deps.len()
    }

    pub fn spell_mod(&self, modifier: SpellModId) -> &SpellModDef {
        self.spell_mods
            .get(modifier.index())
            .unwrap_or_else(|| panic!("unknown spell modifier handle {modifier}"))
    }

    pub fn spell_mod_count(&self) -> usize {
        self.spell_mods.len()
    }

    /// Auras of `unit` that react to `kind`, in registration order.
    pub fn listeners(&self, unit: UnitId, kind: EventKind) -> &[AuraId] {
        self.listeners
            .get(unit.index())
            .map_or(&[], |l| l.by_kind[kind.as_index()].as_slice())
    }
}
