//! Rogue weapon poisons.
//!
//! Each imbued weapon gets a never-expiring trigger aura on the rogue that
//! casts the poison at the struck target on landed hits. Poisons make a
//! magic hit roll of their own. Deadly poison stacks a dot on the target
//! and, with Savage Combat, raises the physical damage it takes while up.
//! Instant poison hits once and can crit.

use std::time::Duration;

use tracing::debug;

use sim_core::{
    ActionId, AuraConfig, AuraId, Callbacks, DotConfig, DotId, DotRefreshPolicy, Outcome,
    ProcAction, ProcMask, ProcTrigger, Registry, SetupError, Sim, SpellConfig, SpellId,
    SpellProperties, Stat, UnitId,
};

/// Poison applied to one weapon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Poison {
    Deadly,
    Instant,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoisonConfig {
    pub main_hand: Option<Poison>,
    pub off_hand: Option<Poison>,
    /// Improved Poisons talent rank, 0 to 5.
    pub improved_poisons: u32,
    /// Vile Poisons talent rank, 0 to 3.
    pub vile_poisons: u32,
    /// Precision talent rank, 0 to 5. Each rank adds 5 hit rating to poisons.
    pub precision: u32,
    /// Savage Combat talent rank, 0 to 2.
    pub savage_combat: u32,
    /// A windfury totem overrides the main-hand imbue.
    pub windfury_totem: bool,
}

impl PoisonConfig {
    fn proc_mask(&self, poison: Poison) -> ProcMask {
        ProcMask::for_hands(
            !self.windfury_totem && self.main_hand == Some(poison),
            self.off_hand == Some(poison),
        )
    }

    fn damage_multiplier(&self) -> f64 {
        const VILE_POISONS: [f64; 4] = [0.0, 0.07, 0.14, 0.20];
        1.0 + VILE_POISONS[self.vile_poisons.min(3) as usize]
    }

    fn props(&self) -> SpellProperties {
        SpellProperties {
            damage_multiplier: self.damage_multiplier(),
            bonus_hit_rating: 5.0 * self.precision.min(5) as f64,
            ..SpellProperties::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeadlyPoison {
    pub spell: SpellId,
    /// Stacking aura on the target that owns the dot.
    pub debuff: AuraId,
    pub dot: DotId,
    pub trigger: AuraId,
    /// Physical damage-taken debuff kept up alongside the poison.
    pub savage_combat: Option<AuraId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstantPoison {
    pub spell: SpellId,
    pub trigger: AuraId,
}

/// Handles of the poisons actually imbued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Poisons {
    pub deadly: Option<DeadlyPoison>,
    pub instant: Option<InstantPoison>,
}

pub const DEADLY_POISON_MAX_STACKS: u32 = 5;
pub const DEADLY_POISON_DURATION: Duration = Duration::from_secs(12);
pub const DEADLY_POISON_TICKS: u32 = 4;
pub const DEADLY_POISON_TICK_LENGTH: Duration = Duration::from_secs(3);

/// Chance for a spell to miss a boss-level target before any hit bonus.
pub const BASE_SPELL_MISS_CHANCE: f64 = 0.17;
pub const SAVAGE_COMBAT: &str = "Savage Combat";

/// Proc chance of deadly poison per landed hit.
pub fn deadly_poison_chance(improved_poisons: u32) -> f64 {
    0.3 + 0.04 * improved_poisons.min(5) as f64
}

/// Proc chance of instant poison per landed hit.
pub fn instant_poison_chance(improved_poisons: u32) -> f64 {
    0.2 + 0.06 * improved_poisons.min(5) as f64
}

/// Registers the poisons imbued on `rogue`'s weapons, targeting `target`.
pub fn apply_poisons(
    registry: &mut Registry,
    rogue: UnitId,
    target: UnitId,
    config: &PoisonConfig,
) -> Result<Poisons, SetupError> {
    let poisons = Poisons {
        deadly: register_deadly_poison(registry, rogue, target, config)?,
        instant: register_instant_poison(registry, rogue, config)?,
    };
    debug!(
        target: "content::poisons",
        deadly = poisons.deadly.is_some(),
        instant = poisons.instant.is_some(),
        "poisons applied"
    );
    Ok(poisons)
}

fn register_deadly_poison(
    registry: &mut Registry,
    rogue: UnitId,
    target: UnitId,
    config: &PoisonConfig,
) -> Result<Option<DeadlyPoison>, SetupError> {
    let mask = config.proc_mask(Poison::Deadly);
    if mask.is_empty() {
        return Ok(None);
    }
    let action = ActionId::spell(43233);
    let savage_combat = register_savage_combat(registry, target, config.savage_combat)?;
    let debuff_label = format!("Deadly Poison ({})", registry.unit(rogue)?.label);
    let mut debuff_config = AuraConfig::new(debuff_label)
        .action(action)
        .duration(DEADLY_POISON_DURATION)
        .max_stacks(DEADLY_POISON_MAX_STACKS);
    if let Some(savage) = savage_combat {
        debuff_config = debuff_config
            .on_gain(move |sim, _| sim.activate_aura(savage))
            .on_expire(move |sim, _| sim.deactivate_aura(savage));
    }
    // The debuff is registered before the spell so the effect can capture it.
    let debuff = registry.register_aura(target, debuff_config)?;
    let spell = registry.register_spell(
        rogue,
        SpellConfig::new("Deadly Poison")
            .action(action)
            .proc_mask(ProcMask::SPELL_PROC)
            .props(config.props())
            .on_cast(move |sim, spell, target| {
                let outcome = if magic_hit(sim, spell, rogue, "Deadly Poison Hit") {
                    Outcome::HIT
                } else {
                    Outcome::MISS
                };
                sim.deal_spell_hit(spell, target, outcome, 0.0);
                if !outcome.landed() {
                    return;
                }
                if sim.is_aura_active(debuff) {
                    sim.refresh_aura(debuff);
                    sim.add_stack(debuff, 1);
                } else {
                    sim.activate_aura(debuff);
                }
            }),
    )?;

    let dot = registry.new_dot(
        DotConfig::new(debuff, DEADLY_POISON_TICKS, DEADLY_POISON_TICK_LENGTH)
            .spell(spell)
            .refresh(DotRefreshPolicy::Reset)
            .on_tick(move |sim, tick| {
                let per_stack = 74.0 / 4.0 + sim.stat(rogue, Stat::AttackPower) * 0.12;
                let amount = sim.spell_damage(spell, per_stack * tick.stacks as f64);
                sim.deal_periodic(spell, target, amount);
            }),
    )?;

    let trigger = registry.make_proc_trigger_aura(
        rogue,
        ProcTrigger::new("Deadly Poison", Callbacks::SPELL_HIT_DEALT)
            .proc_mask(mask)
            .outcome(Outcome::LANDED)
            .chance(deadly_poison_chance(config.improved_poisons))
            .action(ProcAction::Cast(spell)),
    )?;
    Ok(Some(DeadlyPoison {
        spell,
        debuff,
        dot,
        trigger,
        savage_combat,
    }))
}

/// Registers (or reuses) the target's Savage Combat debuff: +1% physical
/// damage taken per talent rank.
fn register_savage_combat(
    registry: &mut Registry,
    target: UnitId,
    rank: u32,
) -> Result<Option<AuraId>, SetupError> {
    if rank == 0 {
        return Ok(None);
    }
    if let Some(existing) = registry.find_aura(target, SAVAGE_COMBAT) {
        return Ok(Some(existing));
    }
    let factor = 1.0 + 0.01 * rank.min(2) as f64;
    let aura = registry.register_aura(
        target,
        AuraConfig::new(SAVAGE_COMBAT)
            .action(ActionId::spell(14904))
            .on_gain(move |sim, _| sim.pseudo_stats_mut(target).physical_damage_taken_multiplier *= factor)
            .on_expire(move |sim, _| sim.pseudo_stats_mut(target).physical_damage_taken_multiplier /= factor),
    )?;
    Ok(Some(aura))
}

fn register_instant_poison(
    registry: &mut Registry,
    rogue: UnitId,
    config: &PoisonConfig,
) -> Result<Option<InstantPoison>, SetupError> {
    let mask = config.proc_mask(Poison::Instant);
    if mask.is_empty() {
        return Ok(None);
    }
    let spell = registry.register_spell(
        rogue,
        SpellConfig::new("Instant Poison")
            .action(ActionId::spell(43231))
            .proc_mask(ProcMask::SPELL_PROC)
            .props(config.props())
            .on_cast(move |sim, spell, target| {
                let base = 300.0 + sim.stat(rogue, Stat::AttackPower) * 0.1;
                let outcome = if !magic_hit(sim, spell, rogue, "Instant Poison Hit") {
                    Outcome::MISS
                } else if magic_crit(sim, spell, rogue, "Instant Poison Crit") {
                    Outcome::CRIT
                } else {
                    Outcome::HIT
                };
                let mut amount = sim.spell_damage(spell, base);
                if outcome.contains(Outcome::CRIT) {
                    amount *= SPELL_CRIT_MULTIPLIER;
                }
                sim.deal_spell_hit(spell, target, outcome, amount);
            }),
    )?;
    let trigger = registry.make_proc_trigger_aura(
        rogue,
        ProcTrigger::new("Instant Poison", Callbacks::SPELL_HIT_DEALT)
            .proc_mask(mask)
            .outcome(Outcome::LANDED)
            .chance(instant_poison_chance(config.improved_poisons))
            .action(ProcAction::Cast(spell)),
    )?;
    Ok(Some(InstantPoison { spell, trigger }))
}

const SPELL_CRIT_MULTIPLIER: f64 = 1.5;

/// Miss chance of a spell after the caster's spell hit and the spell's bonus
/// hit rating, both in percent.
pub fn spell_miss_chance(spell_hit: f64, bonus_hit_rating: f64) -> f64 {
    (BASE_SPELL_MISS_CHANCE - (spell_hit + bonus_hit_rating) / 100.0).clamp(0.0, 1.0)
}

fn magic_hit(sim: &mut Sim, spell: SpellId, caster: UnitId, stream: &str) -> bool {
    let miss = spell_miss_chance(sim.stat(caster, Stat::SpellHit), sim.spell_props(spell).bonus_hit_rating);
    sim.roll(stream, 1.0 - miss)
}

/// Crit roll using the caster's spell crit (percent) plus the spell's bonus
/// crit rating.
fn magic_crit(sim: &mut Sim, spell: SpellId, caster: UnitId, stream: &str) -> bool {
    let crit = (sim.stat(caster, Stat::SpellCrit) + sim.spell_props(spell).bonus_crit_rating) / 100.0;
    sim.roll(stream, crit)
}
