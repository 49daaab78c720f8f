//! Shaman runes built from auras, proc triggers and stat dependencies.

use std::sync::Arc;
use std::time::Duration;

use sim_core::{
    ActionId, AuraConfig, AuraId, AuraRefs, Callbacks, CombatEvent, Hand, ModOp, Outcome,
    ProcAction, ProcMask, ProcTrigger, Reactivation, Registry, SetupError, Sim, SpellCode, SpellId,
    SpellProperty, Stat, Stats, UnitId,
};

use crate::codes;

/// Spell hit rating worth one percent of hit chance.
pub const SPELL_HIT_RATING_PER_PERCENT: f64 = 1.0;

pub const MAELSTROM_WEAPON_MAX_STACKS: u32 = 5;
pub const MAELSTROM_WEAPON_DURATION: Duration = Duration::from_secs(30);
/// Cast time and cost reduction per stack.
pub const MAELSTROM_WEAPON_STEP: f64 = 0.2;

const MAELSTROM_WEAPON_CODES: [SpellCode; 6] = [
    codes::LIGHTNING_BOLT,
    codes::CHAIN_LIGHTNING,
    codes::LAVA_BURST,
    codes::HEALING_WAVE,
    codes::LESSER_HEALING_WAVE,
    codes::CHAIN_HEAL,
];

const POWER_SURGE_CODES: [SpellCode; 3] = [codes::CHAIN_LIGHTNING, codes::CHAIN_HEAL, codes::LAVA_BURST];

pub const POWER_SURGE_PROC_CHANCE: f64 = 0.05;
pub const POWER_SURGE_DURATION: Duration = Duration::from_secs(10);

pub const TWO_HANDED_MASTERY_DURATION: Duration = Duration::from_secs(10);
pub const TWO_HANDED_MASTERY_ATTACK_SPEED: f64 = 1.3;
pub const TWO_HANDED_MASTERY_ATTACK_POWER: f64 = 1.1;

pub const DUAL_WIELD_SPEC_OFF_HAND_DAMAGE: f64 = 1.5;
/// Melee and spell hit granted while both hands are armed.
pub const DUAL_WIELD_SPEC_HIT: f64 = 10.0;

pub const WAY_OF_EARTH_THREAT: f64 = 1.5;
pub const SPIRIT_OF_THE_ALPHA_DAMAGE: f64 = 1.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuneAuras {
    /// Buff whose uptime the rune is about.
    pub proc_aura: AuraId,
    /// Never-expiring aura watching combat events.
    pub trigger_aura: AuraId,
}

fn spells_with_codes(registry: &Registry, unit: UnitId, codes: &[SpellCode]) -> Vec<SpellId> {
    codes
        .iter()
        .flat_map(|&code| registry.spells_with_code(unit, code))
        .collect()
}

/// Maelstrom Weapon: landed melee hits build up to five stacks (PPM 10, or
/// 15 with a windfury imbue). Each stack cuts cast time and cost of the
/// shaman's nature spells by 20%. Casting one of them consumes every stack.
///
/// The affected spells are resolved when the registry is finished, so the
/// rune can be applied before the spells are registered.
pub fn apply_maelstrom_weapon(
    registry: &mut Registry,
    shaman: UnitId,
    windfury_imbue: bool,
) -> Result<RuneAuras, SetupError> {
    let proc_aura = registry.register_aura(
        shaman,
        AuraConfig::new("Maelstrom Weapon Proc")
            .action(ActionId::spell(408505))
            .duration(MAELSTROM_WEAPON_DURATION)
            .max_stacks(MAELSTROM_WEAPON_MAX_STACKS)
            .reactivation(Reactivation::Refresh)
            .on_init(move |registry, _| {
                Ok(AuraRefs::spells(spells_with_codes(registry, shaman, &MAELSTROM_WEAPON_CODES)))
            })
            .on_stacks_change(|sim, aura, old, new| {
                let step = MAELSTROM_WEAPON_STEP * (new as f64 - old as f64);
                let bp = sim.blueprint();
                for &spell in &bp.aura_refs(aura).spells {
                    let props = sim.spell_props_mut(spell);
                    props.cast_time_multiplier -= step;
                    props.cost_multiplier -= step;
                }
            })
            .on_cast_complete(|sim, aura, event| {
                let bp = sim.blueprint();
                if event.spell.is_some_and(|spell| bp.aura_refs(aura).spells.contains(&spell)) {
                    sim.deactivate_aura(aura);
                }
            }),
    )?;

    let ppm = if windfury_imbue { 15.0 } else { 10.0 };
    let trigger_aura = registry.make_proc_trigger_aura(
        shaman,
        ProcTrigger::new("Maelstrom Weapon", Callbacks::SPELL_HIT_DEALT)
            .proc_mask(ProcMask::MELEE)
            .outcome(Outcome::LANDED)
            .ppm(ppm)
            .action(ProcAction::Custom(Arc::new(move |sim: &mut Sim, _: AuraId, _: &CombatEvent| {
                // Re-activation refreshes the duration; only a refresh adds a stack.
                let was_active = sim.is_aura_active(proc_aura);
                sim.activate_aura(proc_aura);
                if was_active {
                    sim.add_stack(proc_aura, 1);
                }
            }))),
    )?;
    Ok(RuneAuras {
        proc_aura,
        trigger_aura,
    })
}

/// Two-Handed Mastery: main-hand hits with a two-handed weapon grant 10%
/// attack power, 30% attack speed and 10% spell hit for 10 seconds. Any
/// main-hand hit with a one-handed weapon drops the buff.
pub fn apply_two_handed_mastery(
    registry: &mut Registry,
    shaman: UnitId,
    two_handed_weapon: bool,
) -> Result<RuneAuras, SetupError> {
    let spell_hit = SPELL_HIT_RATING_PER_PERCENT * 10.0;
    let attack_power = registry.new_dynamic_multiply_stat(
        shaman,
        Stat::AttackPower,
        TWO_HANDED_MASTERY_ATTACK_POWER,
    )?;
    let proc_aura = registry.register_aura(
        shaman,
        AuraConfig::new("Two-Handed Mastery Proc")
            .action(ActionId::spell(436365))
            .duration(TWO_HANDED_MASTERY_DURATION)
            .reactivation(Reactivation::Refresh)
            .on_gain(move |sim, _| {
                sim.multiply_attack_speed(shaman, TWO_HANDED_MASTERY_ATTACK_SPEED);
                sim.add_stat_dynamic(shaman, Stat::SpellHit, spell_hit);
                sim.enable_stat_dep(attack_power);
            })
            .on_expire(move |sim, _| {
                sim.multiply_attack_speed(shaman, 1.0 / TWO_HANDED_MASTERY_ATTACK_SPEED);
                sim.add_stat_dynamic(shaman, Stat::SpellHit, -spell_hit);
                sim.disable_stat_dep(attack_power);
            }),
    )?;
    let trigger_aura = registry.register_aura(
        shaman,
        AuraConfig::new("Two-Handed Mastery").on_spell_hit_dealt(move |sim, _, event| {
            if !event.outcome.landed() || !event.proc_mask.intersects(ProcMask::MELEE_MH) {
                return;
            }
            if two_handed_weapon {
                sim.activate_aura(proc_aura);
            } else {
                sim.deactivate_aura(proc_aura);
            }
        }),
    )?;
    registry.make_permanent(trigger_aura)?;
    Ok(RuneAuras {
        proc_aura,
        trigger_aura,
    })
}

/// Dual Wield Specialization, for a shaman holding two weapons at setup.
/// Off-hand attacks deal 50% more damage, and melee and spell hit rise by
/// 10 while both hands stay armed. Landed main-hand hits re-check the
/// off-hand: an emptied slot drops the hit bonus, re-arming restores it.
///
/// Returns `None` without registering anything when either hand is empty.
pub fn apply_dual_wield_specialization(
    registry: &mut Registry,
    shaman: UnitId,
) -> Result<Option<RuneAuras>, SetupError> {
    let weapons = registry.unit(shaman)?.weapon_speeds;
    if weapons[Hand::MainHand.as_index()].is_none() || weapons[Hand::OffHand.as_index()].is_none() {
        return Ok(None);
    }
    registry.on_spell_registered(shaman, |spell| {
        if spell.proc_mask.intersects(ProcMask::MELEE_OH_AUTO) {
            spell.props.damage_multiplier *= DUAL_WIELD_SPEC_OFF_HAND_DAMAGE;
        }
    })?;

    let hit = Stats::from_pairs(&[
        (Stat::MeleeHit, DUAL_WIELD_SPEC_HIT),
        (Stat::SpellHit, SPELL_HIT_RATING_PER_PERCENT * DUAL_WIELD_SPEC_HIT),
    ]);
    let proc_aura = registry.register_aura(
        shaman,
        AuraConfig::new("Dual Wield Specialization")
            .action(ActionId::spell(408496))
            .on_gain(move |sim, _| sim.add_stats_dynamic(shaman, &hit))
            .on_expire(move |sim, _| sim.add_stats_dynamic(shaman, &-hit)),
    )?;
    let trigger_aura = registry.register_aura(
        shaman,
        AuraConfig::new("DW Spec Trigger")
            // Every trial starts armed as configured.
            .on_reset(move |sim, _| sim.activate_aura(proc_aura))
            .on_spell_hit_dealt(move |sim, _, event| {
                if !event.outcome.landed() || !event.proc_mask.intersects(ProcMask::MELEE_MH) {
                    return;
                }
                let armed = sim.weapon_speed(shaman, Hand::MainHand).is_some()
                    && sim.weapon_speed(shaman, Hand::OffHand).is_some();
                if armed {
                    sim.activate_aura(proc_aura);
                } else {
                    sim.deactivate_aura(proc_aura);
                }
            }),
    )?;
    registry.make_permanent(trigger_aura)?;
    Ok(Some(RuneAuras {
        proc_aura,
        trigger_aura,
    }))
}

/// Way of Earth: with a rockbiter main-hand imbue the shaman generates 50%
/// more threat. The rune's aura is up either way.
pub fn apply_way_of_earth(
    registry: &mut Registry,
    shaman: UnitId,
    rockbiter_imbue: bool,
) -> Result<AuraId, SetupError> {
    if rockbiter_imbue {
        registry.pseudo_stats_mut(shaman)?.threat_multiplier *= WAY_OF_EARTH_THREAT;
    }
    let aura = registry.register_aura(shaman, AuraConfig::new("Way of Earth").action(ActionId::spell(408531)))?;
    registry.make_permanent(aura)?;
    Ok(aura)
}

/// Spirit of the Alpha: 5% more physical damage dealt.
pub fn apply_spirit_of_the_alpha(registry: &mut Registry, shaman: UnitId) -> Result<(), SetupError> {
    registry.pseudo_stats_mut(shaman)?.physical_damage_dealt_multiplier *= SPIRIT_OF_THE_ALPHA_DAMAGE;
    Ok(())
}

/// Power Surge: periodic damage has a 5% chance to make Chain Lightning,
/// Chain Heal and Lava Burst instant and reset their cooldowns for 10
/// seconds. Landing one of them ends the effect. Also grants MP5 equal to
/// 15% of intellect.
pub fn apply_power_surge(registry: &mut Registry, shaman: UnitId) -> Result<RuneAuras, SetupError> {
    let intellect = registry.unit(shaman)?.base_stats[Stat::Intellect];
    registry.add_stat(shaman, Stat::Mp5, intellect * 0.15)?;

    let proc_aura = registry.register_aura(
        shaman,
        AuraConfig::new("Power Surge Proc")
            .action(ActionId::spell(440285))
            .duration(POWER_SURGE_DURATION)
            .reactivation(Reactivation::Refresh)
            .on_init(move |registry, _| {
                let spells = spells_with_codes(registry, shaman, &POWER_SURGE_CODES);
                if spells.is_empty() {
                    return Ok(AuraRefs::default());
                }
                let instant = registry.new_spell_modifier(
                    spells.clone(),
                    SpellProperty::CastTimeMultiplier,
                    ModOp::Add(-1.0),
                )?;
                Ok(AuraRefs {
                    spells,
                    spell_mods: vec![instant],
                    ..AuraRefs::default()
                })
            })
            .on_gain(|sim, aura| {
                let bp = sim.blueprint();
                let refs = bp.aura_refs(aura);
                for &modifier in &refs.spell_mods {
                    sim.enable_spell_mod(modifier);
                }
                for &spell in &refs.spells {
                    sim.reset_cooldown(spell);
                }
            })
            .on_expire(|sim, aura| {
                let bp = sim.blueprint();
                for &modifier in &bp.aura_refs(aura).spell_mods {
                    sim.disable_spell_mod(modifier);
                }
            })
            .on_spell_hit_dealt(|sim, aura, event| {
                let bp = sim.blueprint();
                if event.spell.is_some_and(|spell| bp.aura_refs(aura).spells.contains(&spell)) {
                    sim.deactivate_aura(aura);
                }
            }),
    )?;

    let trigger_aura = registry.make_proc_trigger_aura(
        shaman,
        ProcTrigger::new("Power Surge", Callbacks::PERIODIC_DAMAGE_DEALT)
            .chance(POWER_SURGE_PROC_CHANCE)
            .action(ProcAction::Activate(proc_aura)),
    )?;
    Ok(RuneAuras {
        proc_aura,
        trigger_aura,
    })
}
