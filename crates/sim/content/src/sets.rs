//! Paladin item sets.

use std::time::Duration;

use sim_core::{
    ActionId, AuraConfig, AuraRefs, Callbacks, CombatEvent, ModOp, Outcome, ProcAction, ProcMask,
    ProcTrigger, Reactivation, Registry, SetupError, Sim, SpellProperty, Stat, Stats, UnitId,
};

use crate::codes;
use crate::error::ContentError;
use crate::item_set::{ItemSet, ItemSetCatalog};

pub const OBSESSED_PROPHETS_PLATE: &str = "Obsessed Prophet's Plate";
pub const EMERALD_ENCRUSTED_BATTLEPLATE: &str = "Emerald Encrusted Battleplate";
pub const SOULFORGE_ARMOR: &str = "Soulforge Armor";
pub const LAWBRINGER_RADIANCE: &str = "Lawbringer Radiance";
pub const FREETHINKERS_ARMOR: &str = "Freethinker's Armor";
pub const MERCIFUL_JUDGEMENT: &str = "Merciful Judgement";
pub const RADIANT_JUDGEMENT: &str = "Radiant Judgement";

/// Label of the temporary spell power aura granted by Soulforge Armor.
pub const CRUSADERS_WRATH: &str = "Crusader's Wrath";
pub const LAWBRINGER_6PC: &str = "Lawbringer Radiance 6P Bonus";
pub const FREETHINKER_5PC: &str = "Freethinker's Armor 5P Bonus";
pub const RADIANT_JUDGEMENT_2PC: &str = "Radiant Judgement 2P Bonus";
pub const RADIANT_JUDGEMENT_4PC: &str = "Radiant Judgement 4P Bonus";
pub const RADIANT_JUDGEMENT_6PC: &str = "Radiant Judgement 6P Bonus";
/// Stacking holy damage buff granted by judgements with the 6-piece bonus.
pub const RADIANT_JUDGEMENT_HOLY_DAMAGE: &str = "Radiant Judgement Holy Damage";
const RADIANT_JUDGEMENT_LAST_SEAL: &str = "Radiant Judgement Last Seal";

/// Seal auras are recognised by this label prefix.
pub const SEAL_PREFIX: &str = "Seal of ";
const MAX_TRACKED_SEALS: u32 = 16;

/// Catalog of every set in this module.
pub fn paladin_sets() -> Result<ItemSetCatalog, ContentError> {
    let mut catalog = ItemSetCatalog::new();
    for set in [
        obsessed_prophets_plate(),
        emerald_encrusted_battleplate(),
        soulforge_armor(),
        lawbringer_radiance(),
        freethinkers_armor(),
        merciful_judgement(),
        radiant_judgement(),
    ] {
        catalog.register(set)?;
    }
    Ok(catalog)
}

pub fn obsessed_prophets_plate() -> ItemSet {
    ItemSet::new(OBSESSED_PROPHETS_PLATE)
        .bonus(2, |registry, unit| {
            registry.add_stat(unit, Stat::MeleeCrit, 1.0)?;
            registry.add_stat(unit, Stat::SpellCrit, 1.0)
        })
        // +3% crit on holy spells.
        .bonus(3, |registry, unit| {
            registry.on_spell_registered(unit, |spell| {
                if codes::HOLY_SPELLS.contains(&spell.code) {
                    spell.props.bonus_crit_rating += 3.0;
                }
            })
        })
}

pub fn emerald_encrusted_battleplate() -> ItemSet {
    ItemSet::new(EMERALD_ENCRUSTED_BATTLEPLATE)
        .bonus(3, |registry, unit| registry.add_stat(unit, Stat::Stamina, 10.0))
        .bonus(6, |registry, unit| registry.add_stat(unit, Stat::HealingPower, 22.0))
}

pub fn soulforge_armor() -> ItemSet {
    ItemSet::new(SOULFORGE_ARMOR)
        .bonus(2, |registry, unit| {
            registry.add_stats(
                unit,
                &Stats::from_pairs(&[
                    (Stat::AttackPower, 40.0),
                    (Stat::RangedAttackPower, 40.0),
                    (Stat::HealingPower, 40.0),
                ]),
            )
        })
        // 6% on landed white hits and 4% on spell casts: +95 spell power for 10s.
        .bonus(4, soulforge_crusaders_wrath)
        .bonus(6, |registry, unit| registry.add_resistances(unit, 8.0))
        .bonus(8, |registry, unit| registry.add_stat(unit, Stat::Armor, 200.0))
}

fn soulforge_crusaders_wrath(registry: &mut Registry, unit: UnitId) -> Result<(), SetupError> {
    let wrath = registry.new_temporary_stats_aura(
        unit,
        CRUSADERS_WRATH,
        ActionId::spell(27499),
        Stats::from_pairs(&[(Stat::SpellPower, 95.0)]),
        Duration::from_secs(10),
    )?;
    registry.make_proc_trigger_aura(
        unit,
        ProcTrigger::new("Crusader's Wrath (Melee Auto)", Callbacks::SPELL_HIT_DEALT)
            .proc_mask(ProcMask::MELEE_AUTO)
            .outcome(Outcome::LANDED)
            .chance(0.06)
            .action(ProcAction::Activate(wrath)),
    )?;
    registry.make_proc_trigger_aura(
        unit,
        ProcTrigger::new("Crusader's Wrath (Spell Cast)", Callbacks::CAST_COMPLETE)
            .proc_mask(ProcMask::SPELL_DAMAGE | ProcMask::SPELL_HEALING)
            .chance(0.04)
            .action(ProcAction::Activate(wrath)),
    )?;
    Ok(())
}

pub fn lawbringer_radiance() -> ItemSet {
    ItemSet::new(LAWBRINGER_RADIANCE)
        .bonus(4, |registry, unit| {
            registry.add_stat(unit, Stat::MeleeCrit, 2.0)?;
            registry.add_stat(unit, Stat::SpellCrit, 2.0)
        })
        // Seal linger time is not modelled; the aura only records the bonus.
        .bonus(6, |registry, unit| {
            let aura = registry.register_aura(unit, AuraConfig::new(LAWBRINGER_6PC))?;
            registry.make_permanent(aura)
        })
}

pub fn freethinkers_armor() -> ItemSet {
    ItemSet::new(FREETHINKERS_ARMOR)
        .bonus(2, |registry, unit| registry.add_stat(unit, Stat::HolyPower, 14.0))
        .bonus(3, |registry, unit| {
            registry.on_spell_registered(unit, |spell| {
                if spell.code == codes::HOLY_SHOCK {
                    spell.props.damage_multiplier *= 1.5;
                }
            })
        })
        .bonus(5, |registry, unit| {
            registry.register_aura(
                unit,
                AuraConfig::new(FREETHINKER_5PC).on_init(move |registry, _| {
                    let exorcisms = registry.spells_with_code(unit, codes::EXORCISM);
                    for &spell in &exorcisms {
                        let def = registry.spell_mut(spell)?;
                        def.cooldown = def.cooldown.saturating_sub(Duration::from_secs(3));
                    }
                    Ok(AuraRefs::spells(exorcisms))
                }),
            )?;
            Ok(())
        })
}

pub fn merciful_judgement() -> ItemSet {
    ItemSet::new(MERCIFUL_JUDGEMENT)
        .bonus(2, |registry, unit| {
            registry.on_spell_registered(unit, |spell| {
                if spell.code == codes::HOLY_SHOCK {
                    spell.props.bonus_crit_rating += 20.0;
                }
            })
        })
        .bonus(4, |registry, unit| {
            registry.on_spell_registered(unit, |spell| {
                if spell.code == codes::CONSECRATION {
                    spell.props.damage_multiplier *= 1.5;
                }
            })
        })
}

/// Radiant Judgement.
///
/// * 2: judgements deal 20% more damage.
/// * 4: a judgement under a different seal than the previous one has its
///   cooldown reset.
/// * 6: each judgement grants 1% holy damage for 8 sec, stacking to 5.
///
/// Every bonus is a permanent aura; judgements are the unit's spells coded
/// [`codes::JUDGEMENT`], resolved when the registry finishes.
pub fn radiant_judgement() -> ItemSet {
    ItemSet::new(RADIANT_JUDGEMENT)
        .bonus(2, radiant_judgement_damage)
        .bonus(4, radiant_judgement_seal_swap)
        .bonus(6, radiant_judgement_holy_stacks)
}

fn is_judgement(sim: &Sim, event: &CombatEvent) -> bool {
    event
        .spell
        .is_some_and(|spell| sim.blueprint().spell(spell).code == codes::JUDGEMENT)
}

/// One-based position of the unit's active seal among its seal auras; zero
/// when no seal is up.
fn active_seal(sim: &Sim, unit: UnitId) -> u32 {
    sim.blueprint()
        .auras_of(unit)
        .filter(|aura| aura.label.starts_with(SEAL_PREFIX))
        .position(|aura| sim.is_aura_active(aura.id))
        .map_or(0, |i| i as u32 + 1)
}

fn radiant_judgement_damage(registry: &mut Registry, unit: UnitId) -> Result<(), SetupError> {
    let aura = registry.register_aura(
        unit,
        AuraConfig::new(RADIANT_JUDGEMENT_2PC)
            .on_init(move |registry, _| {
                let judgements = registry.spells_with_code(unit, codes::JUDGEMENT);
                if judgements.is_empty() {
                    return Ok(AuraRefs::default());
                }
                let bonus = registry.new_spell_modifier(
                    judgements.clone(),
                    SpellProperty::DamageMultiplier,
                    ModOp::Multiply(1.2),
                )?;
                Ok(AuraRefs {
                    spells: judgements,
                    spell_mods: vec![bonus],
                    ..AuraRefs::default()
                })
            })
            .on_reset(|sim, aura| {
                let bp = sim.blueprint();
                for &modifier in &bp.aura_refs(aura).spell_mods {
                    sim.enable_spell_mod(modifier);
                }
            }),
    )?;
    registry.make_permanent(aura)
}

fn radiant_judgement_seal_swap(registry: &mut Registry, unit: UnitId) -> Result<(), SetupError> {
    // Stacks hold the seal of the last judgement.
    let last_seal = registry.register_aura(
        unit,
        AuraConfig::new(RADIANT_JUDGEMENT_LAST_SEAL).max_stacks(MAX_TRACKED_SEALS),
    )?;
    let aura = registry.register_aura(
        unit,
        AuraConfig::new(RADIANT_JUDGEMENT_4PC).on_cast_complete(move |sim, _, event| {
            if !is_judgement(sim, event) {
                return;
            }
            let Some(spell) = event.spell else {
                return;
            };
            let seal = active_seal(sim, unit);
            let last = sim.aura_stacks(last_seal);
            if last != 0 && seal != last {
                sim.reset_cooldown(spell);
            }
            if seal == 0 {
                sim.deactivate_aura(last_seal);
            } else {
                sim.activate_aura(last_seal);
                sim.set_stacks(last_seal, seal);
            }
        }),
    )?;
    registry.make_permanent(aura)
}

fn radiant_judgement_holy_stacks(registry: &mut Registry, unit: UnitId) -> Result<(), SetupError> {
    let holy = registry.register_aura(
        unit,
        AuraConfig::new(RADIANT_JUDGEMENT_HOLY_DAMAGE)
            .duration(Duration::from_secs(8))
            .max_stacks(5)
            .reactivation(Reactivation::Refresh)
            .on_init(move |registry, _| {
                let spells = codes::HOLY_SPELLS
                    .iter()
                    .flat_map(|&code| registry.spells_with_code(unit, code))
                    .collect();
                Ok(AuraRefs::spells(spells))
            })
            .on_stacks_change(|sim, aura, old, new| {
                let step = 0.01 * (new as f64 - old as f64);
                let bp = sim.blueprint();
                for &spell in &bp.aura_refs(aura).spells {
                    sim.spell_props_mut(spell).damage_multiplier += step;
                }
            }),
    )?;
    let aura = registry.register_aura(
        unit,
        AuraConfig::new(RADIANT_JUDGEMENT_6PC).on_cast_complete(move |sim, _, event| {
            if !is_judgement(sim, event) {
                return;
            }
            let was_active = sim.is_aura_active(holy);
            sim.activate_aura(holy);
            if was_active {
                sim.add_stack(holy, 1);
            }
        }),
    )?;
    registry.make_permanent(aura)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sim_core::{AuraId, CastOutcome, EventKind, SimTime, SpellConfig, SpellId};

    use super::*;

    #[test]
    fn catalog_holds_every_set_once() {
        let catalog = paladin_sets().unwrap();
        assert_eq!(catalog.len(), 7);
        assert_eq!(
            catalog.get(SOULFORGE_ARMOR).unwrap().thresholds().collect::<Vec<_>>(),
            vec![2, 4, 6, 8]
        );
    }

    #[test]
    fn soulforge_stat_bonuses_stack_by_threshold() {
        let catalog = paladin_sets().unwrap();
        let mut registry = Registry::new();
        let paladin = registry.add_unit("Paladin");
        catalog
            .apply_equipped(&mut registry, paladin, &[(SOULFORGE_ARMOR, 8)])
            .unwrap();
        let stats = registry.unit(paladin).unwrap().base_stats;
        assert_eq!(stats[Stat::AttackPower], 40.0);
        assert_eq!(stats[Stat::FireResistance], 8.0);
        assert_eq!(stats[Stat::Armor], 200.0);
        assert!(registry.find_aura(paladin, CRUSADERS_WRATH).is_some());
    }

    #[test]
    fn crusaders_wrath_procs_from_white_hits() {
        let catalog = paladin_sets().unwrap();
        let mut registry = Registry::new();
        let paladin = registry.add_unit("Paladin");
        let target = registry.add_unit("Target");
        catalog
            .apply_equipped(&mut registry, paladin, &[(SOULFORGE_ARMOR, 4)])
            .unwrap();
        let wrath = registry.find_aura(paladin, CRUSADERS_WRATH).unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 21);

        let hit = CombatEvent {
            kind: EventKind::SpellHitDealt,
            unit: paladin,
            target,
            spell: None,
            proc_mask: ProcMask::MELEE_MH_AUTO,
            outcome: Outcome::HIT,
            amount: 100.0,
        };
        // 6% per hit; 500 misses in a row would be a ~1e-13 event.
        for _ in 0..500 {
            sim.emit(hit);
            if sim.is_aura_active(wrath) {
                break;
            }
        }
        assert!(sim.is_aura_active(wrath));
        assert_eq!(sim.stat(paladin, Stat::SpellPower), 95.0);
    }

    #[test]
    fn freethinker_bonuses_reach_spells_registered_later() {
        let catalog = paladin_sets().unwrap();
        let mut registry = Registry::new();
        let paladin = registry.add_unit("Paladin");
        catalog
            .apply_equipped(&mut registry, paladin, &[(FREETHINKERS_ARMOR, 5)])
            .unwrap();
        let holy_shock = registry
            .register_spell(paladin, SpellConfig::new("Holy Shock").code(codes::HOLY_SHOCK))
            .unwrap();
        let exorcism = registry
            .register_spell(
                paladin,
                SpellConfig::new("Exorcism")
                    .code(codes::EXORCISM)
                    .cooldown(Duration::from_secs(15)),
            )
            .unwrap();
        let bp = registry.finish().unwrap();
        assert_eq!(bp.spell(holy_shock).props.damage_multiplier, 1.5);
        assert_eq!(bp.spell(exorcism).props.damage_multiplier, 1.0);
        assert_eq!(bp.spell(exorcism).cooldown, Duration::from_secs(12));
    }

    #[test]
    fn lawbringer_marker_is_permanent() {
        let catalog = paladin_sets().unwrap();
        let mut registry = Registry::new();
        let paladin = registry.add_unit("Paladin");
        catalog
            .apply_equipped(&mut registry, paladin, &[(LAWBRINGER_RADIANCE, 6)])
            .unwrap();
        let marker = registry.find_aura(paladin, LAWBRINGER_6PC).unwrap();
        let mut sim = Sim::new(Arc::new(registry.finish().unwrap()), 0);
        assert!(sim.is_aura_active(marker));
        sim.deactivate_aura(marker);
        assert!(sim.is_aura_active(marker));
        assert_eq!(sim.stat(paladin, Stat::MeleeCrit), 2.0);
        sim.reset(1);
        assert!(sim.is_aura_active(marker));
    }

    #[test]
    fn obsessed_prophet_crit_reaches_holy_spells_only() {
        let catalog = paladin_sets().unwrap();
        let mut registry = Registry::new();
        let paladin = registry.add_unit("Paladin");
        catalog
            .apply_equipped(&mut registry, paladin, &[(OBSESSED_PROPHETS_PLATE, 3)])
            .unwrap();
        let exorcism = registry
            .register_spell(paladin, SpellConfig::new("Exorcism").code(codes::EXORCISM))
            .unwrap();
        let strike = registry.register_spell(paladin, SpellConfig::new("Crusader Strike")).unwrap();
        let bp = registry.finish().unwrap();
        assert_eq!(bp.spell(exorcism).props.bonus_crit_rating, 3.0);
        assert_eq!(bp.spell(strike).props.bonus_crit_rating, 0.0);
        assert_eq!(bp.unit(paladin).base_stats[Stat::SpellCrit], 1.0);
    }

    struct Retribution {
        sim: Sim,
        judgement: SpellId,
        holy_shock: SpellId,
        righteousness: AuraId,
        command: AuraId,
    }

    fn retribution_paladin() -> Retribution {
        let catalog = paladin_sets().unwrap();
        let mut registry = Registry::new();
        let paladin = registry.add_unit("Paladin");
        registry.add_unit("Target");
        catalog
            .apply_equipped(&mut registry, paladin, &[(RADIANT_JUDGEMENT, 6)])
            .unwrap();
        let righteousness = registry
            .register_aura(paladin, AuraConfig::new("Seal of Righteousness"))
            .unwrap();
        let command = registry.register_aura(paladin, AuraConfig::new("Seal of Command")).unwrap();
        let judgement = registry
            .register_spell(
                paladin,
                SpellConfig::new("Judgement")
                    .code(codes::JUDGEMENT)
                    .cooldown(Duration::from_secs(10)),
            )
            .unwrap();
        let holy_shock = registry
            .register_spell(paladin, SpellConfig::new("Holy Shock").code(codes::HOLY_SHOCK))
            .unwrap();
        Retribution {
            sim: Sim::new(Arc::new(registry.finish().unwrap()), 0),
            judgement,
            holy_shock,
            righteousness,
            command,
        }
    }

    #[test]
    fn radiant_judgement_bonuses_are_permanent_and_rearm_on_reset() {
        let Retribution { mut sim, judgement, .. } = retribution_paladin();
        let bp = sim.blueprint();
        let paladin = bp.find_unit("Paladin").unwrap();
        let two_piece = bp.find_aura(paladin, RADIANT_JUDGEMENT_2PC).unwrap();
        assert!((sim.spell_props(judgement).damage_multiplier - 1.2).abs() < 1e-12);

        for label in [RADIANT_JUDGEMENT_2PC, RADIANT_JUDGEMENT_4PC, RADIANT_JUDGEMENT_6PC] {
            let aura = bp.find_aura(paladin, label).unwrap();
            sim.deactivate_aura(aura);
            assert!(sim.is_aura_active(aura), "{label} dropped");
        }
        assert!((sim.spell_props(judgement).damage_multiplier - 1.2).abs() < 1e-12);

        sim.reset(2);
        assert!(sim.is_aura_active(two_piece));
        assert!((sim.spell_props(judgement).damage_multiplier - 1.2).abs() < 1e-12);
    }

    #[test]
    fn judging_a_new_seal_resets_the_cooldown() {
        let Retribution {
            mut sim,
            judgement,
            righteousness,
            command,
            ..
        } = retribution_paladin();
        let target = sim.blueprint().find_unit("Target").unwrap();

        sim.activate_aura(righteousness);
        assert_eq!(sim.cast(judgement, target), CastOutcome::Completed);
        assert!(!sim.is_ready(judgement));

        sim.run_until(SimTime::from_millis(10_000));
        sim.deactivate_aura(righteousness);
        sim.activate_aura(command);
        assert_eq!(sim.cast(judgement, target), CastOutcome::Completed);
        assert!(sim.is_ready(judgement));

        // Same seal again: the cooldown sticks.
        assert_eq!(sim.cast(judgement, target), CastOutcome::Completed);
        assert!(!sim.is_ready(judgement));

        // A new trial forgets the last seal.
        sim.reset(3);
        sim.activate_aura(righteousness);
        assert_eq!(sim.cast(judgement, target), CastOutcome::Completed);
        assert!(!sim.is_ready(judgement));
    }

    #[test]
    fn judgements_stack_holy_damage() {
        let Retribution {
            mut sim,
            judgement,
            holy_shock,
            righteousness,
            command,
        } = retribution_paladin();
        let bp = sim.blueprint();
        let target = bp.find_unit("Target").unwrap();
        let holy = bp.find_aura(bp.find_unit("Paladin").unwrap(), RADIANT_JUDGEMENT_HOLY_DAMAGE).unwrap();

        for i in 0..7 {
            let (off, on) = if i % 2 == 0 { (command, righteousness) } else { (righteousness, command) };
            sim.deactivate_aura(off);
            sim.activate_aura(on);
            sim.reset_cooldown(judgement);
            assert!(sim.cast(judgement, target).is_success());
        }
        assert_eq!(sim.aura_stacks(holy), 5);
        assert!((sim.spell_props(holy_shock).damage_multiplier - 1.05).abs() < 1e-12);

        sim.run_until(SimTime::from_millis(8_000));
        assert!(!sim.is_aura_active(holy));
        assert!((sim.spell_props(holy_shock).damage_multiplier - 1.0).abs() < 1e-12);
    }
}
