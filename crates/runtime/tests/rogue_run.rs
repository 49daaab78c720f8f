use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;

use runtime::{
    AttackTable, AutoAttackDriver, Execution, RunReport, RunnerConfig, RuntimeError, TrialRunner,
};
use sim_content::{Poison, PoisonConfig, apply_poisons};
use sim_core::{Blueprint, Hand, ProcMask, Registry, SpellConfig, Stat};

fn combat_rogue() -> Result<(Arc<Blueprint>, AutoAttackDriver)> {
    let mut registry = Registry::new();
    let rogue = registry.add_unit("Rogue");
    let target = registry.add_unit("Target");
    registry.add_stat(rogue, Stat::AttackPower, 1500.0)?;
    registry.set_weapon_speed(rogue, Hand::MainHand, 2.7)?;
    registry.set_weapon_speed(rogue, Hand::OffHand, 1.5)?;
    let mh = registry.register_spell(rogue, SpellConfig::new("Main Hand").proc_mask(ProcMask::MELEE_MH_AUTO))?;
    let oh = registry.register_spell(rogue, SpellConfig::new("Off Hand").proc_mask(ProcMask::MELEE_OH_AUTO))?;
    apply_poisons(
        &mut registry,
        rogue,
        target,
        &PoisonConfig {
            main_hand: Some(Poison::Instant),
            off_hand: Some(Poison::Deadly),
            improved_poisons: 5,
            vile_poisons: 3,
            precision: 5,
            savage_combat: 2,
            windfury_totem: false,
        },
    )?;

    let driver = AutoAttackDriver::new(rogue, target)
        .hand_range(Hand::MainHand, mh, 250.0, 350.0)
        .hand(Hand::OffHand, oh, 150.0)
        .table(AttackTable {
            miss_chance: 0.24,
            crit_chance: 0.30,
            crit_multiplier: 2.0,
        });
    Ok((Arc::new(registry.finish()?), driver))
}

fn config(execution: Execution) -> RunnerConfig {
    RunnerConfig {
        iterations: 24,
        duration_secs: 60.0,
        base_seed: 1234,
        execution,
        threads: Some(4),
    }
}

#[test]
fn parallel_and_sequential_runs_agree() -> Result<()> {
    let (blueprint, driver) = combat_rogue()?;
    let driver = Arc::new(driver);
    let parallel = TrialRunner::new(Arc::clone(&blueprint), Arc::clone(&driver), config(Execution::Parallel)).run()?;
    let sequential = TrialRunner::new(blueprint, driver, config(Execution::Sequential)).run()?;
    assert_eq!(parallel, sequential);
    Ok(())
}

#[test]
fn report_covers_poisons_and_white_hits() -> Result<()> {
    let (blueprint, driver) = combat_rogue()?;
    let report = TrialRunner::new(blueprint, driver, config(Execution::Parallel)).run()?;
    assert_eq!(report.iterations, 24);

    let rogue = report.unit("Rogue").unwrap();
    assert_eq!(rogue.dps.count, 24);
    assert!(rogue.dps.min > 0.0 && rogue.dps.min <= rogue.dps.mean && rogue.dps.mean <= rogue.dps.max);
    assert_eq!(rogue.hps.max, 0.0);
    // No threat modifiers: threat tracks damage.
    assert!((rogue.tps.mean - rogue.dps.mean).abs() < 1e-6);

    // 60s at 2.7s and 1.5s from a swing at zero.
    assert!(rogue.spell("Main Hand").unwrap().avg_hits <= 23.0);
    assert!(rogue.spell("Off Hand").unwrap().avg_hits <= 41.0);
    assert!(rogue.spell("Instant Poison").unwrap().avg_damage > 0.0);
    assert!(rogue.spell("Deadly Poison").unwrap().avg_damage > 0.0);

    let deadly = rogue.aura("Deadly Poison").unwrap();
    assert!(deadly.avg_procs > 0.0);
    assert!(deadly.avg_uptime >= 0.99, "trigger aura uptime {}", deadly.avg_uptime);

    let target = report.unit("Target").unwrap();
    let debuff = target.aura("Deadly Poison (Rogue)").unwrap();
    assert!(debuff.avg_uptime > 0.5 && debuff.avg_uptime <= 1.0);
    let savage = target.aura("Savage Combat").unwrap();
    assert!((savage.avg_uptime - debuff.avg_uptime).abs() < 1e-9);
    Ok(())
}

#[test]
fn config_file_drives_a_run() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"
iterations = 6
duration_secs = 30.0
base_seed = 99
execution = "sequential"
"#
    )?;
    let config = RunnerConfig::load(file.path())?;
    assert_eq!(config.execution, Execution::Sequential);

    let (blueprint, driver) = combat_rogue()?;
    let report = TrialRunner::new(blueprint, driver, config).run()?;
    assert_eq!(report.iterations, 6);

    let json = serde_json::to_string(&report)?;
    let restored: RunReport = serde_json::from_str(&json)?;
    assert_eq!(restored.units.len(), report.units.len());
    assert_eq!(restored.iterations, 6);
    let labels = |report: &RunReport| -> Vec<String> {
        report.unit("Rogue").unwrap().spells.iter().map(|s| s.label.clone()).collect()
    };
    assert_eq!(labels(&restored), labels(&report));
    Ok(())
}

#[test]
fn missing_config_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = RunnerConfig::load(&path).unwrap_err();
    assert!(matches!(&err, RuntimeError::Io { path: p, .. } if *p == path));
    assert!(err.to_string().contains("absent.toml"));
}
