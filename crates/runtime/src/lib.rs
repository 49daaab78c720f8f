//! Monte Carlo runner for `sim-core` encounters.
//!
//! Content is registered once into a `sim_core::Registry` and frozen into a
//! `Blueprint`. [`TrialRunner`] then runs any number of independent trials
//! from it, each with its own seed and an [`EncounterDriver`] supplying the
//! combat, and folds their metrics into a [`RunReport`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use runtime::{RotationDriver, RunnerConfig, TrialRunner};
//! use sim_core::{Registry, SpellConfig};
//!
//! let mut registry = Registry::new();
//! let mage = registry.add_unit("Mage");
//! let target = registry.add_unit("Target");
//! let bolt = registry.register_spell(mage, SpellConfig::new("Bolt"))?;
//! let blueprint = Arc::new(registry.finish()?);
//!
//! let config = RunnerConfig::from_toml_str("iterations = 500")?;
//! let report = TrialRunner::new(blueprint, RotationDriver::new(target, vec![bolt]), config).run()?;
//! println!("{:?}", report.unit("Mage").map(|u| u.dps.mean));
//! # Ok::<(), runtime::RuntimeError>(())
//! ```
pub mod aggregate;
pub mod config;
pub mod driver;
pub mod error;
pub mod runner;
pub mod telemetry;

pub use aggregate::{AuraReport, Distribution, RunReport, SpellReport, UnitReport};
pub use config::{Execution, RunnerConfig};
pub use driver::{AttackTable, AutoAttackDriver, EncounterDriver, RotationDriver};
pub use error::{Result, RuntimeError};
pub use runner::TrialRunner;
pub use telemetry::init_tracing;
