//! Monte Carlo trial execution.
//!
//! Every trial builds its own [`Sim`] from the shared blueprint and a seed
//! derived from `(base_seed, trial index)`. Trials never share mutable
//! state, so they run on the rayon pool without locking.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, error, info};

use sim_core::{Blueprint, Sim, TrialMetrics, trial_seed};

use crate::aggregate::RunReport;
use crate::config::{Execution, RunnerConfig};
use crate::driver::EncounterDriver;
use crate::error::{Result, RuntimeError};

pub struct TrialRunner {
    blueprint: Arc<Blueprint>,
    driver: Box<dyn EncounterDriver>,
    config: RunnerConfig,
}

impl TrialRunner {
    pub fn new(
        blueprint: Arc<Blueprint>,
        driver: impl EncounterDriver + 'static,
        config: RunnerConfig,
    ) -> Self {
        Self {
            blueprint,
            driver: Box::new(driver),
            config,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs trial number `trial` to the end of the encounter.
    ///
    /// A panic inside the trial (a stale handle, a runaway proc cascade)
    /// is caught and reported as [`RuntimeError::TrialAborted`].
    pub fn run_trial(&self, trial: u64) -> Result<TrialMetrics> {
        let seed = trial_seed(self.config.base_seed, trial);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut sim = Sim::with_config(Arc::clone(&self.blueprint), seed, self.config.sim_config());
            self.driver.start(&mut sim);
            sim.run_encounter();
            sim.metrics()
        }));
        match outcome {
            Ok(metrics) => {
                debug!(target: "runtime::runner", trial, seed, "trial finished");
                Ok(metrics)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(target: "runtime::runner", trial, seed, %message, "trial aborted");
                Err(RuntimeError::TrialAborted { trial, message })
            }
        }
    }

    /// Runs every configured trial and aggregates them.
    ///
    /// The first aborted trial fails the whole run; no partial report is
    /// produced.
    pub fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let iterations = self.config.iterations;
        info!(
            target: "runtime::runner",
            iterations,
            base_seed = self.config.base_seed,
            execution = ?self.config.execution,
            threads = ?self.config.threads,
            "run started"
        );
        let started = Instant::now();

        let trials = match (self.config.execution, self.config.threads) {
            (Execution::Sequential, _) => {
                (0..iterations).map(|trial| self.run_trial(trial)).collect::<Result<Vec<_>>>()?
            }
            (Execution::Parallel, None) => self.run_parallel()?,
            (Execution::Parallel, Some(threads)) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
                pool.install(|| self.run_parallel())?
            }
        };

        let report = RunReport::from_trials(&trials);
        info!(
            target: "runtime::runner",
            iterations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        Ok(report)
    }

    fn run_parallel(&self) -> Result<Vec<TrialMetrics>> {
        (0..self.config.iterations)
            .into_par_iter()
            .map(|trial| self.run_trial(trial))
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
