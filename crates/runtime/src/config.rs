//! Run configuration loaded from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sim_core::SimConfig;

use crate::error::{Result, RuntimeError};

/// How trials are spread over threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    #[default]
    Parallel,
    Sequential,
}

/// Settings for one Monte Carlo run.
///
/// ```toml
/// iterations = 1000
/// duration_secs = 180.0
/// base_seed = 42
/// execution = "parallel"
/// threads = 8
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub iterations: u64,
    /// Encounter length of every trial.
    pub duration_secs: f64,
    pub base_seed: u64,
    pub execution: Execution,
    /// Size of a dedicated rayon pool; the global pool is used when unset.
    pub threads: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            duration_secs: SimConfig::DEFAULT_ENCOUNTER_SECS as f64,
            base_seed: 0,
            execution: Execution::Parallel,
            threads: None,
        }
    }
}

impl RunnerConfig {
    /// Longest accepted encounter: one simulated day.
    pub const MAX_DURATION_SECS: f64 = 86_400.0;

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(RuntimeError::InvalidConfig("iterations must be positive".into()));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(RuntimeError::InvalidConfig(format!(
                "duration_secs must be a positive number, got {}",
                self.duration_secs
            )));
        }
        if self.duration_secs > Self::MAX_DURATION_SECS {
            return Err(RuntimeError::InvalidConfig(format!(
                "duration_secs must be at most {}, got {}",
                Self::MAX_DURATION_SECS,
                self.duration_secs
            )));
        }
        if self.threads == Some(0) {
            return Err(RuntimeError::InvalidConfig("threads must be positive".into()));
        }
        Ok(())
    }

    /// Encounter length, clamped to `[0, MAX_DURATION_SECS]` for configs that
    /// skipped validation. NaN maps to zero.
    pub fn encounter_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs.clamp(0.0, Self::MAX_DURATION_SECS))
            .unwrap_or(Duration::ZERO)
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig::with_encounter_duration(self.encounter_duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = RunnerConfig::from_toml_str(
            r#"
            iterations = 250
            duration_secs = 120.5
            base_seed = 7
            execution = "sequential"
            threads = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.iterations, 250);
        assert_eq!(config.execution, Execution::Sequential);
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.encounter_duration(), Duration::from_millis(120_500));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config = RunnerConfig::from_toml_str("base_seed = 3").unwrap();
        assert_eq!(config.base_seed, 3);
        assert_eq!(config.iterations, RunnerConfig::default().iterations);
        assert_eq!(config.execution, Execution::Parallel);
    }

    #[test]
    fn oversized_durations_never_panic() {
        let config = RunnerConfig {
            duration_secs: 1e300,
            ..RunnerConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.encounter_duration(), Duration::from_secs(86_400));

        let config = RunnerConfig {
            duration_secs: f64::NAN,
            ..RunnerConfig::default()
        };
        assert_eq!(config.encounter_duration(), Duration::ZERO);
        assert!(RunnerConfig::from_toml_str("duration_secs = 86400.0").is_ok());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            RunnerConfig::from_toml_str("iterations = 0"),
            Err(RuntimeError::InvalidConfig(_))
        ));
        assert!(matches!(
            RunnerConfig::from_toml_str("duration_secs = -1.0"),
            Err(RuntimeError::InvalidConfig(_))
        ));
        assert!(matches!(
            RunnerConfig::from_toml_str("duration_secs = 1e300"),
            Err(RuntimeError::InvalidConfig(_))
        ));
        assert!(matches!(
            RunnerConfig::from_toml_str("threads = 0"),
            Err(RuntimeError::InvalidConfig(_))
        ));
        assert!(matches!(
            RunnerConfig::from_toml_str("iterations = \"many\""),
            Err(RuntimeError::Config(_))
        ));
        assert!(matches!(
            RunnerConfig::from_toml_str("trials = 5"),
            Err(RuntimeError::Config(_))
        ));
    }
}
