//! Cross-trial statistics.
//!
//! Trials are folded in index order, so a report depends only on the
//! per-trial metrics and never on how trials were scheduled over threads.

use serde::{Deserialize, Serialize};

use sim_core::TrialMetrics;

/// Running mean, spread and range of one per-trial quantity (Welford).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    m2: f64,
}

impl Distribution {
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Sample standard deviation; zero below two samples.
    pub fn stdev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}

impl FromIterator<f64> for Distribution {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut dist = Self::default();
        for value in iter {
            dist.push(value);
        }
        dist
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpellReport {
    pub label: String,
    pub avg_casts: f64,
    pub avg_hits: f64,
    pub avg_crits: f64,
    pub avg_damage: f64,
    pub avg_healing: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuraReport {
    pub label: String,
    /// Mean fraction of the encounter the aura was up, in `[0, 1]`.
    pub avg_uptime: f64,
    pub avg_activations: f64,
    pub avg_procs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    pub label: String,
    pub dps: Distribution,
    pub hps: Distribution,
    /// Threat per second.
    pub tps: Distribution,
    pub resource_per_second: Distribution,
    pub spells: Vec<SpellReport>,
    pub auras: Vec<AuraReport>,
}

/// Outcome of a whole run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub iterations: u64,
    pub units: Vec<UnitReport>,
}

impl RunReport {
    /// Aggregates trials of one blueprint.
    ///
    /// Every trial of a blueprint reports the same units, spells and auras in
    /// the same order, so entries are matched by position.
    pub fn from_trials(trials: &[TrialMetrics]) -> Self {
        let Some(first) = trials.first() else {
            return Self {
                iterations: 0,
                units: Vec::new(),
            };
        };
        let n = trials.len() as f64;
        let units = first
            .units
            .iter()
            .enumerate()
            .map(|(u, unit)| {
                let per_second = |value: fn(&sim_core::UnitMetrics) -> f64| {
                    trials
                        .iter()
                        .map(|t| {
                            let secs = t.duration.as_secs_f64();
                            if secs > 0.0 { value(&t.units[u]) / secs } else { 0.0 }
                        })
                        .collect::<Distribution>()
                };
                let spells = unit
                    .spells
                    .iter()
                    .enumerate()
                    .map(|(s, spell)| {
                        let mean = |value: fn(&sim_core::SpellMetrics) -> f64| {
                            trials.iter().map(|t| value(&t.units[u].spells[s])).sum::<f64>() / n
                        };
                        SpellReport {
                            label: spell.label.clone(),
                            avg_casts: mean(|m| m.casts as f64),
                            avg_hits: mean(|m| m.hits as f64),
                            avg_crits: mean(|m| m.crits as f64),
                            avg_damage: mean(|m| m.damage),
                            avg_healing: mean(|m| m.healing),
                        }
                    })
                    .collect();
                let auras = unit
                    .auras
                    .iter()
                    .enumerate()
                    .map(|(a, aura)| {
                        let mean = |value: &dyn Fn(&TrialMetrics) -> f64| {
                            trials.iter().map(value).sum::<f64>() / n
                        };
                        AuraReport {
                            label: aura.label.clone(),
                            avg_uptime: mean(&|t| {
                                let secs = t.duration.as_secs_f64();
                                if secs > 0.0 {
                                    t.units[u].auras[a].uptime.as_secs_f64() / secs
                                } else {
                                    0.0
                                }
                            }),
                            avg_activations: mean(&|t| t.units[u].auras[a].activations as f64),
                            avg_procs: mean(&|t| t.units[u].auras[a].procs as f64),
                        }
                    })
                    .collect();
                UnitReport {
                    label: unit.label.clone(),
                    dps: per_second(|m| m.damage_done),
                    hps: per_second(|m| m.healing_done),
                    tps: per_second(|m| m.threat),
                    resource_per_second: per_second(|m| m.resource_spent),
                    spells,
                    auras,
                }
            })
            .collect();
        Self {
            iterations: trials.len() as u64,
            units,
        }
    }

    pub fn unit(&self, label: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.label == label)
    }
}

impl UnitReport {
    pub fn spell(&self, label: &str) -> Option<&SpellReport> {
        self.spells.iter().find(|s| s.label == label)
    }

    pub fn aura(&self, label: &str) -> Option<&AuraReport> {
        self.auras.iter().find(|a| a.label == label)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sim_core::{AuraMetrics, SpellMetrics, UnitMetrics};

    use super::*;

    #[test]
    fn welford_matches_two_pass() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let dist: Distribution = values.iter().copied().collect();
        assert_eq!(dist.count, 8);
        assert!((dist.mean - 5.0).abs() < 1e-12);
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((dist.stdev() - expected).abs() < 1e-12);
        assert_eq!(dist.min, 2.0);
        assert_eq!(dist.max, 9.0);
    }

    #[test]
    fn single_sample_has_no_spread() {
        let dist: Distribution = [3.5].into_iter().collect();
        assert_eq!(dist.stdev(), 0.0);
        assert_eq!((dist.min, dist.max), (3.5, 3.5));
    }

    fn trial(damage: f64, uptime_secs: u64, casts: u32) -> TrialMetrics {
        TrialMetrics {
            seed: 0,
            duration: Duration::from_secs(10),
            units: vec![UnitMetrics {
                label: "Rogue".into(),
                damage_done: damage,
                threat: damage * 1.5,
                healing_done: 0.0,
                resource_spent: 20.0,
                spells: vec![SpellMetrics {
                    label: "Sinister Strike".into(),
                    casts,
                    hits: casts,
                    crits: 0,
                    damage,
                    healing: 0.0,
                }],
                auras: vec![AuraMetrics {
                    label: "Slice and Dice".into(),
                    activations: 1,
                    procs: 0,
                    uptime: Duration::from_secs(uptime_secs),
                }],
            }],
        }
    }

    #[test]
    fn report_averages_over_trials() {
        let report = RunReport::from_trials(&[trial(1000.0, 5, 4), trial(3000.0, 10, 6)]);
        assert_eq!(report.iterations, 2);
        let unit = report.unit("Rogue").unwrap();
        assert_eq!(unit.dps.mean, 200.0);
        assert_eq!((unit.dps.min, unit.dps.max), (100.0, 300.0));
        assert_eq!(unit.tps.mean, 300.0);
        assert_eq!(unit.resource_per_second.mean, 2.0);
        assert_eq!(unit.spell("Sinister Strike").unwrap().avg_casts, 5.0);
        assert_eq!(unit.aura("Slice and Dice").unwrap().avg_uptime, 0.75);
    }

    #[test]
    fn empty_run_has_no_units() {
        let report = RunReport::from_trials(&[]);
        assert_eq!(report.iterations, 0);
        assert!(report.units.is_empty());
    }
}
