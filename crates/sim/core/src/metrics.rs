//! Per-trial outcome snapshot.

use std::time::Duration;

use crate::engine::Sim;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellMetrics {
    pub label: String,
    pub casts: u32,
    pub hits: u32,
    pub crits: u32,
    pub damage: f64,
    pub healing: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuraMetrics {
    pub label: String,
    pub activations: u32,
    /// Times a trigger carried by this aura fired.
    pub procs: u32,
    pub uptime: Duration,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitMetrics {
    pub label: String,
    pub damage_done: f64,
    /// Damage done scaled by the unit's threat multiplier at the time of each hit.
    pub threat: f64,
    pub healing_done: f64,
    pub resource_spent: f64,
    /// In spell registration order.
    pub spells: Vec<SpellMetrics>,
    /// In aura registration order.
    pub auras: Vec<AuraMetrics>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialMetrics {
    pub seed: u64,
    /// Simulated time covered by the trial.
    pub duration: Duration,
    pub units: Vec<UnitMetrics>,
}

impl TrialMetrics {
    pub fn unit(&self, label: &str) -> Option<&UnitMetrics> {
        self.units.iter().find(|u| u.label == label)
    }
}

impl UnitMetrics {
    pub fn spell(&self, label: &str) -> Option<&SpellMetrics> {
        self.spells.iter().find(|s| s.label == label)
    }

    pub fn aura(&self, label: &str) -> Option<&AuraMetrics> {
        self.auras.iter().find(|a| a.label == label)
    }
}

impl Sim {
    /// Snapshot of everything recorded so far. Auras still active count
    /// their uptime up to now.
    pub fn metrics(&self) -> TrialMetrics {
        let bp = self.blueprint_ref();
        let now = self.now();
        let units = bp
            .units()
            .map(|(unit, def)| {
                let state = self.unit_state(unit);
                let spells = bp
                    .spells_of(unit)
                    .map(|spell| {
                        let s = self.spell_state(spell.id);
                        SpellMetrics {
                            label: spell.label.clone(),
                            casts: s.casts,
                            hits: s.hits,
                            crits: s.crits,
                            damage: s.damage,
                            healing: s.healing,
                        }
                    })
                    .collect();
                let auras = bp
                    .auras_of(unit)
                    .map(|aura| {
                        let s = self.aura_state(aura.id);
                        let open = if s.active { now.since(s.gained_at) } else { Duration::ZERO };
                        AuraMetrics {
                            label: aura.label.clone(),
                            activations: s.activations,
                            procs: s.procs,
                            uptime: s.uptime + open,
                        }
                    })
                    .collect();
                UnitMetrics {
                    label: def.label.clone(),
                    damage_done: state.damage_done,
                    threat: state.threat,
                    healing_done: state.healing_done,
                    resource_spent: state.resource_spent,
                    spells,
                    auras,
                }
            })
            .collect();
        TrialMetrics {
            seed: self.seed(),
            duration: now.0,
            units,
        }
    }
}
