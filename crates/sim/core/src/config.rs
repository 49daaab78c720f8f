use std::time::Duration;

/// Engine constants and tunable defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Length of one encounter.
    pub encounter_duration: Duration,
}

impl SimConfig {
    // ===== compile-time limits =====
    /// Maximum nesting of combat events dispatched from inside hooks.
    ///
    /// Cascading procs are legal, but a chain this deep means two effects keep
    /// triggering each other and the trial state can no longer be trusted.
    pub const MAX_EVENT_DEPTH: usize = 64;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ENCOUNTER_SECS: u64 = 180;

    pub fn new() -> Self {
        Self {
            encounter_duration: Duration::from_secs(Self::DEFAULT_ENCOUNTER_SECS),
        }
    }

    pub fn with_encounter_duration(encounter_duration: Duration) -> Self {
        Self { encounter_duration }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}
