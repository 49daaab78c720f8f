//! Item sets: bonuses unlocked by wearing enough pieces of one set.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use sim_core::{Registry, SetupError, UnitId};

use crate::error::ContentError;

/// Setup-time effect of one set bonus.
pub type SetBonus = Arc<dyn Fn(&mut Registry, UnitId) -> Result<(), SetupError> + Send + Sync>;

/// A named set and its bonuses, keyed by the number of pieces required.
#[derive(Clone)]
pub struct ItemSet {
    pub name: String,
    bonuses: Vec<(u32, SetBonus)>,
}

impl ItemSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bonuses: Vec::new(),
        }
    }

    /// Adds the bonus unlocked at `pieces`. Bonuses are kept sorted by
    /// threshold; several bonuses may share one.
    pub fn bonus<F>(mut self, pieces: u32, bonus: F) -> Self
    where
        F: Fn(&mut Registry, UnitId) -> Result<(), SetupError> + Send + Sync + 'static,
    {
        let at = self.bonuses.partition_point(|(threshold, _)| *threshold <= pieces);
        self.bonuses.insert(at, (pieces, Arc::new(bonus)));
        self
    }

    /// Thresholds in ascending order.
    pub fn thresholds(&self) -> impl Iterator<Item = u32> + '_ {
        self.bonuses.iter().map(|(pieces, _)| *pieces)
    }

    /// Applies every bonus whose threshold `equipped` reaches, ascending.
    /// Returns how many were applied.
    pub fn apply(&self, registry: &mut Registry, unit: UnitId, equipped: u32) -> Result<usize, SetupError> {
        let mut applied = 0;
        for (pieces, bonus) in self.bonuses.iter().take_while(|(pieces, _)| *pieces <= equipped) {
            bonus(registry, unit)?;
            debug!(target: "content::item_set", set = %self.name, pieces, %unit, "set bonus applied");
            applied += 1;
        }
        Ok(applied)
    }
}

impl fmt::Debug for ItemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemSet")
            .field("name", &self.name)
            .field("thresholds", &self.thresholds().collect::<Vec<_>>())
            .finish()
    }
}

/// Every set known to a simulation, looked up by name.
#[derive(Clone, Debug, Default)]
pub struct ItemSetCatalog {
    sets: Vec<ItemSet>,
}

impl ItemSetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, set: ItemSet) -> Result<(), ContentError> {
        if self.get(&set.name).is_some() {
            return Err(ContentError::DuplicateItemSet(set.name));
        }
        self.sets.push(set);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ItemSet> {
        self.sets.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Applies the bonuses of every `(set name, pieces worn)` pair to `unit`.
    ///
    /// Every name is resolved before any bonus runs, so an unknown set
    /// leaves the registry untouched.
    pub fn apply_equipped(
        &self,
        registry: &mut Registry,
        unit: UnitId,
        equipped: &[(&str, u32)],
    ) -> Result<(), ContentError> {
        let sets = equipped
            .iter()
            .map(|&(name, pieces)| {
                self.get(name)
                    .map(|set| (set, pieces))
                    .ok_or_else(|| ContentError::UnknownItemSet(name.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (set, pieces) in sets {
            set.apply(registry, unit, pieces)?;
        }
        Ok(())
    }
}
