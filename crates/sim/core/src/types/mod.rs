//! Identifiers and simulated time shared by every engine component.

mod ids;
mod time;

pub use ids::{ActionId, AuraId, DotId, SpellCode, SpellId, SpellModId, StatDepId, TriggerId, UnitId};
pub use time::SimTime;
