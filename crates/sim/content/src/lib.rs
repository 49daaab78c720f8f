//! Combat content built on `sim-core`.
//!
//! Everything here is plain setup code: each module registers spells, auras,
//! dots and proc triggers into a [`sim_core::Registry`] and hands back the
//! ids a caller may want to inspect. Nothing in this crate reaches into
//! engine internals; it only uses the public registration and `Sim` APIs.
pub mod codes;
pub mod error;
pub mod item_set;
pub mod poisons;
pub mod runes;
pub mod sets;

pub use error::ContentError;
pub use item_set::{ItemSet, ItemSetCatalog, SetBonus};
pub use poisons::{DeadlyPoison, InstantPoison, Poison, PoisonConfig, Poisons, apply_poisons};
pub use runes::{
    RuneAuras, apply_dual_wield_specialization, apply_maelstrom_weapon, apply_power_surge,
    apply_spirit_of_the_alpha, apply_two_handed_mastery, apply_way_of_earth,
};
pub use sets::paladin_sets;
