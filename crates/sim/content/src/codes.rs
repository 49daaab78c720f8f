//! Spell codes shared between content modules.
//!
//! A code groups every rank of one ability, so bonuses can target "Holy
//! Shock" without knowing how many ranks a unit registered.

use sim_core::SpellCode;

// ===== paladin =====
pub const HOLY_SHOCK: SpellCode = SpellCode(1);
pub const EXORCISM: SpellCode = SpellCode(2);
pub const CONSECRATION: SpellCode = SpellCode(3);
pub const JUDGEMENT: SpellCode = SpellCode(4);
pub const HOLY_WRATH: SpellCode = SpellCode(5);
pub const HAMMER_OF_WRATH: SpellCode = SpellCode(6);

/// Paladin spells of the holy school.
pub const HOLY_SPELLS: [SpellCode; 6] = [
    HOLY_SHOCK,
    EXORCISM,
    CONSECRATION,
    JUDGEMENT,
    HOLY_WRATH,
    HAMMER_OF_WRATH,
];

// ===== shaman =====
pub const LIGHTNING_BOLT: SpellCode = SpellCode(20);
pub const CHAIN_LIGHTNING: SpellCode = SpellCode(21);
pub const LAVA_BURST: SpellCode = SpellCode(22);
pub const HEALING_WAVE: SpellCode = SpellCode(23);
pub const LESSER_HEALING_WAVE: SpellCode = SpellCode(24);
pub const CHAIN_HEAL: SpellCode = SpellCode(25);
