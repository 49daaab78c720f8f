use arrayvec::ArrayVec;
use bitflags::bitflags;
use strum::{EnumCount, IntoEnumIterator};

use crate::types::{SpellId, UnitId};
use crate::unit::Hand;

/// Classification of a combat event.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumCount,
    strum::EnumIter,
    strum::IntoStaticStr,
    strum::Display,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// A direct hit or miss from the caster's side.
    SpellHitDealt,
    /// The same hit seen from the target's side.
    SpellHitTaken,
    PeriodicDamageDealt,
    HealDealt,
    CastComplete,
}

impl EventKind {
    #[inline]
    pub const fn as_index(self) -> usize {
        self as usize
    }

    /// Callback flag matching this kind.
    pub const fn callback(self) -> Callbacks {
        match self {
            Self::SpellHitDealt => Callbacks::SPELL_HIT_DEALT,
            Self::SpellHitTaken => Callbacks::SPELL_HIT_TAKEN,
            Self::PeriodicDamageDealt => Callbacks::PERIODIC_DAMAGE_DEALT,
            Self::HealDealt => Callbacks::HEAL_DEALT,
            Self::CastComplete => Callbacks::CAST_COMPLETE,
        }
    }

    /// Whether the event is observed by the target rather than the caster.
    pub const fn observed_by_target(self) -> bool {
        matches!(self, Self::SpellHitTaken)
    }
}

bitflags! {
    /// Set of event kinds a proc trigger listens to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Callbacks: u8 {
        const SPELL_HIT_DEALT       = 1 << 0;
        const SPELL_HIT_TAKEN       = 1 << 1;
        const PERIODIC_DAMAGE_DEALT = 1 << 2;
        const HEAL_DEALT            = 1 << 3;
        const CAST_COMPLETE         = 1 << 4;
    }
}

impl Callbacks {
    /// Event kinds selected by this set, in declaration order.
    pub fn kinds(self) -> ArrayVec<EventKind, { EventKind::COUNT }> {
        EventKind::iter()
            .filter(|kind| self.contains(kind.callback()))
            .collect()
    }
}

bitflags! {
    /// What produced an event: which weapon, which kind of ability.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ProcMask: u32 {
        const MELEE_MH_AUTO    = 1 << 0;
        const MELEE_OH_AUTO    = 1 << 1;
        const MELEE_MH_SPECIAL = 1 << 2;
        const MELEE_OH_SPECIAL = 1 << 3;
        const RANGED_AUTO      = 1 << 4;
        const RANGED_SPECIAL   = 1 << 5;
        const SPELL_DAMAGE     = 1 << 6;
        const SPELL_HEALING    = 1 << 7;
        /// Damage from an effect that was itself proc'd (poisons, weapon procs).
        const SPELL_PROC       = 1 << 8;

        const MELEE_MH = Self::MELEE_MH_AUTO.bits() | Self::MELEE_MH_SPECIAL.bits();
        const MELEE_OH = Self::MELEE_OH_AUTO.bits() | Self::MELEE_OH_SPECIAL.bits();
        const MELEE_AUTO = Self::MELEE_MH_AUTO.bits() | Self::MELEE_OH_AUTO.bits();
        const MELEE_SPECIAL = Self::MELEE_MH_SPECIAL.bits() | Self::MELEE_OH_SPECIAL.bits();
        const MELEE = Self::MELEE_MH.bits() | Self::MELEE_OH.bits();
        const RANGED = Self::RANGED_AUTO.bits() | Self::RANGED_SPECIAL.bits();
        const WEAPON = Self::MELEE.bits() | Self::RANGED.bits();
        const SPELL = Self::SPELL_DAMAGE.bits() | Self::SPELL_HEALING.bits() | Self::SPELL_PROC.bits();
    }
}

impl ProcMask {
    /// Melee mask covering the selected hands.
    pub fn for_hands(main_hand: bool, off_hand: bool) -> Self {
        let mut mask = Self::empty();
        if main_hand {
            mask |= Self::MELEE_MH;
        }
        if off_hand {
            mask |= Self::MELEE_OH;
        }
        mask
    }

    /// Weapon slot that produced an event with this mask, if any.
    pub fn hand(self) -> Option<Hand> {
        if self.intersects(Self::MELEE_OH) {
            Some(Hand::OffHand)
        } else if self.intersects(Self::MELEE_MH) {
            Some(Hand::MainHand)
        } else if self.intersects(Self::RANGED) {
            Some(Hand::Ranged)
        } else {
            None
        }
    }
}

bitflags! {
    /// Result of an attack roll.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Outcome: u16 {
        const HIT    = 1 << 0;
        const CRIT   = 1 << 1;
        const GLANCE = 1 << 2;
        const BLOCK  = 1 << 3;
        const MISS   = 1 << 4;
        const DODGE  = 1 << 5;
        const PARRY  = 1 << 6;
        const RESIST = 1 << 7;

        /// Any outcome that connected with the target.
        const LANDED = Self::HIT.bits() | Self::CRIT.bits() | Self::GLANCE.bits() | Self::BLOCK.bits();
    }
}

impl Outcome {
    pub fn landed(self) -> bool {
        self.intersects(Self::LANDED)
    }
}

/// One combat event, as emitted by the combat-resolution layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatEvent {
    pub kind: EventKind,
    /// Unit that caused the event.
    pub unit: UnitId,
    pub target: UnitId,
    pub spell: Option<SpellId>,
    pub proc_mask: ProcMask,
    pub outcome: Outcome,
    pub amount: f64,
}

impl CombatEvent {
    /// Unit whose auras react to this event.
    pub fn observer(&self) -> UnitId {
        if self.kind.observed_by_target() {
            self.target
        } else {
            self.unit
        }
    }

    /// The other side of the event from the observer's point of view.
    pub fn counterpart(&self) -> UnitId {
        if self.kind.observed_by_target() {
            self.unit
        } else {
            self.target
        }
    }

    /// Same event seen from the other side, or `None` for one-sided kinds.
    pub(crate) fn mirrored(&self) -> Option<Self> {
        match self.kind {
            EventKind::SpellHitDealt => Some(Self {
                kind: EventKind::SpellHitTaken,
                ..*self
            }),
            _ => None,
        }
    }
}
