use std::fmt;

macro_rules! index_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Position of this handle in its registry table.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

index_handle!(
    /// Combat participant registered in a [`crate::Registry`].
    UnitId,
    "unit"
);
index_handle!(
    /// Aura registered on a unit.
    AuraId,
    "aura"
);
index_handle!(
    /// Spell (castable action) registered on a unit.
    SpellId,
    "spell"
);
index_handle!(
    /// Periodic effect bound to an aura.
    DotId,
    "dot"
);
index_handle!(
    /// Dynamic stat dependency registered on a unit.
    StatDepId,
    "statdep"
);
index_handle!(
    /// Reversible spell property modifier.
    SpellModId,
    "spellmod"
);
index_handle!(
    /// Proc trigger carried by an aura.
    TriggerId,
    "trigger"
);

/// Game-facing identifier of an action, used only for display and logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionId(pub u32);

impl ActionId {
    pub const NONE: Self = Self(0);

    pub const fn spell(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action:{}", self.0)
    }
}

/// Content-defined grouping code for spells.
///
/// Several ranks of one ability share a code, which lets content find "all
/// spells of family X" without holding direct handles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellCode(pub u32);

impl SpellCode {
    pub const NONE: Self = Self(0);
}
