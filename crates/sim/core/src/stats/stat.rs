use std::ops::{Add, AddAssign, Index, IndexMut, Neg, Sub};

use strum::{EnumCount, IntoEnumIterator};

/// Every stat tracked on a unit.
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
pub enum Stat {
    Strength,
    Agility,
    Stamina,
    Intellect,
    Spirit,
    AttackPower,
    RangedAttackPower,
    SpellPower,
    HolyPower,
    NaturePower,
    HealingPower,
    MeleeHit,
    SpellHit,
    MeleeCrit,
    SpellCrit,
    MeleeHaste,
    SpellHaste,
    Armor,
    ArcaneResistance,
    FireResistance,
    FrostResistance,
    NatureResistance,
    ShadowResistance,
    Mana,
    Mp5,
}

impl Stat {
    pub const RESISTANCES: [Stat; 5] = [
        Stat::ArcaneResistance,
        Stat::FireResistance,
        Stat::FrostResistance,
        Stat::NatureResistance,
        Stat::ShadowResistance,
    ];

    #[inline]
    pub const fn as_index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Dense stat vector indexed by [`Stat`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    values: [f64; Stat::COUNT],
}

impl Default for Stats {
    fn default() -> Self {
        Self::zero()
    }
}

impl Stats {
    pub const fn zero() -> Self {
        Self {
            values: [0.0; Stat::COUNT],
        }
    }

    /// Builds a vector from `(stat, value)` pairs; later pairs add to earlier ones.
    pub fn from_pairs(pairs: &[(Stat, f64)]) -> Self {
        let mut stats = Self::zero();
        for &(stat, value) in pairs {
            stats[stat] += value;
        }
        stats
    }

    pub fn get(&self, stat: Stat) -> f64 {
        self.values[stat.as_index()]
    }

    pub fn set(&mut self, stat: Stat, value: f64) {
        self.values[stat.as_index()] = value;
    }

    pub fn add(&mut self, stat: Stat, amount: f64) {
        self.values[stat.as_index()] += amount;
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Iterates over the non-zero entries.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        Stat::iter()
            .map(|stat| (stat, self.get(stat)))
            .filter(|(_, v)| *v != 0.0)
    }
}

impl Index<Stat> for Stats {
    type Output = f64;

    fn index(&self, stat: Stat) -> &f64 {
        &self.values[stat.as_index()]
    }
}

impl IndexMut<Stat> for Stats {
    fn index_mut(&mut self, stat: Stat) -> &mut f64 {
        &mut self.values[stat.as_index()]
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Stats) -> Stats {
        self += rhs;
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        for (lhs, rhs) in self.values.iter_mut().zip(rhs.values) {
            *lhs += rhs;
        }
    }
}

impl Sub for Stats {
    type Output = Stats;

    fn sub(self, rhs: Stats) -> Stats {
        self + (-rhs)
    }
}

impl Neg for Stats {
    type Output = Stats;

    fn neg(mut self) -> Stats {
        for v in &mut self.values {
            *v = -*v;
        }
        self
    }
}

/// Multipliers that are not stats in their own right but scale combat output.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PseudoStats {
    /// Divides weapon swing intervals (1.3 = 30% faster swings).
    pub attack_speed_multiplier: f64,
    /// Scales all damage dealt by the unit.
    pub damage_dealt_multiplier: f64,
    /// Scales damage dealt by the unit's weapon attacks.
    pub physical_damage_dealt_multiplier: f64,
    /// Scales weapon damage landing on the unit.
    pub physical_damage_taken_multiplier: f64,
    pub threat_multiplier: f64,
}

impl Default for PseudoStats {
    fn default() -> Self {
        Self {
            attack_speed_multiplier: 1.0,
            damage_dealt_multiplier: 1.0,
            physical_damage_dealt_multiplier: 1.0,
            physical_damage_taken_multiplier: 1.0,
            threat_multiplier: 1.0,
        }
    }
}
