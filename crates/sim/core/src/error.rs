//! Error infrastructure for the effect engine.
//!
//! Only setup can fail with a `Result`. Everything that happens inside a trial
//! is either a total operation (clamped or no-op) or a programmer error that
//! panics, so a trial never continues on inconsistent state.
//!
//! # Design Principles
//!
//! - **Fail fast**: configuration problems surface from [`crate::Registry`]
//!   before any trial is built
//! - **Rich Context**: errors name the unit, label or handle involved
//! - **Severity Classification**: errors are categorized for the runner

use crate::types::{AuraId, DotId, SpellId, UnitId};

/// Severity level of an error, used for categorization by callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid content configuration; fix the setup and rebuild.
    ///
    /// Examples: duplicate aura label, malformed proc filter
    Configuration,

    /// Internal inconsistency, indicating a bug in the engine or its caller.
    ///
    /// Examples: a handle that does not belong to this registry
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for engine errors.
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on who has to fix it, not on impact
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str;
}

/// Configuration errors raised while content registers itself.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("unit {unit} already has an aura labelled '{label}'")]
    DuplicateAuraLabel { unit: UnitId, label: String },

    #[error("unit {unit} already has a spell labelled '{label}'")]
    DuplicateSpellLabel { unit: UnitId, label: String },

    #[error("unknown unit handle {0}")]
    UnknownUnit(UnitId),

    #[error("unknown aura handle {0}")]
    UnknownAura(AuraId),

    #[error("unknown spell handle {0}")]
    UnknownSpell(SpellId),

    #[error("unknown dot handle {0}")]
    UnknownDot(DotId),

    #[error("unit {unit} has no spell labelled '{label}'")]
    SpellNotFound { unit: UnitId, label: String },

    #[error("aura '{label}' has a zero finite duration; use NeverExpires instead")]
    ZeroDuration { label: String },

    #[error("dot on aura {aura} must have at least one tick and a non-zero tick length")]
    InvalidDot { aura: AuraId },

    #[error("aura {aura} already owns a dot")]
    DotAlreadyBound { aura: AuraId },

    #[error("proc trigger '{name}' is malformed: {reason}")]
    InvalidProcTrigger { name: String, reason: &'static str },

    #[error("spell modifier must target at least one spell")]
    EmptySpellModifier,
}

impl SetupError {
    pub(crate) fn invalid_trigger(name: &str, reason: &'static str) -> Self {
        Self::InvalidProcTrigger {
            name: name.to_owned(),
            reason,
        }
    }
}

impl EngineError for SetupError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownUnit(_)
            | Self::UnknownAura(_)
            | Self::UnknownSpell(_)
            | Self::UnknownDot(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Configuration,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateAuraLabel { .. } => "DUPLICATE_AURA_LABEL",
            Self::DuplicateSpellLabel { .. } => "DUPLICATE_SPELL_LABEL",
            Self::UnknownUnit(_) => "UNKNOWN_UNIT",
            Self::UnknownAura(_) => "UNKNOWN_AURA",
            Self::UnknownSpell(_) => "UNKNOWN_SPELL",
            Self::UnknownDot(_) => "UNKNOWN_DOT",
            Self::SpellNotFound { .. } => "SPELL_NOT_FOUND",
            Self::ZeroDuration { .. } => "ZERO_DURATION",
            Self::InvalidDot { .. } => "INVALID_DOT",
            Self::DotAlreadyBound { .. } => "DOT_ALREADY_BOUND",
            Self::InvalidProcTrigger { .. } => "INVALID_PROC_TRIGGER",
            Self::EmptySpellModifier => "EMPTY_SPELL_MODIFIER",
        }
    }
}
