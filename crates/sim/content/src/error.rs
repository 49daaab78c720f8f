use thiserror::Error;

use sim_core::{EngineError, ErrorSeverity, SetupError};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("no item set named '{0}'")]
    UnknownItemSet(String),

    #[error("item set '{0}' is already in the catalog")]
    DuplicateItemSet(String),
}

impl EngineError for ContentError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Setup(err) => err.severity(),
            Self::UnknownItemSet(_) | Self::DuplicateItemSet(_) => ErrorSeverity::Configuration,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Setup(err) => err.error_code(),
            Self::UnknownItemSet(_) => "UNKNOWN_ITEM_SET",
            Self::DuplicateItemSet(_) => "DUPLICATE_ITEM_SET",
        }
    }
}
