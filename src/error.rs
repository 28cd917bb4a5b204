use crate::portal::FetchError;
use crate::registry::RegistryError;

/// Coarse classification, for callers that branch on what went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Configuration,
    Lookup,
    Transport,
    Output,
}

#[derive(thiserror::Error, Debug)]
pub enum TransitError {
    #[error("Configuration error: {0}")]
    Config(RegistryError),

    #[error("Mode '{0}' is not defined. Check your spelling or add a new entry")]
    UnknownMode(String),

    #[error("Fetch error for '{mode}': {source}")]
    Fetch {
        mode: String,
        #[source]
        source: FetchError,
    },

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<RegistryError> for TransitError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownMode(mode) => TransitError::UnknownMode(mode),
            other => TransitError::Config(other),
        }
    }
}

impl TransitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransitError::Config(_) => ErrorKind::Configuration,
            TransitError::UnknownMode(_) => ErrorKind::Lookup,
            TransitError::Fetch { .. } => ErrorKind::Transport,
            TransitError::Output(_) | TransitError::Serialize(_) => ErrorKind::Output,
        }
    }
}

impl From<TransitError> for std::io::Error {
    fn from(e: TransitError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, e)
    }
}

pub type TransitResult<T> = Result<T, TransitError>;
