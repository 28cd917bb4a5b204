use super::DataKind;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("Data type must either be 'stops' or 'lines', got '{0}'")]
    InvalidKind(String),

    #[error("Mode '{0}' is not defined. Check your spelling or add a new entry")]
    UnknownMode(String),

    #[error("Mode '{mode}' has no {missing} dataset")]
    IncompleteEntry { mode: String, missing: DataKind },

    #[error("Mode '{mode}' was given an empty {kind} identifier")]
    EmptyIdentifier { mode: String, kind: DataKind },

    #[error("Mode '{0}' is defined more than once in the seed data")]
    DuplicateMode(String),

    #[error("Seed data error: {0}")]
    Seed(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
