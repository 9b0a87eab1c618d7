use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid spec: {0}")]
    InvalidSpec(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict writing {key}: expected resourceVersion {expected}, found {found}")]
    Conflict {
        key: String,
        expected: String,
        found: String,
    },

    #[error("Cannot set owner reference on {child}: {reason}")]
    OwnerReference { child: String, reason: String },

    #[error("Unable to read {kind} {name} for status: {source}")]
    StatusRead {
        kind: &'static str,
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Resource store error: {0}")]
    Store(String),
}

impl Error {
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Conflict { .. } => true,
            Error::Kube(kube::Error::Api(e)) => e.code == 409,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
