/// Failure reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("object adapter `{0}' could not be created: {1}")]
    AdapterCreation(String, String),

    #[error("identity `{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("object adapter `{0}' is deactivated")]
    Deactivated(String),

    #[error("{0}")]
    Other(String),
}

/// Errors from the service lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("service `{0}' is already started")]
    AlreadyStarted(String),

    #[error("service is not started")]
    NotStarted,

    #[error("failed to start worker thread: {0}")]
    Worker(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
