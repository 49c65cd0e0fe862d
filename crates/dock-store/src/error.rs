//! Error types for dock-store

/// Turning a locator back into a live path failed.
/// Surfaced per item at use time, never at load time.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("locator is unresolvable: {0}")]
    Unresolvable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reading or writing the durable backing store failed.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}
