//! Error taxonomy shared by the store and the engine facade.

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngramError {
    /// Engram id not present in the store
    #[error("Engram not found: {0}")]
    NotFound(String),
    /// Invalid argument (unknown kind, out-of-range factor, unknown preset)
    #[error("Bad argument: {0}")]
    BadArg(String),
    /// Malformed full-text query
    #[error("Bad query: {0}")]
    BadQuery(String),
    /// Integrity failure in the backing store
    #[error("Store error: {0}")]
    Store(String),
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Writer lock held elsewhere; only surfaced by try-lock variants
    #[error("Lock busy: {0}")]
    LockBusy(&'static str),
}

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, EngramError>;
