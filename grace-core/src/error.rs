use thiserror::Error;

/// Recoverable failures of collection operations.
///
/// Absence of a key is never an error, and misuse of read-side critical
/// sections panics instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("failed to allocate a {size} byte node")]
    Allocation { size: usize },
}

pub type Result<T> = std::result::Result<T, ListError>;
