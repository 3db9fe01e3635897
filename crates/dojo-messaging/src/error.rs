use thiserror::Error;

pub type Result<T> = std::result::Result<T, MessagingError>;

/// Why an authorization check failed. Callers (and clients) need to tell a
/// reachability denial apart from an ownership denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    /// The target is outside the sender's reach per the role/branch matrix.
    #[error("{0}")]
    NotReachable(&'static str),
    /// The actor is neither the owning party of the record nor a superadmin.
    #[error("{0}")]
    NotOwner(&'static str),
}

#[derive(Debug, Error)]
pub enum MessagingError {
    /// Malformed input, rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Forbidden(#[from] Denial),

    /// Lost the thread find-or-create race; resolved internally by
    /// re-resolving, surfaces only if that also fails.
    #[error("conversation was created concurrently")]
    Conflict,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl MessagingError {
    pub fn not_reachable(reason: &'static str) -> Self {
        MessagingError::Forbidden(Denial::NotReachable(reason))
    }

    pub fn not_owner(reason: &'static str) -> Self {
        MessagingError::Forbidden(Denial::NotOwner(reason))
    }
}
