//! Delivery error types.

/// Errors produced while delivering a transfer.
///
/// [`Transient`](DeliveryError::Transient) is the only variant the engine
/// retries; everything else either fails the current file
/// ([`Rejected`](DeliveryError::Rejected),
/// [`RetriesExhausted`](DeliveryError::RetriesExhausted)) or aborts the
/// whole run.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("packaging error: {0}")]
    Packaging(#[from] mailpack_packaging::PackagingError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("transient delivery failure: {0}")]
    Transient(String),

    #[error("message rejected: {0}")]
    Rejected(String),

    #[error("gave up on {subject:?} after {attempts} attempts")]
    RetriesExhausted { subject: String, attempts: u32 },

    #[error("interrupted")]
    Interrupted,
}
