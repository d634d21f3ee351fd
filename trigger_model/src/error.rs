use crate::fields::FromBytesError;
use std::collections::TryReserveError;
use thiserror::Error;

/// # Status of a failed operation on a trigger object
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument violates a precondition
    ///
    /// For example: the wrong variant, an empty string where one is required, or an
    /// action group added to another group.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),

    /// The queried optional field was never assigned
    #[error("field is not set")]
    Unset,

    /// The operation is not implemented for this variant
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Buffer contents failed structural or length validation
    #[error("malformed buffer: {0}")]
    Malformed(#[from] FromBytesError),

    /// Allocation failure
    #[error("resource exhausted: {0}")]
    ResourceExhausted(#[from] TryReserveError),

    /// The output writer failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
