use crate::action::ActionType;
use crate::buffer::BufferView;
use crate::condition::ConditionType;
use thiserror::Error;

/// Error type for deserializing objects from an untrusted byte buffer
///
/// Every variant describes malformed input: the buffer is structurally invalid, truncated,
/// or declares lengths that do not match its contents.
#[derive(Error, Debug)]
pub enum FromBytesError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A sub-view would extend past its parent
    #[error("buffer view out of bounds (offset {offset}, length {length:?}, size {size})")]
    OutOfBounds {
        /// requested offset
        offset: usize,
        /// requested length (`None` means "rest of the parent")
        length: Option<usize>,
        /// size of the parent view
        size: usize,
    },

    /// A fixed-size field or header does not fit in the buffer
    #[error("truncated field (wanted {wanted}, got {got})")]
    TruncatedField {
        /// bytes needed
        wanted: usize,
        /// bytes available
        got: usize,
    },

    /// A string does not match its declared length or lies outside the buffer
    #[error("invalid string at offset {offset} (declared length {length})")]
    InvalidString {
        /// offset of the string within the enclosing view
        offset: usize,
        /// declared length, including the NUL terminator
        length: usize,
    },

    /// Unknown event rule type tag
    #[error("unknown event rule type {0}")]
    UnknownEventRuleType(i8),

    /// Unknown condition type tag
    #[error("unknown condition type {0}")]
    UnknownConditionType(i8),

    /// Condition type with no wire representation
    #[error("unsupported condition type {0:?}")]
    UnsupportedConditionType(ConditionType),

    /// Unknown action type tag
    #[error("unknown action type {0}")]
    UnknownActionType(i8),

    /// A group action nested in another group
    #[error("nested {0:?} in action group")]
    NestedGroup(ActionType),

    /// Tracing domain outside of the valid range
    #[error("invalid domain {0}")]
    InvalidDomain(i8),

    /// Unknown loglevel type tag
    #[error("invalid loglevel type {0}")]
    InvalidLoglevelType(i8),

    /// A required string field has zero length
    #[error("required field {0} is missing")]
    RequiredFieldNotFound(&'static str),

    /// A declared length does not match what was actually decoded
    #[error("length mismatch (declared {declared}, actual {actual})")]
    LengthMismatch {
        /// length found in the header
        declared: usize,
        /// length of the decoded payload
        actual: usize,
    },
}

/// The result of a deserialization
pub type FromBytesResult<T> = Result<T, FromBytesError>;

/// Deserialize a field from a byte buffer
pub trait FromBytes<'a>: Sized {
    /// Read the binary representation of a field and return the parsed representation
    ///
    /// **Note**: the argument is a mutable reference to an immutable slice. While the contents
    /// of the slice cannot be modified, the slice itself can. Every call to `from_bytes` consumes
    /// a number of bytes from the beginning of the slice.
    fn from_bytes(buf: &mut &'a [u8]) -> FromBytesResult<Self>;
}

/// Deserialize a complete wire object from a buffer view
///
/// Unlike [`FromBytes`], which works on single header fields, this reconstructs a whole
/// (possibly nested) object and reports how many bytes it took, so that the caller can find
/// the next object in a buffer holding several of them.
pub trait FromBuffer: Sized {
    /// Decode an object from the start of `view`
    ///
    /// Returns the number of bytes consumed and the new, exclusively owned object. Nothing
    /// in the returned value borrows from `view`.
    fn from_buffer(view: &BufferView<'_>) -> FromBytesResult<(usize, Self)>;
}
