use thiserror::Error;

use crate::types::DataType;

/// Errors surfaced by container operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A named entry or string-cache id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Attempt to create a child under a name that is already taken.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Mutation attempted at or under a location whose subtree has been
    /// committed to a subindex block.
    #[error("location has been committed and is read-only: {0}")]
    AlreadyCommitted(String),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// An allocator or tree invariant was violated. This indicates a bug,
    /// not bad input, and is never retried.
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to malformed or unsupported on-disk input.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("bad magic number: {0:#018x}")]
    BadMagic(u64),

    #[error("format version {0} is newer than supported")]
    UnsupportedVersion(u64),

    #[error("truncated or corrupt {0} block")]
    Truncated(&'static str),

    #[error("unknown node tag {0:#04x}")]
    UnknownTag(u8),

    #[error("unknown data type tag {0:#04x}")]
    UnknownDataType(u8),

    #[error("string cache does not contain id {0}")]
    UnknownStringId(u64),

    #[error("entry {name:?} holds {found:?}, not {expected:?}")]
    UnexpectedDataType {
        name: String,
        expected: DataType,
        found: DataType,
    },

    #[error("array of {length} elements does not divide into {arity}-element aggregates")]
    BadAggregateLength { length: u64, arity: u64 },
}
