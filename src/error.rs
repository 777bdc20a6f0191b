//! The Error and Result types of this library.
//!
//! Configuration problems, capability mismatches and invariant violations all
//! surface as an [`Error`]. Operations which can fail come in two versions:
//!
//! - A fallible `try_xxx` version, which returns a [`Result`].
//! - A convenience `xxx` version, which invokes the `try_xxx` version and
//!   panics in case of error.

use core::fmt;

/// Universal error type of this library.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Error {
    /// The load factor is not inside the open interval `(0, 1)`.
    InvalidLoadFactor {
        /// The rejected load factor.
        load_factor: f32,
    },
    /// The requested number of entries needs a table larger than the maximum
    /// supported size.
    CapacityOverflow {
        /// The number of entries that was asked for.
        requested: usize,
    },
    /// Bulk construction received sources of different lengths.
    LengthMismatch {
        /// The length the construction was sized for.
        expected: usize,
        /// The length that was actually observed.
        actual: usize,
    },
    /// The table changed structurally behind the back of an operation in
    /// progress, or its strategy hashed a key inconsistently.
    ConcurrentModification,
    /// A cursor was asked to remove an entry while not positioned on one.
    NoCurrentEntry,
    /// The operation is not supported by this kind of table.
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },
    /// The source of a frozen table contained the same key twice and the
    /// builder was configured to reject duplicates.
    DuplicateKey,
    /// The allocator could not provide the backing arrays.
    OutOfMemory {
        /// Number of slots of the table that could not be allocated.
        capacity: usize,
    },
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidLoadFactor { load_factor } => {
                write!(f, "load factor {load_factor} is not in (0, 1)")
            }
            Error::CapacityOverflow { requested } => {
                write!(f, "cannot size a table for {requested} entries")
            }
            Error::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} entries, found {actual}")
            }
            Error::ConcurrentModification => f.write_str("concurrent structural modification"),
            Error::NoCurrentEntry => f.write_str("cursor is not positioned on an entry"),
            Error::Unsupported { operation } => {
                write!(f, "`{operation}` is not supported by this table")
            }
            Error::DuplicateKey => f.write_str("duplicate key in source"),
            Error::OutOfMemory { capacity } => {
                write!(f, "failed to allocate a table of {capacity} slots")
            }
        }
    }
}

/// Universal Result type of this library.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            "`clear` is not supported by this table",
            format!("{}", Error::Unsupported { operation: "clear" })
        );
        assert_eq!(
            "expected 3 entries, found 2",
            format!(
                "{}",
                Error::LengthMismatch {
                    expected: 3,
                    actual: 2
                }
            )
        );
    }
}
