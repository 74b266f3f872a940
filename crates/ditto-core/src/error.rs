//! Errors for value-model construction and accessor misuse

use thiserror::Error;

/// Errors raised by fallible constructors and payload accessors.
///
/// Cloning itself never produces these; they cover misuse of the value
/// model (building a view past its buffer, compiling a bad pattern, ...).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Pattern failed to compile
    #[error("invalid regular expression /{pattern}/{flags}: {reason}")]
    InvalidPattern {
        /// The offending pattern source
        pattern: String,
        /// The flags it was compiled with
        flags: String,
        /// Compiler message
        reason: String,
    },

    /// Index past the end of an array, buffer, or typed array
    #[error("index {index} out of bounds (length: {len})")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Length of the target
        len: usize,
    },

    /// View range does not fit inside its backing buffer
    #[error("view range {offset}+{length} exceeds buffer of {buffer_len} bytes")]
    ViewOutOfBounds {
        /// Byte offset of the view
        offset: usize,
        /// Byte length of the view
        length: usize,
        /// Length of the backing buffer
        buffer_len: usize,
    },

    /// A buffer view was pointed at a composite that is not a byte buffer
    #[error("view target is not a byte buffer")]
    NotABuffer,

    /// A boxed scalar wrapper was given a composite payload
    #[error("boxed wrapper payload must be a primitive, got {got}")]
    NotAPrimitive {
        /// Type name of the rejected payload
        got: &'static str,
    },

    /// A promise operation was applied to a non-promise composite
    #[error("composite is not a promise")]
    NotAPromise,
}

/// Convenience alias for value-model results.
pub type CoreResult<T> = Result<T, CoreError>;
