use thiserror::Error;

/// Main error type for V2X codec operations
///
/// Every layer of the codec reports through this one type so that callers can
/// log and drop an offending message with a single match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum V2xError {
    /// A value violates a subtype constraint of its type
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Invalid choice index {index} ({count} alternatives)")]
    InvalidChoiceIndex { index: usize, count: usize },

    #[error("Invalid enumerated value {index} ({count} items)")]
    InvalidEnumerated { index: usize, count: usize },

    #[error("Invalid UTF-8 sequence at byte {position}")]
    InvalidUtf8 { position: usize },

    #[error("Invalid character U+{code_point:04X} at position {position}")]
    InvalidCharacter { position: usize, code_point: u32 },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Output buffer could not grow
    #[error("Allocation failure: {0}")]
    Allocation(String),

    /// The value tree does not have the shape its descriptor prescribes
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for V2X codec operations
pub type V2xResult<T> = Result<T, V2xError>;
