use thiserror::Error;

/// Input fails an enum/range/shape check. Always user-visible (spec.md §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must be one of the enumerated values, got {value:?}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("{field} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} exceeds maximum length of {max} ({actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}
