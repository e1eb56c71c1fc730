//! Pure validation helpers shared across layers. No I/O (spec.md §4.2).

use super::error::ValidationError;

pub const PRIORITY_MIN: i32 = -100;
pub const PRIORITY_MAX: i32 = 100;

pub fn validate_priority(priority: i32) -> Result<(), ValidationError> {
    if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        return Err(ValidationError::OutOfRange {
            field: "priority",
            value: priority as i64,
            min: PRIORITY_MIN as i64,
            max: PRIORITY_MAX as i64,
        });
    }
    Ok(())
}

pub fn validate_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_in_range_is_ok() {
        assert!(validate_priority(0).is_ok());
        assert!(validate_priority(-100).is_ok());
        assert!(validate_priority(100).is_ok());
    }

    #[test]
    fn priority_out_of_range_is_rejected() {
        assert!(validate_priority(101).is_err());
        assert!(validate_priority(-101).is_err());
    }

    #[test]
    fn empty_description_is_rejected() {
        assert!(validate_non_empty("description", "   ").is_err());
        assert!(validate_non_empty("description", "add login").is_ok());
    }
}
