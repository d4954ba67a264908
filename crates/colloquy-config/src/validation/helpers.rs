//! Shared validation helpers used by the section validators.

/// Push an error if `value` is outside `[min, max]` (integer).
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is outside `[min, max]` (float).
pub(crate) fn validate_range_f32(
    errors: &mut Vec<String>,
    name: &str,
    value: f32,
    min: f32,
    max: f32,
) {
    if value.is_nan() || value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if a marker string is empty.
pub(crate) fn validate_non_empty(errors: &mut Vec<String>, name: &str, value: &str) {
    if value.is_empty() {
        errors.push(format!("{name} must not be empty"));
    }
}
