//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted room title, in characters after trimming.
pub const MAX_TITLE_CHARS: usize = 100;
/// Longest accepted participant name, in characters after trimming.
pub const MAX_NAME_CHARS: usize = 50;

/// Validates that a room title is 1-100 characters after trimming.
pub fn validate_room_title(title: &str) -> Result<(), ValidationError> {
    validate_trimmed("title", title, MAX_TITLE_CHARS)
}

/// Validates that a participant name is 1-50 characters after trimming.
pub fn validate_participant_name(name: &str) -> Result<(), ValidationError> {
    validate_trimmed("name", name, MAX_NAME_CHARS)
}

fn validate_trimmed(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(format!("{field} must not be empty").into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > max {
        let mut err = ValidationError::new("too_long");
        err.message =
            Some(format!("{field} must be at most {max} characters (got {chars})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_within_bounds_pass() {
        assert!(validate_room_title("Lunch").is_ok());
        assert!(validate_room_title(&"x".repeat(100)).is_ok());
        // Surrounding whitespace does not count.
        assert!(validate_room_title("  Lunch  ").is_ok());
    }

    #[test]
    fn empty_or_blank_titles_fail() {
        assert!(validate_room_title("").is_err());
        assert!(validate_room_title("   ").is_err());
    }

    #[test]
    fn overlong_titles_fail() {
        assert!(validate_room_title(&"x".repeat(101)).is_err());
    }

    #[test]
    fn name_limit_is_fifty_characters() {
        assert!(validate_participant_name(&"n".repeat(50)).is_ok());
        assert!(validate_participant_name(&"n".repeat(51)).is_err());
        assert!(validate_participant_name(" ").is_err());
    }
}
