//! Input validation for the composer.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a message.")]
    EmptyMessage,
}

/// Rejects zero-length input. Whitespace-only input is accepted as typed.
pub fn validate_input(content: &str) -> Result<&str, ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    Ok(content)
}
