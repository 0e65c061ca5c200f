use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid identifier for `{option}`: {reason}")]
    InvalidIdentifier {
        option: &'static str,
        reason: String,
    },
}

impl DomainError {
    pub fn invalid_identifier(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            option,
            reason: reason.into(),
        }
    }
}
