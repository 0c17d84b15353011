use std::fmt;

use thiserror::Error;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

pub type Result<T> = std::result::Result<T, CrmError>;

impl CrmError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors,
            Self::StorageUnavailable(_) => &[],
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<std::io::Error> for CrmError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageUnavailable(format!("I/O error: {err}"))
    }
}

impl From<rmp_serde::encode::Error> for CrmError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::StorageUnavailable(format!("failed to encode snapshot: {err}"))
    }
}

impl From<rmp_serde::decode::Error> for CrmError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::StorageUnavailable(format!("failed to decode snapshot: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = CrmError::Validation(vec![
            FieldError::new("firstName", "must not be blank"),
            FieldError::new("email", "must be a well-formed email address"),
        ]);

        assert_eq!(
            err.to_string(),
            "Validation failed: firstName: must not be blank; email: must be a well-formed email address"
        );
        assert_eq!(err.field_errors().len(), 2);
    }

    #[test]
    fn io_errors_surface_as_storage_unavailable() {
        let err = CrmError::from(std::io::Error::other("disk gone"));
        assert!(matches!(err, CrmError::StorageUnavailable(msg) if msg.contains("disk gone")));
    }
}
