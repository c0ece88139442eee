//! Service errors.

use autoparc_storage::StorageError;

/// Result alias for fleet services.
pub type Result<T> = std::result::Result<T, FleetError>;

/// Errors returned by the record services.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// Request failed validation
    #[error("{0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Request conflicts with existing records
    #[error("{0}")]
    Conflict(String),

    /// Backend failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl FleetError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Trimmed value of a required text field.
pub(crate) fn required_text(value: Option<&str>, field: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(FleetError::validation(format!("{field} is required"))),
    }
}

/// A required field of any other type.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| FleetError::validation(format!("{field} is required")))
}

/// Check an optional number against an inclusive range.
pub(crate) fn in_range<T>(value: Option<T>, min: T, max: T, field: &str) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(FleetError::validation(format!(
            "{field} must be between {min} and {max}"
        ))),
        _ => Ok(()),
    }
}

/// Optional free text, trimmed, empty meaning absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
