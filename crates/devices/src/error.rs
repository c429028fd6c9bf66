//! Error types for device construction.

use std::fmt;

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors raised when device parameters are invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// A design parameter was outside its legal range.
    InvalidParameter { name: &'static str, value: f64 },
}

impl DeviceError {
    pub(crate) fn invalid(name: &'static str, value: f64) -> Self {
        DeviceError::InvalidParameter { name, value }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::InvalidParameter { name, value } => {
                write!(f, "invalid device parameter {}: {}", name, value)
            }
        }
    }
}

impl std::error::Error for DeviceError {}
