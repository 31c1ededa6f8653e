use std::fmt;

/// Result alias used across the menu engine.
pub type Result<T> = std::result::Result<T, MenuError>;

/// Failures raised synchronously by template configuration and `open`.
///
/// Everything else the engine encounters (unbound cells, out-of-range
/// stamps, double closes) is treated as a no-op rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    InvalidArgument(String),
    NotFound(String),
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::NotFound(id) => write!(f, "template not found: {id}"),
        }
    }
}

impl std::error::Error for MenuError {}
