//! Error types for the particle field.
//!
//! The simulation itself cannot fail. Errors only come from loading
//! configuration and from acquiring a drawing surface.

use std::fmt;

#[derive(Debug)]
pub enum FieldError {
    /// A config value is outside its allowed range.
    InvalidConfig { field: &'static str, value: f64 },
    /// Config JSON could not be parsed.
    ConfigParse(serde_json::Error),
    /// Reading a config file failed.
    Io(std::io::Error),
    /// The host has no usable 2D drawing surface.
    SurfaceUnavailable(String),
    /// A host (browser) API call failed.
    Host(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::InvalidConfig { field, value } => {
                write!(f, "Invalid config value for {}: {}", field, value)
            }
            FieldError::ConfigParse(e) => write!(f, "Failed to parse field config: {}", e),
            FieldError::Io(e) => write!(f, "Failed to read field config: {}", e),
            FieldError::SurfaceUnavailable(what) => {
                write!(f, "Drawing surface unavailable: {}", what)
            }
            FieldError::Host(what) => write!(f, "Host call failed: {}", what),
        }
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FieldError::ConfigParse(e) => Some(e),
            FieldError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(e: serde_json::Error) -> Self {
        FieldError::ConfigParse(e)
    }
}

impl From<std::io::Error> for FieldError {
    fn from(e: std::io::Error) -> Self {
        FieldError::Io(e)
    }
}
