//! Error types for the component model and store
//!
//! [`CoreError`] covers everything that can go wrong while building or
//! querying a [`System`](crate::System): loading, unit conversion, and
//! reference resolution. Exporters wrap it in their own error type.
//!
//! # Example
//!
//! ```
//! use tabgrid_core::{CoreResult, Quantity, Unit};
//!
//! fn to_megawatts(q: Quantity) -> CoreResult<f64> {
//!     Ok(q.to(Unit::Megawatt)?.magnitude)
//! }
//!
//! assert_eq!(to_megawatts(Quantity::new(1500.0, Unit::Kilowatt)).unwrap(), 1.5);
//! ```

use thiserror::Error;

/// Error type for all core model operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O errors (reading a system file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// A unit symbol that no [`Unit`](crate::Unit) variant matches
    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),

    /// Conversion between units of different dimensions
    #[error("Cannot convert {from} to {to}")]
    UnitConversion { from: String, to: String },

    /// A component reference that the store cannot resolve
    #[error("Unresolved component reference '{0}'")]
    UnresolvedReference(String),

    /// Two components registered under the same label
    #[error("Duplicate component '{0}'")]
    DuplicateComponent(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for Results using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::UnitConversion {
            from: "MW".into(),
            to: "kV".into(),
        };
        assert_eq!(err.to_string(), "Cannot convert MW to kV");

        let err = CoreError::UnresolvedReference("ACBus.missing".into());
        assert!(err.to_string().contains("ACBus.missing"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Parse(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> CoreResult<()> {
            Err(CoreError::Validation("test".into()))
        }

        fn outer() -> CoreResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
