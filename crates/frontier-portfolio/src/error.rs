//! Error types for portfolio optimization.
//!
//! Every variant here is a configuration or input problem detected before
//! a solve is attempted. Solver outcomes (infeasible, unbounded, numerical
//! failure) are never errors; they are reported as a
//! [`SolveStatus`](frontier_math::optimization::SolveStatus) on the result.

use frontier_math::MathError;
use thiserror::Error;

/// Result type for portfolio operations.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Errors that can occur while configuring a portfolio optimization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    /// A required builder input was not supplied.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// One or more constraint names are not in the catalog.
    #[error("Unsupported constraints: {}", .names.join(", "))]
    UnsupportedConstraint {
        /// The offending names, in the order given.
        names: Vec<String>,
    },

    /// Two requested constraints contradict each other.
    #[error("Conflicting constraints: '{first}' cannot be combined with '{second}'")]
    ConflictingConstraints {
        /// First constraint name.
        first: String,
        /// Second constraint name.
        second: String,
    },

    /// A scalar parameter is outside its valid range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// Risk aversion is negative or not finite.
    #[error("Invalid risk aversion {gamma}: must be finite and non-negative")]
    InvalidRiskAversion {
        /// The rejected value.
        gamma: f64,
    },

    /// Factor mode was requested without the exposure/loading inputs.
    #[error("Missing factor inputs: {reason}")]
    MissingFactorInputs {
        /// What is missing.
        reason: String,
    },

    /// Some of the factor model parts were not supplied.
    #[error("Incomplete factor model: missing {}", .missing.join(", "))]
    IncompleteFactorModel {
        /// Names of the missing parts.
        missing: Vec<String>,
    },

    /// Input shapes are inconsistent.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which input has the wrong shape.
        what: String,
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },

    /// Input data is malformed (NaN, asymmetric covariance, ...).
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// The reason the input is invalid.
        reason: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {reason}")]
    Config {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// Error raised by the math layer.
    #[error(transparent)]
    Math(#[from] MathError),
}

impl PortfolioError {
    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing factor inputs error.
    #[must_use]
    pub fn missing_factor_inputs(reason: impl Into<String>) -> Self {
        Self::MissingFactorInputs {
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// True for errors caused by how the problem was configured, as
    /// opposed to the shape or content of the numerical inputs.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::UnsupportedConstraint { .. }
                | Self::ConflictingConstraints { .. }
                | Self::InvalidParameter { .. }
                | Self::InvalidRiskAversion { .. }
                | Self::MissingFactorInputs { .. }
                | Self::IncompleteFactorModel { .. }
                | Self::Config { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortfolioError::UnsupportedConstraint {
            names: vec!["max_weight".to_string(), "sector_cap".to_string()],
        };
        assert_eq!(err.to_string(), "Unsupported constraints: max_weight, sector_cap");

        let err = PortfolioError::IncompleteFactorModel {
            missing: vec!["loadings".to_string()],
        };
        assert!(err.to_string().contains("loadings"));

        let err = PortfolioError::missing_field("expected_returns");
        assert!(err.to_string().contains("expected_returns"));

        let err = PortfolioError::dimension_mismatch("sigma", "3x3", "2x2");
        assert!(err.to_string().contains("expected 3x3, got 2x2"));
    }

    #[test]
    fn test_math_error_conversion() {
        let err: PortfolioError = MathError::invalid_input("nan").into();
        assert!(matches!(err, PortfolioError::Math(_)));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_configuration_classification() {
        assert!(PortfolioError::InvalidRiskAversion { gamma: -1.0 }.is_configuration_error());
        assert!(PortfolioError::invalid_parameter("leverage_limit", "below 1").is_configuration_error());
        assert!(!PortfolioError::invalid_input("asymmetric").is_configuration_error());
    }
}
