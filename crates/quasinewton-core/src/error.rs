//! Error types for vector arithmetic and optimization.
//!
//! Two layers are used: [`VectorError`] for failures inside vector and
//! operator arithmetic, and [`OptimizerError`] for everything the optimizer,
//! its line searches and user objectives can report. Vector errors convert
//! into optimizer errors with `?`.

use thiserror::Error;

/// Errors that can occur during vector operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorError {
    /// Operands of incompatible length.
    ///
    /// Vector length is fixed at construction, so every binary operation
    /// requires both operands to have the receiver's length.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid argument to a vector or operator constructor.
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// Description of the problem
        reason: String,
    },
}

impl VectorError {
    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter<S: Into<String>>(reason: S) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Returns `Ok(())` if `actual == expected`.
    pub fn check_dimension(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::dimension_mismatch(expected, actual))
        }
    }
}

/// Errors that can occur during optimization.
#[derive(Debug, Clone, Error)]
pub enum OptimizerError {
    /// Propagated vector error (dimension mismatch and friends).
    #[error("Vector operation failed: {0}")]
    Vector(#[from] VectorError),

    /// A curvature pair violated `y·s > tolerance`.
    ///
    /// Only raised when the inverse-Hessian operator is configured to reject
    /// degenerate pairs instead of skipping them.
    #[error("Degenerate curvature: y·s = {curvature:e} is not above {tolerance:e}")]
    DegenerateCurvature {
        /// The offending inner product `y·s`
        curvature: f64,
        /// Configured tolerance
        tolerance: f64,
    },

    /// Line search failed to find an acceptable step.
    #[error("Line search failed: {reason}")]
    LineSearchFailed {
        /// Description of why the line search failed
        reason: String,
        /// Number of trial steps attempted
        iterations: usize,
        /// Last step size tried
        last_step_size: f64,
    },

    /// The objective could not be evaluated at a point.
    #[error("Objective evaluation failed: {reason}")]
    EvaluationFailed {
        /// Description of the failure
        reason: String,
    },

    /// Invalid optimizer configuration.
    #[error("Invalid optimizer configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// The search direction is not a descent direction.
    #[error("Invalid search direction: not a descent direction")]
    InvalidSearchDirection,
}

impl OptimizerError {
    /// Create a LineSearchFailed error with detailed context.
    pub fn line_search_failed<S: Into<String>>(
        reason: S,
        iterations: usize,
        last_step_size: f64,
    ) -> Self {
        Self::LineSearchFailed {
            reason: reason.into(),
            iterations,
            last_step_size,
        }
    }

    /// Create an EvaluationFailed error.
    pub fn evaluation_failed<S: Into<String>>(reason: S) -> Self {
        Self::EvaluationFailed {
            reason: reason.into(),
        }
    }

    /// Create a DegenerateCurvature error.
    pub fn degenerate_curvature(curvature: f64, tolerance: f64) -> Self {
        Self::DegenerateCurvature {
            curvature,
            tolerance,
        }
    }

    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// True for a wrapped [`VectorError::DimensionMismatch`].
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::Vector(VectorError::DimensionMismatch { .. }))
    }
}

/// Result type alias for vector operations.
pub type Result<T> = std::result::Result<T, VectorError>;

/// Result type alias for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;
