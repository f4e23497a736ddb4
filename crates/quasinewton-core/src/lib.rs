//! Core traits and types for quasi-Newton optimization.
//!
//! This crate provides the abstractions the optimizers in `quasinewton-optim`
//! are written against: vectors, objectives, linear operators, line searches
//! and convergence checks.
//!
//! # Key Concepts
//!
//! - **Vectors**: fixed-length real containers with `scale`, `axpy`, inner
//!   product and norm
//! - **Objectives**: differentiable scalar functions returning value and gradient
//! - **Linear operators**: matrix-free maps `v ↦ A·v`, e.g. inverse-Hessian
//!   approximations
//! - **Line searches**: step-length selection along a descent direction
//!
//! # Modules
//!
//! - [`callback`]: Iteration callbacks and hooks
//! - [`error`]: Error types for vector operations and optimization
//! - [`line_search`]: Line search algorithms
//! - [`linear_operator`]: Matrix-free linear operators
//! - [`objective`]: Objective function interface
//! - [`optimizer`]: Stopping criteria and optimization results
//! - [`types`]: Scalar trait and numerical constants
//! - [`vector`]: Vector trait and dense storage

pub mod callback;
pub mod error;
pub mod line_search;
pub mod linear_operator;
pub mod objective;
pub mod optimizer;
pub mod types;
pub mod vector;

// Re-export commonly used items at the crate root
pub use error::{OptimizerError, OptimizerResult, Result, VectorError};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use quasinewton_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::callback::{
        BoxedCallback, CallbackError, CallbackResult, IterationCallback, IterationHooks, IterationInfo,
        ProgressLogger,
    };
    pub use crate::error::{OptimizerError, OptimizerResult, Result, VectorError};
    pub use crate::line_search::{
        BacktrackingLineSearch, FixedStepSize, LineSearch, LineSearchMethod, LineSearchParams,
        LineSearchResult, StrongWolfeLineSearch,
    };
    pub use crate::linear_operator::{
        ComposedOperator, DiagonalOperator, FnOperator, LinearOperator, ScaledIdentity,
    };
    pub use crate::objective::{evaluate_checked, CountingObjective, FnObjective, Objective};
    pub use crate::optimizer::{
        Convergence, ConvergenceChecker, OptimizationResult, StoppingCriterion, TerminationReason,
    };
    pub use crate::types::{DVector, Scalar};
    pub use crate::vector::{DenseVector, NormKind, Vector};
}
