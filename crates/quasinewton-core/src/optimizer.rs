//! Stopping criteria, convergence checks and optimization results.
//!
//! # Convergence Criteria
//!
//! - **Gradient norm**: ‖∇f(xₖ)‖ < ε_grad (first-order optimality)
//! - **Function reduction**: |f(xₖ) − f(xₖ₋₁)| < ε_f, evaluated only once a
//!   previous value exists
//!
//! The iteration cap is not a convergence criterion: hitting it yields
//! [`TerminationReason::MaxIterations`] with `converged == false`.

use crate::{
    error::{OptimizerError, OptimizerResult},
    types::Scalar,
    vector::NormKind,
};
use num_traits::Float;
use std::fmt::{self, Display};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reasons for optimization termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TerminationReason {
    /// ‖∇f(x)‖ fell below the gradient tolerance
    GradientTolerance,
    /// |f(xₖ) − f(xₖ₋₁)| fell below the function tolerance
    FunctionTolerance,
    /// Maximum iteration count exhausted without convergence
    MaxIterations,
    /// Line search failed to produce an acceptable step
    LineSearchFailed,
}

impl TerminationReason {
    /// True if the reason is a convergence criterion.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::GradientTolerance | Self::FunctionTolerance)
    }
}

impl Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::GradientTolerance => "gradient tolerance reached",
            Self::FunctionTolerance => "function tolerance reached",
            Self::MaxIterations => "maximum iterations reached",
            Self::LineSearchFailed => "line search failed",
        };
        f.write_str(text)
    }
}

/// A satisfied convergence criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct Convergence {
    /// Which criterion fired
    pub reason: TerminationReason,
    /// Human-readable description including the measured quantity
    pub message: String,
}

/// Stopping criteria for the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppingCriterion<T>
where
    T: Scalar,
{
    /// Maximum number of iterations
    pub max_iterations: usize,

    /// Tolerance for the gradient norm: ‖∇f(x)‖ < ε_grad
    pub gradient_tolerance: T,

    /// Tolerance for the function reduction: |f(xₖ) − f(xₖ₋₁)| < ε_f
    pub function_tolerance: T,

    /// Norm used for the gradient test
    pub norm: NormKind,
}

impl<T> Default for StoppingCriterion<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            max_iterations: 200,
            gradient_tolerance: <T as Scalar>::DEFAULT_GRADIENT_TOLERANCE,
            function_tolerance: <T as Scalar>::DEFAULT_TOLERANCE,
            norm: NormKind::L2,
        }
    }
}

impl<T> StoppingCriterion<T>
where
    T: Scalar,
{
    /// Creates a new stopping criterion with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Sets the gradient tolerance.
    pub fn with_gradient_tolerance(mut self, tol: T) -> Self {
        self.gradient_tolerance = tol;
        self
    }

    /// Sets the function value change tolerance.
    pub fn with_function_tolerance(mut self, tol: T) -> Self {
        self.function_tolerance = tol;
        self
    }

    /// Sets the norm used for the gradient test.
    pub fn with_norm(mut self, norm: NormKind) -> Self {
        self.norm = norm;
        self
    }

    /// Validates the tolerances.
    pub fn validate(&self) -> OptimizerResult<()> {
        if !(self.gradient_tolerance >= T::zero()) {
            return Err(OptimizerError::invalid_configuration(
                "gradient tolerance must be non-negative",
                "gradient_tolerance",
                self.gradient_tolerance.to_string(),
            ));
        }
        if !(self.function_tolerance >= T::zero()) {
            return Err(OptimizerError::invalid_configuration(
                "function tolerance must be non-negative",
                "function_tolerance",
                self.function_tolerance.to_string(),
            ));
        }
        Ok(())
    }
}

/// Evaluates the convergence criteria of a [`StoppingCriterion`].
#[derive(Debug, Clone)]
pub struct ConvergenceChecker<T>
where
    T: Scalar,
{
    criterion: StoppingCriterion<T>,
}

impl<T> ConvergenceChecker<T>
where
    T: Scalar,
{
    /// Creates a checker for the given criterion.
    pub fn new(criterion: StoppingCriterion<T>) -> Self {
        Self { criterion }
    }

    /// The criterion being checked.
    pub fn criterion(&self) -> &StoppingCriterion<T> {
        &self.criterion
    }

    /// Checks the gradient and function-reduction criteria.
    ///
    /// `previous_value` is `None` before the first step, in which case only
    /// the gradient test applies.
    pub fn check(
        &self,
        value: T,
        previous_value: Option<T>,
        gradient_norm: T,
    ) -> Option<Convergence> {
        if gradient_norm < self.criterion.gradient_tolerance {
            return Some(Convergence {
                reason: TerminationReason::GradientTolerance,
                message: format!(
                    "gradient norm {:e} below tolerance {:e}",
                    gradient_norm.to_f64_lossy(),
                    self.criterion.gradient_tolerance.to_f64_lossy()
                ),
            });
        }

        if let Some(previous) = previous_value {
            let reduction = <T as Float>::abs(value - previous);
            if reduction < self.criterion.function_tolerance {
                return Some(Convergence {
                    reason: TerminationReason::FunctionTolerance,
                    message: format!(
                        "function reduction {:e} below tolerance {:e}",
                        reduction.to_f64_lossy(),
                        self.criterion.function_tolerance.to_f64_lossy()
                    ),
                });
            }
        }

        None
    }

    /// Message for an exhausted iteration budget, if `iteration` reached it.
    pub fn check_budget(&self, iteration: usize) -> Option<Convergence> {
        (iteration >= self.criterion.max_iterations).then(|| Convergence {
            reason: TerminationReason::MaxIterations,
            message: format!(
                "maximum number of iterations ({}) reached",
                self.criterion.max_iterations
            ),
        })
    }
}

/// Result of an optimization run.
///
/// `point`, `value` and `gradient_norm` always describe the same iterate.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationResult<T, V>
where
    T: Scalar,
{
    /// The final iterate xₖ
    pub point: V,

    /// f(xₖ)
    pub value: T,

    /// ‖∇f(xₖ)‖
    pub gradient_norm: T,

    /// Number of completed iterations
    pub iterations: usize,

    /// Total objective value evaluations
    pub function_evaluations: usize,

    /// Total gradient evaluations
    pub gradient_evaluations: usize,

    /// Wall-clock time of the run
    pub duration: Duration,

    /// Why the run stopped
    pub termination_reason: TerminationReason,

    /// Human-readable termination message
    pub message: String,

    /// True if a convergence criterion fired
    pub converged: bool,

    /// Curvature pairs dropped by the inverse-Hessian update
    pub skipped_updates: usize,

    /// Hook or callback invocations that returned an error
    pub hook_failures: usize,
}

impl<T, V> OptimizationResult<T, V>
where
    T: Scalar,
{
    /// Creates a result; `converged` is derived from the reason.
    pub fn new(
        point: V,
        value: T,
        gradient_norm: T,
        iterations: usize,
        termination_reason: TerminationReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            point,
            value,
            gradient_norm,
            iterations,
            function_evaluations: 0,
            gradient_evaluations: 0,
            duration: Duration::ZERO,
            termination_reason,
            message: message.into(),
            converged: termination_reason.is_converged(),
            skipped_updates: 0,
            hook_failures: 0,
        }
    }

    /// Sets the evaluation counts.
    pub fn with_evaluations(mut self, function: usize, gradient: usize) -> Self {
        self.function_evaluations = function;
        self.gradient_evaluations = gradient;
        self
    }

    /// Sets the wall-clock duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Sets the skipped-update and hook-failure counters.
    pub fn with_diagnostics(mut self, skipped_updates: usize, hook_failures: usize) -> Self {
        self.skipped_updates = skipped_updates;
        self.hook_failures = hook_failures;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gradient_criterion() {
        let checker = ConvergenceChecker::new(StoppingCriterion::<f64>::new());
        let hit = checker.check(1.0, None, 1e-5).unwrap();
        assert_eq!(hit.reason, TerminationReason::GradientTolerance);
        assert!(hit.message.contains("gradient norm"));

        assert!(checker.check(1.0, None, 1.0).is_none());
    }

    #[test]
    fn test_function_criterion_needs_previous_value() {
        let checker = ConvergenceChecker::new(
            StoppingCriterion::<f64>::new().with_function_tolerance(1e-3),
        );
        assert!(checker.check(1.0, None, 1.0).is_none());

        let hit = checker.check(1.0, Some(1.0005), 1.0).unwrap();
        assert_eq!(hit.reason, TerminationReason::FunctionTolerance);
        assert!(hit.message.contains("function reduction"));

        assert!(checker.check(1.0, Some(2.0), 1.0).is_none());
    }

    #[test]
    fn test_budget() {
        let checker = ConvergenceChecker::new(StoppingCriterion::<f64>::new().with_max_iterations(3));
        assert!(checker.check_budget(2).is_none());
        let hit = checker.check_budget(3).unwrap();
        assert_eq!(hit.reason, TerminationReason::MaxIterations);
        assert_eq!(hit.message, "maximum number of iterations (3) reached");
    }

    #[test]
    fn test_validate() {
        assert!(StoppingCriterion::<f64>::default().validate().is_ok());
        let bad = StoppingCriterion::<f64>::new().with_gradient_tolerance(-1.0);
        assert!(bad.validate().is_err());
        let bad = StoppingCriterion::<f64>::new().with_function_tolerance(f64::NAN);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_result_converged_flag() {
        let result = OptimizationResult::new(
            vec![0.0],
            0.0,
            0.0,
            4,
            TerminationReason::FunctionTolerance,
            "done",
        )
        .with_evaluations(5, 5)
        .with_diagnostics(1, 0);
        assert!(result.converged);
        assert_eq!(result.skipped_updates, 1);

        let result = OptimizationResult::new(
            vec![0.0],
            0.0,
            1.0,
            4,
            TerminationReason::MaxIterations,
            "budget",
        );
        assert!(!result.converged);
        assert_eq!(TerminationReason::LineSearchFailed.to_string(), "line search failed");
    }
}
