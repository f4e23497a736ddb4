//! Limited-memory BFGS optimizer.
//!
//! # Algorithm Overview
//!
//! Starting from x₀, each iteration:
//! 1. Checks convergence: ‖∇f(xₖ)‖ < gtol, or |f(xₖ) − f(xₖ₋₁)| < tol
//! 2. Computes the search direction pₖ = −Hₖ ∇f(xₖ)
//! 3. Runs a line search for the step size αₖ
//! 4. Updates xₖ₊₁ = xₖ + sₖ with sₖ = αₖ pₖ
//! 5. Feeds yₖ = ∇f(xₖ₊₁) − ∇f(xₖ) and sₖ into the inverse-Hessian
//!    approximation [`LHess`]
//!
//! The run stops when a convergence criterion fires, when `max_iterations`
//! steps have been taken, or when the line search cannot produce a step. The
//! latter two are reported through [`TerminationReason`], not as errors.
//!
//! # References
//!
//! - Nocedal & Wright, "Numerical Optimization" (2006), chapters 6 and 7

use crate::lhess::{CurvaturePolicy, InitialHessian, LHess, UpdateOutcome};
use quasinewton_core::{
    callback::{BoxedCallback, IterationCallback, IterationHooks, IterationInfo, ProgressLogger},
    error::{OptimizerError, OptimizerResult, VectorError},
    line_search::{LineSearch, LineSearchMethod, LineSearchParams},
    linear_operator::LinearOperator,
    objective::{evaluate_checked, CountingObjective, Objective},
    optimizer::{ConvergenceChecker, OptimizationResult, StoppingCriterion, TerminationReason},
    types::Scalar,
    vector::{NormKind, Vector},
};
use num_traits::Float;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the BFGS optimizer.
///
/// With the `serde` feature, unknown keys are rejected on deserialization.
/// The short option names `tol`, `gtol`, `maxiter`, `disp`,
/// `line_search_options` and `max_len` are accepted as aliases.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct BFGSConfig<T>
where
    T: Scalar,
{
    /// Functional reduction tolerance: |f(xₖ) − f(xₖ₋₁)| < tol
    #[cfg_attr(feature = "serde", serde(alias = "tol"))]
    pub function_tolerance: T,

    /// Gradient norm tolerance: ‖∇f(xₖ)‖ < gtol
    #[cfg_attr(feature = "serde", serde(alias = "gtol"))]
    pub gradient_tolerance: T,

    /// Maximum number of iterations
    #[cfg_attr(feature = "serde", serde(alias = "maxiter"))]
    pub max_iterations: usize,

    /// Log progress at `info` level
    #[cfg_attr(feature = "serde", serde(alias = "disp"))]
    pub display: bool,

    /// Line search strategy
    pub line_search: LineSearchMethod,

    /// Line search parameters
    #[cfg_attr(feature = "serde", serde(alias = "line_search_options"))]
    pub line_search_params: LineSearchParams<T>,

    /// Scale h of the initial approximation H₀ = h·I
    pub initial_hessian: T,

    /// Number of curvature pairs to store
    #[cfg_attr(feature = "serde", serde(alias = "max_len"))]
    pub memory_size: usize,

    /// Handling of pairs with y·s <= curvature_tolerance
    pub curvature_policy: CurvaturePolicy,

    /// Threshold of the curvature test
    pub curvature_tolerance: T,
}

impl<T: Scalar> Default for BFGSConfig<T> {
    fn default() -> Self {
        Self {
            function_tolerance: <T as Scalar>::DEFAULT_TOLERANCE,
            gradient_tolerance: <T as Scalar>::DEFAULT_GRADIENT_TOLERANCE,
            max_iterations: 200,
            display: true,
            line_search: LineSearchMethod::StrongWolfe,
            line_search_params: LineSearchParams::strong_wolfe(),
            initial_hessian: T::one(),
            memory_size: 10,
            curvature_policy: CurvaturePolicy::Skip,
            curvature_tolerance: <T as Scalar>::EPSILON,
        }
    }
}

impl<T: Scalar> BFGSConfig<T> {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the functional reduction tolerance.
    pub fn with_function_tolerance(mut self, tol: T) -> Self {
        self.function_tolerance = tol;
        self
    }

    /// Sets the gradient norm tolerance.
    pub fn with_gradient_tolerance(mut self, tol: T) -> Self {
        self.gradient_tolerance = tol;
        self
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Enables or disables progress logging.
    pub fn with_display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    /// Sets the line search strategy.
    pub fn with_line_search(mut self, method: LineSearchMethod) -> Self {
        self.line_search = method;
        self
    }

    /// Sets the line search parameters.
    pub fn with_line_search_params(mut self, params: LineSearchParams<T>) -> Self {
        self.line_search_params = params;
        self
    }

    /// Sets H₀ = h·I.
    pub fn with_initial_hessian(mut self, h: T) -> Self {
        self.initial_hessian = h;
        self
    }

    /// Sets the number of stored curvature pairs.
    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.memory_size = size;
        self
    }

    /// Sets the curvature policy and tolerance.
    pub fn with_curvature_policy(mut self, policy: CurvaturePolicy, tolerance: T) -> Self {
        self.curvature_policy = policy;
        self.curvature_tolerance = tolerance;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OptimizerResult<()> {
        let non_negative = [
            ("function_tolerance", self.function_tolerance),
            ("gradient_tolerance", self.gradient_tolerance),
            ("curvature_tolerance", self.curvature_tolerance),
        ];
        for (name, value) in non_negative {
            if !(value >= T::zero() && <T as Float>::is_finite(value)) {
                return Err(OptimizerError::invalid_configuration(
                    "tolerance must be finite and non-negative",
                    name,
                    value.to_string(),
                ));
            }
        }

        if !(self.initial_hessian > T::zero() && <T as Float>::is_finite(self.initial_hessian)) {
            return Err(OptimizerError::invalid_configuration(
                "initial inverse Hessian scale must be positive",
                "initial_hessian",
                self.initial_hessian.to_string(),
            ));
        }

        if self.memory_size == 0 {
            return Err(OptimizerError::invalid_configuration(
                "memory size must be at least 1",
                "memory_size",
                "0",
            ));
        }

        self.line_search_params.validate()
    }

    /// Stopping criterion implied by the tolerances and iteration cap.
    pub fn stopping_criterion(&self) -> StoppingCriterion<T> {
        StoppingCriterion::new()
            .with_max_iterations(self.max_iterations)
            .with_gradient_tolerance(self.gradient_tolerance)
            .with_function_tolerance(self.function_tolerance)
            .with_norm(NormKind::L2)
    }
}

/// Limited-memory BFGS optimizer.
///
/// # Examples
///
/// ```rust
/// use quasinewton_core::prelude::*;
/// use quasinewton_optim::{BFGSConfig, BFGS};
///
/// let f = FnObjective::new(
///     |x: &DenseVector<f64>| Ok(x.inner(x)?),
///     |x: &DenseVector<f64>| Ok(x.scaled(2.0)),
/// );
/// let mut bfgs = BFGS::new(BFGSConfig::new().with_display(false)).unwrap();
/// let result = bfgs.solve(&f, &DenseVector::from_vec(vec![3.0, -4.0])).unwrap();
/// assert!(result.converged);
/// assert!(result.point.norm(NormKind::L2) < 1e-6);
/// ```
pub struct BFGS<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    config: BFGSConfig<T>,
    line_search: Box<dyn LineSearch<T, V>>,
    initial_operator: Option<Arc<dyn LinearOperator<T, V>>>,
    callback: Option<BoxedCallback<T, V>>,
    hooks: IterationHooks<T, V>,
    progress: ProgressLogger<T>,
}

impl<T, V> BFGS<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    /// Creates an optimizer after validating `config`.
    pub fn new(config: BFGSConfig<T>) -> OptimizerResult<Self> {
        config.validate()?;
        Ok(Self {
            line_search: config.line_search.build(),
            config,
            initial_operator: None,
            callback: None,
            hooks: IterationHooks::new(),
            progress: ProgressLogger::new(1),
        })
    }

    /// Replaces the line search with a custom strategy.
    pub fn with_line_search(mut self, line_search: Box<dyn LineSearch<T, V>>) -> Self {
        self.line_search = line_search;
        self
    }

    /// Uses `operator` as H₀ instead of `initial_hessian·I`.
    pub fn with_initial_operator(mut self, operator: Arc<dyn LinearOperator<T, V>>) -> Self {
        self.initial_operator = Some(operator);
        self
    }

    /// Sets the callback run after every iteration.
    pub fn with_callback<C>(mut self, callback: C) -> Self
    where
        C: IterationCallback<T, V> + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Sets the before/after iteration hooks.
    pub fn with_hooks(mut self, hooks: IterationHooks<T, V>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Returns the optimizer configuration.
    pub fn config(&self) -> &BFGSConfig<T> {
        &self.config
    }

    /// Returns the optimizer name.
    pub fn name(&self) -> &str {
        "BFGS"
    }

    fn fresh_hessian(&self) -> OptimizerResult<LHess<T, V>> {
        let initial = match &self.initial_operator {
            Some(op) => InitialHessian::Operator(Arc::clone(op)),
            None => InitialHessian::Scaled(self.config.initial_hessian),
        };
        Ok(LHess::new(initial, self.config.memory_size)?
            .with_curvature_policy(self.config.curvature_policy, self.config.curvature_tolerance))
    }

    /// Minimizes `objective` starting from a copy of `x_init`.
    ///
    /// # Errors
    ///
    /// - `EvaluationFailed` if the objective fails, or returns a non-finite
    ///   value or gradient at an accepted point
    /// - dimension mismatches between the point and the gradient
    /// - `DegenerateCurvature` under [`CurvaturePolicy::Reject`]
    ///
    /// Exhausting the iteration budget or a failing line search are not
    /// errors: they are reported in [`OptimizationResult::termination_reason`].
    pub fn solve<O>(&mut self, objective: &O, x_init: &V) -> OptimizerResult<OptimizationResult<T, V>>
    where
        O: Objective<T, V>,
    {
        let start = Instant::now();
        let objective = CountingObjective::new(objective);
        let checker = ConvergenceChecker::new(self.config.stopping_criterion());
        let mut hessian = self.fresh_hessian()?;

        let mut x = x_init.clone();
        let (mut value, mut gradient) = evaluate_checked(&objective, &x)?;
        let mut gradient_norm = gradient.norm(NormKind::L2);
        let mut previous_value: Option<T> = None;
        let mut step_size: Option<T> = None;
        let mut iteration = 0;
        let mut skipped_updates = 0;
        let mut hook_failures = 0;

        log::debug!(
            "BFGS start: n = {}, f = {:e}, |grad| = {:e}",
            x.len(),
            value.to_f64_lossy(),
            gradient_norm.to_f64_lossy()
        );

        if self.config.display {
            let start_info = IterationInfo {
                iteration,
                value,
                previous_value,
                gradient_norm,
                step_size,
                point: &x,
            };
            // ProgressLogger never fails
            let _ = self.progress.on_iteration(&start_info);
        }

        let (termination_reason, message) = loop {
            if let Some(hit) = checker.check(value, previous_value, gradient_norm) {
                break (hit.reason, hit.message);
            }
            if let Some(hit) = checker.check_budget(iteration) {
                break (hit.reason, hit.message);
            }

            // Runs only for iterations that go on to take a step.
            let info = IterationInfo {
                iteration,
                value,
                previous_value,
                gradient_norm,
                step_size,
                point: &x,
            };
            if let Err(err) = self.hooks.before_iteration(&info) {
                hook_failures += 1;
                log::warn!("before_iteration hook failed at iteration {}: {}", iteration, err);
            }

            let mut direction = hessian.apply(&gradient)?;
            direction.scale(-T::one());

            let accepted = match self.line_search.search(
                &objective,
                &x,
                value,
                &gradient,
                &direction,
                &self.config.line_search_params,
            ) {
                Ok(accepted) => accepted,
                Err(OptimizerError::LineSearchFailed { reason, .. }) => {
                    log::warn!("line search failed at iteration {}: {}", iteration, reason);
                    break (
                        TerminationReason::LineSearchFailed,
                        format!("line search failed: {}", reason),
                    );
                }
                Err(OptimizerError::InvalidSearchDirection) => {
                    log::warn!("search direction is not a descent direction at iteration {}", iteration);
                    break (
                        TerminationReason::LineSearchFailed,
                        "search direction is not a descent direction".to_string(),
                    );
                }
                Err(err) => return Err(err),
            };

            let mut s = direction;
            s.scale(accepted.step_size);

            let new_gradient = match accepted.new_gradient {
                Some(g) => g,
                None => Objective::<T, V>::derivative(&objective, &accepted.new_point)?,
            };
            VectorError::check_dimension(x.len(), new_gradient.len())?;
            if !new_gradient.is_finite() {
                return Err(OptimizerError::evaluation_failed(format!(
                    "non-finite gradient after step {}",
                    iteration + 1
                )));
            }

            let mut y = new_gradient.clone();
            y.axpy(-T::one(), &gradient)?;
            if hessian.update(&y, &s)? == UpdateOutcome::Skipped {
                skipped_updates += 1;
            }

            previous_value = Some(value);
            x = accepted.new_point;
            value = accepted.new_value;
            gradient = new_gradient;
            gradient_norm = gradient.norm(NormKind::L2);
            step_size = Some(accepted.step_size);
            iteration += 1;

            log::debug!(
                "iter {}: alpha = {:e}, f = {:e}, |grad| = {:e}, pairs = {}",
                iteration,
                accepted.step_size.to_f64_lossy(),
                value.to_f64_lossy(),
                gradient_norm.to_f64_lossy(),
                hessian.len()
            );

            let info = IterationInfo {
                iteration,
                value,
                previous_value,
                gradient_norm,
                step_size,
                point: &x,
            };
            if let Err(err) = self.hooks.after_iteration(&info) {
                hook_failures += 1;
                log::warn!("after_iteration hook failed at iteration {}: {}", iteration, err);
            }
            if let Some(callback) = self.callback.as_mut() {
                if let Err(err) = callback.on_iteration(&info) {
                    hook_failures += 1;
                    log::warn!("callback failed at iteration {}: {}", iteration, err);
                }
            }
            if self.config.display {
                // ProgressLogger never fails
                let _ = self.progress.on_iteration(&info);
            }
        };

        if self.config.display {
            log::info!(
                "BFGS finished after {} iterations: {} (f = {:e}, |grad| = {:e})",
                iteration,
                message,
                value.to_f64_lossy(),
                gradient_norm.to_f64_lossy()
            );
        }

        let (function_evaluations, gradient_evaluations) = objective.counts();
        Ok(
            OptimizationResult::new(x, value, gradient_norm, iteration, termination_reason, message)
                .with_evaluations(function_evaluations, gradient_evaluations)
                .with_duration(start.elapsed())
                .with_diagnostics(skipped_updates, hook_failures),
        )
    }
}

impl<T, V> Debug for BFGS<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BFGS")
            .field("config", &self.config)
            .field("line_search", &self.line_search)
            .field("initial_operator", &self.initial_operator)
            .field("callback", &self.callback.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl<T, V> Display for BFGS<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} method", self.name())?;
        writeln!(f, "{}", "-".repeat(30))?;
        writeln!(f, "Line search:\t\t {}", self.line_search.name())?;
        writeln!(f, "Maximum iterations:\t {}", self.config.max_iterations)?;
        writeln!(f, "Memory size:\t\t {}", self.config.memory_size)
    }
}
