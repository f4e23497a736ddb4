//! Line search algorithms.
//!
//! Given a point x, a descent direction p and the objective f, a line search
//! picks a step length α > 0 along φ(α) = f(x + α p).
//!
//! # Conditions
//!
//! ## Armijo (sufficient decrease)
//! φ(α) ≤ φ(0) + c₁ α φ'(0)
//!
//! ## Strong Wolfe
//! 1. Armijo as above
//! 2. |φ'(α)| ≤ c₂ |φ'(0)|
//!
//! with 0 < c₁ < c₂ < 1, typically c₁ = 10⁻⁴ and c₂ = 0.9 for quasi-Newton
//! methods. Strong Wolfe steps keep y·s > 0, which is what the BFGS update
//! needs to stay positive definite.
//!
//! # Strategies
//!
//! - [`StrongWolfeLineSearch`]: bracketing followed by a zoom phase with
//!   cubic interpolation (Nocedal & Wright, Algorithms 3.5 and 3.6).
//! - [`BacktrackingLineSearch`]: shrink the step by ρ until Armijo holds.
//! - [`FixedStepSize`]: always take `initial_step_size`.
//!
//! Strategies are selected by name through [`LineSearchMethod`], which
//! parses `"strong_wolfe"`, `"backtracking"` and `"fixed"`. Any other type
//! implementing [`LineSearch`] can be plugged into the optimizer directly.
//!
//! # Example
//!
//! ```rust
//! use quasinewton_core::prelude::*;
//!
//! let f = FnObjective::new(
//!     |x: &DenseVector<f64>| Ok(x.inner(x)?),
//!     |x: &DenseVector<f64>| Ok(x.scaled(2.0)),
//! );
//! let x = DenseVector::from_vec(vec![1.0, 1.0]);
//! let (value, gradient) = f.value_and_derivative(&x).unwrap();
//! let direction = gradient.scaled(-1.0);
//!
//! let mut ls = StrongWolfeLineSearch::new();
//! let params = LineSearchParams::strong_wolfe();
//! let result = ls.search(&f, &x, value, &gradient, &direction, &params).unwrap();
//! assert!(result.new_value < value);
//! ```

use crate::{
    error::{OptimizerError, OptimizerResult},
    objective::Objective,
    types::Scalar,
    vector::Vector,
};
use num_traits::Float;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of a successful line search.
#[derive(Debug, Clone)]
pub struct LineSearchResult<T, V>
where
    T: Scalar,
{
    /// The accepted step size α
    pub step_size: T,

    /// The new point x + α p
    pub new_point: V,

    /// The objective value at the new point
    pub new_value: T,

    /// The gradient at the new point, if the search computed it
    pub new_gradient: Option<V>,

    /// Number of objective value evaluations performed
    pub function_evals: usize,

    /// Number of gradient evaluations performed
    pub gradient_evals: usize,
}

/// Parameters shared by the line search strategies.
///
/// # Parameter Guidelines
///
/// ```rust
/// # use quasinewton_core::prelude::*;
/// let params = LineSearchParams::<f64>::strong_wolfe(); // c₁ = 10⁻⁴, c₂ = 0.9
/// assert!(params.validate().is_ok());
///
/// let params = LineSearchParams::<f64>::backtracking(); // c₁ = 10⁻⁴, ρ = 0.5
/// assert_eq!(params.max_iterations, 30);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct LineSearchParams<T>
where
    T: Scalar,
{
    /// Initial step size α₀ (also the step of [`FixedStepSize`])
    pub initial_step_size: T,

    /// Maximum allowable step size
    pub max_step_size: T,

    /// Width of the bracket, or step size, below which the search gives up
    pub min_step_size: T,

    /// Maximum number of trial steps per phase
    pub max_iterations: usize,

    /// Armijo parameter c₁ ∈ (0,1)
    pub c1: T,

    /// Curvature parameter c₂ ∈ (c₁,1)
    pub c2: T,

    /// Backtracking reduction factor ρ ∈ (0,1)
    pub rho: T,
}

impl<T> Default for LineSearchParams<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            initial_step_size: T::one(),
            max_step_size: <T as Scalar>::MAX_STEP_SIZE,
            min_step_size: <T as Scalar>::MIN_STEP_SIZE,
            max_iterations: 30,
            c1: <T as Scalar>::from_f64(1e-4),
            c2: <T as Scalar>::from_f64(0.9),
            rho: <T as Scalar>::from_f64(0.5),
        }
    }
}

impl<T> LineSearchParams<T>
where
    T: Scalar,
{
    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns `OptimizerError::InvalidConfiguration` if step sizes are not
    /// positive and ordered, if `0 < c₁ < c₂ < 1` does not hold, if ρ ∉ (0, 1)
    /// or if `max_iterations` is zero.
    pub fn validate(&self) -> OptimizerResult<()> {
        let invalid = |reason: &str, parameter: &str, value: String| {
            Err(OptimizerError::invalid_configuration(reason, parameter, value))
        };

        if !(self.initial_step_size > T::zero()) {
            return invalid(
                "initial step size must be positive",
                "initial_step_size",
                self.initial_step_size.to_string(),
            );
        }
        if !(self.min_step_size > T::zero()) {
            return invalid(
                "minimum step size must be positive",
                "min_step_size",
                self.min_step_size.to_string(),
            );
        }
        if !(self.max_step_size > self.min_step_size) {
            return invalid(
                "maximum step size must be greater than minimum step size",
                "max_step_size",
                self.max_step_size.to_string(),
            );
        }
        if !(self.c1 > T::zero() && self.c1 < T::one()) {
            return invalid("c1 must be in (0, 1)", "c1", self.c1.to_string());
        }
        if !(self.c2 > self.c1 && self.c2 < T::one()) {
            return invalid("c2 must satisfy c1 < c2 < 1", "c2", self.c2.to_string());
        }
        if !(self.rho > T::zero() && self.rho < T::one()) {
            return invalid("rho must be in (0, 1)", "rho", self.rho.to_string());
        }
        if self.max_iterations == 0 {
            return invalid(
                "maximum iterations must be at least 1",
                "max_iterations",
                "0".to_string(),
            );
        }
        Ok(())
    }

    /// Parameters for quasi-Newton methods: c₁ = 10⁻⁴, c₂ = 0.9.
    pub fn strong_wolfe() -> Self {
        Self::default()
    }

    /// Parameters for plain Armijo backtracking.
    pub fn backtracking() -> Self {
        Self::default()
    }

    /// Parameters for a fixed step of length `step_size`.
    pub fn fixed(step_size: T) -> Self {
        Self {
            initial_step_size: step_size,
            ..Self::default()
        }
    }
}

/// Interface for line search algorithms.
///
/// The objective is passed as a trait object so that strategies can be
/// stored as `Box<dyn LineSearch<T, V>>` and selected at runtime.
pub trait LineSearch<T, V>: Debug
where
    T: Scalar,
    V: Vector<T>,
{
    /// Finds a step size along `direction`.
    ///
    /// Computes the directional derivative ⟨∇f(x), p⟩ and delegates to
    /// [`LineSearch::search_with_deriv`].
    ///
    /// # Errors
    ///
    /// - `InvalidSearchDirection` if `direction` is not a descent direction
    /// - `LineSearchFailed` if no acceptable step was found
    /// - any error returned by the objective
    #[allow(clippy::too_many_arguments)]
    fn search(
        &mut self,
        objective: &dyn Objective<T, V>,
        point: &V,
        value: T,
        gradient: &V,
        direction: &V,
        params: &LineSearchParams<T>,
    ) -> OptimizerResult<LineSearchResult<T, V>> {
        let directional_deriv = gradient.inner(direction)?;
        self.search_with_deriv(objective, point, value, direction, directional_deriv, params)
    }

    /// Finds a step size given a pre-computed directional derivative.
    #[allow(clippy::too_many_arguments)]
    fn search_with_deriv(
        &mut self,
        objective: &dyn Objective<T, V>,
        point: &V,
        value: T,
        direction: &V,
        directional_deriv: T,
        params: &LineSearchParams<T>,
    ) -> OptimizerResult<LineSearchResult<T, V>>;

    /// Name of the strategy, e.g. `"strong_wolfe"`.
    fn name(&self) -> &str;
}

/// x + α p
fn step_point<T: Scalar, V: Vector<T>>(point: &V, direction: &V, alpha: T) -> OptimizerResult<V> {
    let mut trial = point.clone();
    trial.axpy(alpha, direction)?;
    Ok(trial)
}

fn ensure_descent<T: Scalar>(directional_deriv: T) -> OptimizerResult<()> {
    if directional_deriv < T::zero() {
        Ok(())
    } else {
        Err(OptimizerError::InvalidSearchDirection)
    }
}

/// Backtracking line search with the Armijo condition.
///
/// Starting from α₀, the step is multiplied by ρ until
/// f(x + α p) ≤ f(x) + c₁ α ⟨∇f(x), p⟩. Non-finite trial values count as
/// failures of the condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktrackingLineSearch;

impl BacktrackingLineSearch {
    /// Creates a new backtracking line search.
    pub fn new() -> Self {
        Self
    }
}

impl<T, V> LineSearch<T, V> for BacktrackingLineSearch
where
    T: Scalar,
    V: Vector<T>,
{
    fn search_with_deriv(
        &mut self,
        objective: &dyn Objective<T, V>,
        point: &V,
        value: T,
        direction: &V,
        directional_deriv: T,
        params: &LineSearchParams<T>,
    ) -> OptimizerResult<LineSearchResult<T, V>> {
        params.validate()?;
        ensure_descent(directional_deriv)?;

        let mut alpha = <T as Float>::min(params.initial_step_size, params.max_step_size);
        let mut function_evals = 0;

        for _ in 0..params.max_iterations {
            let new_point = step_point(point, direction, alpha)?;
            let new_value = objective.value(&new_point)?;
            function_evals += 1;

            if <T as Float>::is_finite(new_value)
                && new_value <= value + params.c1 * alpha * directional_deriv
            {
                return Ok(LineSearchResult {
                    step_size: alpha,
                    new_point,
                    new_value,
                    new_gradient: None,
                    function_evals,
                    gradient_evals: 0,
                });
            }

            alpha *= params.rho;
            if alpha < params.min_step_size {
                break;
            }
        }

        Err(OptimizerError::line_search_failed(
            "Armijo condition not satisfied",
            function_evals,
            alpha.to_f64_lossy(),
        ))
    }

    fn name(&self) -> &str {
        "backtracking"
    }
}

/// Line search satisfying the strong Wolfe conditions.
///
/// The bracketing phase doubles the step until it either violates
/// sufficient decrease, stops decreasing, or reaches a point with a
/// non-negative directional derivative. The zoom phase then shrinks the
/// bracket with safeguarded cubic interpolation until both conditions hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrongWolfeLineSearch;

/// One end of a zoom bracket: (α, φ(α), φ'(α)).
#[derive(Debug, Clone, Copy)]
struct Bracket<T> {
    alpha: T,
    value: T,
    slope: T,
}

/// Evaluation bookkeeping shared between the bracketing and zoom phases.
struct WolfeProblem<'a, T: Scalar, V: Vector<T>> {
    objective: &'a dyn Objective<T, V>,
    point: &'a V,
    direction: &'a V,
    value: T,
    slope: T,
    params: &'a LineSearchParams<T>,
    evals: usize,
}

impl<T: Scalar, V: Vector<T>> WolfeProblem<'_, T, V> {
    /// Evaluates φ and φ' at `alpha`.
    fn probe(&mut self, alpha: T) -> OptimizerResult<(V, T, V, T)> {
        let x = step_point(self.point, self.direction, alpha)?;
        let (phi, gradient) = self.objective.value_and_derivative(&x)?;
        self.evals += 1;
        let dphi = if <T as Float>::is_finite(phi) {
            let dphi = gradient.inner(self.direction)?;
            if !<T as Float>::is_finite(dphi) {
                return Err(OptimizerError::line_search_failed(
                    "non-finite gradient at trial step",
                    self.evals,
                    alpha.to_f64_lossy(),
                ));
            }
            dphi
        } else {
            T::nan()
        };
        Ok((x, phi, gradient, dphi))
    }

    fn violates_armijo(&self, alpha: T, phi: T) -> bool {
        !<T as Float>::is_finite(phi) || phi > self.value + self.params.c1 * alpha * self.slope
    }

    fn satisfies_curvature(&self, dphi: T) -> bool {
        <T as Float>::abs(dphi) <= -self.params.c2 * self.slope
    }

    fn accept(&self, alpha: T, x: V, phi: T, gradient: V) -> LineSearchResult<T, V> {
        LineSearchResult {
            step_size: alpha,
            new_point: x,
            new_value: phi,
            new_gradient: Some(gradient),
            function_evals: self.evals,
            gradient_evals: self.evals,
        }
    }

    fn failure(&self, reason: &str, alpha: T) -> OptimizerError {
        OptimizerError::line_search_failed(reason, self.evals, alpha.to_f64_lossy())
    }

    /// Zoom phase. `lo` satisfies sufficient decrease and has the lowest
    /// value seen so far; the minimizer lies between `lo` and `hi`.
    fn zoom(
        &mut self,
        mut lo: Bracket<T>,
        mut hi: Bracket<T>,
    ) -> OptimizerResult<LineSearchResult<T, V>> {
        for _ in 0..self.params.max_iterations {
            if <T as Float>::abs(hi.alpha - lo.alpha) < self.params.min_step_size {
                log::debug!(
                    "zoom bracket [{:e}, {:e}] collapsed after {} evaluations",
                    lo.alpha.to_f64_lossy(),
                    hi.alpha.to_f64_lossy(),
                    self.evals
                );
                break;
            }

            let alpha = interpolate(&lo, &hi);
            let (x, phi, gradient, dphi) = self.probe(alpha)?;

            if self.violates_armijo(alpha, phi) || phi >= lo.value {
                hi = Bracket {
                    alpha,
                    value: phi,
                    slope: dphi,
                };
                continue;
            }

            if self.satisfies_curvature(dphi) {
                return Ok(self.accept(alpha, x, phi, gradient));
            }

            if dphi * (hi.alpha - lo.alpha) >= T::zero() {
                hi = lo;
            }
            lo = Bracket {
                alpha,
                value: phi,
                slope: dphi,
            };
        }

        Err(self.failure("zoom phase did not satisfy the strong Wolfe conditions", lo.alpha))
    }
}

/// Safeguarded cubic interpolation of the minimizer between two bracket ends.
///
/// Falls back to bisection when the interpolant is undefined or lands
/// within 10% of either end.
fn interpolate<T: Scalar>(a: &Bracket<T>, b: &Bracket<T>) -> T {
    let two = <T as Scalar>::from_f64(2.0);
    let three = <T as Scalar>::from_f64(3.0);
    let margin = <T as Scalar>::from_f64(0.1);
    let midpoint = (a.alpha + b.alpha) / two;

    let finite = [a.value, b.value, a.slope, b.slope]
        .iter()
        .all(|v| <T as Float>::is_finite(*v));
    if !finite {
        return midpoint;
    }

    let d1 = a.slope + b.slope - three * (a.value - b.value) / (a.alpha - b.alpha);
    let disc = d1 * d1 - a.slope * b.slope;
    if disc < T::zero() {
        return midpoint;
    }
    let d2 = <T as Float>::signum(b.alpha - a.alpha) * <T as Float>::sqrt(disc);
    let trial =
        b.alpha - (b.alpha - a.alpha) * (b.slope + d2 - d1) / (b.slope - a.slope + two * d2);

    let low = <T as Float>::min(a.alpha, b.alpha);
    let high = <T as Float>::max(a.alpha, b.alpha);
    let guard = margin * (high - low);
    if !<T as Float>::is_finite(trial) || trial < low + guard || trial > high - guard {
        midpoint
    } else {
        trial
    }
}

impl StrongWolfeLineSearch {
    /// Creates a new strong Wolfe line search.
    pub fn new() -> Self {
        Self
    }
}

impl<T, V> LineSearch<T, V> for StrongWolfeLineSearch
where
    T: Scalar,
    V: Vector<T>,
{
    fn search_with_deriv(
        &mut self,
        objective: &dyn Objective<T, V>,
        point: &V,
        value: T,
        direction: &V,
        directional_deriv: T,
        params: &LineSearchParams<T>,
    ) -> OptimizerResult<LineSearchResult<T, V>> {
        params.validate()?;
        ensure_descent(directional_deriv)?;

        let mut problem = WolfeProblem {
            objective,
            point,
            direction,
            value,
            slope: directional_deriv,
            params,
            evals: 0,
        };

        let two = <T as Scalar>::from_f64(2.0);
        let mut prev = Bracket {
            alpha: T::zero(),
            value,
            slope: directional_deriv,
        };
        let mut alpha = <T as Float>::min(params.initial_step_size, params.max_step_size);

        for i in 0..params.max_iterations {
            let (x, phi, gradient, dphi) = problem.probe(alpha)?;
            let current = Bracket {
                alpha,
                value: phi,
                slope: dphi,
            };

            if problem.violates_armijo(alpha, phi) || (i > 0 && phi >= prev.value) {
                return problem.zoom(prev, current);
            }

            if problem.satisfies_curvature(dphi) {
                return Ok(problem.accept(alpha, x, phi, gradient));
            }

            if dphi >= T::zero() {
                return problem.zoom(current, prev);
            }

            if alpha >= params.max_step_size {
                return Err(problem.failure("step size reached its upper bound", alpha));
            }
            prev = current;
            alpha = <T as Float>::min(two * alpha, params.max_step_size);
        }

        Err(problem.failure("bracketing phase exhausted its iterations", alpha))
    }

    fn name(&self) -> &str {
        "strong_wolfe"
    }
}

/// Fixed step size: always accepts `initial_step_size`.
///
/// Only a non-finite objective value at the trial point is treated as a
/// failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStepSize;

impl FixedStepSize {
    /// Creates a fixed step strategy; the step comes from the parameters.
    pub fn new() -> Self {
        Self
    }
}

impl<T, V> LineSearch<T, V> for FixedStepSize
where
    T: Scalar,
    V: Vector<T>,
{
    fn search_with_deriv(
        &mut self,
        objective: &dyn Objective<T, V>,
        point: &V,
        _value: T,
        direction: &V,
        directional_deriv: T,
        params: &LineSearchParams<T>,
    ) -> OptimizerResult<LineSearchResult<T, V>> {
        params.validate()?;
        ensure_descent(directional_deriv)?;

        let alpha = params.initial_step_size;
        let new_point = step_point(point, direction, alpha)?;
        let new_value = objective.value(&new_point)?;
        if !<T as Float>::is_finite(new_value) {
            return Err(OptimizerError::line_search_failed(
                "objective is not finite at the fixed step",
                1,
                alpha.to_f64_lossy(),
            ));
        }

        Ok(LineSearchResult {
            step_size: alpha,
            new_point,
            new_value,
            new_gradient: None,
            function_evals: 1,
            gradient_evals: 0,
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Built-in line search strategies, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LineSearchMethod {
    /// [`StrongWolfeLineSearch`]
    #[default]
    StrongWolfe,
    /// [`BacktrackingLineSearch`]
    Backtracking,
    /// [`FixedStepSize`]
    Fixed,
}

impl LineSearchMethod {
    /// Every built-in strategy.
    pub const ALL: [LineSearchMethod; 3] = [
        LineSearchMethod::StrongWolfe,
        LineSearchMethod::Backtracking,
        LineSearchMethod::Fixed,
    ];

    /// Registered name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StrongWolfe => "strong_wolfe",
            Self::Backtracking => "backtracking",
            Self::Fixed => "fixed",
        }
    }

    /// Instantiates the strategy.
    pub fn build<T, V>(&self) -> Box<dyn LineSearch<T, V>>
    where
        T: Scalar,
        V: Vector<T>,
    {
        match self {
            Self::StrongWolfe => Box::new(StrongWolfeLineSearch::new()),
            Self::Backtracking => Box::new(BacktrackingLineSearch::new()),
            Self::Fixed => Box::new(FixedStepSize::new()),
        }
    }
}

impl FromStr for LineSearchMethod {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|method| method.name() == s)
            .ok_or_else(|| {
                OptimizerError::invalid_configuration(
                    format!(
                        "unknown line search; expected one of {}",
                        Self::ALL.map(|m| m.name()).join(", ")
                    ),
                    "line_search",
                    s,
                )
            })
    }
}

impl Display for LineSearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{objective::FnObjective, vector::DenseVector};
    use approx::assert_relative_eq;

    type V = DenseVector<f64>;

    fn quadratic() -> impl Objective<f64, V> {
        // f(x) = 0.5 * (x₀² + 10 x₁²)
        FnObjective::new(
            |x: &V| Ok(0.5 * (x[0] * x[0] + 10.0 * x[1] * x[1])),
            |x: &V| Ok(DenseVector::from_vec(vec![x[0], 10.0 * x[1]])),
        )
    }

    fn setup(f: &impl Objective<f64, V>, x: &V) -> (f64, V, V) {
        let (value, gradient) = f.value_and_derivative(x).unwrap();
        let direction = gradient.scaled(-1.0);
        (value, gradient, direction)
    }

    #[test]
    fn test_strong_wolfe_conditions_hold() {
        let f = quadratic();
        let x = DenseVector::from_vec(vec![2.0, 1.0]);
        let (value, gradient, direction) = setup(&f, &x);
        let params = LineSearchParams::strong_wolfe();

        let mut ls = StrongWolfeLineSearch::new();
        let result = ls.search(&f, &x, value, &gradient, &direction, &params).unwrap();

        let slope = gradient.inner(&direction).unwrap();
        let new_gradient = result.new_gradient.clone().unwrap();
        let new_slope = new_gradient.inner(&direction).unwrap();

        assert!(result.step_size > 0.0);
        assert!(result.new_value <= value + params.c1 * result.step_size * slope);
        assert!(new_slope.abs() <= params.c2 * slope.abs());
        assert_eq!(result.function_evals, result.gradient_evals);
    }

    #[test]
    fn test_strong_wolfe_exact_on_isotropic_quadratic() {
        // f(x) = x·x from [10, 10]: the unit step overshoots to the mirror
        // point and cubic interpolation recovers the exact minimizer α = 0.5.
        let f = FnObjective::new(|x: &V| Ok(x.inner(x)?), |x: &V| Ok(x.scaled(2.0)));
        let x = DenseVector::from_vec(vec![10.0, 10.0]);
        let (value, gradient, direction) = setup(&f, &x);

        let mut ls = StrongWolfeLineSearch::new();
        let result = ls
            .search(&f, &x, value, &gradient, &direction, &LineSearchParams::default())
            .unwrap();

        assert_relative_eq!(result.step_size, 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.new_value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_strong_wolfe_expands_short_steps() {
        let f = quadratic();
        let x = DenseVector::from_vec(vec![1.0, 0.0]);
        let (value, gradient, _) = setup(&f, &x);
        // A tiny direction forces the bracketing phase to grow α.
        let direction = gradient.scaled(-0.01);

        let mut ls = StrongWolfeLineSearch::new();
        let result = ls
            .search(&f, &x, value, &gradient, &direction, &LineSearchParams::default())
            .unwrap();
        assert!(result.step_size > 1.0);
        assert!(result.new_value < value);
    }

    #[test]
    fn test_backtracking_armijo() {
        let f = quadratic();
        let x = DenseVector::from_vec(vec![1.0, 1.0]);
        let (value, gradient, direction) = setup(&f, &x);
        let params = LineSearchParams::backtracking();

        let mut ls = BacktrackingLineSearch::new();
        let result = ls.search(&f, &x, value, &gradient, &direction, &params).unwrap();

        let slope = gradient.inner(&direction).unwrap();
        assert!(result.new_value <= value + params.c1 * result.step_size * slope);
        assert!(result.new_gradient.is_none());
        assert_eq!(result.gradient_evals, 0);
        assert!(result.step_size < 1.0);
    }

    #[test]
    fn test_descent_direction_required() {
        let f = quadratic();
        let x = DenseVector::from_vec(vec![1.0, 1.0]);
        let (value, gradient, _) = setup(&f, &x);
        let ascent = gradient.clone();
        let params = LineSearchParams::default();

        let mut searches: Vec<Box<dyn LineSearch<f64, V>>> = LineSearchMethod::ALL
            .iter()
            .map(|m| m.build())
            .collect();
        for ls in searches.iter_mut() {
            let err = ls.search(&f, &x, value, &gradient, &ascent, &params).unwrap_err();
            assert!(matches!(err, OptimizerError::InvalidSearchDirection), "{}", ls.name());
        }
    }

    #[test]
    fn test_fixed_step_size() {
        let f = quadratic();
        let x = DenseVector::from_vec(vec![1.0, 1.0]);
        let (value, gradient, direction) = setup(&f, &x);

        let mut ls = FixedStepSize::new();
        let result = ls
            .search(&f, &x, value, &gradient, &direction, &LineSearchParams::fixed(0.1))
            .unwrap();

        assert_eq!(result.step_size, 0.1);
        assert_eq!(result.function_evals, 1);
        assert_relative_eq!(result.new_point[0], 0.9);
        assert_relative_eq!(result.new_point[1], 0.0);
    }

    #[test]
    fn test_backtracking_failure_on_nan() {
        let f = FnObjective::new(
            |x: &V| Ok(if x[0] == 1.0 { 1.0 } else { f64::NAN }),
            |_: &V| Ok(DenseVector::from_vec(vec![1.0])),
        );
        let x = DenseVector::from_vec(vec![1.0]);
        let gradient = DenseVector::from_vec(vec![1.0]);
        let direction = DenseVector::from_vec(vec![-1.0]);

        let mut ls = BacktrackingLineSearch::new();
        let err = ls
            .search(&f, &x, 1.0, &gradient, &direction, &LineSearchParams::default())
            .unwrap_err();
        assert!(matches!(err, OptimizerError::LineSearchFailed { .. }));
    }

    #[test]
    fn test_strong_wolfe_failure_on_unbounded_linear() {
        // f(x) = -x decreases forever; the bracketing phase runs into the cap.
        let f = FnObjective::new(|x: &V| Ok(-x[0]), |_: &V| Ok(DenseVector::from_vec(vec![-1.0])));
        let x = DenseVector::from_vec(vec![0.0]);
        let gradient = DenseVector::from_vec(vec![-1.0]);
        let direction = DenseVector::from_vec(vec![1.0]);

        let params = LineSearchParams {
            max_step_size: 64.0,
            ..LineSearchParams::default()
        };
        let mut ls = StrongWolfeLineSearch::new();
        let err = ls.search(&f, &x, 0.0, &gradient, &direction, &params).unwrap_err();
        assert!(matches!(err, OptimizerError::LineSearchFailed { .. }));
    }

    #[test]
    fn test_params_validation() {
        assert!(LineSearchParams::<f64>::default().validate().is_ok());

        let bad = LineSearchParams {
            c1: 0.95,
            ..LineSearchParams::<f64>::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(OptimizerError::InvalidConfiguration { ref parameter, .. }) if parameter == "c2"
        ));

        let bad = LineSearchParams {
            rho: 1.5,
            ..LineSearchParams::<f64>::default()
        };
        assert!(bad.validate().is_err());

        let bad = LineSearchParams {
            max_iterations: 0,
            ..LineSearchParams::<f64>::default()
        };
        assert!(bad.validate().is_err());

        let bad = LineSearchParams::<f64>::fixed(-1.0);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_method_names() {
        for method in LineSearchMethod::ALL {
            assert_eq!(method.name().parse::<LineSearchMethod>().unwrap(), method);
            assert_eq!(method.to_string(), method.name());
            let ls: Box<dyn LineSearch<f64, V>> = method.build();
            assert_eq!(ls.name(), method.name());
        }

        let err = "more_thuente".parse::<LineSearchMethod>().unwrap_err();
        assert!(err.to_string().contains("unknown line search"));
        assert_eq!(LineSearchMethod::default(), LineSearchMethod::StrongWolfe);
    }
}
