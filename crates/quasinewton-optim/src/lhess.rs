//! Limited-memory BFGS approximation of the inverse Hessian.
//!
//! [`LHess`] stores the `m` most recent curvature pairs
//!
//! ```text
//! sₖ = xₖ₊₁ − xₖ,    yₖ = ∇f(xₖ₊₁) − ∇f(xₖ)
//! ```
//!
//! together with their inner products `yₖ·sₖ`, and applies the implied
//! operator Hₖ without ever forming a matrix.
//!
//! # Recursion
//!
//! With ρⱼ = 1/(yⱼ·sⱼ) and j counting pairs from oldest (1) to newest (k):
//!
//! ```text
//! F(v, 0) = H₀·v
//! t       = v − ρⱼ (v·sⱼ) yⱼ
//! F(v, j) = F(t, j−1) − ρⱼ (yⱼ·F(t, j−1)) sⱼ + ρⱼ (v·sⱼ) sⱼ
//! ```
//!
//! and `Hₖ·v = F(v, k)`. This is the BFGS update
//! Hⱼ = Vⱼᵀ Hⱼ₋₁ Vⱼ + ρⱼ sⱼ sⱼᵀ with Vⱼ = I − ρⱼ yⱼ sⱼᵀ applied to a vector.
//! [`LHess::apply_two_loop`] evaluates the same product with the classical
//! two-loop recursion.
//!
//! # Curvature
//!
//! A pair is only useful if y·s > 0. Pairs with `y·s <= curvature_tolerance`
//! are dropped ([`CurvaturePolicy::Skip`]) or reported as
//! `OptimizerError::DegenerateCurvature` ([`CurvaturePolicy::Reject`]).

use quasinewton_core::{
    error::{OptimizerError, OptimizerResult, Result, VectorError},
    linear_operator::LinearOperator,
    types::Scalar,
    vector::Vector,
};
use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to do with a pair whose curvature `y·s` is not above the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CurvaturePolicy {
    /// Drop the pair and keep the current approximation
    #[default]
    Skip,
    /// Fail with `OptimizerError::DegenerateCurvature`
    Reject,
}

/// Result of [`LHess::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The pair was stored
    Accepted,
    /// The pair failed the curvature test and was dropped
    Skipped,
}

/// Initial approximation H₀.
#[derive(Clone)]
pub enum InitialHessian<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    /// H₀ = h·I
    Scaled(T),
    /// Arbitrary operator
    Operator(Arc<dyn LinearOperator<T, V>>),
}

impl<T: Scalar, V: Vector<T>> InitialHessian<T, V> {
    fn apply(&self, v: &V) -> Result<V> {
        match self {
            Self::Scaled(h) => Ok(v.scaled(*h)),
            Self::Operator(op) => op.apply(v),
        }
    }
}

impl<T: Scalar, V: Vector<T>> Debug for InitialHessian<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scaled(h) => write!(f, "Scaled({})", h),
            Self::Operator(op) => f.debug_tuple("Operator").field(op).finish(),
        }
    }
}

/// One stored curvature pair `(y·s, y, s)`.
#[derive(Debug, Clone)]
pub struct CurvaturePair<T, V> {
    curvature: T,
    y: V,
    s: V,
}

impl<T: Scalar, V> CurvaturePair<T, V> {
    /// The raw inner product y·s.
    pub fn curvature(&self) -> T {
        self.curvature
    }

    /// ρ = 1/(y·s)
    pub fn rho(&self) -> T {
        T::one() / self.curvature
    }

    /// Gradient difference y.
    pub fn y(&self) -> &V {
        &self.y
    }

    /// Step s.
    pub fn s(&self) -> &V {
        &self.s
    }
}

/// Entry of the history as returned by [`LHess::get`].
#[derive(Debug, Clone, Copy)]
pub enum HistoryEntry<'a, T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    /// Index 0: the initial approximation
    Initial(&'a InitialHessian<T, V>),
    /// Index k ≥ 1: the k-th oldest pair
    Pair(&'a CurvaturePair<T, V>),
}

/// Limited-memory inverse-Hessian operator.
///
/// # Examples
///
/// ```rust
/// use quasinewton_core::prelude::*;
/// use quasinewton_optim::lhess::{InitialHessian, LHess, UpdateOutcome};
///
/// let mut h = LHess::<f64, DenseVector<f64>>::new(InitialHessian::Scaled(1.0), 5).unwrap();
/// let s = DenseVector::from_vec(vec![1.0, 0.0]);
/// let y = DenseVector::from_vec(vec![4.0, 0.0]);
/// assert_eq!(h.update(&y, &s).unwrap(), UpdateOutcome::Accepted);
///
/// // The secant equation H·y = s holds for the newest pair.
/// let hy = h.apply(&y).unwrap();
/// assert!((hy[0] - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LHess<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    initial: InitialHessian<T, V>,
    pairs: VecDeque<CurvaturePair<T, V>>,
    memory_size: usize,
    policy: CurvaturePolicy,
    curvature_tolerance: T,
}

impl<T, V> LHess<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    /// Creates an empty history holding at most `memory_size` pairs.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `memory_size` is zero.
    pub fn new(initial: InitialHessian<T, V>, memory_size: usize) -> OptimizerResult<Self> {
        if memory_size == 0 {
            return Err(OptimizerError::invalid_configuration(
                "memory size must be at least 1",
                "memory_size",
                "0",
            ));
        }
        Ok(Self {
            initial,
            pairs: VecDeque::with_capacity(memory_size),
            memory_size,
            policy: CurvaturePolicy::default(),
            curvature_tolerance: <T as Scalar>::EPSILON,
        })
    }

    /// Sets the curvature policy and tolerance.
    pub fn with_curvature_policy(mut self, policy: CurvaturePolicy, tolerance: T) -> Self {
        self.policy = policy;
        self.curvature_tolerance = tolerance;
        self
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Maximum number of stored pairs.
    pub fn capacity(&self) -> usize {
        self.memory_size
    }

    /// Dimension of the stored pairs, once the first pair is accepted.
    pub fn dimension(&self) -> Option<usize> {
        self.pairs.front().map(|pair| pair.s.len())
    }

    /// The initial approximation H₀.
    pub fn initial(&self) -> &InitialHessian<T, V> {
        &self.initial
    }

    /// Stored pairs from oldest to newest.
    pub fn pairs(&self) -> impl Iterator<Item = &CurvaturePair<T, V>> + '_ {
        self.pairs.iter()
    }

    /// `0` yields H₀, `1..=len()` the pairs from oldest to newest.
    pub fn get(&self, k: usize) -> Option<HistoryEntry<'_, T, V>> {
        match k {
            0 => Some(HistoryEntry::Initial(&self.initial)),
            _ => self.pairs.get(k - 1).map(HistoryEntry::Pair),
        }
    }

    /// Drops every stored pair.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    fn check_dimension(&self, n: usize) -> Result<()> {
        match self.dimension() {
            Some(expected) => VectorError::check_dimension(expected, n),
            None => Ok(()),
        }
    }

    /// Adds the pair `(y, s)`, evicting the oldest pair when full.
    ///
    /// # Errors
    ///
    /// - dimension mismatch between `y` and `s`, or with the stored pairs
    /// - `DegenerateCurvature` if `y·s <= curvature_tolerance` under
    ///   [`CurvaturePolicy::Reject`]
    ///
    /// The history is unchanged whenever an error is returned.
    pub fn update(&mut self, y: &V, s: &V) -> OptimizerResult<UpdateOutcome> {
        VectorError::check_dimension(s.len(), y.len())?;
        self.check_dimension(s.len())?;

        let curvature = y.inner(s)?;
        if !(curvature > self.curvature_tolerance) {
            return match self.policy {
                CurvaturePolicy::Skip => {
                    log::warn!(
                        "skipping curvature pair: y·s = {:e} <= {:e}",
                        curvature.to_f64_lossy(),
                        self.curvature_tolerance.to_f64_lossy()
                    );
                    Ok(UpdateOutcome::Skipped)
                }
                CurvaturePolicy::Reject => Err(OptimizerError::degenerate_curvature(
                    curvature.to_f64_lossy(),
                    self.curvature_tolerance.to_f64_lossy(),
                )),
            };
        }

        if self.pairs.len() == self.memory_size {
            self.pairs.pop_front();
        }
        self.pairs.push_back(CurvaturePair {
            curvature,
            y: y.clone(),
            s: s.clone(),
        });
        Ok(UpdateOutcome::Accepted)
    }

    /// Computes `Hₖ·v = F(v, k)` (see the module documentation).
    ///
    /// The recursion is unrolled: the descent from depth `k` records each
    /// `v·sⱼ`, the ascent applies the `sⱼ` corrections. Stack use does not
    /// grow with the history length.
    ///
    /// With no stored pair this is exactly `H₀·v`.
    pub fn apply(&self, v: &V) -> Result<V> {
        self.check_dimension(v.len())?;

        let mut t = v.clone();
        let mut projections = Vec::with_capacity(self.pairs.len());
        for pair in self.pairs.iter().rev() {
            let vs = t.inner(&pair.s)?;
            t.axpy(-pair.rho() * vs, &pair.y)?;
            projections.push(vs);
        }

        let mut r = self.initial.apply(&t)?;
        for (pair, vs) in self.pairs.iter().zip(projections.into_iter().rev()) {
            let yr = pair.y.inner(&r)?;
            r.axpy(pair.rho() * (vs - yr), &pair.s)?;
        }
        Ok(r)
    }

    /// Computes `Hₖ·v` with the two-loop recursion.
    pub fn apply_two_loop(&self, v: &V) -> Result<V> {
        self.check_dimension(v.len())?;

        let mut q = v.clone();
        let mut alphas = Vec::with_capacity(self.pairs.len());
        for pair in self.pairs.iter().rev() {
            let alpha = pair.rho() * pair.s.inner(&q)?;
            q.axpy(-alpha, &pair.y)?;
            alphas.push(alpha);
        }

        let mut r = self.initial.apply(&q)?;
        for (pair, alpha) in self.pairs.iter().zip(alphas.into_iter().rev()) {
            let beta = pair.rho() * pair.y.inner(&r)?;
            r.axpy(alpha - beta, &pair.s)?;
        }
        Ok(r)
    }
}

impl<T, V> LinearOperator<T, V> for LHess<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    fn apply(&self, v: &V) -> Result<V> {
        LHess::apply(self, v)
    }
}
