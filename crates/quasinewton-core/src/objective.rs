//! Objective function interface for optimization algorithms.
//!
//! An [`Objective`] exposes a scalar value and its gradient (called the
//! derivative here). Both must be pure functions of the point; optimizers
//! rely on that when comparing successive values.

use crate::{
    error::{OptimizerError, OptimizerResult},
    types::Scalar,
    vector::Vector,
};
use std::cell::Cell;
use std::fmt::{self, Debug};
use std::marker::PhantomData;

/// A differentiable scalar objective over vectors of type `V`.
///
/// The trait is object safe so that line searches can receive a
/// `&dyn Objective<T, V>`.
pub trait Objective<T, V>: Debug
where
    T: Scalar,
    V: Vector<T>,
{
    /// Evaluates the objective at `x`.
    fn value(&self, x: &V) -> OptimizerResult<T>;

    /// Evaluates the gradient at `x`.
    ///
    /// The result must have the same length as `x`.
    fn derivative(&self, x: &V) -> OptimizerResult<V>;

    /// Evaluates value and gradient together.
    ///
    /// Override when both share intermediate work.
    fn value_and_derivative(&self, x: &V) -> OptimizerResult<(T, V)> {
        Ok((self.value(x)?, self.derivative(x)?))
    }
}

impl<T, V, O> Objective<T, V> for &O
where
    T: Scalar,
    V: Vector<T>,
    O: Objective<T, V> + ?Sized,
{
    fn value(&self, x: &V) -> OptimizerResult<T> {
        (**self).value(x)
    }

    fn derivative(&self, x: &V) -> OptimizerResult<V> {
        (**self).derivative(x)
    }

    fn value_and_derivative(&self, x: &V) -> OptimizerResult<(T, V)> {
        (**self).value_and_derivative(x)
    }
}

/// Objective built from a pair of closures.
///
/// ```rust
/// use quasinewton_core::prelude::*;
///
/// let f = FnObjective::new(
///     |x: &DenseVector<f64>| x.inner(x).map_err(Into::into),
///     |x: &DenseVector<f64>| Ok(x.scaled(2.0)),
/// );
/// let x = DenseVector::from_vec(vec![1.0, 2.0]);
/// assert_eq!(f.value(&x).unwrap(), 5.0);
/// ```
pub struct FnObjective<F, G, T, V> {
    value_fn: F,
    derivative_fn: G,
    _phantom: PhantomData<fn(&V) -> T>,
}

impl<F, G, T, V> FnObjective<F, G, T, V>
where
    T: Scalar,
    V: Vector<T>,
    F: Fn(&V) -> OptimizerResult<T>,
    G: Fn(&V) -> OptimizerResult<V>,
{
    /// Creates an objective from a value closure and a gradient closure.
    pub fn new(value_fn: F, derivative_fn: G) -> Self {
        Self {
            value_fn,
            derivative_fn,
            _phantom: PhantomData,
        }
    }
}

impl<F, G, T, V> Debug for FnObjective<F, G, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObjective").finish_non_exhaustive()
    }
}

impl<F, G, T, V> Objective<T, V> for FnObjective<F, G, T, V>
where
    T: Scalar,
    V: Vector<T>,
    F: Fn(&V) -> OptimizerResult<T>,
    G: Fn(&V) -> OptimizerResult<V>,
{
    fn value(&self, x: &V) -> OptimizerResult<T> {
        (self.value_fn)(x)
    }

    fn derivative(&self, x: &V) -> OptimizerResult<V> {
        (self.derivative_fn)(x)
    }
}

/// Wrapper that counts objective evaluations.
#[derive(Debug)]
pub struct CountingObjective<O> {
    /// The underlying objective
    pub inner: O,
    value_count: Cell<usize>,
    derivative_count: Cell<usize>,
}

impl<O> CountingObjective<O> {
    /// Creates a new counting wrapper around an objective.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            value_count: Cell::new(0),
            derivative_count: Cell::new(0),
        }
    }

    /// Resets all counters to zero.
    pub fn reset_counts(&self) {
        self.value_count.set(0);
        self.derivative_count.set(0);
    }

    /// Returns `(value evaluations, derivative evaluations)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.value_count.get(), self.derivative_count.get())
    }
}

impl<T, V, O> Objective<T, V> for CountingObjective<O>
where
    T: Scalar,
    V: Vector<T>,
    O: Objective<T, V>,
{
    fn value(&self, x: &V) -> OptimizerResult<T> {
        self.value_count.set(self.value_count.get() + 1);
        self.inner.value(x)
    }

    fn derivative(&self, x: &V) -> OptimizerResult<V> {
        self.derivative_count.set(self.derivative_count.get() + 1);
        self.inner.derivative(x)
    }

    fn value_and_derivative(&self, x: &V) -> OptimizerResult<(T, V)> {
        self.value_count.set(self.value_count.get() + 1);
        self.derivative_count.set(self.derivative_count.get() + 1);
        self.inner.value_and_derivative(x)
    }
}

/// Evaluates value and gradient and rejects non-finite results.
pub fn evaluate_checked<T, V, O>(objective: &O, x: &V) -> OptimizerResult<(T, V)>
where
    T: Scalar,
    V: Vector<T>,
    O: Objective<T, V> + ?Sized,
{
    let (value, gradient) = objective.value_and_derivative(x)?;
    if gradient.len() != x.len() {
        return Err(crate::error::VectorError::dimension_mismatch(x.len(), gradient.len()).into());
    }
    if !num_traits::Float::is_finite(value) || !gradient.is_finite() {
        return Err(OptimizerError::evaluation_failed(format!(
            "non-finite objective value ({}) or gradient",
            value
        )));
    }
    Ok((value, gradient))
}
