//! Matrix-free linear operators.
//!
//! A [`LinearOperator`] maps a vector to a vector of the same length without
//! exposing a matrix. Operators compose with [`LinearOperator::compose_with`]
//! and can be shared behind `Arc`/`Box`.

use crate::{
    error::{Result, VectorError},
    types::Scalar,
    vector::{DenseVector, Vector},
};
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::Arc;

/// A linear map applied to vectors of type `V`.
pub trait LinearOperator<T, V>: Debug
where
    T: Scalar,
    V: Vector<T>,
{
    /// Returns `A·v` as a new vector.
    fn apply(&self, v: &V) -> Result<V>;

    /// Returns the operator `v ↦ self(other(v))`.
    fn compose_with<B>(self, other: B) -> ComposedOperator<Self, B>
    where
        Self: Sized,
        B: LinearOperator<T, V>,
    {
        ComposedOperator {
            outer: self,
            inner: other,
        }
    }
}

impl<T, V, O> LinearOperator<T, V> for Box<O>
where
    T: Scalar,
    V: Vector<T>,
    O: LinearOperator<T, V> + ?Sized,
{
    fn apply(&self, v: &V) -> Result<V> {
        (**self).apply(v)
    }
}

impl<T, V, O> LinearOperator<T, V> for Arc<O>
where
    T: Scalar,
    V: Vector<T>,
    O: LinearOperator<T, V> + ?Sized,
{
    fn apply(&self, v: &V) -> Result<V> {
        (**self).apply(v)
    }
}

/// The operator `a·I`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledIdentity<T> {
    /// Scale factor
    pub scale: T,
}

impl<T: Scalar> ScaledIdentity<T> {
    /// Creates `scale·I`.
    pub fn new(scale: T) -> Self {
        Self { scale }
    }

    /// The identity operator.
    pub fn identity() -> Self {
        Self::new(T::one())
    }
}

impl<T, V> LinearOperator<T, V> for ScaledIdentity<T>
where
    T: Scalar,
    V: Vector<T>,
{
    fn apply(&self, v: &V) -> Result<V> {
        Ok(v.scaled(self.scale))
    }
}

/// Diagonal operator on dense vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalOperator<T: Scalar> {
    diagonal: DenseVector<T>,
}

impl<T: Scalar> DiagonalOperator<T> {
    /// Creates `diag(diagonal)`.
    pub fn new(diagonal: DenseVector<T>) -> Result<Self> {
        if diagonal.is_empty() {
            return Err(VectorError::invalid_parameter(
                "diagonal operator needs at least one entry",
            ));
        }
        Ok(Self { diagonal })
    }

    /// The diagonal entries.
    pub fn diagonal(&self) -> &DenseVector<T> {
        &self.diagonal
    }
}

impl<T: Scalar> LinearOperator<T, DenseVector<T>> for DiagonalOperator<T> {
    fn apply(&self, v: &DenseVector<T>) -> Result<DenseVector<T>> {
        self.diagonal.component_mul(v)
    }
}

/// Composition `outer ∘ inner`.
#[derive(Debug, Clone)]
pub struct ComposedOperator<A, B> {
    outer: A,
    inner: B,
}

impl<T, V, A, B> LinearOperator<T, V> for ComposedOperator<A, B>
where
    T: Scalar,
    V: Vector<T>,
    A: LinearOperator<T, V>,
    B: LinearOperator<T, V>,
{
    fn apply(&self, v: &V) -> Result<V> {
        let w = self.inner.apply(v)?;
        self.outer.apply(&w)
    }
}

/// Operator defined by a matrix-vector closure.
pub struct FnOperator<F, T, V> {
    matvec: F,
    _phantom: PhantomData<fn(&V) -> T>,
}

impl<F, T, V> FnOperator<F, T, V>
where
    T: Scalar,
    V: Vector<T>,
    F: Fn(&V) -> Result<V>,
{
    /// Wraps a matvec closure.
    pub fn new(matvec: F) -> Self {
        Self {
            matvec,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, V> Debug for FnOperator<F, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperator").finish_non_exhaustive()
    }
}

impl<F, T, V> LinearOperator<T, V> for FnOperator<F, T, V>
where
    T: Scalar,
    V: Vector<T>,
    F: Fn(&V) -> Result<V>,
{
    fn apply(&self, v: &V) -> Result<V> {
        let out = (self.matvec)(v)?;
        VectorError::check_dimension(v.len(), out.len())?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dv(values: &[f64]) -> DenseVector<f64> {
        DenseVector::from_slice(values)
    }

    #[test]
    fn test_scaled_identity() {
        let op = ScaledIdentity::new(2.5);
        let out = LinearOperator::<f64, DenseVector<f64>>::apply(&op, &dv(&[1.0, -2.0])).unwrap();
        assert_eq!(out.as_slice(), &[2.5, -5.0]);
    }

    #[test]
    fn test_diagonal_and_composition() {
        let diag = DiagonalOperator::new(dv(&[1.0, 4.0, 9.0])).unwrap();
        let half = ScaledIdentity::new(0.5);
        let composed = diag.clone().compose_with(half);

        let out = composed.apply(&dv(&[2.0, 2.0, 2.0])).unwrap();
        assert_eq!(out.as_slice(), &[1.0, 4.0, 9.0]);

        assert!(diag.apply(&dv(&[1.0])).is_err());
        assert!(DiagonalOperator::<f64>::new(DenseVector::zeros(0)).is_err());
    }

    #[test]
    fn test_fn_operator_and_shared() {
        let negate = FnOperator::new(|v: &DenseVector<f64>| Ok(v.scaled(-1.0)));
        let shared: Arc<dyn LinearOperator<f64, DenseVector<f64>>> = Arc::new(negate);
        let out = shared.apply(&dv(&[1.0, 2.0])).unwrap();
        assert_eq!(out.as_slice(), &[-1.0, -2.0]);

        let bad = FnOperator::new(|_: &DenseVector<f64>| Ok(DenseVector::zeros(5)));
        assert_eq!(
            bad.apply(&dv(&[1.0])),
            Err(VectorError::dimension_mismatch(1, 5))
        );
    }
}
