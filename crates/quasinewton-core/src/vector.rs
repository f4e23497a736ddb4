//! Vector abstraction used by the optimizer.
//!
//! The optimizer never touches raw storage: it only needs scaling, the fused
//! `axpy` update, an inner product and a norm. Any container implementing
//! [`Vector`] can be optimized over; [`DenseVector`] is the provided
//! implementation backed by a `nalgebra::DVector`.
//!
//! Vectors have value semantics. Length is fixed at construction and every
//! binary operation checks that the operand has the receiver's length.

use crate::{
    error::{Result, VectorError},
    types::{DVector, Scalar},
};
use num_traits::Float;
use std::fmt::{self, Debug, Display};
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Norms supported by [`Vector::norm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NormKind {
    /// Sum of absolute values
    L1,
    /// Euclidean norm
    #[default]
    L2,
    /// Largest absolute value
    LInf,
}

/// Numeric container the optimizer works with.
pub trait Vector<T: Scalar>: Clone + Debug {
    /// Number of components.
    fn len(&self) -> usize;

    /// True if the vector has no components.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Multiplies every component by `a` in place.
    fn scale(&mut self, a: T);

    /// Adds `a * x` to `self` in place.
    fn axpy(&mut self, a: T, x: &Self) -> Result<()>;

    /// Inner product `<self, other>`.
    fn inner(&self, other: &Self) -> Result<T>;

    /// Norm of the vector.
    fn norm(&self, kind: NormKind) -> T;

    /// A vector of zeros with the same length.
    fn zeros_like(&self) -> Self;

    /// True if every component is finite.
    fn is_finite(&self) -> bool;

    /// Returns `a * self` as a new vector.
    fn scaled(&self, a: T) -> Self {
        let mut out = self.clone();
        out.scale(a);
        out
    }
}

/// Dense vector stored contiguously.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DenseVector<T: Scalar> {
    data: DVector<T>,
}

impl<T: Scalar> DenseVector<T> {
    /// Creates a vector taking ownership of `data`.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data: DVector::from_vec(data),
        }
    }

    /// Creates a vector copying `data`.
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            data: DVector::from_column_slice(data),
        }
    }

    /// A zero vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: DVector::zeros(n),
        }
    }

    /// A vector of length `n` with every component equal to `value`.
    pub fn from_element(n: usize, value: T) -> Self {
        Self {
            data: DVector::from_element(n, value),
        }
    }

    /// Components as a slice.
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    /// Borrow the underlying nalgebra vector.
    pub fn as_dvector(&self) -> &DVector<T> {
        &self.data
    }

    /// Consumes the wrapper, returning the nalgebra vector.
    pub fn into_inner(self) -> DVector<T> {
        self.data
    }

    /// Iterator over components.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Componentwise product `self ⊙ other`.
    pub fn component_mul(&self, other: &Self) -> Result<Self> {
        VectorError::check_dimension(self.len(), other.len())?;
        Ok(Self {
            data: self.data.component_mul(&other.data),
        })
    }
}

impl<T: Scalar> Vector<T> for DenseVector<T> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn scale(&mut self, a: T) {
        self.data *= a;
    }

    fn axpy(&mut self, a: T, x: &Self) -> Result<()> {
        VectorError::check_dimension(self.len(), x.len())?;
        self.data.axpy(a, &x.data, T::one());
        Ok(())
    }

    fn inner(&self, other: &Self) -> Result<T> {
        VectorError::check_dimension(self.len(), other.len())?;
        Ok(self.data.dot(&other.data))
    }

    fn norm(&self, kind: NormKind) -> T {
        match kind {
            NormKind::L1 => self
                .data
                .iter()
                .fold(T::zero(), |acc, &v| acc + <T as Float>::abs(v)),
            NormKind::L2 => self.data.norm(),
            NormKind::LInf => self
                .data
                .iter()
                .fold(T::zero(), |acc, &v| <T as Float>::max(acc, <T as Float>::abs(v))),
        }
    }

    fn zeros_like(&self) -> Self {
        Self::zeros(self.len())
    }

    fn is_finite(&self) -> bool {
        self.data.iter().all(|v| <T as Float>::is_finite(*v))
    }
}

impl<T: Scalar> From<Vec<T>> for DenseVector<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T: Scalar> From<DVector<T>> for DenseVector<T> {
    fn from(data: DVector<T>) -> Self {
        Self { data }
    }
}

impl<T: Scalar> Index<usize> for DenseVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T: Scalar> IndexMut<usize> for DenseVector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T: Scalar> Debug for DenseVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl<T: Scalar> Display for DenseVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_construction_copies() {
        let source = vec![1.0, 2.0, 3.0];
        let mut v = DenseVector::from_slice(&source);
        v[0] = 10.0;
        assert_eq!(source[0], 1.0);
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
        assert!(DenseVector::<f64>::zeros(0).is_empty());
    }

    #[test]
    fn test_scale_and_axpy() {
        let mut v = DenseVector::from_vec(vec![1.0, -2.0]);
        v.scale(3.0);
        assert_eq!(v.as_slice(), &[3.0, -6.0]);

        let x = DenseVector::from_vec(vec![1.0, 1.0]);
        v.axpy(2.0, &x).unwrap();
        assert_eq!(v.as_slice(), &[5.0, -4.0]);

        let scaled = x.scaled(-0.5);
        assert_eq!(scaled.as_slice(), &[-0.5, -0.5]);
        assert_eq!(x.as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn test_inner_and_norms() {
        let v = DenseVector::from_vec(vec![3.0, -4.0]);
        let w = DenseVector::from_vec(vec![1.0, 2.0]);

        assert_relative_eq!(v.inner(&w).unwrap(), -5.0);
        assert_relative_eq!(v.norm(NormKind::L2), 5.0);
        assert_relative_eq!(v.norm(NormKind::L1), 7.0);
        assert_relative_eq!(v.norm(NormKind::LInf), 4.0);
        assert_eq!(NormKind::default(), NormKind::L2);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut v = DenseVector::from_vec(vec![1.0, 2.0]);
        let w = DenseVector::from_vec(vec![1.0, 2.0, 3.0]);

        assert_eq!(
            v.inner(&w),
            Err(VectorError::dimension_mismatch(2, 3))
        );
        assert!(v.axpy(1.0, &w).is_err());
        assert!(v.component_mul(&w).is_err());
        // Receiver untouched after a failed axpy
        assert_eq!(v.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_finiteness_and_display() {
        let v = DenseVector::from_vec(vec![1.0, 0.5]);
        assert!(v.is_finite());
        assert_eq!(v.to_string(), "[1, 0.5]");

        let nan = DenseVector::from_vec(vec![1.0, f64::NAN]);
        assert!(!nan.is_finite());
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_serde_transparent() {
        let v = DenseVector::from_vec(vec![1.0, 2.0]);
        let json = serde_json::to_string(&v).unwrap();
        let back: DenseVector<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
