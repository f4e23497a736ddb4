//! Quasi-Newton optimization algorithms.
//!
//! This crate provides the limited-memory BFGS inverse-Hessian approximation
//! and the BFGS driver built on top of it.
//!
//! # Available Components
//!
//! - **LHess**: limited-memory inverse-Hessian operator with bounded history
//! - **BFGS**: line-search quasi-Newton optimizer
//!
//! # Examples
//!
//! ```rust
//! use quasinewton_core::prelude::*;
//! use quasinewton_optim::{BFGSConfig, BFGS};
//!
//! // f(x) = (x₀ − 1)² + 10 (x₁ + 2)²
//! let f = FnObjective::new(
//!     |x: &DenseVector<f64>| Ok((x[0] - 1.0).powi(2) + 10.0 * (x[1] + 2.0).powi(2)),
//!     |x: &DenseVector<f64>| {
//!         Ok(DenseVector::from_vec(vec![2.0 * (x[0] - 1.0), 20.0 * (x[1] + 2.0)]))
//!     },
//! );
//!
//! let mut optimizer = BFGS::new(
//!     BFGSConfig::new()
//!         .with_gradient_tolerance(1e-8)
//!         .with_function_tolerance(0.0)
//!         .with_display(false),
//! )
//! .unwrap();
//!
//! let result = optimizer.solve(&f, &DenseVector::zeros(2)).unwrap();
//! assert!(result.converged);
//! assert!((result.point[0] - 1.0).abs() < 1e-6);
//! assert!((result.point[1] + 2.0).abs() < 1e-6);
//! ```

pub mod bfgs;
pub mod lhess;

pub use bfgs::{BFGSConfig, BFGS};
pub use lhess::{CurvaturePair, CurvaturePolicy, HistoryEntry, InitialHessian, LHess, UpdateOutcome};
