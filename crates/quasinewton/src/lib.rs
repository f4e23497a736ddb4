//! Limited-memory quasi-Newton optimization.
//!
//! Facade over [`quasinewton_core`] (vectors, objectives, line searches,
//! stopping criteria) and [`quasinewton_optim`] (the limited-memory
//! inverse-Hessian and the BFGS driver).
//!
//! # Example
//!
//! ```rust
//! use quasinewton::prelude::*;
//!
//! let f = FnObjective::new(
//!     |x: &DenseVector<f64>| Ok(x.inner(x)?),
//!     |x: &DenseVector<f64>| Ok(x.scaled(2.0)),
//! );
//!
//! let mut bfgs = BFGS::new(BFGSConfig::new().with_display(false)).unwrap();
//! let result = bfgs.solve(&f, &DenseVector::from_vec(vec![3.0, -4.0])).unwrap();
//! assert!(result.converged);
//! ```

pub use nalgebra;
pub use quasinewton_core as core;
pub use quasinewton_optim as optim;

pub use quasinewton_core::{OptimizerError, OptimizerResult, Result, VectorError};
pub use quasinewton_optim::{BFGSConfig, BFGS};

/// Everything needed to define an objective and run the optimizer.
pub mod prelude {
    pub use quasinewton_core::prelude::*;
    pub use quasinewton_optim::{
        BFGSConfig, CurvaturePair, CurvaturePolicy, HistoryEntry, InitialHessian, LHess,
        UpdateOutcome, BFGS,
    };
}
