//! Iteration callbacks and hooks.
//!
//! Callbacks observe the optimization process; they cannot steer it. An
//! error returned by a callback is reported by the optimizer (logged and
//! counted) and the run continues unchanged.
//!
//! Closures of the form `FnMut(&IterationInfo<T, V>) -> CallbackResult`
//! implement [`IterationCallback`] directly.

use crate::{types::Scalar, vector::Vector};
use std::marker::PhantomData;
use thiserror::Error;

/// Error reported by a callback or hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CallbackError(pub String);

impl From<&str> for CallbackError {
    fn from(reason: &str) -> Self {
        Self(reason.to_string())
    }
}

impl From<String> for CallbackError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

/// Result returned by callbacks and hooks.
pub type CallbackResult = std::result::Result<(), CallbackError>;

/// Snapshot of the iterate passed to callbacks.
#[derive(Debug, Clone, Copy)]
pub struct IterationInfo<'a, T, V>
where
    T: Scalar,
{
    /// Number of completed iterations
    pub iteration: usize,

    /// f(xₖ)
    pub value: T,

    /// f(xₖ₋₁), if a step has been taken
    pub previous_value: Option<T>,

    /// ‖∇f(xₖ)‖
    pub gradient_norm: T,

    /// Step size of the step that produced xₖ
    pub step_size: Option<T>,

    /// The current iterate xₖ
    pub point: &'a V,
}

/// Observer invoked by the optimizer.
pub trait IterationCallback<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    /// Called with the current iterate.
    fn on_iteration(&mut self, info: &IterationInfo<'_, T, V>) -> CallbackResult;
}

impl<T, V, F> IterationCallback<T, V> for F
where
    T: Scalar,
    V: Vector<T>,
    F: FnMut(&IterationInfo<'_, T, V>) -> CallbackResult,
{
    fn on_iteration(&mut self, info: &IterationInfo<'_, T, V>) -> CallbackResult {
        self(info)
    }
}

/// Boxed callback as stored by optimizers.
pub type BoxedCallback<T, V> = Box<dyn IterationCallback<T, V>>;

/// Hooks run before and after every iteration.
pub struct IterationHooks<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    before: Option<BoxedCallback<T, V>>,
    after: Option<BoxedCallback<T, V>>,
}

impl<T, V> Default for IterationHooks<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    fn default() -> Self {
        Self {
            before: None,
            after: None,
        }
    }
}

impl<T, V> std::fmt::Debug for IterationHooks<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationHooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

impl<T, V> IterationHooks<T, V>
where
    T: Scalar,
    V: Vector<T>,
{
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook run before each iteration.
    pub fn before<C>(mut self, hook: C) -> Self
    where
        C: IterationCallback<T, V> + 'static,
    {
        self.before = Some(Box::new(hook));
        self
    }

    /// Sets the hook run after each iteration.
    pub fn after<C>(mut self, hook: C) -> Self
    where
        C: IterationCallback<T, V> + 'static,
    {
        self.after = Some(Box::new(hook));
        self
    }

    /// Runs the before-iteration hook, if any.
    pub fn before_iteration(&mut self, info: &IterationInfo<'_, T, V>) -> CallbackResult {
        match self.before.as_mut() {
            Some(hook) => hook.on_iteration(info),
            None => Ok(()),
        }
    }

    /// Runs the after-iteration hook, if any.
    pub fn after_iteration(&mut self, info: &IterationInfo<'_, T, V>) -> CallbackResult {
        match self.after.as_mut() {
            Some(hook) => hook.on_iteration(info),
            None => Ok(()),
        }
    }
}

/// Logs progress through `log::info!` every `print_every` iterations.
#[derive(Debug, Clone)]
pub struct ProgressLogger<T> {
    print_every: usize,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> ProgressLogger<T> {
    /// Logs every `print_every` iterations (at least every iteration).
    pub fn new(print_every: usize) -> Self {
        Self {
            print_every: print_every.max(1),
            _phantom: PhantomData,
        }
    }
}

impl<T, V> IterationCallback<T, V> for ProgressLogger<T>
where
    T: Scalar,
    V: Vector<T>,
{
    fn on_iteration(&mut self, info: &IterationInfo<'_, T, V>) -> CallbackResult {
        if info.iteration % self.print_every == 0 {
            match info.step_size {
                Some(step) => log::info!(
                    "iter {:>5}  f = {:<14e}  |grad| = {:<12e}  step = {:e}",
                    info.iteration,
                    info.value.to_f64_lossy(),
                    info.gradient_norm.to_f64_lossy(),
                    step.to_f64_lossy()
                ),
                None => log::info!(
                    "iter {:>5}  f = {:<14e}  |grad| = {:<12e}",
                    info.iteration,
                    info.value.to_f64_lossy(),
                    info.gradient_norm.to_f64_lossy()
                ),
            }
        }
        Ok(())
    }
}
