//! Derivative-based minimization of symbolic multivariate functions.
//!
//! The crate couples a small symbolic engine with a family of iterative
//! searchers. An objective is built as an expression tree over variables
//! `x0, x1, ...`; the tree differentiates itself exactly, so the searchers
//! work with analytic gradients and Hessians instead of finite differences.
//!
//! Three families of searchers are provided, in decreasing order of how much
//! derivative information they consume:
//!
//! * [`vector::Newton`] — gradient and Hessian, with a linear solve per
//!   iteration; classic, line-search-damped and descent-guarded variants;
//! * [`vector::QuasiNewton`] — gradient only, maintaining a rank-2-updated
//!   approximation of the inverse Hessian (BFGS or Powell rule);
//! * [`vector::FastestDescent`] — gradient only, nothing else.
//!
//! Each of them delegates its inner one-dimensional problem to
//! [`scalar::Brent`] and records every iteration in a [`trace::TraceLog`]
//! that can be replayed after the run.
//!
//! # Examples
//!
//! ```
//! use ndarray::array;
//! use descent::expr::var;
//! use descent::vector::NewtonBuilder;
//!
//! // Rosenbrock: 100 (x1 - x0^2)^2 + (1 - x0)^2
//! let f = 100. * (var(1) - var(0).powi(2)).powi(2) + (1. - var(0)).powi(2);
//!
//! let mut newton = NewtonBuilder::default().eps(1e-6).build().unwrap();
//! let min = newton.classic(&f, Some(array![1., 2.])).unwrap();
//!
//! assert!((min[0] - 1.).abs() < 1e-4);
//! assert!((min[1] - 1.).abs() < 1e-4);
//! ```

pub mod expr;
pub mod linalg;
pub mod scalar;
pub mod trace;
pub mod vector;

pub use crate::expr::{cns, var, Expr};
pub use crate::trace::{TraceEntry, TraceLog};

/// The ways a search can be asked to do something meaningless.
///
/// Running out of iterations is deliberately *not* here: the searchers
/// return the best point found so far, and callers that must distinguish
/// convergence can inspect the trace or the gradient at the result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The initial point does not match the function's dimensionality.
    #[error("the initial point has {got} coordinates but the function depends on {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A function without variables has no gradient to follow.
    #[error("cannot minimize a constant function")]
    ConstantFunction,

    /// The Hessian admits no LU factorization at the current point, so the
    /// Newton step is undefined there.
    #[error("the hessian is singular at the current point")]
    SingularHessian,
}
