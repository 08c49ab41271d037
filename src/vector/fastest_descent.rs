//! Fastest (steepest) descent.
//!
//! After computing the gradient, do not take a small damped step along the
//! antigradient: move along it for as long as the function keeps decreasing,
//! by solving the one-dimensional problem `min f(curr - t * grad)` on a
//! bounded interval. Only then recompute the gradient and repeat. No matrix
//! is ever formed, which makes this the cheapest searcher per iteration and
//! the slowest one to converge near flat valleys.

use derive_builder::Builder;
use ndarray::Array1;
use tracing::debug;

use super::adopt_init;
use crate::expr::Expr;
use crate::linalg::norm_sq;
use crate::scalar::{Bounds, Brent};
use crate::trace::{TraceEntry, TraceLog};
use crate::Error;

const MAX_ITER: usize = 1000;

/// A gradient-only minimizer with a bounded line search per iteration.
#[derive(Builder, Debug)]
pub struct FastestDescent {
    /// Gradient-length threshold below which the search is converged.
    /// Smaller is more precise.
    #[builder(default = "1e-6")]
    pub eps: f64,

    /// Upper bound of the step-length line search.
    #[builder(default = "10.")]
    pub max_step: f64,

    /// The maximum number of iterations before the current point is returned
    /// as is.
    #[builder(default = "1000")]
    pub max_iter: usize,

    #[builder(setter(skip), default)]
    trace: TraceLog,

    #[builder(setter(skip), default)]
    last_expr: Option<Expr>,
}

impl FastestDescent {
    pub fn new(eps: f64) -> FastestDescent {
        FastestDescent {
            eps,
            max_step: 10.,
            max_iter: MAX_ITER,
            trace: TraceLog::new(),
            last_expr: None,
        }
    }

    /// The iteration trace of the most recent run.
    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    /// The function minimized by the most recent run.
    pub fn last_expr(&self) -> Option<&Expr> {
        self.last_expr.as_ref()
    }

    /// Searches for a minimum of `expr` from `init` (or the origin).
    pub fn minimize(
        &mut self,
        expr: &Expr,
        init: Option<Array1<f64>>,
    ) -> Result<Array1<f64>, Error> {
        self.trace.clear();
        self.last_expr = Some(expr.clone());
        let mut curr = adopt_init(expr, init)?;

        let eps_2 = self.eps * self.eps;
        let sd_searcher = Brent::new(self.eps);
        let grad = expr.gradient();

        let mut shift = grad.eval(curr.view());
        let mut iter_num = 0;
        while norm_sq(&shift) >= eps_2 && iter_num < self.max_iter {
            self.trace.append(TraceEntry::Point { version: iter_num, coords: curr.clone() });

            let sd_min = sd_searcher.find_min(
                |t| expr.eval((&curr - &(t * &shift)).view()),
                Bounds { from: 0., to: self.max_step },
            );
            debug!("descent iter {}: step {:e} along |grad|^2 = {:e}", iter_num, sd_min, norm_sq(&shift));

            curr -= &(sd_min * &shift);
            shift = grad.eval(curr.view());
            iter_num += 1;
        }

        Ok(curr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;
    use ndarray::array;

    #[test]
    fn minimizes_a_quadratic_bowl() {
        let f = var(0).powi(2) + var(1).powi(2);
        let mut fd = FastestDescent::new(1e-6);
        let res = fd.minimize(&f, Some(array![3., 4.])).unwrap();

        assert!(res[0].abs() < 1e-4 && res[1].abs() < 1e-4, "res: {}", res);
        assert!(!fd.trace().is_empty());
    }

    #[test]
    fn minimizes_himmelblau_to_a_stationary_point() {
        let f = (var(0).powi(2) + var(1) - 11.).powi(2)
            + (var(0) + var(1).powi(2) - 7.).powi(2);
        let mut fd = FastestDescentBuilder::default().build().unwrap();
        let res = fd.minimize(&f, Some(array![1., 2.])).unwrap();

        let grad = f.gradient().eval(res.view());
        assert!(norm_sq(&grad).sqrt() < 1e-2, "grad: {}", grad);
    }

    #[test]
    fn starting_at_the_minimum_takes_no_iterations() {
        let f = var(0).powi(2) + var(1).powi(2);
        let mut fd = FastestDescent::new(1e-6);
        let res = fd.minimize(&f, Some(array![0., 0.])).unwrap();

        assert_eq!(res, array![0., 0.]);
        assert!(fd.trace().is_empty());
    }
}
