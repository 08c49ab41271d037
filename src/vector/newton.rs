//! Newton-family searchers.
//!
//! All three variants follow the same skeleton: differentiate the objective
//! once to get symbolic gradient and Hessian, then repeatedly solve
//! `H(x) * delta = -grad(x)` for the step `delta`. They differ in how much
//! they trust that step:
//!
//! * [`classic`](Newton::classic) applies it unscaled — the textbook method,
//!   quadratically convergent near a minimum with a positive definite
//!   Hessian, and happy to run off to any stationary point otherwise;
//! * [`with_line_search`](Newton::with_line_search) keeps the direction but
//!   picks the scale by a one-dimensional minimization along it;
//! * [`with_descent_guard`](Newton::with_descent_guard) additionally checks
//!   that the step is a descent direction, and falls back to the antigradient
//!   when the Hessian is not positive definite at the current point.

use derive_builder::Builder;
use ndarray::Array1;
use tracing::debug;

use super::{adopt_init, find_alpha, log_alpha, log_x};
use crate::expr::Expr;
use crate::linalg;
use crate::scalar::Brent;
use crate::trace::TraceLog;
use crate::Error;

const MAX_ITER: usize = 3000;

/// A minimizer using Newton's method over exact symbolic derivatives.
#[derive(Builder, Debug)]
pub struct Newton {
    /// Step-length threshold below which the search is converged.
    /// Smaller is more precise.
    #[builder(default = "1e-6")]
    pub eps: f64,

    /// The maximum number of iterations before the current point is returned
    /// as is.
    #[builder(default = "3000")]
    pub max_iter: usize,

    #[builder(setter(skip), default)]
    trace: TraceLog,

    #[builder(setter(skip), default)]
    last_expr: Option<Expr>,
}

impl Newton {
    pub fn new(eps: f64) -> Newton {
        Newton { eps, max_iter: MAX_ITER, trace: TraceLog::new(), last_expr: None }
    }

    /// The iteration trace of the most recent run.
    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    /// The function minimized by the most recent run.
    pub fn last_expr(&self) -> Option<&Expr> {
        self.last_expr.as_ref()
    }

    fn start(&mut self, expr: &Expr, init: Option<Array1<f64>>) -> Result<Array1<f64>, Error> {
        self.trace.clear();
        self.last_expr = Some(expr.clone());
        adopt_init(expr, init)
    }

    /// The classic method: full, unscaled Newton steps.
    pub fn classic(
        &mut self,
        expr: &Expr,
        init: Option<Array1<f64>>,
    ) -> Result<Array1<f64>, Error> {
        let mut curr = self.start(expr, init)?;
        let eps_2 = self.eps * self.eps;

        let grad = expr.gradient();
        let hessian = grad.hessian();

        for iter_num in 0..self.max_iter {
            log_x(&mut self.trace, iter_num, &curr);

            let shift = linalg::solve_lu(hessian.eval(curr.view()), -grad.eval(curr.view()))
                .ok_or(Error::SingularHessian)?;

            let shift_len = linalg::norm_sq(&shift);
            debug!("newton iter {}: |shift|^2 = {:e}", iter_num, shift_len);
            if shift_len < eps_2 {
                break;
            }
            curr += &shift;
        }
        Ok(curr)
    }

    /// Newton direction, step scale chosen by one-dimensional minimization.
    pub fn with_line_search(
        &mut self,
        expr: &Expr,
        init: Option<Array1<f64>>,
    ) -> Result<Array1<f64>, Error> {
        let mut curr = self.start(expr, init)?;
        let eps_2 = self.eps * self.eps;
        let sd_searcher = Brent::new(self.eps);

        let grad = expr.gradient();
        let hessian = grad.hessian();

        for iter_num in 0..self.max_iter {
            let shift = linalg::solve_lu(hessian.eval(curr.view()), -grad.eval(curr.view()))
                .ok_or(Error::SingularHessian)?;

            let alpha = find_alpha(&sd_searcher, expr, &curr, &shift);

            log_x(&mut self.trace, iter_num, &curr);
            log_alpha(&mut self.trace, iter_num, alpha);

            let step = alpha * &shift;
            if linalg::norm_sq(&step) < eps_2 {
                break;
            }
            curr += &step;
        }
        Ok(curr)
    }

    /// As [`with_line_search`](Newton::with_line_search), but a step that
    /// points uphill is replaced with the antigradient before the line
    /// search.
    pub fn with_descent_guard(
        &mut self,
        expr: &Expr,
        init: Option<Array1<f64>>,
    ) -> Result<Array1<f64>, Error> {
        let mut curr = self.start(expr, init)?;
        let eps_2 = self.eps * self.eps;
        let sd_searcher = Brent::new(self.eps);

        let grad = expr.gradient();
        let hessian = grad.hessian();

        for iter_num in 0..self.max_iter {
            let curr_grad = grad.eval(curr.view());
            let curr_grad_neg = -&curr_grad;

            let mut shift = linalg::solve_lu(hessian.eval(curr.view()), curr_grad_neg.clone())
                .ok_or(Error::SingularHessian)?;

            if shift.dot(&curr_grad) > 0. {
                debug!("newton iter {}: not a descent direction, using antigradient", iter_num);
                shift = curr_grad_neg;
            }

            let alpha = find_alpha(&sd_searcher, expr, &curr, &shift);

            log_x(&mut self.trace, iter_num, &curr);
            log_alpha(&mut self.trace, iter_num, alpha);

            let step = alpha * &shift;
            if linalg::norm_sq(&step) < eps_2 {
                break;
            }
            curr += &step;
        }
        Ok(curr)
    }
}
