//! Quasi-Newton searchers.
//!
//! Instead of evaluating a Hessian and solving a linear system on every
//! iteration, these methods maintain a running approximation of the *inverse*
//! Hessian (the anti-Hessian), refined by a rank-2 correction from the latest
//! point and gradient changes. Only the gradient of the objective is ever
//! required. Both update rules satisfy the secant condition: the corrected
//! approximation maps the latest gradient change onto the latest point
//! change, exactly.

use derive_builder::Builder;
use ndarray::{Array1, Array2};
use tracing::debug;

use super::{adopt_init, find_alpha, log_alpha, log_x};
use crate::expr::Expr;
use crate::linalg::{norm_sq, outer};
use crate::scalar::Brent;
use crate::trace::TraceLog;
use crate::Error;

const MAX_ITER: usize = 3000;

/// A correction denominator below this magnitude would blow the anti-Hessian
/// up with near-infinities; the update is skipped instead.
const DEGENERACY_GUARD: f64 = 1e-12;

/// The rank-2 correction applied to the anti-Hessian each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRule {
    /// Broyden-Fletcher-Goldfarb-Shanno: keeps the approximation positive
    /// definite as long as the secant condition has the right curvature.
    Bfgs,
    /// Powell's symmetric rank-correction variant.
    Powell,
}

/// A minimizer that approximates the inverse Hessian from gradient changes.
#[derive(Builder, Debug)]
pub struct QuasiNewton {
    /// Step-length threshold below which the search is converged.
    /// Smaller is more precise.
    #[builder(default = "1e-6")]
    pub eps: f64,

    /// The maximum number of iterations before the current point is returned
    /// as is.
    #[builder(default = "3000")]
    pub max_iter: usize,

    /// The anti-Hessian update rule, fixed for the whole run.
    #[builder(default = "UpdateRule::Bfgs")]
    pub update: UpdateRule,

    #[builder(setter(skip), default)]
    trace: TraceLog,

    #[builder(setter(skip), default)]
    last_expr: Option<Expr>,
}

impl QuasiNewton {
    pub fn new(eps: f64, update: UpdateRule) -> QuasiNewton {
        QuasiNewton {
            eps,
            max_iter: MAX_ITER,
            update,
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
    ///
    /// The first iteration is a plain gradient-descent step: the anti-Hessian
    /// is still the identity and there is no previous gradient to form a
    /// secant from.
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
        let mut anti_hessian = Array2::eye(grad.dims());
        let mut w = -grad.eval(curr.view());

        let alpha = find_alpha(&sd_searcher, expr, &curr, &w);
        log_x(&mut self.trace, 0, &curr);
        log_alpha(&mut self.trace, 0, alpha);
        let mut curr_diff = alpha * &w;
        curr += &curr_diff;

        for iter_num in 1..self.max_iter {
            if norm_sq(&curr_diff) <= eps_2 {
                break;
            }

            let w_new = -grad.eval(curr.view());
            let w_diff = &w_new - &w;
            w = w_new;

            anti_hessian = match self.update {
                UpdateRule::Bfgs => bfgs_update(anti_hessian, &w_diff, &curr_diff),
                UpdateRule::Powell => powell_update(anti_hessian, &w_diff, &curr_diff),
            };

            let p = anti_hessian.dot(&w);
            let alpha = find_alpha(&sd_searcher, expr, &curr, &p);

            log_x(&mut self.trace, iter_num, &curr);
            log_alpha(&mut self.trace, iter_num, alpha);

            curr_diff = alpha * &p;
            curr += &curr_diff;
        }

        Ok(curr)
    }
}

/// The BFGS rank-2 correction of the anti-Hessian.
fn bfgs_update(
    anti_hessian: Array2<f64>,
    w_diff: &Array1<f64>,
    curr_diff: &Array1<f64>,
) -> Array2<f64> {
    let ah_wd = anti_hessian.dot(w_diff);
    let roe = ah_wd.dot(w_diff);
    let wd_cd = w_diff.dot(curr_diff);
    if roe.abs() < DEGENERACY_GUARD || wd_cd.abs() < DEGENERACY_GUARD {
        debug!("degenerate bfgs update skipped: roe = {:e}, wd_cd = {:e}", roe, wd_cd);
        return anti_hessian;
    }

    let r = &(&ah_wd / roe) - &(curr_diff / wd_cd);

    let fst = outer(curr_diff, curr_diff) * (-1. / wd_cd);
    let sec = outer(&ah_wd, w_diff).dot(&anti_hessian.t()) * (-1. / roe);
    let thd = outer(&(roe * &r), &r);

    anti_hessian + fst + sec + thd
}

/// Powell's correction: a single symmetric rank-adjustment built from
/// `x = H * w_diff + curr_diff`.
fn powell_update(
    anti_hessian: Array2<f64>,
    w_diff: &Array1<f64>,
    curr_diff: &Array1<f64>,
) -> Array2<f64> {
    let x = &anti_hessian.dot(w_diff) + curr_diff;
    let denom = w_diff.dot(&x);
    if denom.abs() < DEGENERACY_GUARD {
        debug!("degenerate powell update skipped: denom = {:e}", denom);
        return anti_hessian;
    }

    let correction = outer(&x, &x) * (-1. / denom);
    anti_hessian + correction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;
    use crate::linalg;
    use ndarray::array;

    fn himmelblau() -> Expr {
        (var(0).powi(2) + var(1) - 11.).powi(2) + (var(0) + var(1).powi(2) - 7.).powi(2)
    }

    fn grad_len(expr: &Expr, x: &Array1<f64>) -> f64 {
        linalg::norm_sq(&expr.gradient().eval(x.view())).sqrt()
    }

    #[test]
    fn bfgs_minimizes_a_quadratic_bowl() {
        let f = var(0).powi(2) + var(1).powi(2);
        let mut qn = QuasiNewton::new(1e-6, UpdateRule::Bfgs);
        let res = qn.minimize(&f, Some(array![3., 4.])).unwrap();

        assert!(res[0].abs() < 1e-4 && res[1].abs() < 1e-4, "res: {}", res);
    }

    #[test]
    fn powell_minimizes_a_quadratic_bowl() {
        let f = var(0).powi(2) + var(1).powi(2);
        let mut qn = QuasiNewton::new(1e-6, UpdateRule::Powell);
        let res = qn.minimize(&f, Some(array![3., 4.])).unwrap();

        assert!(res[0].abs() < 1e-4 && res[1].abs() < 1e-4, "res: {}", res);
    }

    #[test]
    fn bfgs_minimizes_himmelblau() {
        let f = himmelblau();
        let mut qn = QuasiNewtonBuilder::default().build().unwrap();
        let res = qn.minimize(&f, Some(array![1., 2.])).unwrap();

        assert!(f.eval(res.view()) < 1e-4, "f: {}", f.eval(res.view()));
        assert!(grad_len(&f, &res) < 1e-2);
    }

    #[test]
    fn powell_minimizes_a_skewed_quadratic() {
        let f = (var(0) + 10. * var(1)).powi(2) + 5. * (var(0) - var(1)).powi(2);
        let mut qn = QuasiNewtonBuilder::default()
            .update(UpdateRule::Powell)
            .build()
            .unwrap();
        let res = qn.minimize(&f, Some(array![1., 2.])).unwrap();

        assert!(res[0].abs() < 1e-3 && res[1].abs() < 1e-3, "res: {}", res);
    }

    // `w_diff` is the change of the *negative* gradient, so the secant
    // condition `H' * (gradient change) = point change` reads
    // `H' * w_diff = -curr_diff`.
    #[test]
    fn bfgs_update_satisfies_the_secant_condition() {
        let anti_hessian = Array2::eye(2);
        let w_diff = array![3.6, 7.2];
        let curr_diff = array![-1.8, -2.0];

        let updated = bfgs_update(anti_hessian, &w_diff, &curr_diff);
        let secant = updated.dot(&w_diff);
        for i in 0..2 {
            assert!((secant[i] + curr_diff[i]).abs() < 1e-12, "secant: {}", secant);
        }
    }

    #[test]
    fn powell_update_satisfies_the_secant_condition() {
        let anti_hessian = Array2::eye(2);
        let w_diff = array![3.6, 7.2];
        let curr_diff = array![-1.8, -2.0];

        let updated = powell_update(anti_hessian, &w_diff, &curr_diff);
        let secant = updated.dot(&w_diff);
        for i in 0..2 {
            assert!((secant[i] + curr_diff[i]).abs() < 1e-12, "secant: {}", secant);
        }
    }

    #[test]
    fn degenerate_updates_leave_the_anti_hessian_alone() {
        let anti_hessian = Array2::eye(2);
        let w_diff = array![0., 0.];
        let curr_diff = array![1., 1.];

        assert_eq!(bfgs_update(anti_hessian.clone(), &w_diff, &curr_diff), Array2::eye(2));
        assert_eq!(powell_update(anti_hessian, &w_diff, &curr_diff), Array2::eye(2));
    }

    #[test]
    fn logs_points_and_step_scales() {
        let f = var(0).powi(2) + var(1).powi(2);
        let mut qn = QuasiNewton::new(1e-6, UpdateRule::Bfgs);
        qn.minimize(&f, Some(array![3., 4.])).unwrap();

        use crate::trace::TraceEntry;
        let points = qn.trace().iter().filter(|e| matches!(e, TraceEntry::Point { .. })).count();
        let values = qn.trace().iter().filter(|e| matches!(e, TraceEntry::Value { .. })).count();
        assert!(points > 0);
        assert_eq!(points, values);
    }
}
