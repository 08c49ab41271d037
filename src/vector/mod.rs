//! Algorithms that search for local minima of functions along multiple dimensions.
//!
//! All searchers share the same per-run shape: adopt the supplied starting
//! point (or a zero vector sized to the function), clear the iteration trace,
//! differentiate the objective once, then iterate until the step length drops
//! below the configured precision or the iteration cap is hit. Exceeding the
//! cap is not an error; the best point so far is returned.

mod fastest_descent;
mod newton;
mod quasi_newton;

pub use self::fastest_descent::FastestDescent;
pub use self::fastest_descent::FastestDescentBuilder;
pub use self::newton::Newton;
pub use self::newton::NewtonBuilder;
pub use self::quasi_newton::QuasiNewton;
pub use self::quasi_newton::QuasiNewtonBuilder;
pub use self::quasi_newton::UpdateRule;

use ndarray::Array1;

use crate::expr::Expr;
use crate::scalar::{Bounds, Brent};
use crate::trace::{TraceEntry, TraceLog};
use crate::Error;

/// Window searched for the step scale of Newton and quasi-Newton steps.
const ALPHA_BOUNDS: Bounds = Bounds { from: -100., to: 100. };

/// Adopts the caller's starting point, or zeros sized to the function.
fn adopt_init(expr: &Expr, init: Option<Array1<f64>>) -> Result<Array1<f64>, Error> {
    let dims = expr.dims();
    if dims == 0 {
        return Err(Error::ConstantFunction);
    }
    match init {
        Some(point) => {
            if point.len() != dims {
                return Err(Error::DimensionMismatch { expected: dims, got: point.len() });
            }
            Ok(point)
        }
        None => Ok(Array1::zeros(dims)),
    }
}

/// The step scale: minimizes `f(curr + alpha * dir)` over [`ALPHA_BOUNDS`].
fn find_alpha(sd_searcher: &Brent, expr: &Expr, curr: &Array1<f64>, dir: &Array1<f64>) -> f64 {
    sd_searcher.find_min(|alpha| expr.eval((curr + &(alpha * dir)).view()), ALPHA_BOUNDS)
}

fn log_x(trace: &mut TraceLog, iter_num: usize, x: &Array1<f64>) {
    trace.append(TraceEntry::Comment { version: iter_num, text: "x:".to_owned() });
    trace.append(TraceEntry::Point { version: iter_num, coords: x.clone() });
}

fn log_alpha(trace: &mut TraceLog, iter_num: usize, alpha: f64) {
    trace.append(TraceEntry::Comment { version: iter_num, text: "alpha:".to_owned() });
    trace.append(TraceEntry::Value { version: iter_num, value: alpha });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::var;
    use ndarray::array;

    #[test]
    fn init_defaults_to_zeros() {
        let f = var(0) + var(2);
        let init = adopt_init(&f, None).unwrap();
        assert_eq!(init, array![0., 0., 0.]);
    }

    #[test]
    fn init_rejects_wrong_dimensionality() {
        let f = var(0) * var(1);
        match adopt_init(&f, Some(array![1.])) {
            Err(Error::DimensionMismatch { expected: 2, got: 1 }) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn init_rejects_constant_functions() {
        let f = crate::expr::cns(5.);
        assert!(matches!(adopt_init(&f, None), Err(Error::ConstantFunction)));
    }
}
