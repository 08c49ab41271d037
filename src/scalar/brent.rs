//! Brent's method combines golden-section search with inverse parabolic
//! interpolation. Golden-section alone is safe but slow: it shrinks the
//! bracket by a constant factor per evaluation no matter how cooperative the
//! function is. When the three best points seen so far look parabola-like,
//! fitting that parabola and jumping to its vertex converges superlinearly on
//! smooth functions. Brent's method tries the parabola first and falls back
//! to a golden-section step whenever the vertex is suspect: outside the
//! bracket, too close to its edges, or further from the current best point
//! than half of the step taken two iterations ago.
//!
//! The method keeps three abscissas ordered by merit:
//!   x — the best point found so far,
//!   w — the second best,
//!   v — the previous value of w.
//! Each iteration produces one new point u, evaluates the function once, then
//! shrinks the bracket around the minimum and rotates u into the triple.

use derive_builder::Builder;

/// The search interval of a one-dimensional minimization.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub from: f64,
    pub to: f64,
}

impl Bounds {
    pub fn length(&self) -> f64 {
        self.to - self.from
    }

    pub fn middle(&self) -> f64 {
        (self.from + self.to) / 2.
    }
}

const TAU: f64 = 0.381_966_011_250_105_2; // (3 - sqrt(5)) / 2, the golden-section fraction

/// A searcher for a local minimum of a function on a bounded interval.
#[derive(Builder, Debug)]
pub struct Brent {
    /// The accuracy to which the minimizer is located. Smaller is more precise.
    #[builder(default = "1e-6")]
    pub eps: f64,

    /// The maximum number of iterations; reaching it is a soft failure and
    /// the best point so far is returned as is.
    #[builder(default = "100")]
    pub max_iter: usize,
}

fn all_different(a: f64, b: f64, c: f64, eps: f64) -> bool {
    (a - b).abs() > eps && (a - c).abs() > eps && (b - c).abs() > eps
}

/// Abscissa of the vertex of the parabola through three points, via divided
/// differences.
fn parabola_vertex(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)) -> f64 {
    let a0 = p1.1;
    let a1 = (p2.1 - a0) / (p2.0 - p1.0);
    let a2 = ((p3.1 - a0) / (p3.0 - p1.0) - a1) / (p3.0 - p2.0);

    (p1.0 + p2.0 - a1 / a2) / 2.
}

impl Brent {
    pub fn new(eps: f64) -> Brent {
        Brent { eps, max_iter: 100 }
    }

    /// Searches `bounds` for a local minimum of `func`.
    ///
    /// The function is assumed unimodal on the interval; on a multimodal
    /// function the result is one of the local minima, with no guarantee
    /// which.
    pub fn find_min<F>(&self, func: F, bounds: Bounds) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let mut bnds = bounds;

        let mut x = bnds.from + TAU * bnds.length();
        let mut w = x;
        let mut v = x;
        let mut f_x = func(x);
        let mut f_w = f_x;
        let mut f_v = f_x;

        let mut step = bnds.length();
        let mut prev_step = step;

        for _ in 0..self.max_iter {
            let prev_prev_step = prev_step;
            prev_step = step;

            let tol = self.eps * x.abs() + self.eps / 10.;
            if (x - bnds.middle()).abs() + bnds.length() / 2. - 2. * tol <= self.eps {
                break;
            }

            let mut u = 0.;
            let mut accepted = false;
            if all_different(x, w, v, self.eps) && all_different(f_x, f_w, f_v, self.eps) {
                u = parabola_vertex((x, f_x), (w, f_w), (v, f_v));
                if bnds.from + self.eps <= u
                    && u <= bnds.to - self.eps
                    && (u - x).abs() < prev_prev_step / 2.
                {
                    // The vertex is inside the bracket and the interpolation
                    // steps are shrinking; take it. A vertex hugging either
                    // edge is pulled back next to x, on the side away from
                    // the middle.
                    accepted = true;
                    if u - bnds.from < 2. * tol || bnds.to - u < 2. * tol {
                        u = if x < bnds.middle() { x - tol } else { x + tol };
                    }
                }
            }

            if !accepted {
                // Golden-section step toward the longer side of the bracket.
                u = if x < bnds.middle() {
                    x + TAU * (bnds.to - x)
                } else {
                    x - TAU * (x - bnds.from)
                };
            }

            step = (u - x).abs();
            let f_u = func(u);
            if f_u <= f_x {
                // u is the new best point; the far side of x falls away.
                if u >= x {
                    bnds.from = x;
                } else {
                    bnds.to = x;
                }
                v = w;
                w = x;
                x = u;
                f_v = f_w;
                f_w = f_x;
                f_x = f_u;
            } else {
                // x stays best; u truncates its own side of the bracket.
                if u >= x {
                    bnds.to = u;
                } else {
                    bnds.from = u;
                }
                if f_u <= f_w || w == x {
                    v = w;
                    w = u;
                    f_v = f_w;
                    f_w = f_u;
                } else if f_u <= f_v || v == x || v == w {
                    v = u;
                    f_v = f_u;
                }
            }
        }

        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parabola_minimum() {
        let brent = BrentBuilder::default().eps(1e-6).build().unwrap();
        let res = brent.find_min(|x| (x - 3.).powi(2), Bounds { from: -10., to: 10. });
        assert!((res - 3.).abs() <= 1e-5, "res: {}", res);
    }

    #[test]
    fn flat_quartic_minimum() {
        let brent = Brent::new(1e-6);
        let res = brent.find_min(|x| (x + 1.).powi(4), Bounds { from: -3., to: 6. });
        assert!((res + 1.).abs() <= 1e-4, "res: {}", res);
    }

    #[test]
    fn kink_forces_golden_section() {
        // Not differentiable at the minimum, so parabolic steps get rejected
        // there and the golden-section fallback has to finish the job.
        let brent = Brent::new(1e-6);
        let res = brent.find_min(|x| (x - 0.5).abs(), Bounds { from: 0., to: 1. });
        assert!((res - 0.5).abs() <= 1e-5, "res: {}", res);
    }

    #[test]
    fn minimum_near_the_edge() {
        let brent = Brent::new(1e-6);
        let res = brent.find_min(|x| (x - 9.9).powi(2), Bounds { from: -10., to: 10. });
        assert!((res - 9.9).abs() <= 1e-4, "res: {}", res);
    }

    #[test]
    fn iteration_cap_is_a_soft_failure() {
        // An eps this small never satisfies the exit test; the searcher must
        // still return a finite, reasonable point after max_iter iterations.
        let brent = BrentBuilder::default().eps(1e-18).build().unwrap();
        let res = brent.find_min(|x| (x - 3.).powi(2), Bounds { from: -10., to: 10. });
        assert!(res.is_finite());
        assert!((res - 3.).abs() <= 1e-5, "res: {}", res);
    }
}
