//! Symbolic expressions over an indexed set of variables.
//!
//! An [`Expr`] is an owned tree built from constants, variables `x0, x1, ...`,
//! the binary operations `+`, `-`, `*` and an integer power. The closed
//! operator set keeps differentiation a total function: every variant has an
//! exact analytic derivative, so gradients and Hessians are themselves
//! expressions that can be evaluated at arbitrary points without any numeric
//! approximation.
//!
//! Construction goes through simplifying constructors: adding or subtracting
//! zero, multiplying by zero or one, raising to the power zero or one and
//! combining two constants all collapse on the spot. Derivatives produce a lot
//! of such degenerate nodes, and folding them at construction keeps the
//! derivative trees small enough to evaluate on every iteration of a search.
//!
//! The usual operators are overloaded for `Expr` and `f64` operands, so test
//! functions read close to their mathematical form:
//!
//! ```
//! use ndarray::array;
//! use descent::expr::var;
//!
//! // Rosenbrock: 100 (x1 - x0^2)^2 + (1 - x0)^2
//! let f = 100. * (var(1) - var(0).powi(2)).powi(2) + (1. - var(0)).powi(2);
//! assert_eq!(f.dims(), 2);
//! assert_eq!(f.eval(array![1., 1.].view()), 0.);
//! ```

use std::fmt;
use std::ops;

use ndarray::{aview1, Array1, Array2, ArrayView1};
use num_traits::{One, Zero};

/// A node of a symbolic expression tree.
///
/// Every node owns its children exclusively; `clone()` is a deep structural
/// copy and the only way to share a subexpression between two trees.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A fixed value, independent of the evaluation point.
    Const(f64),
    /// The coordinate with the given index.
    Var(usize),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    /// Integer power of a subexpression. Negative exponents are how division
    /// is expressed: `l / r` builds `l * r^-1`.
    Pow(Box<Expr>, i32),
}

/// Shorthand for a constant node.
pub fn cns(value: f64) -> Expr {
    Expr::Const(value)
}

/// Shorthand for the variable with index `idx`.
pub fn var(idx: usize) -> Expr {
    Expr::Var(idx)
}

fn add(l: Expr, r: Expr) -> Expr {
    let l_cnst = l.as_const();
    if let Some(c) = l_cnst {
        if c.is_zero() {
            return r;
        }
    }
    if let Some(c) = r.as_const() {
        if c.is_zero() {
            return l;
        }
        if let Some(l_c) = l_cnst {
            return cns(l_c + c);
        }
    }
    Expr::Add(Box::new(l), Box::new(r))
}

fn sub(l: Expr, r: Expr) -> Expr {
    if let Some(c) = r.as_const() {
        if c.is_zero() {
            return l;
        }
        if let Some(l_c) = l.as_const() {
            return cns(l_c - c);
        }
    }
    Expr::Sub(Box::new(l), Box::new(r))
}

fn mul(l: Expr, r: Expr) -> Expr {
    let l_cnst = l.as_const();
    if let Some(c) = l_cnst {
        if c.is_zero() {
            return cns(0.);
        }
        if c.is_one() {
            return r;
        }
    }
    if let Some(c) = r.as_const() {
        if c.is_zero() {
            return cns(0.);
        }
        if c.is_one() {
            return l;
        }
        if let Some(l_c) = l_cnst {
            return cns(l_c * c);
        }
    }
    Expr::Mul(Box::new(l), Box::new(r))
}

fn pow(base: Expr, p: i32) -> Expr {
    if p == 0 {
        return cns(1.);
    }
    if p == 1 {
        return base;
    }
    if let Some(c) = base.as_const() {
        return cns(c.powi(p));
    }
    Expr::Pow(Box::new(base), p)
}

impl Expr {
    /// The number of input coordinates this tree reads: one past the highest
    /// variable index, or 0 for a constant-only tree.
    pub fn dims(&self) -> usize {
        match self {
            Expr::Const(_) => 0,
            Expr::Var(idx) => idx + 1,
            Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) => l.dims().max(r.dims()),
            Expr::Pow(base, _) => base.dims(),
        }
    }

    /// Evaluates the tree at `x`.
    ///
    /// `x` must be at least [`dims`](Expr::dims) long — and when the tree is a
    /// subexpression of a larger function, at least as long as the *whole*
    /// function's dimensionality. A shorter point is a caller error and panics
    /// with the out-of-range index.
    pub fn eval(&self, x: ArrayView1<f64>) -> f64 {
        match self {
            Expr::Const(value) => *value,
            Expr::Var(idx) => x[*idx],
            Expr::Add(l, r) => l.eval(x) + r.eval(x),
            Expr::Sub(l, r) => l.eval(x) - r.eval(x),
            Expr::Mul(l, r) => l.eval(x) * r.eval(x),
            Expr::Pow(base, p) => base.eval(x).powi(*p),
        }
    }

    /// The value of a variable-free tree.
    fn as_const(&self) -> Option<f64> {
        if self.dims() == 0 {
            Some(self.eval(aview1(&[])))
        } else {
            None
        }
    }

    /// The exact partial derivative with respect to variable `idx`.
    ///
    /// Structural recursion: constants vanish, `Var(i)` becomes 1 or 0, `+`
    /// and `-` distribute, `*` applies the product rule and `^` the chain
    /// rule. The untouched side of a product is deep-copied so the derivative
    /// owns all of its nodes.
    pub fn partial_derivative(&self, idx: usize) -> Expr {
        match self {
            Expr::Const(_) => cns(0.),
            Expr::Var(i) => cns(if *i == idx { 1. } else { 0. }),
            Expr::Add(l, r) => add(l.partial_derivative(idx), r.partial_derivative(idx)),
            Expr::Sub(l, r) => sub(l.partial_derivative(idx), r.partial_derivative(idx)),
            Expr::Mul(l, r) => add(
                mul(l.partial_derivative(idx), (**r).clone()),
                mul((**l).clone(), r.partial_derivative(idx)),
            ),
            Expr::Pow(base, p) => mul(
                mul(cns(f64::from(*p)), base.partial_derivative(idx)),
                pow((**base).clone(), p - 1),
            ),
        }
    }

    /// All partial derivatives, with this tree's dimensionality pinned on the
    /// result. Differentiating is much more expensive than evaluating, so a
    /// search calls this once and evaluates the result every iteration.
    pub fn gradient(&self) -> Gradient {
        let dims = self.dims();
        Gradient {
            parts: (0..dims).map(|i| self.partial_derivative(i)).collect(),
            dims,
        }
    }

    /// Integer power, named after [`f64::powi`].
    pub fn powi(self, p: i32) -> Expr {
        pow(self, p)
    }
}

/// An ordered sequence of partial derivatives of one scalar function.
///
/// A derivative is a structurally smaller tree that may mention fewer
/// variables than the function it came from, so the component expressions
/// cannot answer "how many coordinates does the function have" on their own.
/// The gradient records that count explicitly and uses it when building the
/// Hessian, keeping every row the full width of the original function.
#[derive(Debug, Clone)]
pub struct Gradient {
    parts: Vec<Expr>,
    dims: usize,
}

impl Gradient {
    /// Dimensionality of the function this gradient came from.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The component expressions, indexed by variable.
    pub fn parts(&self) -> &[Expr] {
        &self.parts
    }

    /// Evaluates every component at `x`.
    pub fn eval(&self, x: ArrayView1<f64>) -> Array1<f64> {
        self.parts.iter().map(|part| part.eval(x)).collect()
    }

    /// The gradient of every component: the matrix of second partial
    /// derivatives. Stored row-by-row, not symmetrized.
    pub fn hessian(&self) -> Hessian {
        Hessian {
            rows: self
                .parts
                .iter()
                .map(|part| Gradient {
                    parts: (0..self.dims).map(|i| part.partial_derivative(i)).collect(),
                    dims: self.dims,
                })
                .collect(),
        }
    }
}

/// The n×n matrix of second-derivative expressions of a scalar function.
#[derive(Debug, Clone)]
pub struct Hessian {
    rows: Vec<Gradient>,
}

impl Hessian {
    /// Evaluates every entry at `x`.
    pub fn eval(&self, x: ArrayView1<f64>) -> Array2<f64> {
        let n = self.rows.len();
        let mut res = Array2::zeros((n, n));
        for (i, row) in self.rows.iter().enumerate() {
            res.row_mut(i).assign(&row.eval(x));
        }
        res
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(out, "{}", value),
            Expr::Var(idx) => write!(out, "x{}", idx),
            Expr::Add(l, r) => write!(out, "({} + {})", l, r),
            Expr::Sub(l, r) => write!(out, "({} - {})", l, r),
            Expr::Mul(l, r) => write!(out, "({} * {})", l, r),
            Expr::Pow(base, p) => write!(out, "({} ^ {})", base, p),
        }
    }
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, r: Expr) -> Expr {
        add(self, r)
    }
}

impl ops::Add<f64> for Expr {
    type Output = Expr;
    fn add(self, r: f64) -> Expr {
        add(self, cns(r))
    }
}

impl ops::Add<Expr> for f64 {
    type Output = Expr;
    fn add(self, r: Expr) -> Expr {
        add(cns(self), r)
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, r: Expr) -> Expr {
        sub(self, r)
    }
}

impl ops::Sub<f64> for Expr {
    type Output = Expr;
    fn sub(self, r: f64) -> Expr {
        sub(self, cns(r))
    }
}

impl ops::Sub<Expr> for f64 {
    type Output = Expr;
    fn sub(self, r: Expr) -> Expr {
        sub(cns(self), r)
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, r: Expr) -> Expr {
        mul(self, r)
    }
}

impl ops::Mul<f64> for Expr {
    type Output = Expr;
    fn mul(self, r: f64) -> Expr {
        mul(self, cns(r))
    }
}

impl ops::Mul<Expr> for f64 {
    type Output = Expr;
    fn mul(self, r: Expr) -> Expr {
        mul(cns(self), r)
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, r: Expr) -> Expr {
        mul(self, pow(r, -1))
    }
}

impl ops::Div<f64> for Expr {
    type Output = Expr;
    fn div(self, r: f64) -> Expr {
        mul(self, pow(cns(r), -1))
    }
}

impl ops::Div<Expr> for f64 {
    type Output = Expr;
    fn div(self, r: Expr) -> Expr {
        mul(cns(self), pow(r, -1))
    }
}
