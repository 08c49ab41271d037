//! Dense linear-system solving and the few array helpers `ndarray` lacks.
//!
//! The searchers treat this module as a black box: a Newton step needs one
//! `solve_lu` per iteration on the evaluated Hessian, and the quasi-Newton
//! rank-2 updates need outer products. Everything elementwise (negation,
//! addition, scaling, dot products) comes straight from `ndarray`.

use ndarray::{Array1, Array2};

/// A pivot below this is treated as zero and the matrix as singular.
const PIVOT_MIN: f64 = 1e-12;

/// Solves `a * x = b` by LU factorization with partial pivoting.
///
/// Factorizes in place, L packed below the diagonal with an implicit unit
/// diagonal, U on and above it. Returns `None` when a pivot column has no
/// usable entry, i.e. the matrix is singular to working precision.
pub fn solve_lu(mut a: Array2<f64>, b: Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols());
    debug_assert_eq!(n, b.len());

    let mut perm: Vec<usize> = (0..n).collect();

    for col in 0..n {
        // Partial pivoting: bring the largest remaining entry of this column
        // onto the diagonal.
        let mut max_row = col;
        let mut max_val = a[(col, col)].abs();
        for row in col + 1..n {
            let val = a[(row, col)].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }
        if max_val < PIVOT_MIN {
            return None;
        }
        if max_row != col {
            perm.swap(col, max_row);
            for j in 0..n {
                let tmp = a[(col, j)];
                a[(col, j)] = a[(max_row, j)];
                a[(max_row, j)] = tmp;
            }
        }

        let pivot = a[(col, col)];
        for row in col + 1..n {
            let factor = a[(row, col)] / pivot;
            a[(row, col)] = factor;
            for j in col + 1..n {
                a[(row, j)] -= factor * a[(col, j)];
            }
        }
    }

    // Forward substitution: L y = P b.
    let mut x = Array1::zeros(n);
    for i in 0..n {
        let mut sum = b[perm[i]];
        for j in 0..i {
            sum -= a[(i, j)] * x[j];
        }
        x[i] = sum;
    }
    // Back substitution: U x = y.
    for i in (0..n).rev() {
        let mut sum = x[i];
        for j in i + 1..n {
            sum -= a[(i, j)] * x[j];
        }
        x[i] = sum / a[(i, i)];
    }

    Some(x)
}

/// The outer product `u vᵗ`.
pub fn outer(u: &Array1<f64>, v: &Array1<f64>) -> Array2<f64> {
    let mut res = Array2::zeros((u.len(), v.len()));
    for (i, &u_i) in u.iter().enumerate() {
        res.row_mut(i).assign(&(v * u_i));
    }
    res
}

/// Squared Euclidean length.
pub fn norm_sq(v: &Array1<f64>) -> f64 {
    v.dot(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use ndarray::array;

    #[test]
    fn solves_a_known_system() {
        let a = array![[2., 1.], [1., 3.]];
        let b = array![3., 5.];
        let x = solve_lu(a.clone(), b.clone()).unwrap();
        let back = a.dot(&x);
        for i in 0..2 {
            assert!(approx_eq!(f64, back[i], b[i], epsilon = 1e-12));
        }
    }

    #[test]
    fn pivots_past_a_zero_diagonal() {
        let a = array![[0., 1., 2.], [3., 0., 1.], [1., 1., 1.]];
        let b = array![5., 4., 3.];
        let x = solve_lu(a.clone(), b.clone()).unwrap();
        let back = a.dot(&x);
        for i in 0..3 {
            assert!(approx_eq!(f64, back[i], b[i], epsilon = 1e-12));
        }
    }

    #[test]
    fn reports_singular_matrices() {
        let a = array![[1., 2.], [2., 4.]];
        assert!(solve_lu(a, array![1., 1.]).is_none());
    }

    #[test]
    fn outer_product_shape_and_values() {
        let m = outer(&array![1., 2.], &array![3., 4., 5.]);
        assert_eq!(m, array![[3., 4., 5.], [6., 8., 10.]]);
    }

    #[test]
    fn norm_sq_is_squared_length() {
        assert_eq!(norm_sq(&array![3., 4.]), 25.);
    }
}
