/////////////////////////////////////////////////////////////////////////////////////////////
//
// Enumerates and evaluates the monomial bases used for polynomial augmentation of stencils.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::error::{RbfFdError, Result};
use faer::Mat;
use ferreus_rbffd_utils::falling_factorial;
use itertools::Itertools;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// An ordered set of monomial exponent tuples.
///
/// Terms are grouped by increasing total degree. The zero tuple comes first
/// whenever the basis is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonomialPowers {
    dim: usize,
    terms: Vec<Vec<usize>>,
}

impl MonomialPowers {
    /// Number of terms in the basis.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Spatial dimension of every exponent tuple.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn terms(&self) -> &[Vec<usize>] {
        &self.terms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<usize>> {
        self.terms.iter()
    }
}

impl<'a> IntoIterator for &'a MonomialPowers {
    type Item = &'a Vec<usize>;
    type IntoIter = std::slice::Iter<'a, Vec<usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

type PowersCache = Mutex<HashMap<(usize, usize), Arc<MonomialPowers>>>;

fn cache() -> &'static PowersCache {
    static CACHE: OnceLock<PowersCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn build_powers(order: usize, dim: usize) -> MonomialPowers {
    let mut terms = Vec::with_capacity(monomial_count(order, dim));

    if order >= 1 {
        terms.push(vec![0; dim]);
    }

    // Each multiset of `p` axes is one way to spread degree `p` over the axes.
    for p in 1..order {
        for axes in (0..dim).combinations_with_replacement(p) {
            let mut term = vec![0; dim];
            for axis in axes {
                term[axis] += 1;
            }
            terms.push(term);
        }
    }

    MonomialPowers { dim, terms }
}

/// Returns the monomial basis of `order` in `dim` dimensions.
///
/// An order `o` basis holds every exponent tuple of total degree `<= o - 1`, so
/// order 0 is empty and order 1 is the constant term alone. Results are cached
/// process-wide and shared between threads.
pub fn monomial_powers(order: usize, dim: usize) -> Arc<MonomialPowers> {
    // A poisoned lock still holds complete entries since inserts happen last.
    let mut map = cache().lock().unwrap_or_else(|e| e.into_inner());
    Arc::clone(
        map.entry((order, dim))
            .or_insert_with(|| Arc::new(build_powers(order, dim))),
    )
}

/// Number of terms in the order `order` basis: `binomial(order + dim - 1, dim)`.
pub fn monomial_count(order: usize, dim: usize) -> usize {
    if order == 0 {
        return 0;
    }
    let n = order + dim - 1;
    let k = dim.min(n - dim);

    // Each partial product is itself a binomial coefficient, so the division is exact.
    let mut count: u128 = 1;
    for i in 1..=k {
        count = count * (n - k + i) as u128 / i as u128;
    }
    count as usize
}

/// Largest polynomial order whose basis fits within `stencil_size` nodes.
///
/// The order never exceeds `stencil_size`. In zero dimensions every non-empty
/// basis is the single constant term, so the cap is what ends the search.
pub fn maximum_order(stencil_size: usize, dim: usize) -> usize {
    let mut order = 0;
    while order < stencil_size && monomial_count(order + 1, dim) <= stencil_size {
        order += 1;
    }
    order
}

/// Evaluates every monomial of `powers` at every row of `points`.
///
/// Returns a `points.nrows() x powers.len()` matrix. With `diff`, each monomial
/// is differentiated `diff[j]` times along axis `j`; a derivative order above
/// the power zeroes the whole term.
pub fn mvmonos(
    points: &Mat<f64>,
    powers: &MonomialPowers,
    diff: Option<&[usize]>,
) -> Result<Mat<f64>> {
    let dim = powers.dim();
    if points.ncols() != dim {
        return Err(RbfFdError::DimensionMismatch {
            context: "points",
            expected: dim,
            found: points.ncols(),
        });
    }
    if let Some(diff) = diff {
        if diff.len() != dim {
            return Err(RbfFdError::DimensionMismatch {
                context: "derivative order",
                expected: dim,
                found: diff.len(),
            });
        }
    }

    let derivative = |axis: usize| diff.map_or(0, |d| d[axis]);

    // Per-term (coefficient, exponent) pairs for every axis.
    let factors: Vec<Vec<(f64, i32)>> = powers
        .iter()
        .map(|term| {
            (0..dim)
                .map(|axis| {
                    let p = term[axis];
                    let d = derivative(axis);
                    let coeff = falling_factorial(p as f64, d);
                    if coeff == 0.0 {
                        (0.0, 0)
                    } else {
                        (coeff, (p - d) as i32)
                    }
                })
                .collect()
        })
        .collect();

    Ok(Mat::from_fn(points.nrows(), powers.len(), |i, t| {
        factors[t]
            .iter()
            .enumerate()
            .map(|(axis, &(coeff, exp))| coeff * points[(i, axis)].powi(exp))
            .product()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{mat, utils::approx::*};

    fn run_case(points: Mat<f64>, order: usize, diff: Option<&[usize]>, expected: Mat<f64>) {
        let powers = monomial_powers(order, points.ncols());
        assert!(powers.len() == expected.ncols());

        let monomials = mvmonos(&points, &powers, diff).unwrap();

        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0);
        assert!(&monomials ~ &expected);
    }

    #[test]
    fn empty_and_constant_bases() {
        for dim in 1..=4 {
            assert!(monomial_powers(0, dim).is_empty());
            assert!(monomial_powers(1, dim).terms() == &[vec![0; dim]]);
        }
    }

    #[test]
    fn counts_match_enumeration() {
        for dim in 1..=4 {
            for order in 1..=7 {
                assert!(monomial_count(order, dim) == monomial_powers(order, dim).len());
            }
        }
        assert!(monomial_count(0, 3) == 0);
        assert!(monomial_count(3, 2) == 6);
        assert!(monomial_count(4, 3) == 20);
    }

    #[test]
    fn terms_are_distinct_and_sorted_by_degree() {
        let powers = monomial_powers(5, 3);
        let degrees: Vec<usize> = powers.iter().map(|t| t.iter().sum()).collect();
        assert!(degrees.windows(2).all(|w| w[0] <= w[1]));
        assert!(*degrees.last().unwrap() == 4);

        let unique: std::collections::HashSet<_> = powers.iter().collect();
        assert!(unique.len() == powers.len());
    }

    #[test]
    fn maximum_order_fits_stencil() {
        for dim in 1..=3 {
            for size in 1..=40 {
                let order = maximum_order(size, dim);
                assert!(monomial_count(order, dim) <= size);
                assert!(size < monomial_count(order + 1, dim));
            }
        }
        assert!(maximum_order(3, 1) == 3);
        assert!(maximum_order(6, 2) == 3);
        assert!(maximum_order(9, 2) == 3);
        assert!(maximum_order(0, 2) == 0);

        // Zero dimensions: every basis is the constant term alone.
        assert!(maximum_order(5, 0) == 5);
        assert!(maximum_order(0, 0) == 0);
    }

    #[test]
    fn cache_returns_shared_basis() {
        let a = monomial_powers(4, 2);
        let b = monomial_powers(4, 2);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn concurrent_requests_share_one_basis() {
        // A key no other test requests, so every thread races on the first insert.
        let (order, dim) = (9, 5);
        let barrier = std::sync::Barrier::new(8);

        let handles: Vec<Arc<MonomialPowers>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        monomial_powers(order, dim)
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(handles[0].len() == monomial_count(order, dim));
        for other in &handles[1..] {
            assert!(Arc::ptr_eq(&handles[0], other));
        }
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let powers = monomial_powers(3, 2);
        let points = mat![[1.0, 2.0]];

        let err = mvmonos(&points, &powers, Some(&[1])).unwrap_err();
        assert_eq!(
            err,
            RbfFdError::DimensionMismatch {
                context: "derivative order",
                expected: 2,
                found: 1,
            }
        );

        let err = mvmonos(&mat![[1.0]], &powers, None).unwrap_err();
        assert!(matches!(err, RbfFdError::DimensionMismatch { context: "points", .. }));
    }

    #[test]
    fn monomials_quadratic_2d() {
        let points = mat![[1.0, 2.0], [3.0, 4.0]];
        // Basis: [1, x, y, x^2, x*y, y^2]
        let expected = mat![
            [1.0, 1.0, 2.0, 1.0, 2.0, 4.0],
            [1.0, 3.0, 4.0, 9.0, 12.0, 16.0],
        ];
        run_case(points, 3, None, expected);
    }

    #[test]
    fn monomials_quadratic_2d_x_derivative() {
        let points = mat![[1.0, 2.0], [3.0, 4.0]];
        // d/dx of [1, x, y, x^2, x*y, y^2]
        let expected = mat![
            [0.0, 1.0, 0.0, 2.0, 2.0, 0.0],
            [0.0, 1.0, 0.0, 6.0, 4.0, 0.0],
        ];
        run_case(points, 3, Some(&[1, 0]), expected);
    }

    #[test]
    fn monomials_cubic_1d_second_derivative() {
        // d2/dx2 of [1, x, x^2, x^3] at x = 0 must not produce 0^-1.
        let points = mat![[0.0], [2.0]];
        let expected = mat![[0.0, 0.0, 2.0, 0.0], [0.0, 0.0, 2.0, 12.0]];
        run_case(points, 4, Some(&[2]), expected);
    }

    #[test]
    fn monomials_linear_3d() {
        let points = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        // Basis: [1, x, y, z]
        let expected = mat![[1.0, 1.0, 2.0, 3.0], [1.0, 4.0, 5.0, 6.0]];
        run_case(points, 2, None, expected);
    }
}
