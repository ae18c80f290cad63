/////////////////////////////////////////////////////////////////////////////////////////////
//
// Assembles the polynomial and RBF-augmented matrices and right-hand sides for stencil solves.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::error::{RbfFdError, Result};
use crate::monomials::{monomial_powers, mvmonos};
use faer::Mat;
use ferreus_rbffd_utils::RadialBasis;

/// Wraps a single point as a one-row matrix.
pub(crate) fn point_row(point: &[f64]) -> Mat<f64> {
    Mat::from_fn(1, point.len(), |_, j| point[j])
}

/// Polynomial Vandermonde matrix: one row per monomial term, one column per node.
pub fn vpoly(nodes: &Mat<f64>, order: usize) -> Result<Mat<f64>> {
    let powers = monomial_powers(order, nodes.ncols());
    Ok(mvmonos(nodes, &powers, None)?.transpose().to_owned())
}

/// Column vector of the (optionally differentiated) monomials of `order` at `point`.
///
/// `diff` must have one entry per coordinate of `point`.
pub fn dpoly(point: &[f64], order: usize, diff: Option<&[usize]>) -> Result<Mat<f64>> {
    let powers = monomial_powers(order, point.len());
    Ok(mvmonos(&point_row(point), &powers, diff)?
        .transpose()
        .to_owned())
}

fn check_centers(nodes: &Mat<f64>, centers: &Mat<f64>, eps: &[f64]) -> Result<()> {
    if centers.ncols() != nodes.ncols() {
        return Err(RbfFdError::DimensionMismatch {
            context: "centers",
            expected: nodes.ncols(),
            found: centers.ncols(),
        });
    }
    if centers.nrows() != nodes.nrows() {
        return Err(RbfFdError::CenterCountMismatch {
            nodes: nodes.nrows(),
            centers: centers.nrows(),
        });
    }
    if eps.len() != centers.nrows() {
        return Err(RbfFdError::ShapeParameterLength {
            expected: centers.nrows(),
            found: eps.len(),
        });
    }
    Ok(())
}

/// Kernel block with entry `(c, n)` equal to the kernel between center `c` and node `n`.
pub fn kernel_matrix(
    nodes: &Mat<f64>,
    centers: &Mat<f64>,
    eps: &[f64],
    basis: &dyn RadialBasis,
) -> Result<Mat<f64>> {
    check_centers(nodes, centers, eps)?;
    Ok(basis.evaluate(nodes, centers, eps, None).transpose().to_owned())
}

/// Builds the square augmented system
///
/// ```text
/// | K  P^T |
/// | P  0   |
/// ```
///
/// where `K` is [`kernel_matrix`] and `P` is [`vpoly`] of the nodes.
pub fn vrbf(
    nodes: &Mat<f64>,
    centers: &Mat<f64>,
    eps: &[f64],
    order: usize,
    basis: &dyn RadialBasis,
) -> Result<Mat<f64>> {
    let kernel = kernel_matrix(nodes, centers, eps, basis)?;
    let poly = vpoly(nodes, order)?;

    let n = nodes.nrows();
    let np = poly.nrows();
    let mut system = Mat::<f64>::zeros(n + np, n + np);

    system.submatrix_mut(0, 0, n, n).copy_from(kernel.as_ref());
    system.submatrix_mut(0, n, n, np).copy_from(poly.transpose());
    system.submatrix_mut(n, 0, np, n).copy_from(poly.as_ref());

    Ok(system)
}

/// Right-hand side matching [`vrbf`]: `diff` applied to each center's kernel at
/// `point`, followed by [`dpoly`].
pub fn drbf(
    point: &[f64],
    centers: &Mat<f64>,
    eps: &[f64],
    order: usize,
    diff: &[usize],
    basis: &dyn RadialBasis,
) -> Result<Mat<f64>> {
    if point.len() != centers.ncols() {
        return Err(RbfFdError::DimensionMismatch {
            context: "evaluation point",
            expected: centers.ncols(),
            found: point.len(),
        });
    }
    if diff.len() != centers.ncols() {
        return Err(RbfFdError::DimensionMismatch {
            context: "derivative order",
            expected: centers.ncols(),
            found: diff.len(),
        });
    }
    if eps.len() != centers.nrows() {
        return Err(RbfFdError::ShapeParameterLength {
            expected: centers.nrows(),
            found: eps.len(),
        });
    }

    let kernel = basis.evaluate(&point_row(point), centers, eps, Some(diff));
    let poly = dpoly(point, order, Some(diff))?;

    let n = centers.nrows();
    let np = poly.nrows();

    Ok(Mat::from_fn(n + np, 1, |i, _| {
        if i < n {
            kernel[(0, i)]
        } else {
            poly[(i - n, 0)]
        }
    }))
}

/// Base-10 logarithm of the 2-norm condition number of `matrix`.
///
/// A zero smallest singular value yields `+inf`.
pub fn log10_condition_number(matrix: &Mat<f64>) -> Result<f64> {
    let svd = matrix.svd().map_err(|_| RbfFdError::Svd {
        nrows: matrix.nrows(),
        ncols: matrix.ncols(),
    })?;

    let mut s_max = 0.0_f64;
    let mut s_min = f64::INFINITY;
    for &s in svd.S().column_vector().iter() {
        s_max = s_max.max(s);
        s_min = s_min.min(s);
    }

    if !s_max.is_finite() || s_min.is_nan() {
        return Err(RbfFdError::Svd {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
        });
    }
    if s_min <= 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok((s_max / s_min).log10())
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{mat, utils::approx::*};
    use ferreus_rbffd_utils::KernelType;

    fn nodes_2d() -> Mat<f64> {
        mat![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [0.5, 0.4],
            [0.2, 0.9],
        ]
    }

    #[test]
    fn dpoly_matches_vpoly_column_at_node() {
        let nodes = nodes_2d();
        let vander = vpoly(&nodes, 3).unwrap();
        assert!(vander.nrows() == 6);
        assert!(vander.ncols() == 6);

        let approx_eq = CwiseMat(ApproxEq::eps() * 16.0);
        for i in 0..nodes.nrows() {
            let point: Vec<f64> = nodes.row(i).iter().copied().collect();
            let value = dpoly(&point, 3, None).unwrap();
            let zero_diff = dpoly(&point, 3, Some(&[0, 0])).unwrap();
            let column = Mat::from_fn(vander.nrows(), 1, |r, _| vander[(r, i)]);
            assert!(&value ~ &column);
            assert!(&zero_diff ~ &column);
        }
    }

    #[test]
    fn augmented_system_is_block_symmetric() {
        let nodes = nodes_2d();
        let eps = vec![1.3; nodes.nrows()];
        let system = vrbf(&nodes, &nodes, &eps, 2, &KernelType::Gaussian).unwrap();

        assert!(system.nrows() == 9);
        assert!(system.ncols() == 9);

        let approx_eq = CwiseMat(ApproxEq::eps() * 16.0);
        let transposed = system.transpose().to_owned();
        assert!(&system ~ &transposed);

        for i in 6..9 {
            for j in 6..9 {
                assert!(system[(i, j)] == 0.0);
            }
        }
        // Constant row of the polynomial block.
        for j in 0..6 {
            assert!(system[(6, j)] == 1.0);
        }
    }

    #[test]
    fn drbf_stacks_kernel_and_polynomial_parts() {
        let nodes = nodes_2d();
        let eps = vec![1.0; nodes.nrows()];
        let point = [0.25, 0.5];
        let rhs = drbf(&point, &nodes, &eps, 2, &[1, 0], &KernelType::Phs3).unwrap();

        assert!(rhs.nrows() == 9);
        // d/dx of [1, x, y] is [0, 1, 0].
        assert!(rhs[(6, 0)] == 0.0);
        assert!(rhs[(7, 0)] == 1.0);
        assert!(rhs[(8, 0)] == 0.0);

        // d/dx r^3 = 3 r (x - cx).
        let dx = point[0] - nodes[(1, 0)];
        let dy = point[1] - nodes[(1, 1)];
        let r = (dx * dx + dy * dy).sqrt();
        assert!((rhs[(1, 0)] - 3.0 * r * dx).abs() < 1e-12);
    }

    #[test]
    fn center_and_shape_mismatches_are_configuration_errors() {
        let nodes = nodes_2d();
        let fewer = mat![[0.0, 0.0], [1.0, 0.0]];
        let eps = vec![1.0; nodes.nrows()];

        let err = vrbf(&nodes, &fewer, &eps, 1, &KernelType::Phs3).unwrap_err();
        assert!(err == RbfFdError::CenterCountMismatch { nodes: 6, centers: 2 });

        let err = vrbf(&nodes, &nodes, &eps[..3], 1, &KernelType::Phs3).unwrap_err();
        assert!(err == RbfFdError::ShapeParameterLength { expected: 6, found: 3 });

        let err = drbf(&[0.0], &nodes, &eps, 1, &[0], &KernelType::Phs3).unwrap_err();
        assert!(matches!(err, RbfFdError::DimensionMismatch { .. }));
    }

    #[test]
    fn dpoly_rejects_mismatched_derivative_order() {
        let err = dpoly(&[0.0, 0.0], 2, Some(&[1])).unwrap_err();
        assert_eq!(
            err,
            RbfFdError::DimensionMismatch {
                context: "derivative order",
                expected: 2,
                found: 1,
            }
        );
        assert!(dpoly(&[0.0, 0.0], 2, Some(&[1, 0])).is_ok());
    }

    #[test]
    fn condition_number_of_diagonal_matrix() {
        let m = mat![[100.0, 0.0], [0.0, 0.1]];
        let cond = log10_condition_number(&m).unwrap();
        assert!((cond - 3.0).abs() < 1e-12);

        let singular = mat![[1.0, 1.0], [1.0, 1.0]];
        let cond = log10_condition_number(&singular).unwrap();
        assert!(cond > 12.0);
    }
}
