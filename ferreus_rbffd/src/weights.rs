/////////////////////////////////////////////////////////////////////////////////////////////
//
// Solves for RBF-FD and pure polynomial stencil weights, singly and in parallel batches.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    assembly::{dpoly, drbf, log10_condition_number, vpoly, vrbf},
    config::{PolynomialOrder, WeightParams},
    error::{RbfFdError, Result},
    monomials::{maximum_order, monomial_count},
    operators::DifferentialOperator,
};
use faer::{Mat, linalg::solvers::Solve};
use ferreus_rbffd_utils::{RadialBasis, select_mat_rows};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Weights for many stencils over a shared node set.
///
/// Row `i` of the differentiation matrix has `weights[i][j]` in column `stencils[i][j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    pub num_nodes: usize,
    pub stencils: Vec<Vec<usize>>,
    pub weights: Vec<Vec<f64>>,
}

impl WeightSet {
    /// Number of evaluation points.
    pub fn len(&self) -> usize {
        self.stencils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stencils.is_empty()
    }

    /// `(row, column, weight)` entries of the differentiation matrix.
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        self.stencils
            .iter()
            .zip(&self.weights)
            .enumerate()
            .flat_map(|(row, (stencil, weights))| {
                stencil.iter().zip(weights).map(move |(&col, &w)| (row, col, w))
            })
            .collect()
    }

    /// Dense `len() x num_nodes` differentiation matrix. Repeated indices accumulate.
    pub fn to_dense(&self) -> Mat<f64> {
        let mut dense = Mat::<f64>::zeros(self.len(), self.num_nodes);
        for (row, col, w) in self.triplets() {
            dense[(row, col)] += w;
        }
        dense
    }

    /// Applies the weights to node `values`, one result per evaluation point.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        assert_eq!(values.len(), self.num_nodes);
        self.stencils
            .iter()
            .zip(&self.weights)
            .map(|(stencil, weights)| stencil.iter().zip(weights).map(|(&j, w)| w * values[j]).sum())
            .collect()
    }
}

pub(crate) fn check_stencil_indices(stencils: &[Vec<usize>], num_nodes: usize) -> Result<()> {
    for (stencil_idx, stencil) in stencils.iter().enumerate() {
        if let Some(&index) = stencil.iter().find(|&&j| j >= num_nodes) {
            return Err(RbfFdError::InvalidStencilIndex {
                stencil: stencil_idx,
                index,
                num_nodes,
            });
        }
    }
    Ok(())
}

fn check_point(point: &[f64], dim: usize) -> Result<()> {
    if dim == 0 {
        return Err(RbfFdError::ZeroDimension { context: "nodes" });
    }
    if point.len() != dim {
        return Err(RbfFdError::DimensionMismatch {
            context: "evaluation point",
            expected: dim,
            found: point.len(),
        });
    }
    Ok(())
}

/// Subtracts `origin` from every row.
fn translate(points: &Mat<f64>, origin: &[f64]) -> Mat<f64> {
    Mat::from_fn(points.nrows(), points.ncols(), |i, j| points[(i, j)] - origin[j])
}

/// `rhs += coeff * term` for single-column matrices.
fn accumulate(rhs: &mut Mat<f64>, term: &Mat<f64>, coeff: f64) {
    for i in 0..rhs.nrows() {
        rhs[(i, 0)] += coeff * term[(i, 0)];
    }
}

/// Solves the square system `lhs x = rhs`, rejecting singular and ill-conditioned systems.
fn solve_dense(lhs: &Mat<f64>, rhs: &Mat<f64>, params: &WeightParams) -> Result<Mat<f64>> {
    let size = lhs.nrows();
    let lu = lhs.full_piv_lu();
    let solution = lu.solve(rhs);

    if !solution.col_iter().all(|c| c.iter().all(|v| v.is_finite())) {
        return Err(RbfFdError::SingularSystem { size });
    }

    let limit = params.max_log_condition;
    if limit.is_finite() {
        let log_condition = log10_condition_number(lhs)?;
        if log_condition.is_nan() || log_condition > limit {
            log::debug!("rejecting {size}x{size} system with log10 condition {log_condition:.2}");
            return Err(RbfFdError::IllConditioned {
                size,
                log_condition,
                limit,
            });
        }
    }

    Ok(solution)
}

/// Computes RBF-FD weights approximating `diff` at `eval_point`.
///
/// # Arguments
/// * `eval_point` - Where the operator is approximated.
/// * `nodes` - Stencil nodes, one per row.
/// * `diff` - The differential operator.
/// * `centers` - RBF centers, one per node. Defaults to `nodes`.
/// * `basis` - The RBF kernel.
/// * `order` - Polynomial augmentation order.
/// * `eps` - Shape parameter shared by every center.
///
/// # Returns
/// One weight per node. The weights reproduce `diff` exactly on every monomial
/// of total degree below the resolved order.
///
/// # Errors
/// * [`RbfFdError::ZeroDimension`] if the nodes have no coordinates.
/// * [`RbfFdError::TooManyMonomials`] if the polynomial basis is larger than the stencil.
/// * [`RbfFdError::SingularSystem`] if the augmented system cannot be solved.
/// * [`RbfFdError::IllConditioned`] if the augmented system exceeds the default
///   [`WeightParams::max_log_condition`].
pub fn rbf_weight(
    eval_point: &[f64],
    nodes: &Mat<f64>,
    diff: &DifferentialOperator,
    centers: Option<&Mat<f64>>,
    basis: &dyn RadialBasis,
    order: PolynomialOrder,
    eps: f64,
) -> Result<Vec<f64>> {
    rbf_weight_with_params(
        eval_point,
        nodes,
        diff,
        centers,
        basis,
        order,
        eps,
        &WeightParams::default(),
    )
}

/// [`rbf_weight`] with an explicit conditioning limit.
#[allow(clippy::too_many_arguments)]
pub fn rbf_weight_with_params(
    eval_point: &[f64],
    nodes: &Mat<f64>,
    diff: &DifferentialOperator,
    centers: Option<&Mat<f64>>,
    basis: &dyn RadialBasis,
    order: PolynomialOrder,
    eps: f64,
    params: &WeightParams,
) -> Result<Vec<f64>> {
    let (n, dim) = nodes.shape();
    check_point(eval_point, dim)?;
    diff.validate(dim)?;

    let centers = centers.unwrap_or(nodes);
    if centers.ncols() != dim {
        return Err(RbfFdError::DimensionMismatch {
            context: "centers",
            expected: dim,
            found: centers.ncols(),
        });
    }
    if centers.nrows() != n {
        return Err(RbfFdError::CenterCountMismatch {
            nodes: n,
            centers: centers.nrows(),
        });
    }

    let order = match order {
        PolynomialOrder::Max => maximum_order(n, dim),
        PolynomialOrder::Fixed(order) => order,
    };
    let num_terms = monomial_count(order, dim);
    if num_terms > n {
        return Err(RbfFdError::TooManyMonomials {
            num_terms,
            stencil_size: n,
        });
    }

    let nodes = translate(nodes, eval_point);
    let centers = translate(centers, eval_point);
    let origin = vec![0.0; dim];
    let shape = vec![eps; n];

    let lhs = vrbf(&nodes, &centers, &shape, order, basis)?;

    let mut rhs = Mat::<f64>::zeros(n + num_terms, 1);
    for (coeff, d) in diff.terms() {
        accumulate(&mut rhs, &drbf(&origin, &centers, &shape, order, d, basis)?, coeff);
    }

    let solution = solve_dense(&lhs, &rhs, params)?;
    Ok((0..n).map(|i| solution[(i, 0)]).collect())
}

/// Computes polynomial finite-difference weights approximating `diff` at `eval_point`.
///
/// The stencil must hold exactly as many nodes as the maximum-order monomial basis,
/// so the Vandermonde system is square.
pub fn poly_weight(
    eval_point: &[f64],
    nodes: &Mat<f64>,
    diff: &DifferentialOperator,
) -> Result<Vec<f64>> {
    poly_weight_with_params(eval_point, nodes, diff, &WeightParams::default())
}

/// [`poly_weight`] with an explicit conditioning limit.
pub fn poly_weight_with_params(
    eval_point: &[f64],
    nodes: &Mat<f64>,
    diff: &DifferentialOperator,
    params: &WeightParams,
) -> Result<Vec<f64>> {
    let (n, dim) = nodes.shape();
    check_point(eval_point, dim)?;
    diff.validate(dim)?;

    let order = maximum_order(n, dim);
    let expected = monomial_count(order, dim);
    if n != expected {
        return Err(RbfFdError::NodeCountMismatch {
            order,
            expected,
            found: n,
        });
    }

    let nodes = translate(nodes, eval_point);
    let origin = vec![0.0; dim];

    let lhs = vpoly(&nodes, order)?;
    let mut rhs = Mat::<f64>::zeros(n, 1);
    for (coeff, d) in diff.terms() {
        accumulate(&mut rhs, &dpoly(&origin, order, Some(d))?, coeff);
    }

    let solution = solve_dense(&lhs, &rhs, params)?;
    Ok((0..n).map(|i| solution[(i, 0)]).collect())
}

fn check_batch(eval_points: &Mat<f64>, nodes: &Mat<f64>, stencils: &[Vec<usize>]) -> Result<()> {
    if stencils.is_empty() {
        return Err(RbfFdError::EmptyStencilSet);
    }
    if eval_points.nrows() != stencils.len() {
        return Err(RbfFdError::DimensionMismatch {
            context: "evaluation point count",
            expected: stencils.len(),
            found: eval_points.nrows(),
        });
    }
    if eval_points.ncols() != nodes.ncols() {
        return Err(RbfFdError::DimensionMismatch {
            context: "evaluation points",
            expected: nodes.ncols(),
            found: eval_points.ncols(),
        });
    }
    check_stencil_indices(stencils, nodes.nrows())
}

fn row_vec(points: &Mat<f64>, i: usize) -> Vec<f64> {
    points.row(i).iter().copied().collect()
}

/// Computes [`rbf_weight`] for every stencil in parallel.
///
/// Row `i` of `eval_points` is approximated from the nodes in `stencils[i]` with
/// shape parameter `eps[i]`. Each stencil's nodes are its centers.
pub fn rbf_weights(
    eval_points: &Mat<f64>,
    nodes: &Mat<f64>,
    stencils: &[Vec<usize>],
    diff: &DifferentialOperator,
    basis: &dyn RadialBasis,
    order: PolynomialOrder,
    eps: &[f64],
) -> Result<WeightSet> {
    rbf_weights_with_params(
        eval_points,
        nodes,
        stencils,
        diff,
        basis,
        order,
        eps,
        &WeightParams::default(),
    )
}

/// [`rbf_weights`] with an explicit conditioning limit applied to every stencil.
#[allow(clippy::too_many_arguments)]
pub fn rbf_weights_with_params(
    eval_points: &Mat<f64>,
    nodes: &Mat<f64>,
    stencils: &[Vec<usize>],
    diff: &DifferentialOperator,
    basis: &dyn RadialBasis,
    order: PolynomialOrder,
    eps: &[f64],
    params: &WeightParams,
) -> Result<WeightSet> {
    check_batch(eval_points, nodes, stencils)?;
    if eps.len() != stencils.len() {
        return Err(RbfFdError::ShapeParameterLength {
            expected: stencils.len(),
            found: eps.len(),
        });
    }

    let weights = stencils
        .par_iter()
        .enumerate()
        .map(|(i, stencil)| {
            let stencil_nodes = select_mat_rows(nodes, stencil);
            rbf_weight_with_params(
                &row_vec(eval_points, i),
                &stencil_nodes,
                diff,
                None,
                basis,
                order,
                eps[i],
                params,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WeightSet {
        num_nodes: nodes.nrows(),
        stencils: stencils.to_vec(),
        weights,
    })
}

/// Computes [`poly_weight`] for every stencil in parallel.
pub fn poly_weights(
    eval_points: &Mat<f64>,
    nodes: &Mat<f64>,
    stencils: &[Vec<usize>],
    diff: &DifferentialOperator,
) -> Result<WeightSet> {
    poly_weights_with_params(eval_points, nodes, stencils, diff, &WeightParams::default())
}

/// [`poly_weights`] with an explicit conditioning limit applied to every stencil.
pub fn poly_weights_with_params(
    eval_points: &Mat<f64>,
    nodes: &Mat<f64>,
    stencils: &[Vec<usize>],
    diff: &DifferentialOperator,
    params: &WeightParams,
) -> Result<WeightSet> {
    check_batch(eval_points, nodes, stencils)?;

    let weights = stencils
        .par_iter()
        .enumerate()
        .map(|(i, stencil)| {
            poly_weight_with_params(
                &row_vec(eval_points, i),
                &select_mat_rows(nodes, stencil),
                diff,
                params,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(WeightSet {
        num_nodes: nodes.nrows(),
        stencils: stencils.to_vec(),
        weights,
    })
}
