/////////////////////////////////////////////////////////////////////////////////////////////
//
// Estimates per-stencil RBF shape parameters from node spacing and a target condition number.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Shape parameter selection.
//!
//! Each stencil `i` receives `eps_i = alpha / mu_i`, where `mu_i` is the mean
//! distance from each of its centers to the nearest other center. A global
//! `alpha` can be given directly or estimated by sampling stencils and solving,
//! per sample, for the shape parameter that gives a target kernel matrix
//! condition number.

use crate::{
    assembly::{kernel_matrix, log10_condition_number},
    config::ShapeFactorParams,
    error::{RbfFdError, Result},
    kdtree::{KDTree, SpatialIndex},
    nonlinear_solvers::{BrentLogSolver, ScalarLeastSquares},
    progress::{self, ProgressMsg, ProgressSink},
};
use faer::Mat;
use ferreus_rbffd_utils::{RadialBasis, select_mat_rows};
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shape parameters selected for a set of stencils.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeFactors {
    /// Global shape factor, supplied or estimated.
    pub alpha: f64,

    /// One shape parameter per stencil, in stencil order.
    pub eps: Vec<f64>,
}

/// Mean distance from each point to its nearest other point.
///
/// Returns `None` when there are fewer than two points, or the points have no coordinates.
pub fn mean_nearest_neighbour_distance(points: &Mat<f64>) -> Option<f64> {
    let n = points.nrows();
    if n < 2 || points.ncols() == 0 {
        return None;
    }

    let tree = KDTree::new(points);
    let (_, dists) = tree.k_nearest_batch(points, 2);

    // Column 0 is the query point itself.
    let total: f64 = (0..n).map(|i| dists[(i, 1)]).sum();
    Some(total / n as f64)
}

/// Outcome of one condition number search.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ConditionSearch {
    Converged(f64),
    Missed { achieved: Option<f64> },
}

fn search_condition(
    nodes: &Mat<f64>,
    centers: &Mat<f64>,
    basis: &dyn RadialBasis,
    params: &ShapeFactorParams,
    solver: &dyn ScalarLeastSquares,
) -> Result<ConditionSearch> {
    if centers.ncols() == 0 {
        return Err(RbfFdError::ZeroDimension { context: "centers" });
    }
    let spacing = mean_nearest_neighbour_distance(centers).ok_or(RbfFdError::StencilTooSmall {
        stencil: 0,
        size: centers.nrows(),
    })?;
    // Validates shapes before the search proper.
    kernel_matrix(nodes, centers, &vec![1.0; centers.nrows()], basis)?;

    let log_condition = |eps: f64| {
        let shape = vec![eps; centers.nrows()];
        match kernel_matrix(nodes, centers, &shape, basis) {
            Ok(k) if k.col_iter().all(|c| c.iter().all(|v| v.is_finite())) => {
                log10_condition_number(&k).unwrap_or(f64::INFINITY)
            }
            _ => f64::INFINITY,
        }
    };

    let initial = 0.1 / spacing;
    let target = params.target_log_condition;

    match solver.solve(&log_condition, initial, target, &params.solver) {
        Ok(sol) => {
            let miss = (sol.predicted - target).abs();
            // Written so that a NaN mismatch is rejected.
            if miss <= params.acceptance_tolerance {
                Ok(ConditionSearch::Converged(sol.solution))
            } else {
                Ok(ConditionSearch::Missed {
                    achieved: Some(sol.predicted),
                })
            }
        }
        Err(err) => {
            log::debug!("condition number search failed: {err}");
            Ok(ConditionSearch::Missed { achieved: None })
        }
    }
}

/// Finds a shape parameter for which the kernel matrix between `nodes` and
/// `centers` has log10 condition number `params.target_log_condition`.
///
/// Returns `Ok(None)` when the solver does not converge, or converges to a
/// value further than `params.acceptance_tolerance` from the target.
pub fn condition_based_shape_factor(
    nodes: &Mat<f64>,
    centers: &Mat<f64>,
    basis: &dyn RadialBasis,
    params: &ShapeFactorParams,
    solver: &dyn ScalarLeastSquares,
) -> Result<Option<f64>> {
    Ok(match search_condition(nodes, centers, basis, params, solver)? {
        ConditionSearch::Converged(eps) => Some(eps),
        ConditionSearch::Missed { .. } => None,
    })
}

/// Selects a shape parameter for every stencil using [`BrentLogSolver`].
///
/// See [`shape_factor_with_solver`].
pub fn shape_factor(
    nodes: &Mat<f64>,
    stencils: &[Vec<usize>],
    basis: &dyn RadialBasis,
    alpha: Option<f64>,
    params: &ShapeFactorParams,
    progress: Option<Arc<dyn ProgressSink>>,
) -> Result<ShapeFactors> {
    shape_factor_with_solver(nodes, stencils, basis, alpha, params, &BrentLogSolver, progress)
}

/// Selects a shape parameter for every stencil.
///
/// # Arguments
/// * `nodes` - All nodes, one per row.
/// * `stencils` - Node indices of each stencil. Each stencil's nodes are also its centers.
/// * `basis` - The RBF kernel.
/// * `alpha` - Global shape factor. When `None`, it is estimated from sampled stencils.
/// * `params` - Sampling and solver settings for the estimate.
/// * `solver` - Scalar solver used for each sampled condition number search.
/// * `progress` - Optional sink for estimation events.
///
/// # Errors
/// Configuration errors for empty stencil sets, nodes without coordinates,
/// out-of-range indices, or stencils with fewer than two nodes. [`RbfFdError::NoShapeFactorConverged`] when no
/// sampled stencil reaches the target condition number.
pub fn shape_factor_with_solver(
    nodes: &Mat<f64>,
    stencils: &[Vec<usize>],
    basis: &dyn RadialBasis,
    alpha: Option<f64>,
    params: &ShapeFactorParams,
    solver: &dyn ScalarLeastSquares,
    progress: Option<Arc<dyn ProgressSink>>,
) -> Result<ShapeFactors> {
    if stencils.is_empty() {
        return Err(RbfFdError::EmptyStencilSet);
    }
    if nodes.ncols() == 0 {
        return Err(RbfFdError::ZeroDimension { context: "nodes" });
    }
    crate::weights::check_stencil_indices(stencils, nodes.nrows())?;

    let spacings: Vec<f64> = stencils
        .par_iter()
        .enumerate()
        .map(|(i, stencil)| {
            mean_nearest_neighbour_distance(&select_mat_rows(nodes, stencil)).ok_or(
                RbfFdError::StencilTooSmall {
                    stencil: i,
                    size: stencil.len(),
                },
            )
        })
        .collect::<Result<_>>()?;

    let alpha = match alpha {
        Some(alpha) => alpha,
        None => estimate_alpha(
            nodes,
            stencils,
            &spacings,
            basis,
            params,
            solver,
            progress.as_ref(),
        )?,
    };

    Ok(ShapeFactors {
        alpha,
        eps: spacings.iter().map(|mu| alpha / mu).collect(),
    })
}

fn estimate_alpha(
    nodes: &Mat<f64>,
    stencils: &[Vec<usize>],
    spacings: &[f64],
    basis: &dyn RadialBasis,
    params: &ShapeFactorParams,
    solver: &dyn ScalarLeastSquares,
    progress: Option<&Arc<dyn ProgressSink>>,
) -> Result<f64> {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let amount = params.sample_count.min(stencils.len());
    let samples = rand::seq::index::sample(&mut rng, stencils.len(), amount).into_vec();

    let outcomes: Vec<ConditionSearch> = samples
        .par_iter()
        .map(|&i| {
            let stencil_nodes = select_mat_rows(nodes, &stencils[i]);
            search_condition(&stencil_nodes, &stencil_nodes, basis, params, solver)
        })
        .collect::<Result<_>>()?;

    let mut accepted = Vec::with_capacity(amount);
    for (&i, outcome) in samples.iter().zip(outcomes) {
        match outcome {
            ConditionSearch::Converged(eps) => {
                log::debug!("stencil {i}: eps = {eps:.6e}, alpha = {:.6e}", eps * spacings[i]);
                accepted.push(eps * spacings[i]);
            }
            ConditionSearch::Missed { achieved } => {
                log::warn!(
                    "stencil {i}: condition number search did not converge \
                     (target log10 {}, achieved {:?})",
                    params.target_log_condition,
                    achieved
                );
                progress::emit(
                    progress,
                    ProgressMsg::ConditionSearchFailed {
                        stencil: i,
                        achieved,
                        target: params.target_log_condition,
                    },
                );
            }
        }
    }

    if accepted.is_empty() {
        return Err(RbfFdError::NoShapeFactorConverged { samples: amount });
    }

    let alpha = accepted.iter().sum::<f64>() / accepted.len() as f64;
    log::info!(
        "accepted shape factor alpha = {alpha:.6e} from {} of {amount} sampled stencils",
        accepted.len()
    );
    progress::emit(
        progress,
        ProgressMsg::ShapeFactorAccepted {
            alpha,
            successful: accepted.len(),
            samples: amount,
        },
    );

    Ok(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::create_node_grid,
        config::SolverParams,
        error::ErrorKind,
        nonlinear_solvers::{ScalarSolution, SolverError},
        progress::closure_sink,
    };
    use faer::mat;
    use ferreus_rbffd_utils::KernelType;
    use std::sync::Mutex;

    /// Nine-node stencils on a grid of spacing 0.1, each a 3x3 block.
    fn grid_stencils() -> (Mat<f64>, Vec<Vec<usize>>) {
        let nodes = create_node_grid(&[(0.0, 0.5), (0.0, 0.5)], &[6, 6]);
        let mut stencils = Vec::new();
        for by in 0..4 {
            for bx in 0..4 {
                let mut s = Vec::new();
                for dy in 0..3 {
                    for dx in 0..3 {
                        s.push((by + dy) * 6 + bx + dx);
                    }
                }
                stencils.push(s);
            }
        }
        (nodes, stencils)
    }

    #[test]
    fn mean_spacing_of_simple_sets() {
        let line = mat![[0.0], [1.0], [3.0]];
        // Nearest-other distances are 1, 1, 2.
        let mu = mean_nearest_neighbour_distance(&line).unwrap();
        assert!((mu - 4.0 / 3.0).abs() < 1e-14);

        assert!(mean_nearest_neighbour_distance(&mat![[0.0, 0.0]]).is_none());
    }

    #[test]
    fn supplied_alpha_scales_by_spacing() {
        let nodes = mat![[0.0], [0.1], [0.2], [1.0], [1.5], [2.0]];
        let stencils = vec![vec![0, 1, 2], vec![3, 4, 5]];
        let params = ShapeFactorParams::default();

        let factors = shape_factor(&nodes, &stencils, &KernelType::Gaussian, Some(0.3), &params, None)
            .unwrap();
        assert_eq!(factors.alpha, 0.3);
        assert!((factors.eps[0] - 3.0).abs() < 1e-12);
        assert!((factors.eps[1] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn invalid_stencils_are_configuration_errors() {
        let nodes = mat![[0.0], [1.0], [2.0]];
        let params = ShapeFactorParams::default();
        let basis = KernelType::Gaussian;

        let err = shape_factor(&nodes, &[], &basis, Some(1.0), &params, None).unwrap_err();
        assert_eq!(err, RbfFdError::EmptyStencilSet);

        let err = shape_factor(&nodes, &[vec![0, 5]], &basis, Some(1.0), &params, None).unwrap_err();
        assert_eq!(
            err,
            RbfFdError::InvalidStencilIndex {
                stencil: 0,
                index: 5,
                num_nodes: 3
            }
        );

        let err = shape_factor(&nodes, &[vec![0, 1], vec![2]], &basis, Some(1.0), &params, None)
            .unwrap_err();
        assert_eq!(err, RbfFdError::StencilTooSmall { stencil: 1, size: 1 });
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    /// Reports convergence to a value just outside the acceptance tolerance.
    #[derive(Debug)]
    struct OffTarget;

    impl ScalarLeastSquares for OffTarget {
        fn solve(
            &self,
            _g: &dyn Fn(f64) -> f64,
            initial: f64,
            target: f64,
            _params: &SolverParams,
        ) -> std::result::Result<ScalarSolution, SolverError> {
            Ok(ScalarSolution {
                solution: initial,
                predicted: target + 0.05,
                iterations: 1,
            })
        }
    }

    #[test]
    fn off_target_solution_is_rejected() {
        let (nodes, stencils) = grid_stencils();
        let stencil_nodes = select_mat_rows(&nodes, &stencils[0]);
        let params = ShapeFactorParams::builder().sample_count(2).seed(9).build();
        let basis = KernelType::Gaussian;

        let eps =
            condition_based_shape_factor(&stencil_nodes, &stencil_nodes, &basis, &params, &OffTarget)
                .unwrap();
        assert_eq!(eps, None);

        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&events);
        let (sink, handle) = closure_sink(16, move |msg| recorded.lock().unwrap().push(msg));

        let err = shape_factor_with_solver(
            &nodes,
            &stencils,
            &basis,
            None,
            &params,
            &OffTarget,
            Some(sink),
        )
        .unwrap_err();
        assert_eq!(err, RbfFdError::NoShapeFactorConverged { samples: 2 });

        handle.join().unwrap();
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        for msg in events.iter() {
            match msg {
                ProgressMsg::ConditionSearchFailed {
                    achieved: Some(achieved),
                    target,
                    ..
                } => assert!((achieved - target - 0.05).abs() < 1e-12),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn zero_dimensional_nodes_are_rejected() {
        let nodes = Mat::<f64>::zeros(3, 0);
        let params = ShapeFactorParams::default();

        let err = shape_factor(&nodes, &[vec![0, 1, 2]], &KernelType::Gaussian, None, &params, None)
            .unwrap_err();
        assert_eq!(err, RbfFdError::ZeroDimension { context: "nodes" });
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = condition_based_shape_factor(
            &nodes,
            &nodes,
            &KernelType::Gaussian,
            &params,
            &BrentLogSolver,
        )
        .unwrap_err();
        assert_eq!(err, RbfFdError::ZeroDimension { context: "centers" });
        assert!(mean_nearest_neighbour_distance(&nodes).is_none());
    }

    #[test]
    fn condition_search_hits_target() {
        let (nodes, stencils) = grid_stencils();
        let stencil_nodes = select_mat_rows(&nodes, &stencils[0]);
        let params = ShapeFactorParams::default();

        for basis in [KernelType::Gaussian, KernelType::Multiquadric] {
            let eps = condition_based_shape_factor(
                &stencil_nodes,
                &stencil_nodes,
                &basis,
                &params,
                &BrentLogSolver,
            )
            .unwrap()
            .unwrap();

            let k = kernel_matrix(&stencil_nodes, &stencil_nodes, &vec![eps; 9], &basis).unwrap();
            let cond = log10_condition_number(&k).unwrap();
            assert!((cond - 10.0).abs() <= 1e-2, "{basis:?}: cond = {cond}");
        }
    }

    #[test]
    fn estimated_alpha_is_reproducible_with_seed() {
        let (nodes, stencils) = grid_stencils();
        let params = ShapeFactorParams::builder().sample_count(5).seed(42).build();

        let a = shape_factor(&nodes, &stencils, &KernelType::Gaussian, None, &params, None).unwrap();
        let b = shape_factor(&nodes, &stencils, &KernelType::Gaussian, None, &params, None).unwrap();
        assert!((a.alpha - b.alpha).abs() <= 1e-12 * a.alpha);
        assert!(a.alpha.is_finite() && a.alpha > 0.0);

        // Every stencil has the same geometry, so every sample agrees on alpha.
        let stencil_nodes = select_mat_rows(&nodes, &stencils[7]);
        let k = kernel_matrix(&stencil_nodes, &stencil_nodes, &vec![a.eps[7]; 9], &KernelType::Gaussian)
            .unwrap();
        let cond = log10_condition_number(&k).unwrap();
        assert!((cond - 10.0).abs() <= 2e-2);
    }

    #[test]
    fn scale_invariant_kernel_cannot_reach_target() {
        let (nodes, stencils) = grid_stencils();
        // A short bracket search keeps the kernel entries well inside the normal range.
        let params = ShapeFactorParams::builder()
            .sample_count(3)
            .seed(1)
            .solver(SolverParams {
                max_iter: 4,
                ..SolverParams::default()
            })
            .build();

        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&events);
        let (sink, handle) = closure_sink(16, move |msg| recorded.lock().unwrap().push(msg));

        let err = shape_factor(&nodes, &stencils, &KernelType::Phs3, None, &params, Some(sink))
            .unwrap_err();
        assert_eq!(err, RbfFdError::NoShapeFactorConverged { samples: 3 });
        assert_eq!(err.kind(), ErrorKind::Convergence);

        handle.join().unwrap();
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|m| matches!(m, ProgressMsg::ConditionSearchFailed { target, .. } if *target == 10.0)));
    }

    #[test]
    fn accepted_alpha_is_reported() {
        let (nodes, stencils) = grid_stencils();
        let params = ShapeFactorParams::builder().sample_count(2).seed(3).build();

        let events = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&events);
        let (sink, handle) = closure_sink(16, move |msg| recorded.lock().unwrap().push(msg));

        let factors = shape_factor(&nodes, &stencils, &KernelType::Gaussian, None, &params, Some(sink))
            .unwrap();
        handle.join().unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            events.last(),
            Some(&ProgressMsg::ShapeFactorAccepted {
                alpha: factors.alpha,
                successful: 2,
                samples: 2
            })
        );
    }
}
