/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides helper functions for generating node sets for tests and demonstrations.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates `n` uniformly distributed points in the unit hypercube of dimension `d`.
///
/// Passing a `seed` makes the point set reproducible.
pub fn generate_random_points(n: usize, d: usize, seed: Option<u64>) -> Mat<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Mat::from_fn(n, d, |_, _| rng.random_range(0.0..1.0))
}

/// Creates a regular grid of nodes.
///
/// # Arguments
/// * `ranges` - `(start, end)` of the grid along each axis.
/// * `counts` - Number of nodes along each axis; must be at least 2.
///
/// # Returns
/// A `(prod(counts), ranges.len())` matrix with the first axis varying fastest.
pub fn create_node_grid(ranges: &[(f64, f64)], counts: &[usize]) -> Mat<f64> {
    assert_eq!(ranges.len(), counts.len());
    assert!(counts.iter().all(|&c| c >= 2), "each axis needs at least two nodes");

    let total_points: usize = counts.iter().product();

    Mat::from_fn(total_points, ranges.len(), |row_idx, col_idx| {
        let dim_points = counts[col_idx];
        let (start, end) = ranges[col_idx];
        let step = (end - start) / (dim_points as f64 - 1.0);
        let stride: usize = counts[..col_idx].iter().product();

        let index_in_dim = (row_idx / stride) % dim_points;
        start + step * index_in_dim as f64
    })
}
