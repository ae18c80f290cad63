/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the pluggable kernel-evaluation trait shared by all radial kernels.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::utils::{factorial, get_distance_sq};
use faer::{Mat, RowRef};
use itertools::Itertools;
use std::fmt::Debug;

/// A radial kernel `phi(r)` that can be evaluated, and differentiated, between
/// evaluation points and centers.
///
/// Implementors only need to supply [`RadialBasis::squared_distance_derivative`].
/// Derivatives with respect to the evaluation point then follow from the chain rule
/// for `f(|x - c|^2)`:
///
/// ```text
/// d^a f = sum_{m <= a/2} prod_j a_j! / (m_j! (a_j - 2 m_j)!) (2 (x_j - c_j))^(a_j - 2 m_j)
///         * f^(|a| - |m|)(s)
/// ```
///
/// Kernels with a different structure can override [`RadialBasis::evaluate`].
pub trait RadialBasis: Debug + Send + Sync {
    /// Returns the `k`-th derivative, with respect to the squared distance `s`,
    /// of the kernel with shape parameter `eps`.
    fn squared_distance_derivative(&self, s: f64, eps: f64, k: usize) -> f64;

    /// Evaluates the kernel between a single point and a single center.
    ///
    /// `diff` holds the derivative order along each axis, taken with respect to `x`.
    /// `None` or an all-zero tuple means plain evaluation.
    fn evaluate_pair(
        &self,
        x: RowRef<f64>,
        c: RowRef<f64>,
        eps: f64,
        diff: Option<&[usize]>,
    ) -> f64 {
        let s = get_distance_sq(x, c);

        let diff = match diff {
            Some(d) if d.iter().any(|&a| a > 0) => d,
            _ => return self.squared_distance_derivative(s, eps, 0),
        };

        let delta: Vec<f64> = x.iter().zip(c.iter()).map(|(xi, ci)| xi - ci).collect();
        let total_order: usize = diff.iter().sum();

        diff.iter()
            .map(|&a| 0..=a / 2)
            .multi_cartesian_product()
            .fold(0.0, |acc, m| {
                let mut coefficient = 1.0;
                for ((&a, &mj), &dj) in diff.iter().zip(m.iter()).zip(delta.iter()) {
                    let p = a - 2 * mj;
                    coefficient *= factorial(a) / (factorial(mj) * factorial(p))
                        * (2.0 * dj).powi(p as i32);
                }

                // Skipping zero terms keeps kernels that are singular in `s` at the
                // origin from producing 0 * inf.
                if coefficient == 0.0 {
                    return acc;
                }

                let k = total_order - m.iter().sum::<usize>();
                acc + coefficient * self.squared_distance_derivative(s, eps, k)
            })
    }

    /// Builds the dense kernel matrix between `points` (rows) and `centers` (columns).
    ///
    /// `eps` holds one shape parameter per center.
    fn evaluate(
        &self,
        points: &Mat<f64>,
        centers: &Mat<f64>,
        eps: &[f64],
        diff: Option<&[usize]>,
    ) -> Mat<f64> {
        assert_eq!(
            eps.len(),
            centers.nrows(),
            "expected one shape parameter per center"
        );

        let mut a_matrix = Mat::<f64>::zeros(points.nrows(), centers.nrows());

        for j in 0..centers.nrows() {
            let center = centers.row(j);

            for i in 0..points.nrows() {
                a_matrix[(i, j)] = self.evaluate_pair(points.row(i), center, eps[j], diff);
            }
        }

        a_matrix
    }
}
