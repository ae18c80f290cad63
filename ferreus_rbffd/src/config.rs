/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares configuration types for polynomial order selection and shape factor estimation.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares configuration types for polynomial order selection and shape factor estimation.
use serde::{Deserialize, Serialize};

/// Polynomial augmentation used by a stencil.
///
/// An order `o` basis holds every monomial of total degree `<= o - 1`, so `Fixed(0)`
/// disables augmentation and `Fixed(1)` adds only the constant term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PolynomialOrder {
    /// The largest order whose monomial count fits within the stencil size.
    #[default]
    Max,

    /// An explicit order.
    Fixed(usize),
}

/// Stopping criteria for the scalar nonlinear solve inside the shape factor search.
///
/// ### Default Values
/// - `xtol`: `1e-10`
/// - `ftol`: `1e-8`
/// - `max_iter`: `100`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Convergence tolerance on the (log-scaled) solution.
    pub xtol: f64,

    /// Residual magnitude accepted as an exact hit.
    pub ftol: f64,

    /// Maximum number of iterations for each of the bracketing and refinement stages.
    pub max_iter: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            xtol: 1e-10,
            ftol: 1e-8,
            max_iter: 100,
        }
    }
}

/// Parameters controlling estimation of a global shape factor `alpha`.
///
/// When no `alpha` is supplied, a number of stencils are sampled and, for each,
/// the shape parameter giving the requested condition number of the stencil's
/// kernel matrix is searched for. The accepted values, rescaled by the stencil's
/// mean node spacing, are averaged into one global `alpha`.
///
/// ### Default Values
/// - `target_log_condition`: `10.0`
/// - `sample_count`: `100`
/// - `seed`: `None`
/// - `acceptance_tolerance`: `1e-2`
/// - `solver`: [`SolverParams::default`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeFactorParams {
    /// Target base-10 logarithm of the kernel matrix condition number.
    pub target_log_condition: f64,

    /// Maximum number of stencils to sample.
    pub sample_count: usize,

    /// Seed for stencil sampling. `None` draws from the operating system.
    pub seed: Option<u64>,

    /// Largest accepted difference, in log10 space, between the achieved and
    /// target condition numbers.
    pub acceptance_tolerance: f64,

    /// Stopping criteria for the nonlinear solve.
    pub solver: SolverParams,
}

impl Default for ShapeFactorParams {
    fn default() -> Self {
        ShapeFactorParams::builder().build()
    }
}

impl ShapeFactorParams {
    /// Returns a new [`ShapeFactorParamsBuilder`] populated with the defaults.
    pub fn builder() -> ShapeFactorParamsBuilder {
        ShapeFactorParamsBuilder {
            target_log_condition: 10.0,
            sample_count: 100,
            seed: None,
            acceptance_tolerance: 1e-2,
            solver: SolverParams::default(),
        }
    }
}

/// A convenience builder for constructing a [`ShapeFactorParams`] instance.
///
/// The builder should be called via the [`ShapeFactorParams::builder`] method.
///
/// See [`ShapeFactorParams`] for details on each field.
#[derive(Debug, Clone, Copy)]
pub struct ShapeFactorParamsBuilder {
    pub target_log_condition: f64,
    pub sample_count: usize,
    pub seed: Option<u64>,
    pub acceptance_tolerance: f64,
    pub solver: SolverParams,
}

impl ShapeFactorParamsBuilder {
    /// Sets the target log10 condition number.
    pub fn target_log_condition(mut self, target_log_condition: f64) -> Self {
        self.target_log_condition = target_log_condition;
        self
    }

    /// Sets the maximum number of sampled stencils.
    pub fn sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Fixes the sampling seed for reproducible estimates.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the accepted log10 condition number mismatch.
    pub fn acceptance_tolerance(mut self, acceptance_tolerance: f64) -> Self {
        self.acceptance_tolerance = acceptance_tolerance;
        self
    }

    /// Sets the nonlinear solver stopping criteria.
    pub fn solver(mut self, solver: SolverParams) -> Self {
        self.solver = solver;
        self
    }

    /// Builds and returns a [`ShapeFactorParams`] instance.
    pub fn build(self) -> ShapeFactorParams {
        assert!(self.acceptance_tolerance > 0.0);
        assert!(self.solver.max_iter > 0);
        ShapeFactorParams {
            target_log_condition: self.target_log_condition,
            sample_count: self.sample_count,
            seed: self.seed,
            acceptance_tolerance: self.acceptance_tolerance,
            solver: self.solver,
        }
    }
}

/// Acceptance criteria for a solved stencil system.
///
/// Each solve checks the log10 condition number of its system matrix through an
/// SVD. Weights from a system above `max_log_condition` amplify rounding error
/// by more than the limit allows and are rejected. `f64::INFINITY` skips the
/// check and the SVD.
///
/// ### Default Values
/// - `max_log_condition`: `14.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightParams {
    /// Largest accepted log10 condition number of the system matrix.
    pub max_log_condition: f64,
}

impl Default for WeightParams {
    fn default() -> Self {
        WeightParams {
            max_log_condition: 14.0,
        }
    }
}

impl WeightParams {
    /// Parameters that accept any system the LU factorisation can solve.
    pub fn unchecked() -> Self {
        WeightParams {
            max_log_condition: f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let params = ShapeFactorParams::default();
        assert_eq!(params.target_log_condition, 10.0);
        assert_eq!(params.sample_count, 100);
        assert_eq!(params.seed, None);
        assert_eq!(params.acceptance_tolerance, 1e-2);
        assert_eq!(params.solver, SolverParams::default());
    }

    #[test]
    fn params_round_trip_through_json() {
        let params = ShapeFactorParams::builder()
            .target_log_condition(8.0)
            .sample_count(12)
            .seed(7)
            .build();

        let text = serde_json::to_string(&params).unwrap();
        let back: ShapeFactorParams = serde_json::from_str(&text).unwrap();
        assert_eq!(params, back);

        let order: PolynomialOrder = serde_json::from_str(r#"{"Fixed":3}"#).unwrap();
        assert_eq!(order, PolynomialOrder::Fixed(3));
        assert_eq!(PolynomialOrder::default(), PolynomialOrder::Max);
    }

    #[test]
    fn weight_params_defaults() {
        assert_eq!(WeightParams::default().max_log_condition, 14.0);
        assert!(WeightParams::unchecked().max_log_condition.is_infinite());
    }
}
