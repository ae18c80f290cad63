/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the scalar nonlinear solve used to match a target kernel condition number.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Scalar nonlinear solvers for strictly positive unknowns.
use crate::config::SolverParams;
use std::cell::Cell;
use std::fmt::Debug;
use thiserror::Error;

/// Largest magnitude of `ln(x)` explored before giving up on a bracket.
const MAX_LOG_MAGNITUDE: f64 = 700.0;

/// Growth factor applied to the bracket on each expansion step.
const BRACKET_GROWTH: f64 = 1.6;

/// Result of a successful scalar solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarSolution {
    /// The positive argument found.
    pub solution: f64,

    /// The function value at `solution`.
    pub predicted: f64,

    /// Number of function evaluations used.
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("initial guess {0} must be positive and finite")]
    InvalidInitialGuess(f64),

    #[error("no sign change of the residual found after {evaluations} evaluations")]
    NoSignChange { evaluations: usize },

    #[error("root refinement failed: {0}")]
    Refinement(String),
}

/// Solves `g(x) = target` for a positive scalar `x`.
///
/// Implementations must treat a non-finite `g(x)` as a very large value rather
/// than failing outright.
pub trait ScalarLeastSquares: Send + Sync + Debug {
    fn solve(
        &self,
        g: &dyn Fn(f64) -> f64,
        initial: f64,
        target: f64,
        params: &SolverParams,
    ) -> Result<ScalarSolution, SolverError>;
}

/// Brent's method in `u = ln(x)`, after expanding a bracket around the initial guess.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrentLogSolver;

impl ScalarLeastSquares for BrentLogSolver {
    fn solve(
        &self,
        g: &dyn Fn(f64) -> f64,
        initial: f64,
        target: f64,
        params: &SolverParams,
    ) -> Result<ScalarSolution, SolverError> {
        if !(initial.is_finite() && initial > 0.0) {
            return Err(SolverError::InvalidInitialGuess(initial));
        }

        let evaluations = Cell::new(0usize);
        let residual = |u: f64| {
            evaluations.set(evaluations.get() + 1);
            let value = g(u.exp()) - target;
            if value.is_finite() {
                value
            } else {
                f64::MAX
            }
        };

        let u0 = initial.ln();
        let f0 = residual(u0);
        if f0.abs() <= params.ftol {
            return Ok(ScalarSolution {
                solution: initial,
                predicted: f0 + target,
                iterations: evaluations.get(),
            });
        }

        let (mut lo, mut hi) = (u0 - 0.5, u0 + 0.5);
        let (mut f_lo, mut f_hi) = (residual(lo), residual(hi));
        let mut expansions = 0;
        while f_lo.signum() == f_hi.signum() {
            expansions += 1;
            let exhausted = lo.abs() >= MAX_LOG_MAGNITUDE && hi.abs() >= MAX_LOG_MAGNITUDE;
            if expansions > params.max_iter || exhausted {
                return Err(SolverError::NoSignChange {
                    evaluations: evaluations.get(),
                });
            }

            if f_lo.abs() < f_hi.abs() {
                lo = (lo + BRACKET_GROWTH * (lo - hi)).max(-MAX_LOG_MAGNITUDE);
                f_lo = residual(lo);
            } else {
                hi = (hi + BRACKET_GROWTH * (hi - lo)).min(MAX_LOG_MAGNITUDE);
                f_hi = residual(hi);
            }
        }

        let mut convergency = roots::SimpleConvergency {
            eps: params.xtol,
            max_iter: params.max_iter,
        };
        let u = roots::find_root_brent(lo, hi, &residual, &mut convergency)
            .map_err(|e| SolverError::Refinement(format!("{e:?}")))?;

        let solution = u.exp();
        let predicted = g(solution);
        Ok(ScalarSolution {
            solution,
            predicted,
            iterations: evaluations.get() + 1,
        })
    }
}
