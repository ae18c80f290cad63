/////////////////////////////////////////////////////////////////////////////////////////////
//
// Describes the linear differential operators that stencil weights approximate.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::error::{RbfFdError, Result};
use serde::{Deserialize, Serialize};

/// A linear differential operator with constant coefficients.
///
/// Derivative orders are per-axis tuples, so `vec![1, 0]` is `d/dx` in 2D and
/// `vec![0, 0, 0]` is the identity in 3D.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DifferentialOperator {
    /// A single mixed partial derivative.
    DerivativeOrder(Vec<usize>),

    /// Weighted sum of mixed partial derivatives, applied term by term.
    LinearOperator(Vec<(f64, Vec<usize>)>),
}

impl DifferentialOperator {
    /// The identity operator in `dim` dimensions.
    pub fn identity(dim: usize) -> Self {
        DifferentialOperator::DerivativeOrder(vec![0; dim])
    }

    /// The `order`-th partial derivative along `axis`.
    pub fn partial(dim: usize, axis: usize, order: usize) -> Self {
        assert!(axis < dim, "axis {axis} out of range for dimension {dim}");
        let mut diff = vec![0; dim];
        diff[axis] = order;
        DifferentialOperator::DerivativeOrder(diff)
    }

    /// The Laplacian, written as the sum of pure second partials.
    pub fn laplacian(dim: usize) -> Self {
        DifferentialOperator::LinearOperator(
            (0..dim)
                .map(|axis| {
                    let mut diff = vec![0; dim];
                    diff[axis] = 2;
                    (1.0, diff)
                })
                .collect(),
        )
    }

    /// Dimension of the derivative tuples, or `None` for an empty operator.
    pub fn dim(&self) -> Option<usize> {
        match self {
            DifferentialOperator::DerivativeOrder(diff) => Some(diff.len()),
            DifferentialOperator::LinearOperator(terms) => terms.first().map(|(_, d)| d.len()),
        }
    }

    /// Coefficient and derivative order of each term.
    pub fn terms(&self) -> Vec<(f64, &[usize])> {
        match self {
            DifferentialOperator::DerivativeOrder(diff) => vec![(1.0, diff.as_slice())],
            DifferentialOperator::LinearOperator(terms) => {
                terms.iter().map(|(c, d)| (*c, d.as_slice())).collect()
            }
        }
    }

    /// Checks that every derivative tuple has dimension `dim`.
    pub(crate) fn validate(&self, dim: usize) -> Result<()> {
        for (_, diff) in self.terms() {
            if diff.len() != dim {
                return Err(RbfFdError::DimensionMismatch {
                    context: "differential operator",
                    expected: dim,
                    found: diff.len(),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<usize>> for DifferentialOperator {
    fn from(diff: Vec<usize>) -> Self {
        DifferentialOperator::DerivativeOrder(diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        assert_eq!(
            DifferentialOperator::partial(3, 1, 2),
            DifferentialOperator::DerivativeOrder(vec![0, 2, 0])
        );
        assert_eq!(DifferentialOperator::identity(2).dim(), Some(2));

        let lap = DifferentialOperator::laplacian(2);
        let terms = lap.terms();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0], (1.0, &[2usize, 0][..]));
        assert_eq!(terms[1], (1.0, &[0usize, 2][..]));
    }

    #[test]
    fn validate_rejects_wrong_dimension() {
        let op = DifferentialOperator::LinearOperator(vec![(1.0, vec![2, 0]), (0.5, vec![1])]);
        assert_eq!(
            op.validate(2),
            Err(RbfFdError::DimensionMismatch {
                context: "differential operator",
                expected: 2,
                found: 1,
            })
        );
        assert!(DifferentialOperator::laplacian(3).validate(3).is_ok());
    }
}
