/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for RBF-FD stencil weight computation.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Radial Basis Function Finite-Difference (RBF-FD) weights.
//!
//! Meshless PDE solvers replace the structured grid of classical finite differences
//! with small clusters of scattered nodes, called stencils. For each stencil this
//! crate computes a weight vector `w` such that `sum_i w_i f(x_i)` approximates a
//! linear differential operator applied to `f` at an evaluation point.
//!
//! Weights come from an RBF interpolant augmented with polynomial terms, so they
//! reproduce the operator exactly on every polynomial up to the chosen degree. A
//! pure polynomial path is also provided for stencils sized to match a polynomial
//! basis exactly.
//!
//! # Features
//! - Any spatial dimension and any mixed partial derivative, or weighted sums of them
//! - Pluggable kernels through [`ferreus_rbffd_utils::RadialBasis`]
//! - Shape parameter selection by node spacing, with an optional global factor
//!   estimated by targeting a kernel matrix condition number
//! - Parallel batch weight computation across stencils with `rayon`
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for dense linear algebra
//!
//! # Examples
//!
//! ```
//! use faer::mat;
//! use ferreus_rbffd::{DifferentialOperator, config::PolynomialOrder, rbf_weight};
//! use ferreus_rbffd_utils::KernelType;
//!
//! // Three nodes on a line resolve to a quadratic polynomial basis, giving the
//! // classical centered difference for d/dx.
//! let nodes = mat![[-1.0], [0.0], [1.0]];
//! let weights = rbf_weight(
//!     &[0.0],
//!     &nodes,
//!     &DifferentialOperator::partial(1, 0, 1),
//!     None,
//!     &KernelType::Phs3,
//!     PolynomialOrder::Max,
//!     1.0,
//! )?;
//!
//! assert!((weights[0] + 0.5).abs() < 1e-10);
//! assert!(weights[1].abs() < 1e-10);
//! assert!((weights[2] - 0.5).abs() < 1e-10);
//! # Ok::<(), ferreus_rbffd::RbfFdError>(())
//! ```
//!
//! # References
//! 1.  Fornberg, B., Flyer, N., 2015. A Primer on Radial Basis Functions with
//!     Applications to the Geosciences. SIAM.
//! 2.  Fasshauer, G., 2007. Meshfree Approximation Methods with Matlab. World Scientific Publishing Co.
//! 3.  Flyer, N., Fornberg, B., Bayona, V., Barnett, G. A., 2016. On the role of polynomials
//!     in RBF-FD approximations: I. Interpolation and accuracy. J. Comput. Phys. 321, 21-38.
pub mod config;

pub mod progress;

pub mod nonlinear_solvers;

pub mod kdtree;

mod common;

mod error;

mod monomials;

mod operators;

mod assembly;

mod shape_factor;

mod weights;

mod weight_io;

pub use {
    assembly::{dpoly, drbf, kernel_matrix, log10_condition_number, vpoly, vrbf},
    common::{create_node_grid, generate_random_points},
    error::{ErrorKind, RbfFdError, Result},
    monomials::{MonomialPowers, maximum_order, monomial_count, monomial_powers, mvmonos},
    operators::DifferentialOperator,
    shape_factor::{
        ShapeFactors, condition_based_shape_factor, mean_nearest_neighbour_distance, shape_factor,
        shape_factor_with_solver,
    },
    weight_io::{WeightIOError, WeightIOResult},
    weights::{
        WeightSet, poly_weight, poly_weight_with_params, poly_weights, poly_weights_with_params,
        rbf_weight, rbf_weight_with_params, rbf_weights, rbf_weights_with_params,
    },
};
