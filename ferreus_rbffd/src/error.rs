/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the error type shared by the monomial, assembly, shape factor, and weight routines.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use thiserror::Error;

/// Broad category of an [`RbfFdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The inputs cannot describe a solvable stencil. Raised before any assembly.
    Configuration,

    /// The shape parameter search could not reach the target condition number.
    Convergence,

    /// A dense solve or decomposition failed numerically.
    Numerical,
}

/// Errors returned by the RBF-FD routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RbfFdError {
    #[error(
        "too many monomials ({num_terms}) for a stencil of size {stencil_size}; \
         lower the polynomial order or enlarge the stencil"
    )]
    TooManyMonomials {
        num_terms: usize,
        stencil_size: usize,
    },

    #[error(
        "a polynomial stencil of order {order} needs exactly {expected} nodes, got {found}"
    )]
    NodeCountMismatch {
        order: usize,
        expected: usize,
        found: usize,
    },

    #[error("{context}: expected dimension {expected}, got {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("expected one center per node ({nodes} nodes), got {centers} centers")]
    CenterCountMismatch { nodes: usize, centers: usize },

    #[error("expected {expected} shape parameters, got {found}")]
    ShapeParameterLength { expected: usize, found: usize },

    #[error("stencil {stencil} has {size} nodes; at least 2 are needed to measure node spacing")]
    StencilTooSmall { stencil: usize, size: usize },

    #[error("stencil {stencil} references node {index}, but there are only {num_nodes} nodes")]
    InvalidStencilIndex {
        stencil: usize,
        index: usize,
        num_nodes: usize,
    },

    #[error("no stencils were supplied")]
    EmptyStencilSet,

    #[error("{context} have no coordinates; at least one spatial dimension is needed")]
    ZeroDimension { context: &'static str },

    #[error(
        "no shape factor could be estimated: none of the {samples} sampled stencils \
         reached the target condition number"
    )]
    NoShapeFactorConverged { samples: usize },

    #[error("the {size}x{size} stencil system is singular")]
    SingularSystem { size: usize },

    #[error(
        "the {size}x{size} stencil system is ill-conditioned: log10 condition number \
         {log_condition:.2} exceeds {limit:.2}"
    )]
    IllConditioned {
        size: usize,
        log_condition: f64,
        limit: f64,
    },

    #[error("singular value decomposition failed for a {nrows}x{ncols} matrix")]
    Svd { nrows: usize, ncols: usize },
}

impl RbfFdError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RbfFdError::TooManyMonomials { .. }
            | RbfFdError::NodeCountMismatch { .. }
            | RbfFdError::DimensionMismatch { .. }
            | RbfFdError::CenterCountMismatch { .. }
            | RbfFdError::ShapeParameterLength { .. }
            | RbfFdError::StencilTooSmall { .. }
            | RbfFdError::InvalidStencilIndex { .. }
            | RbfFdError::EmptyStencilSet
            | RbfFdError::ZeroDimension { .. } => ErrorKind::Configuration,
            RbfFdError::NoShapeFactorConverged { .. } => ErrorKind::Convergence,
            RbfFdError::SingularSystem { .. }
            | RbfFdError::IllConditioned { .. }
            | RbfFdError::Svd { .. } => ErrorKind::Numerical,
        }
    }
}

pub type Result<T> = std::result::Result<T, RbfFdError>;
