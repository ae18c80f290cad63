/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports the radial kernels, kernel traits, and helper functions used by ferreus_rbffd.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Radial kernels and utilities for the [`ferreus_rbffd`] crate
//!
//! The RBF-FD weight routines never evaluate a kernel directly. They go through the
//! [`RadialBasis`] trait, which exposes plain evaluation as well as mixed partial
//! derivatives of arbitrary per-axis order. Any radial kernel can therefore be
//! plugged in by implementing a single method: the `k`-th derivative of the kernel
//! written as a function of the squared distance `s = r^2`.
mod rbf_kernels;
mod traits;
mod utils;

/// Implemented kernels for use in the [`ferreus_rbffd`] crate.
pub mod kernels {
    pub use super::rbf_kernels::*;
}

pub use {
    traits::RadialBasis,
    utils::{
        KernelType, factorial, falling_factorial, get_distance, get_distance_sq, select_mat_rows,
    },
};
