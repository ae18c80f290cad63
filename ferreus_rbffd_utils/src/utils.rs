/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies general-purpose utilities for matrices, distances, factorials, and kernel dispatch.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::RadialBasis;
use faer::{Mat, RowRef};
use serde::{Deserialize, Serialize};

/// Returns an owned `Mat<T>` from a subset of row indices.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_rbffd_utils::select_mat_rows;
///
/// let matrix = mat![
///     [0.0, 1.0],
///     [1.0, 1.0],
///     [2.0, 2.0],
///     [3.0, 3.0f64],
/// ];
///
/// let stencil = vec![3usize, 0];
///
/// let sub_matrix = select_mat_rows(&matrix, &stencil);
///
/// assert_eq!(
///     sub_matrix,
///     mat![
///         [3.0, 3.0],
///         [0.0, 1.0f64],
///     ]
/// );
/// ```
#[inline(always)]
pub fn select_mat_rows<T>(existing_mat: &Mat<T>, row_indices: &[usize]) -> Mat<T>
where
    T: Clone,
{
    Mat::from_fn(row_indices.len(), existing_mat.ncols(), |i, j| {
        existing_mat.get(row_indices[i], j).clone()
    })
}

/// Calculates the euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_rbffd_utils::get_distance;
///
/// let points = mat![
///     [1.0, 2.0],
///     [4.0, 6.0],
/// ];
///
/// let dist = get_distance(points.row(0), points.row(1));
///
/// assert_eq!(dist, 5.0);
/// ```
#[inline(always)]
pub fn get_distance(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    get_distance_sq(target, source).sqrt()
}

/// Returns the squared Euclidean distance between two points.
#[inline(always)]
pub fn get_distance_sq(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist
}

/// Returns `n!` as a float.
#[inline(always)]
pub fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, i| acc * i as f64)
}

/// Returns the falling factorial `base (base - 1) ... (base - k + 1)`.
///
/// For a non-negative integer `base` smaller than `k` one of the factors is
/// exactly zero, which is how the derivative of `x^p` of order `k > p` vanishes.
///
/// # Examples
///
/// ```
/// use ferreus_rbffd_utils::falling_factorial;
///
/// assert_eq!(falling_factorial(3.0, 2), 6.0);
/// assert_eq!(falling_factorial(2.0, 3), 0.0);
/// assert_eq!(falling_factorial(0.5, 2), -0.25);
/// ```
#[inline(always)]
pub fn falling_factorial(base: f64, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (base - i as f64))
}

// Dispatcher generated from the kernel registry below.
// Assumes each kernel type implements `Default` and `RadialBasis`.
macro_rules! for_each_kernel {
    ( registry = [ $( ($V:ident, $Kty:path) ),* $(,)? ] ) => {

        /// Runtime kernel selector built from the kernel registry.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum KernelType {
            $( $V, )*
        }

        impl KernelType {
            /// All registered kernel types, in registry order.
            pub const ALL: &'static [KernelType] = &[ $( KernelType::$V, )* ];
        }

        impl RadialBasis for KernelType {
            #[inline(always)]
            fn squared_distance_derivative(&self, s: f64, eps: f64, k: usize) -> f64 {
                match self {
                    $(
                        KernelType::$V => {
                            <$Kty as Default>::default().squared_distance_derivative(s, eps, k)
                        }
                    ),*
                }
            }

            fn evaluate(
                &self,
                points: &Mat<f64>,
                centers: &Mat<f64>,
                eps: &[f64],
                diff: Option<&[usize]>,
            ) -> Mat<f64> {
                match self {
                    $(
                        KernelType::$V => {
                            <$Kty as Default>::default().evaluate(points, centers, eps, diff)
                        }
                    ),*
                }
            }
        }
    };
}

for_each_kernel! {
    registry = [
        (Phs1,                crate::kernels::Phs1RbfKernel),
        (Phs3,                crate::kernels::Phs3RbfKernel),
        (Phs5,                crate::kernels::Phs5RbfKernel),
        (Phs7,                crate::kernels::Phs7RbfKernel),
        (ThinPlateSpline,     crate::kernels::ThinPlateSplineRbfKernel),
        (Gaussian,            crate::kernels::GaussianRbfKernel),
        (Multiquadric,        crate::kernels::MultiquadricRbfKernel),
        (InverseMultiquadric, crate::kernels::InverseMultiquadricRbfKernel),
        (InverseQuadratic,    crate::kernels::InverseQuadraticRbfKernel),
    ]
}
