/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete radial kernels and their squared-distance derivatives.
//
// Created on: 14 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{RadialBasis, factorial, falling_factorial};
use std::marker::PhantomData;

/// `k`-th derivative of `coefficient * s^power` with respect to `s`.
///
/// At `s = 0` a negative resulting exponent is singular, and the limit taken by
/// the kernels is `0`.
#[inline(always)]
fn power_law_derivative(s: f64, power: f64, k: usize) -> f64 {
    let coefficient = falling_factorial(power, k);
    let exponent = power - k as f64;

    if s <= 0.0 {
        return match exponent == 0.0 {
            true => coefficient,
            false => 0.0,
        };
    }

    coefficient * s.powf(exponent)
}

/// `k`-th derivative of `(1 + eps^2 s)^power` with respect to `s`.
#[inline(always)]
fn quadric_derivative(s: f64, eps: f64, power: f64, k: usize) -> f64 {
    let eps2 = eps * eps;
    falling_factorial(power, k) * eps2.powi(k as i32) * (1.0 + eps2 * s).powf(power - k as f64)
}

/// Compile-time degree of an odd polyharmonic spline.
pub trait PolyharmonicSpec: Copy + std::fmt::Debug + Default + Send + Sync {
    const POW: i32; // 1, 3, 5 or 7
}

#[doc(hidden)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Degree1;

#[doc(hidden)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Degree3;

#[doc(hidden)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Degree5;

#[doc(hidden)]
#[derive(Copy, Clone, Debug, Default)]
pub struct Degree7;

impl PolyharmonicSpec for Degree1 {
    const POW: i32 = 1;
}
impl PolyharmonicSpec for Degree3 {
    const POW: i32 = 3;
}
impl PolyharmonicSpec for Degree5 {
    const POW: i32 = 5;
}
impl PolyharmonicSpec for Degree7 {
    const POW: i32 = 7;
}

/// Odd polyharmonic spline `phi(r) = (eps r)^POW`.
#[derive(Clone, Debug, Copy, Default)]
pub struct PolyharmonicRbfKernel<S: PolyharmonicSpec> {
    _spec: PhantomData<S>,
}

impl<S: PolyharmonicSpec> PolyharmonicRbfKernel<S> {
    #[inline(always)]
    pub fn phi(&self, r: f64, eps: f64) -> f64 {
        (eps * r).abs().powi(S::POW)
    }
}

impl<S: PolyharmonicSpec> RadialBasis for PolyharmonicRbfKernel<S> {
    #[inline(always)]
    fn squared_distance_derivative(&self, s: f64, eps: f64, k: usize) -> f64 {
        // (eps r)^P = eps^P s^(P / 2)
        eps.abs().powi(S::POW) * power_law_derivative(s, S::POW as f64 / 2.0, k)
    }
}

/// Order-1 polyharmonic spline type alias.
pub type Phs1RbfKernel = PolyharmonicRbfKernel<Degree1>;
/// Order-3 polyharmonic spline type alias.
pub type Phs3RbfKernel = PolyharmonicRbfKernel<Degree3>;
/// Order-5 polyharmonic spline type alias.
pub type Phs5RbfKernel = PolyharmonicRbfKernel<Degree5>;
/// Order-7 polyharmonic spline type alias.
pub type Phs7RbfKernel = PolyharmonicRbfKernel<Degree7>;

/// Thin plate spline `phi(r) = (eps r)^2 log(eps r)`.
#[derive(Clone, Debug, Copy, Default)]
pub struct ThinPlateSplineRbfKernel;

impl ThinPlateSplineRbfKernel {
    #[inline(always)]
    pub fn phi(&self, r: f64, eps: f64) -> f64 {
        let t = eps * r;
        match t.abs() < f64::EPSILON {
            true => 0.0,
            false => t.powi(2) * t.abs().ln(),
        }
    }
}

impl RadialBasis for ThinPlateSplineRbfKernel {
    fn squared_distance_derivative(&self, s: f64, eps: f64, k: usize) -> f64 {
        // phi = g(t) with t = eps^2 s and g(t) = t log(t) / 2.
        let eps2 = eps * eps;
        let t = eps2 * s;

        if t <= 0.0 {
            return 0.0;
        }

        let g = match k {
            0 => 0.5 * t * t.ln(),
            1 => 0.5 * (t.ln() + 1.0),
            _ => {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                0.5 * sign * factorial(k - 2) * t.powi(1 - k as i32)
            }
        };

        eps2.powi(k as i32) * g
    }
}

/// Gaussian kernel `phi(r) = exp(-(eps r)^2)`.
#[derive(Clone, Debug, Copy, Default)]
pub struct GaussianRbfKernel;

impl GaussianRbfKernel {
    #[inline(always)]
    pub fn phi(&self, r: f64, eps: f64) -> f64 {
        (-(eps * r).powi(2)).exp()
    }
}

impl RadialBasis for GaussianRbfKernel {
    #[inline(always)]
    fn squared_distance_derivative(&self, s: f64, eps: f64, k: usize) -> f64 {
        let eps2 = eps * eps;
        (-eps2).powi(k as i32) * (-eps2 * s).exp()
    }
}

/// Multiquadric kernel `phi(r) = sqrt(1 + (eps r)^2)`.
#[derive(Clone, Debug, Copy, Default)]
pub struct MultiquadricRbfKernel;

impl MultiquadricRbfKernel {
    #[inline(always)]
    pub fn phi(&self, r: f64, eps: f64) -> f64 {
        (1.0 + (eps * r).powi(2)).sqrt()
    }
}

impl RadialBasis for MultiquadricRbfKernel {
    #[inline(always)]
    fn squared_distance_derivative(&self, s: f64, eps: f64, k: usize) -> f64 {
        quadric_derivative(s, eps, 0.5, k)
    }
}

/// Inverse multiquadric kernel `phi(r) = 1 / sqrt(1 + (eps r)^2)`.
#[derive(Clone, Debug, Copy, Default)]
pub struct InverseMultiquadricRbfKernel;

impl InverseMultiquadricRbfKernel {
    #[inline(always)]
    pub fn phi(&self, r: f64, eps: f64) -> f64 {
        1.0 / (1.0 + (eps * r).powi(2)).sqrt()
    }
}

impl RadialBasis for InverseMultiquadricRbfKernel {
    #[inline(always)]
    fn squared_distance_derivative(&self, s: f64, eps: f64, k: usize) -> f64 {
        quadric_derivative(s, eps, -0.5, k)
    }
}

/// Inverse quadratic kernel `phi(r) = 1 / (1 + (eps r)^2)`.
#[derive(Clone, Debug, Copy, Default)]
pub struct InverseQuadraticRbfKernel;

impl InverseQuadraticRbfKernel {
    #[inline(always)]
    pub fn phi(&self, r: f64, eps: f64) -> f64 {
        1.0 / (1.0 + (eps * r).powi(2))
    }
}

impl RadialBasis for InverseQuadraticRbfKernel {
    #[inline(always)]
    fn squared_distance_derivative(&self, s: f64, eps: f64, k: usize) -> f64 {
        quadric_derivative(s, eps, -1.0, k)
    }
}
