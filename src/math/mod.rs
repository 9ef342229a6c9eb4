//! Submodule providing the math kernel layer.

pub mod ll_math;
pub mod ll_sparse;
pub mod ll_tensor;

use core::fmt::{Debug, Display};
use core::iter::Sum;
use core::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use num_traits::Float;
use rand::{distributions::uniform::SampleUniform, Rng};
use rand_distr::StandardNormal;

use crate::io::serialize::Scalar;

/// Floating-point element type of tensors, kernels and optimizers.
///
/// The kernels are instantiated separately for `f32` and `f64`;
/// integer element types only support the fill operations on
/// [`Tensor`](crate::tensor::Tensor).
pub trait Real:
    Float
    + Scalar
    + SampleUniform
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Sum
    + Display
    + Debug
    + Default
{
    /// Draws a sample from the standard normal distribution.
    fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Converts an element count to the float type.
    fn from_usize(n: usize) -> Self;

    /// Converts a small signed integer to the float type.
    fn from_i32(v: i32) -> Self;

    /// Narrows a literal constant to the float type.
    fn from_f64(v: f64) -> Self;
}

impl Real for f32 {
    fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }

    fn from_usize(n: usize) -> Self {
        n as f32
    }

    fn from_i32(v: i32) -> Self {
        v as f32
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Real for f64 {
    fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }

    fn from_usize(n: usize) -> Self {
        n as f64
    }

    fn from_i32(v: i32) -> Self {
        v as f64
    }

    fn from_f64(v: f64) -> Self {
        v
    }
}
