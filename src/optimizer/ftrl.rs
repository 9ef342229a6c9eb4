//! Submodule providing the FTRL-proximal update rule.

use crate::{
    math::Real,
    optimizer::{Optimizer, UpdateRule2},
};

/// FTRL-proximal, with slots for the accumulated squared gradients and
/// the `z` accumulator. L1 shrinks small weights to exactly zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Ftrl<T> {
    /// Learning-rate scale.
    pub alpha: T,
    /// Learning-rate smoothing.
    pub beta: T,
    /// L1 regularization strength.
    pub l1: T,
    /// L2 regularization strength.
    pub l2: T,
    /// `1 / alpha`; derived by [`Optimizer::init`].
    pub inv_alpha: T,
}

impl<T: Real> Default for Ftrl<T> {
    fn default() -> Self {
        Self {
            alpha: T::from_f64(0.01),
            beta: T::one(),
            l1: T::one(),
            l2: T::zero(),
            inv_alpha: T::zero(),
        }
    }
}

impl<T: Real> Optimizer for Ftrl<T> {
    fn init(&mut self) {
        self.inv_alpha = T::one() / self.alpha;
    }
}

impl<T: Real> UpdateRule2<T> for Ftrl<T> {
    fn update_scalar(&self, g: T, w: &mut T, n: &mut T, z: &mut T) {
        let new_n = *n + g * g;
        let sqrt_n = n.sqrt();
        let sqrt_new_n = new_n.sqrt();
        let sigma = (sqrt_n - sqrt_new_n) * self.inv_alpha;
        let new_z = *z + g + sigma * *w;
        let z_sign = if new_z < T::zero() { -T::one() } else { T::one() };
        let z_abs = z_sign * new_z;
        if z_abs < self.l1 {
            *w = T::zero();
        } else {
            *w = (z_sign * self.l1 - new_z) / ((self.beta + sqrt_new_n) * self.inv_alpha + self.l2);
        }
        *z = new_z;
        *n = new_n;
    }
}
