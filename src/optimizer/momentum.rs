//! Submodule providing the momentum update rule.

use crate::{
    math::Real,
    optimizer::{Optimizer, UpdateRule1},
};

/// Momentum: `v = rho * v + g; w -= alpha * v`.
#[derive(Debug, Clone, PartialEq)]
pub struct Momentum<T> {
    /// Velocity decay rate.
    pub rho: T,
    /// Learning rate.
    pub alpha: T,
}

impl<T: Real> Default for Momentum<T> {
    fn default() -> Self {
        Self { rho: T::from_f64(0.5), alpha: T::from_f64(0.1) }
    }
}

impl<T: Real> Optimizer for Momentum<T> {}

impl<T: Real> UpdateRule1<T> for Momentum<T> {
    fn update_scalar(&self, g: T, w: &mut T, v: &mut T) {
        let new_v = self.rho * *v + g;
        let new_w = *w - self.alpha * new_v;
        *w = new_w;
        *v = new_v;
    }
}
