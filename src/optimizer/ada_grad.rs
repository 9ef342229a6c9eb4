//! Submodule providing the AdaGrad update rule.

use crate::{
    math::Real,
    optimizer::{smooth, Optimizer, UpdateRule1},
};

/// AdaGrad: `n += g^2; w -= alpha * g / sqrt(n + beta)`.
///
/// The slot buffer holds the accumulated squared gradients.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaGrad<T> {
    /// Learning rate.
    pub alpha: T,
    /// Smoothing term.
    pub beta: T,
}

impl<T: Real> Default for AdaGrad<T> {
    fn default() -> Self {
        Self { alpha: T::from_f64(0.01), beta: smooth() }
    }
}

impl<T: Real> Optimizer for AdaGrad<T> {}

impl<T: Real> UpdateRule1<T> for AdaGrad<T> {
    fn update_scalar(&self, g: T, w: &mut T, n: &mut T) {
        let new_n = *n + g * g;
        let new_w = *w - g / (new_n + self.beta).sqrt() * self.alpha;
        *w = new_w;
        *n = new_n;
    }
}
