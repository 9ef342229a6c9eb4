//! Submodule providing the AdaDelta update rule.

use crate::{
    math::Real,
    optimizer::{smooth, Optimizer, UpdateRule2},
};

/// AdaDelta, with slots for the squared-gradient average and the
/// squared-delta average.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaDelta<T> {
    /// Decay rate of the running averages.
    pub rho: T,
    /// Learning rate.
    pub alpha: T,
    /// Smoothing term.
    pub beta: T,
    /// `1 - rho`; derived by [`Optimizer::init`].
    pub one_sub_rho: T,
}

impl<T: Real> Default for AdaDelta<T> {
    fn default() -> Self {
        Self { rho: T::from_f64(0.95), alpha: T::one(), beta: smooth(), one_sub_rho: T::zero() }
    }
}

impl<T: Real> Optimizer for AdaDelta<T> {
    fn init(&mut self) {
        self.one_sub_rho = T::one() - self.rho;
    }
}

impl<T: Real> UpdateRule2<T> for AdaDelta<T> {
    fn update_scalar(&self, g: T, w: &mut T, n: &mut T, deltaw: &mut T) {
        let new_n = self.rho * *n + self.one_sub_rho * g * g;
        let a = (*deltaw + self.beta).sqrt() / (new_n + self.beta).sqrt() * g;
        let new_deltaw = self.rho * *deltaw + self.one_sub_rho * a * a;
        let new_w = *w - self.alpha * a;
        *w = new_w;
        *n = new_n;
        *deltaw = new_deltaw;
    }
}
