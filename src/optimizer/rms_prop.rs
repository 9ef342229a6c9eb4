//! Submodule providing the RMSProp update rule.

use crate::{
    math::Real,
    optimizer::{smooth, Optimizer, UpdateRule1},
};

/// RMSProp, with a slot for the running squared-gradient average.
#[derive(Debug, Clone, PartialEq)]
pub struct RmsProp<T> {
    /// Decay rate of the running average.
    pub rho: T,
    /// Learning rate.
    pub alpha: T,
    /// Smoothing term.
    pub beta: T,
    /// `1 - rho`; derived by [`Optimizer::init`].
    pub one_sub_rho: T,
}

impl<T: Real> Default for RmsProp<T> {
    fn default() -> Self {
        Self {
            rho: T::from_f64(0.5),
            alpha: T::from_f64(0.1),
            beta: smooth(),
            one_sub_rho: T::zero(),
        }
    }
}

impl<T: Real> Optimizer for RmsProp<T> {
    fn init(&mut self) {
        self.one_sub_rho = T::one() - self.rho;
    }
}

impl<T: Real> UpdateRule1<T> for RmsProp<T> {
    fn update_scalar(&self, g: T, w: &mut T, v: &mut T) {
        let new_v = self.rho * *v + self.one_sub_rho * g * g;
        let new_w = *w - g / (new_v + self.beta).sqrt() * self.alpha;
        *w = new_w;
        *v = new_v;
    }
}
