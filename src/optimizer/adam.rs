//! Submodule providing the Adam update rule.

use crate::{
    math::Real,
    optimizer::{smooth, Optimizer, UpdateRule2},
};

/// Adam, with slots for the first and second moment estimates.
///
/// [`Optimizer::pre_batch`] advances the bias-correction powers and
/// caches the effective step size `rho_aux`.
#[derive(Debug, Clone, PartialEq)]
pub struct Adam<T> {
    /// Decay rate of the first moment.
    pub rho1: T,
    /// Decay rate of the second moment.
    pub rho2: T,
    /// Learning rate.
    pub alpha: T,
    /// Smoothing term.
    pub beta: T,
    /// `rho1^t`; managed by the lifecycle.
    pub rho1t: T,
    /// `rho2^t`; managed by the lifecycle.
    pub rho2t: T,
    /// `1 - rho1`; derived by [`Optimizer::init`].
    pub one_sub_rho1: T,
    /// `1 - rho2`; derived by [`Optimizer::init`].
    pub one_sub_rho2: T,
    /// Bias-corrected step size; managed by the lifecycle.
    pub rho_aux: T,
}

impl<T: Real> Default for Adam<T> {
    fn default() -> Self {
        Self {
            rho1: T::from_f64(0.9),
            rho2: T::from_f64(0.999),
            alpha: T::from_f64(0.001),
            beta: smooth(),
            rho1t: T::one(),
            rho2t: T::one(),
            one_sub_rho1: T::zero(),
            one_sub_rho2: T::zero(),
            rho_aux: T::zero(),
        }
    }
}

impl<T: Real> Optimizer for Adam<T> {
    fn init(&mut self) {
        self.rho1t = T::one();
        self.rho2t = T::one();
        self.one_sub_rho1 = T::one() - self.rho1;
        self.one_sub_rho2 = T::one() - self.rho2;
        self.rho_aux = T::zero();
    }

    fn pre_batch(&mut self) {
        self.rho1t = self.rho1t * self.rho1;
        self.rho2t = self.rho2t * self.rho2;
        self.rho_aux = (T::one() - self.rho2t).sqrt() / (T::one() - self.rho1t) * self.alpha;
    }
}

impl<T: Real> UpdateRule2<T> for Adam<T> {
    fn update_scalar(&self, g: T, w: &mut T, m: &mut T, v: &mut T) {
        let new_m = self.rho1 * *m + self.one_sub_rho1 * g;
        let new_v = self.rho2 * *v + self.one_sub_rho2 * g * g;
        let new_w = *w - self.rho_aux * new_m / (new_v.sqrt() + self.beta);
        *w = new_w;
        *m = new_m;
        *v = new_v;
    }
}
