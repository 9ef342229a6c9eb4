//! Submodule providing stochastic gradient descent with a time-decayed
//! learning rate.

use crate::{
    math::{ll_math, Real},
    optimizer::{Optimizer, UpdateRule0},
};

/// SGD: `w -= real_alpha * g`, with `real_alpha` decayed by
/// `batch_decay_rate` every `batch_decay` batches down to `min_alpha`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sgd<T> {
    /// Initial learning rate.
    pub alpha: T,
    /// Lower bound of the decayed learning rate.
    pub min_alpha: T,
    /// Number of batches between decays, 0 to disable decay.
    pub batch_decay: i32,
    /// Multiplicative decay factor.
    pub batch_decay_rate: T,
    /// Batches seen since the last decay; managed by the lifecycle.
    pub real_batch: i32,
    /// Effective learning rate; managed by the lifecycle.
    pub real_alpha: T,
}

impl<T: Real> Default for Sgd<T> {
    fn default() -> Self {
        Self {
            alpha: T::from_f64(0.01),
            min_alpha: T::from_f64(1e-6),
            batch_decay: 128,
            batch_decay_rate: T::from_f64(0.95),
            real_batch: 0,
            real_alpha: T::zero(),
        }
    }
}

impl<T: Real> Optimizer for Sgd<T> {
    fn init(&mut self) {
        self.real_batch = 0;
        self.real_alpha = self.alpha;
    }

    fn post_batch(&mut self) {
        if self.batch_decay > 0 {
            self.real_batch += 1;
            if self.real_batch >= self.batch_decay {
                self.real_batch = 0;
                self.real_alpha = self.real_alpha * self.batch_decay_rate;
                if self.real_alpha < self.min_alpha {
                    self.real_alpha = self.min_alpha;
                }
            }
        }
    }
}

impl<T: Real> UpdateRule0<T> for Sgd<T> {
    fn update_scalar(&self, g: T, w: &mut T) {
        *w -= self.real_alpha * g;
    }

    fn update_array(&self, g: &[T], w: &mut [T]) {
        ll_math::axpy(-self.real_alpha, g, w);
    }
}
