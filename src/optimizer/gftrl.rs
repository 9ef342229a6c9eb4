//! Submodule providing the group-sparse FTRL update rule.

use crate::{
    math::{ll_math, Real},
    optimizer::{Optimizer, UpdateRule2},
    tensor::Tensor,
};

/// Group FTRL: FTRL accumulators per element, with the shrinkage
/// decision taken over a whole parameter group (one sparse row).
///
/// Groups whose `z` norm stays below `lambda * sqrt(N)` are zeroed as
/// a unit, producing row-level sparsity.
#[derive(Debug, Clone, PartialEq)]
pub struct Gftrl<T> {
    /// Learning-rate scale.
    pub alpha: T,
    /// Learning-rate smoothing.
    pub beta: T,
    /// Group regularization strength.
    pub lambda: T,
    /// `1 / alpha`; derived by [`Optimizer::init`].
    pub inv_alpha: T,
}

impl<T: Real> Default for Gftrl<T> {
    fn default() -> Self {
        Self {
            alpha: T::from_f64(0.1),
            beta: T::from_f64(0.01),
            lambda: T::from_f64(1e-4),
            inv_alpha: T::zero(),
        }
    }
}

impl<T: Real> Optimizer for Gftrl<T> {
    fn init(&mut self) {
        self.inv_alpha = T::one() / self.alpha;
    }
}

impl<T: Real> UpdateRule2<T> for Gftrl<T> {
    /// Single-element group: the threshold degenerates to `lambda`.
    fn update_scalar(&self, g: T, w: &mut T, n: &mut T, z: &mut T) {
        let new_n = *n + g * g;
        let sqrt_n = n.sqrt();
        let sqrt_new_n = new_n.sqrt();
        let sigma = (sqrt_n - sqrt_new_n) * self.inv_alpha;
        let new_z = *z + g + sigma * *w;
        *z = new_z;
        *n = new_n;

        let norm2_z = new_z.abs();
        let threshold = self.lambda;
        if norm2_z < threshold {
            *w = T::zero();
        } else {
            let tmp = self.alpha * (threshold / norm2_z - T::one());
            *w = tmp * new_z / (self.beta + sqrt_new_n);
        }
    }

    /// Whole-group update over a row of length `N`.
    fn update_array(&self, g: &[T], w: &mut [T], n: &mut [T], z: &mut [T]) {
        debug_assert_eq!(g.len(), w.len());
        debug_assert_eq!(g.len(), n.len());
        debug_assert_eq!(g.len(), z.len());
        for (i, &gi) in g.iter().enumerate() {
            let new_n = n[i] + gi * gi;
            let sqrt_n = n[i].sqrt();
            let sqrt_new_n = new_n.sqrt();
            let sigma = (sqrt_n - sqrt_new_n) * self.inv_alpha;
            let new_z = z[i] + gi + sigma * w[i];
            z[i] = new_z;
            n[i] = new_n;
        }

        let norm2_z = ll_math::norm2(z);
        let threshold = self.lambda * T::from_usize(g.len()).sqrt();
        if norm2_z < threshold {
            for wi in w.iter_mut() {
                *wi = T::zero();
            }
        } else {
            let tmp = self.alpha * (threshold / norm2_z - T::one());
            for (i, wi) in w.iter_mut().enumerate() {
                *wi = tmp * z[i] / (self.beta + n[i].sqrt());
            }
        }
    }

    /// Dense parameters carry no group structure, so every element is
    /// its own group.
    fn update_dense(&self, g: &Tensor<T>, w: &mut Tensor<T>, a: &mut Tensor<T>, b: &mut Tensor<T>) {
        assert!(
            g.total_dim() == w.total_dim()
                && g.total_dim() == a.total_dim()
                && g.total_dim() == b.total_dim(),
            "inconsistent total dim: {} vs {} vs {} vs {}",
            g.total_dim(),
            w.total_dim(),
            a.total_dim(),
            b.total_dim()
        );
        let wdata = w.data_mut();
        let adata = a.data_mut();
        let bdata = b.data_mut();
        for (i, &gi) in g.data().iter().enumerate() {
            self.update_scalar(gi, &mut wdata[i], &mut adata[i], &mut bdata[i]);
        }
    }
}
