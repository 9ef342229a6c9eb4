//! Submodule providing the per-parameter optimizer kernels.
//!
//! Every rule is a value type carrying its hyper-parameters and the
//! derived per-step state. The lifecycle is [`Optimizer::init`] once
//! after configuration, then [`Optimizer::pre_batch`] /
//! [`Optimizer::post_batch`] around every mini batch. The update
//! surface is layered by the number of per-parameter slot buffers the
//! rule maintains alongside the weight: [`UpdateRule0`] (none),
//! [`UpdateRule1`] (one) and [`UpdateRule2`] (two), each providing
//! scalar, array, dense and sparse drivers, plus lock-guarded sparse
//! drivers for Hogwild-style training.

pub mod ada_delta;
pub mod ada_grad;
pub mod adam;
pub mod ftrl;
pub mod gftrl;
pub mod momentum;
pub mod rms_prop;
pub mod sgd;

pub use ada_delta::AdaDelta;
pub use ada_grad::AdaGrad;
pub use adam::Adam;
pub use ftrl::Ftrl;
pub use gftrl::Gftrl;
pub use momentum::Momentum;
pub use rms_prop::RmsProp;
pub use sgd::Sgd;

use crate::{
    math::Real,
    tensor::{RowKey, SharedSparseRowMatrix, SparseRowMatrix, Tensor},
};

/// The smoothing constant shared by the adaptive rules.
pub fn smooth<T: Real>() -> T {
    T::from_f64(1e-5)
}

/// The gradient clipping threshold.
pub fn grad_clip_threshold<T: Real>() -> T {
    T::from_i32(20)
}

/// Clamps one gradient element to the clipping threshold.
pub fn clip_scalar<T: Real>(g: &mut T) {
    let threshold = grad_clip_threshold::<T>();
    if *g > threshold {
        *g = threshold;
    } else if *g < -threshold {
        *g = -threshold;
    }
}

/// Clamps every gradient element to the clipping threshold.
pub fn clip_array<T: Real>(g: &mut [T]) {
    for v in g.iter_mut() {
        clip_scalar(v);
    }
}

/// Clamps a dense gradient to the clipping threshold.
pub fn clip_tensor<T: Real>(g: &mut Tensor<T>) {
    clip_array(g.data_mut());
}

/// Clamps a sparse gradient to the clipping threshold.
pub fn clip_srm<T: Real, I: RowKey>(g: &mut SparseRowMatrix<T, I>) {
    for (_, row) in g.iter_mut() {
        clip_array(row);
    }
}

/// Optimizer lifecycle shared by every update rule.
pub trait Optimizer {
    /// Precomputes derived constants after the hyper-parameters have
    /// been set.
    fn init(&mut self) {}

    /// Advances per-batch state before a mini batch.
    fn pre_batch(&mut self) {}

    /// Advances per-batch state after a mini batch.
    fn post_batch(&mut self) {}
}

#[track_caller]
fn check_dense_rows<T: Real>(col: usize, w: &Tensor<T>) -> (usize, usize) {
    assert!(w.is_rank(2), "expected a rank-2 shape, got {}", w.shape());
    let m = w.dim(0);
    let n = w.dim(1);
    assert!(col == n, "inconsistent col: {col} vs {n}");
    (m, n)
}

/// An update rule with no slot buffer besides the weight.
pub trait UpdateRule0<T: Real>: Optimizer {
    /// Updates one weight from one gradient element.
    fn update_scalar(&self, g: T, w: &mut T);

    /// Updates a contiguous run of weights.
    fn update_array(&self, g: &[T], w: &mut [T]) {
        debug_assert_eq!(g.len(), w.len());
        for (gi, wi) in g.iter().zip(w) {
            self.update_scalar(*gi, wi);
        }
    }

    /// Dense gradient, dense parameter.
    ///
    /// # Panics
    ///
    /// Panics when the total dims disagree.
    fn update_dense(&self, g: &Tensor<T>, w: &mut Tensor<T>) {
        assert!(
            g.total_dim() == w.total_dim(),
            "inconsistent total dim: {} vs {}",
            g.total_dim(),
            w.total_dim()
        );
        self.update_array(g.data(), w.data_mut());
    }

    /// Sparse gradient, dense parameter: each gradient row updates the
    /// parameter row addressed by its id.
    ///
    /// # Panics
    ///
    /// Panics when `w` is not rank 2, the column counts disagree, or a
    /// row id is out of range.
    fn update_dense_rows<I: RowKey>(&self, g: &SparseRowMatrix<T, I>, w: &mut Tensor<T>) {
        let (m, n) = check_dense_rows(g.col(), w);
        let data = w.data_mut();
        if n == 1 {
            for (id, grow) in g.iter() {
                let i = id.as_();
                assert!(i < m, "row id {id} out of range for {m} rows");
                self.update_scalar(grow[0], &mut data[i]);
            }
        } else {
            for (id, grow) in g.iter() {
                let i = id.as_();
                assert!(i < m, "row id {id} out of range for {m} rows");
                self.update_array(grow, &mut data[i * n..(i + 1) * n]);
            }
        }
    }

    /// Sparse gradient, sparse parameter; absent parameter rows are
    /// materialized as zeros.
    ///
    /// # Panics
    ///
    /// Panics when the column counts disagree.
    fn update_sparse<I: RowKey>(&self, g: &SparseRowMatrix<T, I>, w: &mut SparseRowMatrix<T, I>) {
        let n = g.col();
        assert!(w.col() == n, "inconsistent col: {} vs {n}", w.col());
        if n == 1 {
            for (id, grow) in g.iter() {
                self.update_scalar(grow[0], w.get_scalar_no_init(id));
            }
        } else {
            for (id, grow) in g.iter() {
                self.update_array(grow, w.get_row_no_init(id));
            }
        }
    }

    /// Lock-guarded [`Self::update_sparse`]: row lookup takes the
    /// matrix's reader lock, row creation its writer lock. Value writes
    /// may race with other threads, which the training algorithm
    /// tolerates.
    ///
    /// # Panics
    ///
    /// Panics when the column counts disagree.
    fn update_sparse_shared<I: RowKey>(
        &self,
        g: &SparseRowMatrix<T, I>,
        w: &SharedSparseRowMatrix<T, I>,
    ) {
        let n = g.col();
        assert!(w.col() == n, "inconsistent col: {} vs {n}", w.col());
        for (id, grow) in g.iter() {
            let wp = w.get_row_no_init(id);
            // SAFETY: the pointer addresses n values kept alive and in
            // place by the shared matrix; racing value writes are part
            // of its contract.
            let wrow = unsafe { core::slice::from_raw_parts_mut(wp, n) };
            self.update_array(grow, wrow);
        }
    }
}

/// An update rule with one slot buffer besides the weight.
pub trait UpdateRule1<T: Real>: Optimizer {
    /// Updates one weight and its slot from one gradient element.
    fn update_scalar(&self, g: T, w: &mut T, a: &mut T);

    /// Updates a contiguous run of weights and slots.
    fn update_array(&self, g: &[T], w: &mut [T], a: &mut [T]) {
        debug_assert_eq!(g.len(), w.len());
        debug_assert_eq!(g.len(), a.len());
        for (i, (gi, wi)) in g.iter().zip(w).enumerate() {
            self.update_scalar(*gi, wi, &mut a[i]);
        }
    }

    /// Dense gradient, dense parameter.
    ///
    /// # Panics
    ///
    /// Panics when the total dims disagree.
    fn update_dense(&self, g: &Tensor<T>, w: &mut Tensor<T>, a: &mut Tensor<T>) {
        assert!(
            g.total_dim() == w.total_dim() && g.total_dim() == a.total_dim(),
            "inconsistent total dim: {} vs {} vs {}",
            g.total_dim(),
            w.total_dim(),
            a.total_dim()
        );
        self.update_array(g.data(), w.data_mut(), a.data_mut());
    }

    /// Sparse gradient, dense parameter.
    ///
    /// # Panics
    ///
    /// Panics when `w` is not rank 2, the shapes disagree, or a row id
    /// is out of range.
    fn update_dense_rows<I: RowKey>(
        &self,
        g: &SparseRowMatrix<T, I>,
        w: &mut Tensor<T>,
        a: &mut Tensor<T>,
    ) {
        let (m, n) = check_dense_rows(g.col(), w);
        assert!(w.same_shape(a), "inconsistent shapes: {} vs {}", w.shape(), a.shape());
        let wdata = w.data_mut();
        let adata = a.data_mut();
        for (id, grow) in g.iter() {
            let i = id.as_();
            assert!(i < m, "row id {id} out of range for {m} rows");
            self.update_array(grow, &mut wdata[i * n..(i + 1) * n], &mut adata[i * n..(i + 1) * n]);
        }
    }

    /// Sparse gradient, sparse parameter.
    ///
    /// # Panics
    ///
    /// Panics when the column counts disagree.
    fn update_sparse<I: RowKey>(
        &self,
        g: &SparseRowMatrix<T, I>,
        w: &mut SparseRowMatrix<T, I>,
        a: &mut SparseRowMatrix<T, I>,
    ) {
        let n = g.col();
        assert!(w.col() == n, "inconsistent col: {} vs {n}", w.col());
        assert!(a.col() == n, "inconsistent col: {} vs {n}", a.col());
        for (id, grow) in g.iter() {
            self.update_array(grow, w.get_row_no_init(id), a.get_row_no_init(id));
        }
    }

    /// Lock-guarded [`Self::update_sparse`], one lock per matrix.
    ///
    /// # Panics
    ///
    /// Panics when the column counts disagree.
    fn update_sparse_shared<I: RowKey>(
        &self,
        g: &SparseRowMatrix<T, I>,
        w: &SharedSparseRowMatrix<T, I>,
        a: &SharedSparseRowMatrix<T, I>,
    ) {
        let n = g.col();
        assert!(w.col() == n, "inconsistent col: {} vs {n}", w.col());
        assert!(a.col() == n, "inconsistent col: {} vs {n}", a.col());
        for (id, grow) in g.iter() {
            let wp = w.get_row_no_init(id);
            let ap = a.get_row_no_init(id);
            // SAFETY: both pointers address n values kept alive and in
            // place by their shared matrices; racing value writes are
            // part of the contract.
            let (wrow, arow) = unsafe {
                (
                    core::slice::from_raw_parts_mut(wp, n),
                    core::slice::from_raw_parts_mut(ap, n),
                )
            };
            self.update_array(grow, wrow, arow);
        }
    }
}

/// An update rule with two slot buffers besides the weight.
pub trait UpdateRule2<T: Real>: Optimizer {
    /// Updates one weight and its slots from one gradient element.
    fn update_scalar(&self, g: T, w: &mut T, a: &mut T, b: &mut T);

    /// Updates a contiguous run of weights and slots.
    fn update_array(&self, g: &[T], w: &mut [T], a: &mut [T], b: &mut [T]) {
        debug_assert_eq!(g.len(), w.len());
        debug_assert_eq!(g.len(), a.len());
        debug_assert_eq!(g.len(), b.len());
        for (i, (gi, wi)) in g.iter().zip(w).enumerate() {
            self.update_scalar(*gi, wi, &mut a[i], &mut b[i]);
        }
    }

    /// Dense gradient, dense parameter.
    ///
    /// # Panics
    ///
    /// Panics when the total dims disagree.
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
        self.update_array(g.data(), w.data_mut(), a.data_mut(), b.data_mut());
    }

    /// Sparse gradient, dense parameter.
    ///
    /// # Panics
    ///
    /// Panics when `w` is not rank 2, the shapes disagree, or a row id
    /// is out of range.
    fn update_dense_rows<I: RowKey>(
        &self,
        g: &SparseRowMatrix<T, I>,
        w: &mut Tensor<T>,
        a: &mut Tensor<T>,
        b: &mut Tensor<T>,
    ) {
        let (m, n) = check_dense_rows(g.col(), w);
        assert!(w.same_shape(a), "inconsistent shapes: {} vs {}", w.shape(), a.shape());
        assert!(w.same_shape(b), "inconsistent shapes: {} vs {}", w.shape(), b.shape());
        let wdata = w.data_mut();
        let adata = a.data_mut();
        let bdata = b.data_mut();
        for (id, grow) in g.iter() {
            let i = id.as_();
            assert!(i < m, "row id {id} out of range for {m} rows");
            let range = i * n..(i + 1) * n;
            self.update_array(
                grow,
                &mut wdata[range.clone()],
                &mut adata[range.clone()],
                &mut bdata[range],
            );
        }
    }

    /// Sparse gradient, sparse parameter.
    ///
    /// # Panics
    ///
    /// Panics when the column counts disagree.
    fn update_sparse<I: RowKey>(
        &self,
        g: &SparseRowMatrix<T, I>,
        w: &mut SparseRowMatrix<T, I>,
        a: &mut SparseRowMatrix<T, I>,
        b: &mut SparseRowMatrix<T, I>,
    ) {
        let n = g.col();
        assert!(w.col() == n, "inconsistent col: {} vs {n}", w.col());
        assert!(a.col() == n, "inconsistent col: {} vs {n}", a.col());
        assert!(b.col() == n, "inconsistent col: {} vs {n}", b.col());
        for (id, grow) in g.iter() {
            self.update_array(
                grow,
                w.get_row_no_init(id),
                a.get_row_no_init(id),
                b.get_row_no_init(id),
            );
        }
    }

    /// Lock-guarded [`Self::update_sparse`], one lock per matrix.
    ///
    /// # Panics
    ///
    /// Panics when the column counts disagree.
    fn update_sparse_shared<I: RowKey>(
        &self,
        g: &SparseRowMatrix<T, I>,
        w: &SharedSparseRowMatrix<T, I>,
        a: &SharedSparseRowMatrix<T, I>,
        b: &SharedSparseRowMatrix<T, I>,
    ) {
        let n = g.col();
        assert!(w.col() == n, "inconsistent col: {} vs {n}", w.col());
        assert!(a.col() == n, "inconsistent col: {} vs {n}", a.col());
        assert!(b.col() == n, "inconsistent col: {} vs {n}", b.col());
        for (id, grow) in g.iter() {
            let wp = w.get_row_no_init(id);
            let ap = a.get_row_no_init(id);
            let bp = b.get_row_no_init(id);
            // SAFETY: the pointers address n values kept alive and in
            // place by their shared matrices; racing value writes are
            // part of the contract.
            let (wrow, arow, brow) = unsafe {
                (
                    core::slice::from_raw_parts_mut(wp, n),
                    core::slice::from_raw_parts_mut(ap, n),
                    core::slice::from_raw_parts_mut(bp, n),
                )
            };
            self.update_array(grow, wrow, arow, brow);
        }
    }
}
