//! Tests for the optimizer kernels: reference values, lifecycle decay,
//! zero-gradient behavior and the dense/sparse drivers.

use deepx_core::optimizer::{
    clip_array, clip_srm, clip_tensor, grad_clip_threshold, AdaDelta, AdaGrad, Adam, Ftrl, Gftrl,
    Momentum, Optimizer, RmsProp, Sgd, UpdateRule0, UpdateRule1, UpdateRule2,
};
use deepx_core::tensor::{SharedSparseRowMatrix, SparseRowMatrix, Tensor};

// ============================================================================
// reference values
// ============================================================================

#[test]
fn test_ada_grad_scalar() {
    let opt = AdaGrad { alpha: 0.01, beta: 1e-5f64 };
    let mut w = 0.0;
    let mut n = 0.0;
    opt.update_scalar(1.0, &mut w, &mut n);
    assert_eq!(n, 1.0);
    assert!((w - (-0.01 / (1.0 + 1e-5f64).sqrt())).abs() < 1e-12);
    assert!((w + 0.009_999_950).abs() < 1e-8);
}

#[test]
fn test_ftrl_l1_clips_weight_to_zero() {
    let mut opt = Ftrl { alpha: 0.01, beta: 1.0, l1: 1.0, l2: 0.0, inv_alpha: 0.0 };
    opt.init();
    let mut w = 0.0f64;
    let mut n = 0.0;
    let mut z = 0.0;
    opt.update_scalar(0.5, &mut w, &mut n, &mut z);
    assert_eq!(w, 0.0);
    assert_eq!(z, 0.5);
    assert_eq!(n, 0.25);
}

#[test]
fn test_ftrl_past_l1() {
    let mut opt = Ftrl { alpha: 0.5, beta: 1.0, l1: 0.1, l2: 0.0, inv_alpha: 0.0 };
    opt.init();
    let mut w = 0.0f64;
    let mut n = 0.0;
    let mut z = 0.0;
    opt.update_scalar(1.0, &mut w, &mut n, &mut z);
    // z = 1, n = 1, w = (0.1 - 1) / ((1 + 1) * 2) = -0.225
    assert!((w + 0.225).abs() < 1e-12);
}

#[test]
fn test_sgd_decay_sequence() {
    let mut opt = Sgd {
        alpha: 1.0f64,
        min_alpha: 0.1,
        batch_decay: 2,
        batch_decay_rate: 0.5,
        real_batch: 0,
        real_alpha: 0.0,
    };
    opt.init();
    let mut seen = Vec::new();
    for _ in 0..4 {
        opt.post_batch();
        seen.push(opt.real_alpha);
    }
    assert_eq!(seen, vec![1.0, 0.5, 0.5, 0.25]);
}

#[test]
fn test_sgd_decay_floor() {
    let mut opt = Sgd {
        alpha: 1.0f64,
        min_alpha: 0.4,
        batch_decay: 1,
        batch_decay_rate: 0.5,
        real_batch: 0,
        real_alpha: 0.0,
    };
    opt.init();
    for _ in 0..5 {
        opt.post_batch();
    }
    assert_eq!(opt.real_alpha, 0.4);
}

#[test]
fn test_sgd_update() {
    let mut opt = Sgd::<f64> { batch_decay: 0, ..Sgd::default() };
    opt.init();
    let mut w = 1.0;
    opt.update_scalar(2.0, &mut w);
    assert!((w - (1.0 - 0.01 * 2.0)).abs() < 1e-12);
}

#[test]
fn test_adam_bias_correction() {
    let mut opt = Adam::<f64>::default();
    opt.init();
    opt.pre_batch();
    assert!((opt.rho1t - 0.9).abs() < 1e-12);
    assert!((opt.rho2t - 0.999).abs() < 1e-12);
    let expected = (1.0 - 0.999f64).sqrt() / (1.0 - 0.9) * 0.001;
    assert!((opt.rho_aux - expected).abs() < 1e-12);

    let mut w = 0.0;
    let mut m = 0.0;
    let mut v = 0.0;
    opt.update_scalar(1.0, &mut w, &mut m, &mut v);
    assert!((m - 0.1).abs() < 1e-12);
    assert!((v - 0.001).abs() < 1e-12);
    assert!(w < 0.0);
}

#[test]
fn test_momentum_accumulates_velocity() {
    let opt = Momentum { rho: 0.5f64, alpha: 0.1 };
    let mut w = 0.0;
    let mut v = 0.0;
    opt.update_scalar(1.0, &mut w, &mut v);
    assert_eq!(v, 1.0);
    assert!((w + 0.1).abs() < 1e-12);
    opt.update_scalar(1.0, &mut w, &mut v);
    assert_eq!(v, 1.5);
}

#[test]
fn test_gftrl_group_shrinkage() {
    let mut opt = Gftrl::<f64>::default();
    opt.init();
    // tiny gradients keep the group at exactly zero
    let g = [1e-7, 1e-7];
    let mut w = [0.5, 0.5];
    let mut n = [0.0, 0.0];
    let mut z = [0.0, 0.0];
    opt.update_array(&g, &mut w, &mut n, &mut z);
    assert_eq!(w, [0.0, 0.0]);

    // large gradients move the whole group off zero
    let g = [1.0, -1.0];
    opt.update_array(&g, &mut w, &mut n, &mut z);
    assert!(w.iter().all(|&v| v != 0.0));
}

// ============================================================================
// zero gradients
// ============================================================================

#[test]
fn test_zero_gradient_keeps_weight() {
    let w0 = 0.75f64;

    let mut sgd = Sgd::<f64> { batch_decay: 0, ..Sgd::default() };
    sgd.init();
    let mut w = w0;
    sgd.update_scalar(0.0, &mut w);
    assert_eq!(w, w0);

    let ada_grad = AdaGrad::<f64>::default();
    let (mut w, mut n) = (w0, 0.0);
    ada_grad.update_scalar(0.0, &mut w, &mut n);
    assert_eq!(w, w0);

    let mut rms_prop = RmsProp::<f64>::default();
    rms_prop.init();
    let (mut w, mut v) = (w0, 0.0);
    rms_prop.update_scalar(0.0, &mut w, &mut v);
    assert_eq!(w, w0);

    let momentum = Momentum::<f64>::default();
    let (mut w, mut v) = (w0, 0.0);
    momentum.update_scalar(0.0, &mut w, &mut v);
    assert_eq!(w, w0);

    let mut ada_delta = AdaDelta::<f64>::default();
    ada_delta.init();
    let (mut w, mut n, mut dw) = (w0, 0.0, 0.0);
    ada_delta.update_scalar(0.0, &mut w, &mut n, &mut dw);
    assert_eq!(w, w0);

    let mut adam = Adam::<f64>::default();
    adam.init();
    adam.pre_batch();
    let (mut w, mut m, mut v) = (w0, 0.0, 0.0);
    adam.update_scalar(0.0, &mut w, &mut m, &mut v);
    assert_eq!(w, w0);
}

// ============================================================================
// gradient clipping
// ============================================================================

#[test]
fn test_clip() {
    let threshold = grad_clip_threshold::<f32>();
    let mut g = [100.0f32, -100.0, 3.0];
    clip_array(&mut g);
    assert_eq!(g, [threshold, -threshold, 3.0]);

    let mut tensor = Tensor::from(vec![1000.0f32, -0.5]);
    clip_tensor(&mut tensor);
    assert_eq!(tensor.data(), &[threshold, -0.5]);

    let mut srm = SparseRowMatrix::<f32, u64>::from_rows(&[(1, &[-999.0, 2.0])]).unwrap();
    clip_srm(&mut srm);
    assert_eq!(srm.row(1).unwrap(), &[-threshold, 2.0]);
}

// ============================================================================
// drivers
// ============================================================================

#[test]
fn test_dense_driver_matches_scalar() {
    let ada_grad = AdaGrad::<f64>::default();
    let g = Tensor::from(vec![1.0f64, -2.0, 0.5]);
    let mut w = Tensor::from(vec![0.0f64; 3]);
    let mut n = Tensor::from(vec![0.0f64; 3]);
    ada_grad.update_dense(&g, &mut w, &mut n);

    for i in 0..3 {
        let (mut ws, mut ns) = (0.0, 0.0);
        ada_grad.update_scalar(g.data()[i], &mut ws, &mut ns);
        assert_eq!(w.data()[i], ws);
        assert_eq!(n.data()[i], ns);
    }
}

#[test]
fn test_dense_rows_driver() {
    let mut sgd = Sgd::<f64> { batch_decay: 0, ..Sgd::default() };
    sgd.init();
    let g = SparseRowMatrix::<f64, u64>::from_rows(&[(1, &[1.0, 1.0])]).unwrap();
    let mut w = Tensor::try_from(vec![vec![5.0f64, 5.0], vec![5.0, 5.0], vec![5.0, 5.0]]).unwrap();
    sgd.update_dense_rows(&g, &mut w);
    // only row 1 moved
    assert_eq!(w.data()[..2], [5.0, 5.0]);
    assert!((w.data()[2] - 4.99).abs() < 1e-12);
    assert_eq!(w.data()[4..], [5.0, 5.0]);
}

#[test]
fn test_sparse_driver_materializes_rows() {
    let ada_grad = AdaGrad::<f64>::default();
    let g = SparseRowMatrix::<f64, u64>::from_rows(&[(7, &[1.0]), (9, &[2.0])]).unwrap();
    let mut w = SparseRowMatrix::<f64, u64>::with_col(1);
    let mut n = SparseRowMatrix::<f64, u64>::with_col(1);
    ada_grad.update_sparse(&g, &mut w, &mut n);
    assert_eq!(w.len(), 2);
    assert_eq!(n.row(9).unwrap(), &[4.0]);
    assert!(w.row(7).unwrap()[0] < 0.0);
}

#[test]
fn test_shared_driver_matches_unshared() {
    let ada_grad = AdaGrad::<f64>::default();
    let g = SparseRowMatrix::<f64, u64>::from_rows(&[(1, &[1.0, 2.0]), (2, &[3.0, 4.0])]).unwrap();

    let mut w = SparseRowMatrix::<f64, u64>::with_col(2);
    let mut n = SparseRowMatrix::<f64, u64>::with_col(2);
    ada_grad.update_sparse(&g, &mut w, &mut n);

    let ws = SharedSparseRowMatrix::new(SparseRowMatrix::<f64, u64>::with_col(2));
    let ns = SharedSparseRowMatrix::new(SparseRowMatrix::<f64, u64>::with_col(2));
    ada_grad.update_sparse_shared(&g, &ws, &ns);

    assert_eq!(ws.into_inner(), w);
    assert_eq!(ns.into_inner(), n);
}

#[test]
fn test_shared_driver_multi_threaded() {
    // four threads updating disjoint rows of one shared parameter
    let mut sgd = Sgd::<f64> { batch_decay: 0, ..Sgd::default() };
    sgd.init();
    let w = SharedSparseRowMatrix::new(SparseRowMatrix::<f64, u64>::with_col(2));

    std::thread::scope(|scope| {
        for t in 0..4u64 {
            let (sgd, w) = (&sgd, &w);
            scope.spawn(move || {
                for i in 0..64 {
                    let id = t * 100 + i;
                    let g =
                        SparseRowMatrix::<f64, u64>::from_rows(&[(id, &[1.0, -1.0])]).unwrap();
                    sgd.update_sparse_shared(&g, w);
                }
            });
        }
    });

    let w = w.into_inner();
    assert_eq!(w.len(), 256);
    let row = w.row(103).unwrap();
    assert!((row[0] + 0.01).abs() < 1e-12);
    assert!((row[1] - 0.01).abs() < 1e-12);
}

#[test]
fn test_gftrl_dense_uses_scalar_groups() {
    let mut opt = Gftrl::<f64>::default();
    opt.init();
    let g = Tensor::from(vec![1.0f64, 1e-7]);
    let mut w = Tensor::from(vec![0.0f64; 2]);
    let mut n = Tensor::from(vec![0.0f64; 2]);
    let mut z = Tensor::from(vec![0.0f64; 2]);
    opt.update_dense(&g, &mut w, &mut n, &mut z);
    // elements are independent groups: the large gradient moves its
    // weight, the tiny one stays shrunk to zero
    assert!(w.data()[0] != 0.0);
    assert_eq!(w.data()[1], 0.0);
}
