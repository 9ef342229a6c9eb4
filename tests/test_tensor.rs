//! Tests for the dense tensor: lifecycle, views, statistics and random
//! initializers.

use deepx_core::tensor::{Initializer, Tensor};
use rand::{rngs::SmallRng, SeedableRng};

// ============================================================================
// lifecycle
// ============================================================================

#[test]
fn test_null_tensor() {
    let tensor = Tensor::<f32>::new();
    assert!(tensor.is_null());
    assert_eq!(tensor.total_dim(), 0);
    assert_eq!(tensor.rank(), 0);
}

#[test]
fn test_resize() {
    let mut tensor = Tensor::<f32>::new();
    tensor.resize(&[2, 3]).unwrap();
    assert!(!tensor.is_null());
    assert_eq!(tensor.total_dim(), 6);
    assert_eq!(tensor.data(), &[0.0; 6]);

    tensor.resize(&[4]).unwrap();
    assert_eq!(tensor.total_dim(), 4);
}

#[test]
fn test_from_vec_and_literals() {
    let tensor = Tensor::from(vec![1.0f32, 2.0, 3.0]);
    assert_eq!(tensor.rank(), 1);
    assert_eq!(tensor.dim(0), 3);

    let matrix = Tensor::<f32>::try_from(vec![vec![1.0f32, 2.0], vec![3.0, 4.0]]).unwrap();
    assert_eq!(matrix.shape().dims(), &[2, 2]);
    assert_eq!(matrix.data(), &[1.0, 2.0, 3.0, 4.0]);

    // ragged rows are rejected
    assert!(Tensor::<f32>::try_from(vec![vec![1.0f32], vec![2.0, 3.0]]).is_err());
}

#[test]
fn test_reshape_preserves_data() {
    let mut tensor = Tensor::from(vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0]);
    tensor.reshape(&[2, -1]).unwrap();
    assert_eq!(tensor.shape().dims(), &[2, 3]);
    assert_eq!(tensor.data(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert!(tensor.reshape(&[4, 2]).is_err());
}

#[test]
fn test_set_data() {
    let mut tensor = Tensor::<f32>::from_shape(&[3]).unwrap();
    tensor.set_data(&[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(tensor.data(), &[1.0, 2.0, 3.0]);
    assert!(tensor.set_data(&[1.0, 2.0]).is_err());

    let other = Tensor::from(vec![7.0f32, 8.0, 9.0]);
    tensor.set_data_from(&other).unwrap();
    assert_eq!(tensor.data(), &[7.0, 8.0, 9.0]);
}

#[test]
fn test_equality() {
    let a = Tensor::from(vec![1.0f32, 2.0]);
    let b = Tensor::from(vec![1.0f32, 2.0]);
    let mut c = Tensor::from(vec![1.0f32, 2.0]);
    c.reshape(&[1, 2]).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

// ============================================================================
// views
// ============================================================================

#[test]
fn test_slice_view() {
    let mut tensor = Tensor::<f32>::from_shape(&[2, 3]).unwrap();
    tensor.set_data(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

    let row = tensor.slice(1);
    assert_eq!(row.rank(), 1);
    assert_eq!(row.dim(0), 3);
    assert_eq!(row.data(), &[3.0, 4.0, 5.0]);
    assert!(row.is_borrowed());

    let whole = tensor.view();
    assert_eq!(whole, tensor);
}

#[test]
fn test_slice_mut() {
    let mut tensor = Tensor::<f32>::from_shape(&[2, 2]).unwrap();
    tensor.slice_mut(0).copy_from_slice(&[1.0, 2.0]);
    tensor.slice_mut(1).copy_from_slice(&[3.0, 4.0]);
    assert_eq!(tensor.data(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
#[should_panic(expected = "invalid slice index")]
fn test_slice_out_of_range() {
    let tensor = Tensor::<f32>::from_shape(&[2, 3]).unwrap();
    let _ = tensor.slice(2);
}

// ============================================================================
// fills and statistics
// ============================================================================

#[test]
fn test_fills() {
    let mut tensor = Tensor::<f32>::from_shape(&[4]).unwrap();
    tensor.arange();
    assert_eq!(tensor.data(), &[0.0, 1.0, 2.0, 3.0]);
    tensor.constant(2.5);
    assert_eq!(tensor.data(), &[2.5; 4]);
    tensor.ones();
    assert_eq!(tensor.data(), &[1.0; 4]);
    tensor.zeros();
    assert_eq!(tensor.data(), &[0.0; 4]);

    let mut ints = Tensor::<i64>::from_shape(&[3]).unwrap();
    ints.arange();
    assert_eq!(ints.data(), &[0, 1, 2]);
    assert_eq!(ints.sum(), 3);
}

#[test]
fn test_statistics() {
    let tensor = Tensor::from(vec![1.0f64, -2.0, 3.0, -4.0]);
    assert_eq!(tensor.sum(), -2.0);
    assert_eq!(tensor.mean(), -0.5);
    assert_eq!(tensor.asum(), 10.0);
    assert_eq!(tensor.amean(), 2.5);
    assert!((tensor.var() - 6.25).abs() < 1e-12);
    assert!((tensor.std() - 2.5).abs() < 1e-12);

    let empty = Tensor::<f64>::new();
    assert_eq!(empty.mean(), 0.0);
    assert_eq!(empty.var(), 0.0);
}

// ============================================================================
// random initializers
// ============================================================================

#[test]
fn test_rand_bounds() {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut tensor = Tensor::<f32>::from_shape(&[1000]).unwrap();
    tensor.rand(&mut rng, -2.0, 3.0);
    assert!(tensor.iter().all(|&v| (-2.0..3.0).contains(&v)));
    // the sample mean is near the midpoint
    assert!((tensor.mean() - 0.5).abs() < 0.2);
}

#[test]
fn test_randn_moments() {
    let mut rng = SmallRng::seed_from_u64(2);
    let mut tensor = Tensor::<f64>::from_shape(&[10000]).unwrap();
    tensor.randn(&mut rng, 1.0, 2.0);
    assert!((tensor.mean() - 1.0).abs() < 0.1);
    assert!((tensor.std() - 2.0).abs() < 0.1);
}

#[test]
fn test_rand_int() {
    let mut rng = SmallRng::seed_from_u64(3);
    let mut tensor = Tensor::<f32>::from_shape(&[500]).unwrap();
    tensor.rand_int(&mut rng, 0, 4);
    assert!(tensor.iter().all(|&v| v == 0.0 || v == 1.0 || v == 2.0 || v == 3.0));
}

#[test]
fn test_variance_scaling_bounds() {
    let mut rng = SmallRng::seed_from_u64(4);
    let mut tensor = Tensor::<f32>::from_shape(&[16, 8]).unwrap();
    // LeCun uniform stays within sqrt(3 / fan_in)
    let limit = (3.0f32 / 16.0).sqrt();
    tensor.rand_lecun(&mut rng);
    assert!(tensor.iter().all(|&v| v.abs() <= limit));

    // He normal is truncated at two standard deviations
    let stddev = (2.0f32 / 16.0).sqrt();
    tensor.randn_he(&mut rng);
    assert!(tensor.iter().all(|&v| v.abs() <= 2.0 * stddev));
}

#[test]
#[should_panic(expected = "rank-2")]
fn test_variance_scaling_requires_rank2() {
    let mut rng = SmallRng::seed_from_u64(5);
    let mut tensor = Tensor::<f32>::from_shape(&[8]).unwrap();
    tensor.rand_xavier(&mut rng);
}

#[test]
fn test_rand_init_dispatch() {
    let mut rng = SmallRng::seed_from_u64(6);
    let mut tensor = Tensor::<f32>::from_shape(&[8]).unwrap();

    tensor.rand_init(&mut rng, Initializer::Constant(4.0));
    assert_eq!(tensor.data(), &[4.0; 8]);

    tensor.rand_init(&mut rng, Initializer::Arange);
    assert_eq!(tensor.data()[7], 7.0);

    tensor.rand_init(&mut rng, Initializer::Rand { min: 0.0, max: 1.0 });
    assert!(tensor.iter().all(|&v| (0.0..1.0).contains(&v)));
}

#[test]
fn test_initializer_validation() {
    assert!(Initializer::Rand { min: 1.0f32, max: 0.0 }.validate().is_err());
    assert!(Initializer::Randn { mean: 0.0f32, stddev: -1.0 }.validate().is_err());
    assert!(Initializer::Rand { min: 0.0f32, max: 1.0 }.validate().is_ok());
    assert!(Initializer::<f32>::from_parts(99, 0.0, 0.0).is_err());

    let init = Initializer::Randn { mean: 0.5f32, stddev: 2.0 };
    let (p1, p2) = init.params();
    let rebuilt = Initializer::from_parts(init.kind(), p1, p2).unwrap();
    assert_eq!(init, rebuilt);
}
