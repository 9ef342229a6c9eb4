//! Tests for the mixed-sparsity products.

use deepx_core::math::ll_sparse;
use deepx_core::tensor::{CsrMatrix, SparseRowMatrix, Tensor};

// ============================================================================
// scatter add
// ============================================================================

#[test]
fn test_add_srm_into_tensor() {
    let x = SparseRowMatrix::<f32, u64>::from_rows(&[(0, &[1.0, 2.0]), (2, &[3.0, 4.0])]).unwrap();
    let mut y = Tensor::<f32>::from_shape(&[3, 2]).unwrap();
    y.ones();

    ll_sparse::add_srm(&x, 1, &mut y);
    assert_eq!(y.data(), &[2.0, 3.0, 1.0, 1.0, 4.0, 5.0]);

    ll_sparse::add_srm(&x, 0, &mut y);
    assert_eq!(y.data(), &[1.0, 2.0, 0.0, 0.0, 3.0, 4.0]);
}

#[test]
fn test_add_srm_scalar_col() {
    let x = SparseRowMatrix::<f32, u64>::from_rows(&[(1, &[5.0])]).unwrap();
    let mut y = Tensor::<f32>::from_shape(&[2, 1]).unwrap();
    ll_sparse::add_srm(&x, 0, &mut y);
    assert_eq!(y.data(), &[0.0, 5.0]);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_add_srm_out_of_range() {
    let x = SparseRowMatrix::<f32, u64>::from_rows(&[(9, &[1.0])]).unwrap();
    let mut y = Tensor::<f32>::from_shape(&[2, 1]).unwrap();
    ll_sparse::add_srm(&x, 0, &mut y);
}

// ============================================================================
// gesmm_mod: CSR x dense, modulo table size
// ============================================================================

#[test]
fn test_gesmm_mod() {
    // one row with feature ids 5 and 7 against a 4-row table: the ids
    // address rows 1 and 3
    let x = CsrMatrix::<f32, u64>::from_rows(&[&[(5, 1.0), (7, 2.0)]]);
    let y = Tensor::try_from(vec![
        vec![0.0f32, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 0.0],
        vec![2.0, 2.0],
    ])
    .unwrap();
    let mut z = Tensor::<f32>::from_shape(&[1, 2]).unwrap();
    ll_sparse::gesmm_mod(&x, &y, 0, &mut z);
    assert_eq!(z.data(), &[5.0, 5.0]);

    // beta = 1 accumulates
    ll_sparse::gesmm_mod(&x, &y, 1, &mut z);
    assert_eq!(z.data(), &[10.0, 10.0]);
}

#[test]
fn test_gesmm_mod_scalar_col() {
    let x = CsrMatrix::<f32, u64>::from_rows(&[&[(0, 1.0)], &[(1, 3.0)]]);
    let y = Tensor::try_from(vec![vec![2.0f32], vec![4.0]]).unwrap();
    let mut z = Tensor::<f32>::from_shape(&[2, 1]).unwrap();
    ll_sparse::gesmm_mod(&x, &y, 0, &mut z);
    assert_eq!(z.data(), &[2.0, 12.0]);
}

// ============================================================================
// gesmsm: CSR x SRM
// ============================================================================

#[test]
fn test_gesmsm() {
    let x = CsrMatrix::<f32, u64>::from_rows(&[&[(7, 1.0), (3, 2.0)]]);
    let y = SparseRowMatrix::<f32, u64>::from_rows(&[(7, &[1.0, 1.0]), (3, &[2.0, 2.0])]).unwrap();
    let mut z = Tensor::<f32>::from_shape(&[1, 2]).unwrap();
    ll_sparse::gesmsm(&x, &y, 0, &mut z);
    assert_eq!(z.data(), &[5.0, 5.0]);
}

#[test]
fn test_gesmsm_absent_rows_contribute_zero() {
    let x = CsrMatrix::<f32, u64>::from_rows(&[&[(7, 1.0), (99, 100.0)]]);
    let y = SparseRowMatrix::<f32, u64>::from_rows(&[(7, &[1.0, 2.0])]).unwrap();
    let mut z = Tensor::<f32>::from_shape(&[1, 2]).unwrap();
    ll_sparse::gesmsm(&x, &y, 0, &mut z);
    assert_eq!(z.data(), &[1.0, 2.0]);
}

#[test]
fn test_gesmsm_scalar_col() {
    let x = CsrMatrix::<f32, u64>::from_rows(&[&[(1, 2.0), (2, 3.0)]]);
    let y = SparseRowMatrix::<f32, u64>::from_rows(&[(1, &[10.0]), (2, &[20.0])]).unwrap();
    let mut z = Tensor::<f32>::from_shape(&[1, 1]).unwrap();
    ll_sparse::gesmsm(&x, &y, 0, &mut z);
    assert_eq!(z.data(), &[80.0]);
}

// ============================================================================
// gestmm: transposed CSR x dense into SRM
// ============================================================================

#[test]
fn test_gestmm() {
    // two batch rows; feature 7 appears in both
    let x = CsrMatrix::<f32, u64>::from_rows(&[&[(7, 1.0)], &[(7, 2.0), (3, 1.0)]]);
    let y = Tensor::try_from(vec![vec![1.0f32, 10.0], vec![2.0, 20.0]]).unwrap();
    let mut z = SparseRowMatrix::<f32, u64>::with_col(2);
    ll_sparse::gestmm(&x, &y, 0, &mut z);
    assert_eq!(z.len(), 2);
    assert_eq!(z.row(7).unwrap(), &[5.0, 50.0]);
    assert_eq!(z.row(3).unwrap(), &[2.0, 20.0]);
}

#[test]
fn test_gestmm_mod() {
    let x = CsrMatrix::<f32, u64>::from_rows(&[&[(10, 1.0)]]);
    let y = Tensor::try_from(vec![vec![3.0f32]]).unwrap();
    let mut z = SparseRowMatrix::<f32, u64>::with_col(1);
    // 10 % 4 = 2
    ll_sparse::gestmm_mod(4, &x, &y, 0, &mut z);
    assert_eq!(z.len(), 1);
    assert_eq!(z.row(2).unwrap(), &[3.0]);
}

#[test]
fn test_gestmm_beta_zero_drops_rows() {
    let x = CsrMatrix::<f32, u64>::from_rows(&[&[(1, 1.0)]]);
    let y = Tensor::try_from(vec![vec![1.0f32]]).unwrap();
    let mut z = SparseRowMatrix::<f32, u64>::from_rows(&[(8, &[9.0])]).unwrap();
    ll_sparse::gestmm(&x, &y, 0, &mut z);
    assert!(z.row(8).is_none());
    assert_eq!(z.row(1).unwrap(), &[1.0]);
}

// ============================================================================
// add_to / scale
// ============================================================================

#[test]
fn test_add_to() {
    let x = Tensor::from(vec![1.0f32, 2.0]);
    let mut z = Tensor::from(vec![10.0f32, 20.0]);
    ll_sparse::add_to_tensor(&x, &mut z);
    assert_eq!(z.data(), &[11.0, 22.0]);

    let xs = SparseRowMatrix::<f32, u64>::from_rows(&[(1, &[1.0]), (2, &[2.0])]).unwrap();
    let mut zs = SparseRowMatrix::<f32, u64>::from_rows(&[(1, &[10.0])]).unwrap();
    ll_sparse::add_to_srm(&xs, &mut zs);
    assert_eq!(zs.row(1).unwrap(), &[11.0]);
    assert_eq!(zs.row(2).unwrap(), &[2.0]);
}

#[test]
fn test_scale() {
    let mut z = Tensor::from(vec![2.0f32, 4.0]);
    ll_sparse::scale_tensor(0.5, &mut z);
    assert_eq!(z.data(), &[1.0, 2.0]);

    let mut zs = SparseRowMatrix::<f32, u64>::from_rows(&[(1, &[2.0, 4.0])]).unwrap();
    ll_sparse::scale_srm(0.25, &mut zs);
    assert_eq!(zs.row(1).unwrap(), &[0.5, 1.0]);
}

#[test]
#[should_panic(expected = "invalid beta")]
fn test_invalid_beta() {
    let x = SparseRowMatrix::<f32, u64>::with_col(1);
    let mut y = Tensor::<f32>::from_shape(&[1, 1]).unwrap();
    ll_sparse::add_srm(&x, 2, &mut y);
}
