//! Tests for the CSR mini-batch matrix and the feature-id encoding.

use deepx_core::tensor::{group_id, make_feature_id, sub_feature_id, CsrMatrix};

// ============================================================================
// construction and iteration
// ============================================================================

#[test]
fn test_empty() {
    let csr = CsrMatrix::<f32, u64>::new();
    assert_eq!(csr.rows(), 0);
    assert_eq!(csr.non_zeros(), 0);
    assert!(csr.is_empty());
    assert_eq!(csr.offsets(), &[0]);
}

#[test]
fn test_builder() {
    let mut csr = CsrMatrix::<f32, u64>::with_capacity(2, 3);
    csr.emplace(10, 1.0);
    csr.emplace(20, 2.0);
    csr.commit_row();
    csr.commit_row(); // an empty row
    csr.emplace(30, 3.0);
    csr.commit_row();

    assert_eq!(csr.rows(), 3);
    assert_eq!(csr.non_zeros(), 3);
    assert_eq!(csr.offsets(), &[0, 2, 2, 3]);
    assert_eq!(csr.col_ids(), &[10, 20, 30]);
    assert_eq!(csr.values(), &[1.0, 2.0, 3.0]);

    let row0 = csr.row_entries(0);
    assert_eq!(row0.len(), 2);
    assert_eq!(row0.col_ids(), &[10, 20]);
    let row1 = csr.row_entries(1);
    assert!(row1.is_empty());
}

#[test]
fn test_from_rows_and_iteration() {
    let csr = CsrMatrix::<f32, u64>::from_rows(&[&[(1, 0.5), (2, 1.5)], &[(3, 2.5)]]);
    let collected: Vec<Vec<(u64, f32)>> =
        csr.iter_rows().map(|row| row.iter().collect()).collect();
    assert_eq!(collected, vec![vec![(1, 0.5), (2, 1.5)], vec![(3, 2.5)]]);
}

#[test]
fn test_clear() {
    let mut csr = CsrMatrix::<f32, u64>::from_rows(&[&[(1, 1.0)]]);
    csr.clear();
    assert_eq!(csr.rows(), 0);
    assert_eq!(csr.offsets(), &[0]);
}

#[test]
#[should_panic(expected = "invalid row index")]
fn test_row_out_of_range() {
    let csr = CsrMatrix::<f32, u64>::new();
    let _ = csr.row_entries(0);
}

#[test]
fn test_equality() {
    let a = CsrMatrix::<f32, u64>::from_rows(&[&[(1, 1.0)]]);
    let b = CsrMatrix::<f32, u64>::from_rows(&[&[(1, 1.0)]]);
    let c = CsrMatrix::<f32, u64>::from_rows(&[&[(1, 2.0)]]);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

// ============================================================================
// feature ids
// ============================================================================

#[test]
fn test_feature_id_packing() {
    let id = make_feature_id(5, 1234);
    assert_eq!(group_id(id), 5);
    assert_eq!(sub_feature_id(id), 1234);

    let max = make_feature_id(u16::MAX, (1u64 << 48) - 1);
    assert_eq!(group_id(max), u16::MAX);
    assert_eq!(sub_feature_id(max), (1u64 << 48) - 1);

    // the sub id is masked to 48 bits
    let masked = make_feature_id(1, u64::MAX);
    assert_eq!(group_id(masked), 1);
    assert_eq!(sub_feature_id(masked), (1u64 << 48) - 1);

    assert_eq!(group_id(0), 0);
    assert_eq!(sub_feature_id(0), 0);
}

#[test]
fn test_feature_id_roundtrip_structure() {
    for group in [0u16, 1, 255, 65535] {
        for sub in [0u64, 1, 0xffff_ffff, (1 << 48) - 1] {
            let id = make_feature_id(group, sub);
            assert_eq!(group_id(id), group);
            assert_eq!(sub_feature_id(id), sub);
        }
    }
}
