//! Submodule providing the mixed-sparsity products that bridge CSR
//! batches, sparse row matrices and dense tensors.
//!
//! `beta` is restricted to 0 or 1: 0 zeros the accumulator first, 1
//! adds into it. Row counts of CSR inputs bound the dense output; the
//! `n == 1` case takes a dedicated scalar loop.

use crate::{
    math::{ll_math, Real},
    tensor::{CsrMatrix, RowKey, SparseRowMatrix, Tensor},
};

#[track_caller]
fn check_beta(beta: i32) {
    assert!(beta == 0 || beta == 1, "invalid beta {beta}, expected 0 or 1");
}

/// `y = x + beta * y`: scatter-adds every row of `x` into the dense
/// rows of `y` addressed by the row id.
///
/// # Panics
///
/// Panics when `y` is not rank 2, the column counts disagree, or a row
/// id is out of range for `y`.
pub fn add_srm<T: Real, I: RowKey>(x: &SparseRowMatrix<T, I>, beta: i32, y: &mut Tensor<T>) {
    check_beta(beta);
    assert!(y.is_rank(2), "expected a rank-2 shape, got {}", y.shape());
    let m = y.dim(0);
    let n = y.dim(1);
    assert!(x.col() == n, "inconsistent col: {} vs {n}", x.col());

    if beta == 0 {
        y.zeros();
    }

    let data = y.data_mut();
    if n == 1 {
        for (id, row) in x.iter() {
            let i = id.as_();
            assert!(i < m, "row id {id} out of range for {m} rows");
            data[i] += row[0];
        }
    } else {
        for (id, row) in x.iter() {
            let i = id.as_();
            assert!(i < m, "row id {id} out of range for {m} rows");
            let yi = &mut data[i * n..(i + 1) * n];
            ll_math::axpy(T::one(), row, yi);
        }
    }
}

/// GESMM: general sparse matrix to matrix multiplication,
/// `z = x * y + beta * z`, with the columns of `x` taken modulo the row
/// count of `y`.
///
/// The modulo turns a feature-id column space into an index into a
/// fixed-size embedding table.
///
/// # Panics
///
/// Panics when `y` is not rank 2 or `z` is not `x.rows() * y.dim(1)`.
pub fn gesmm_mod<T: Real, I: RowKey>(
    x: &CsrMatrix<T, I>,
    y: &Tensor<T>,
    beta: i32,
    z: &mut Tensor<T>,
) {
    check_beta(beta);
    assert!(y.is_rank(2), "expected a rank-2 shape, got {}", y.shape());
    let k = y.dim(0);
    let n = y.dim(1);
    assert!(
        z.is_rank(2) && z.dim(0) == x.rows() && z.dim(1) == n,
        "inconsistent shape {} for {} rows of {n} columns",
        z.shape(),
        x.rows()
    );

    if beta == 0 {
        z.zeros();
    }

    let ydata = y.data();
    let zdata = z.data_mut();
    if n == 1 {
        for (i, row) in x.iter_rows().enumerate() {
            for (col, value) in row.iter() {
                zdata[i] += value * ydata[col.as_() % k];
            }
        }
    } else {
        for (i, row) in x.iter_rows().enumerate() {
            let zi = &mut zdata[i * n..(i + 1) * n];
            for (col, value) in row.iter() {
                let j = (col.as_() % k) * n;
                ll_math::axpy(value, &ydata[j..j + n], zi);
            }
        }
    }
}

/// GESMSM: general sparse matrix to sparse matrix multiplication,
/// `z = x * y + beta * z`, with the rows of `y` looked up by column id;
/// absent rows contribute zero.
///
/// # Panics
///
/// Panics when `z` is not `x.rows() * y.col()`.
pub fn gesmsm<T: Real, I: RowKey>(
    x: &CsrMatrix<T, I>,
    y: &SparseRowMatrix<T, I>,
    beta: i32,
    z: &mut Tensor<T>,
) {
    check_beta(beta);
    let n = y.col();
    assert!(
        z.is_rank(2) && z.dim(0) == x.rows() && z.dim(1) == n,
        "inconsistent shape {} for {} rows of {n} columns",
        z.shape(),
        x.rows()
    );

    if beta == 0 {
        z.zeros();
    }

    let zdata = z.data_mut();
    if n == 1 {
        for (i, row) in x.iter_rows().enumerate() {
            for (col, value) in row.iter() {
                zdata[i] += value * y.row(col).map_or_else(T::zero, |r| r[0]);
            }
        }
    } else {
        for (i, row) in x.iter_rows().enumerate() {
            let zi = &mut zdata[i * n..(i + 1) * n];
            for (col, value) in row.iter() {
                if let Some(yj) = y.row(col) {
                    ll_math::axpy(value, yj, zi);
                }
            }
        }
    }
}

/// GESTMM: general sparse transposed matrix to matrix multiplication,
/// `z = x^T * y + beta * z`, with the columns of `x` taken modulo `k`;
/// rows of `z` are materialized lazily.
///
/// # Panics
///
/// Panics when `y` is not `x.rows() * z.col()`.
pub fn gestmm_mod<T: Real, I: RowKey>(
    k: I,
    x: &CsrMatrix<T, I>,
    y: &Tensor<T>,
    beta: i32,
    z: &mut SparseRowMatrix<T, I>,
) {
    check_beta(beta);
    let n = z.col();
    assert!(
        y.is_rank(2) && y.dim(0) == x.rows() && y.dim(1) == n,
        "inconsistent shape {} for {} rows of {n} columns",
        y.shape(),
        x.rows()
    );

    if beta == 0 {
        z.zeros();
    }

    let ydata = y.data();
    if n == 1 {
        for (i, row) in x.iter_rows().enumerate() {
            for (col, value) in row.iter() {
                *z.get_scalar_no_init(col % k) += value * ydata[i];
            }
        }
    } else {
        for (i, row) in x.iter_rows().enumerate() {
            let yi = &ydata[i * n..(i + 1) * n];
            for (col, value) in row.iter() {
                let zj = z.get_row_no_init(col % k);
                ll_math::axpy(value, yi, zj);
            }
        }
    }
}

/// `z = x^T * y + beta * z` without the modulo; rows of `z` are keyed
/// directly by the column ids of `x`.
///
/// # Panics
///
/// Panics when `y` is not `x.rows() * z.col()`.
pub fn gestmm<T: Real, I: RowKey>(
    x: &CsrMatrix<T, I>,
    y: &Tensor<T>,
    beta: i32,
    z: &mut SparseRowMatrix<T, I>,
) {
    check_beta(beta);
    let n = z.col();
    assert!(
        y.is_rank(2) && y.dim(0) == x.rows() && y.dim(1) == n,
        "inconsistent shape {} for {} rows of {n} columns",
        y.shape(),
        x.rows()
    );

    if beta == 0 {
        z.zeros();
    }

    let ydata = y.data();
    if n == 1 {
        for (i, row) in x.iter_rows().enumerate() {
            for (col, value) in row.iter() {
                *z.get_scalar_no_init(col) += value * ydata[i];
            }
        }
    } else {
        for (i, row) in x.iter_rows().enumerate() {
            let yi = &ydata[i * n..(i + 1) * n];
            for (col, value) in row.iter() {
                let zj = z.get_row_no_init(col);
                ll_math::axpy(value, yi, zj);
            }
        }
    }
}

/// `z += x` elementwise.
///
/// # Panics
///
/// Panics when the shapes disagree.
pub fn add_to_tensor<T: Real>(x: &Tensor<T>, z: &mut Tensor<T>) {
    assert!(x.same_shape(z), "inconsistent shapes: {} vs {}", x.shape(), z.shape());
    ll_math::axpy(T::one(), x.data(), z.data_mut());
}

/// `z += x` row-wise, materializing absent rows of `z`.
///
/// # Panics
///
/// Panics when the column counts disagree.
pub fn add_to_srm<T: Real, I: RowKey>(x: &SparseRowMatrix<T, I>, z: &mut SparseRowMatrix<T, I>) {
    assert!(x.col() == z.col(), "inconsistent col: {} vs {}", x.col(), z.col());
    for (id, row) in x.iter() {
        let zi = z.get_row_no_init(id);
        ll_math::axpy(T::one(), row, zi);
    }
}

/// `z *= beta` elementwise.
pub fn scale_tensor<T: Real>(beta: T, z: &mut Tensor<T>) {
    for v in z.iter_mut() {
        *v *= beta;
    }
}

/// `z *= beta` over every materialized row.
pub fn scale_srm<T: Real, I: RowKey>(beta: T, z: &mut SparseRowMatrix<T, I>) {
    for (_, row) in z.iter_mut() {
        for v in row.iter_mut() {
            *v *= beta;
        }
    }
}
