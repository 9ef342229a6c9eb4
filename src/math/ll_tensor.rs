//! Submodule providing shape-checked tensor wrappers over the slice
//! kernels.
//!
//! Shape mismatches are programmer errors and abort with a message
//! carrying the offending dims.

use crate::{
    math::{ll_math, Real},
    tensor::Tensor,
};

#[track_caller]
fn check_same_shape<T: Real>(x: &Tensor<T>, y: &Tensor<T>) {
    assert!(
        x.same_shape(y),
        "inconsistent shapes: {} vs {}",
        x.shape(),
        y.shape()
    );
}

#[track_caller]
fn check_rank2<T: Real>(x: &Tensor<T>) {
    assert!(x.is_rank(2), "expected a rank-2 shape, got {}", x.shape());
}

#[track_caller]
fn check_total_dim<T: Real>(x: &Tensor<T>, total_dim: usize) {
    assert!(
        x.total_dim() == total_dim,
        "inconsistent total dim: {} vs {total_dim}",
        x.total_dim()
    );
}

/// `y = alpha * x + beta`
pub fn axpb<T: Real>(alpha: T, x: &Tensor<T>, beta: T, y: &mut Tensor<T>) {
    check_same_shape(x, y);
    ll_math::axpb(alpha, x.data(), beta, y.data_mut());
}

/// `y += alpha * x`
pub fn axpy<T: Real>(alpha: T, x: &Tensor<T>, y: &mut Tensor<T>) {
    check_same_shape(x, y);
    ll_math::axpy(alpha, x.data(), y.data_mut());
}

/// `y = alpha * x + beta * y`
pub fn axpby<T: Real>(alpha: T, x: &Tensor<T>, beta: T, y: &mut Tensor<T>) {
    check_same_shape(x, y);
    ll_math::axpby(alpha, x.data(), beta, y.data_mut());
}

/// `z += x * y` elementwise
pub fn xypz<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_same_shape(x, y);
    check_same_shape(x, z);
    ll_math::xypz(x.data(), y.data(), z.data_mut());
}

/// `z = x * y + beta * z` elementwise
pub fn xypbz<T: Real>(x: &Tensor<T>, y: &Tensor<T>, beta: T, z: &mut Tensor<T>) {
    check_same_shape(x, y);
    check_same_shape(x, z);
    ll_math::xypbz(x.data(), y.data(), beta, z.data_mut());
}

/// `z += x / y` elementwise
pub fn xdypz<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_same_shape(x, y);
    check_same_shape(x, z);
    ll_math::xdypz(x.data(), y.data(), z.data_mut());
}

/// `z = x / y + beta * z` elementwise
pub fn xdypbz<T: Real>(x: &Tensor<T>, y: &Tensor<T>, beta: T, z: &mut Tensor<T>) {
    check_same_shape(x, y);
    check_same_shape(x, z);
    ll_math::xdypbz(x.data(), y.data(), beta, z.data_mut());
}

macro_rules! wrap_binary {
    ($(#[$doc:meta] $name:ident;)*) => {$(
        #[$doc]
        pub fn $name<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
            check_same_shape(x, y);
            check_same_shape(x, z);
            ll_math::$name(x.data(), y.data(), z.data_mut());
        }
    )*};
}

wrap_binary! {
    /// `z = x + y` elementwise
    add;
    /// `z = x - y` elementwise
    sub;
    /// `z = x * y` elementwise
    mul;
    /// `z = x / y` elementwise
    div;
    /// `z = x^y` elementwise
    pow;
}

macro_rules! wrap_scalar {
    ($(#[$doc:meta] $name:ident;)*) => {$(
        #[$doc]
        pub fn $name<T: Real>(x: &Tensor<T>, alpha: T, y: &mut Tensor<T>) {
            check_same_shape(x, y);
            ll_math::$name(x.data(), alpha, y.data_mut());
        }
    )*};
}

wrap_scalar! {
    /// `y = x + alpha`
    add_scalar;
    /// `y = x - alpha`
    sub_scalar;
    /// `y = x * alpha`
    mul_scalar;
    /// `y = x / alpha`
    div_scalar;
    /// `y = x^alpha`
    pow_scalar;
}

macro_rules! wrap_unary {
    ($(#[$doc:meta] $name:ident;)*) => {$(
        #[$doc]
        pub fn $name<T: Real>(x: &Tensor<T>, y: &mut Tensor<T>) {
            check_same_shape(x, y);
            ll_math::$name(x.data(), y.data_mut());
        }
    )*};
}

wrap_unary! {
    /// `y = 1 / x`
    inv;
    /// `y = sqrt(x)`
    sqrt;
    /// `y = cbrt(x)`
    cbrt;
    /// `y = x^2`
    square;
    /// `y = x^3`
    cubic;
    /// `y = exp(x)`
    exp;
    /// `y = exp(x) - 1`
    expm1;
    /// `y = ln(x)`
    log;
    /// `y = ln(max(x, eps))`
    safe_log;
    /// `y = 1 / (1 + exp(-x))`
    sigmoid;
    /// `y = sin(x)`
    sin;
    /// `y = asin(x)`
    asin;
    /// `y = sinh(x)`
    sinh;
    /// `y = asinh(x)`
    asinh;
    /// `y = cos(x)`
    cos;
    /// `y = acos(x)`
    acos;
    /// `y = cosh(x)`
    cosh;
    /// `y = acosh(x)`
    acosh;
    /// `y = tan(x)`
    tan;
    /// `y = atan(x)`
    atan;
    /// `y = tanh(x)`
    tanh;
    /// `y = atanh(x)`
    atanh;
    /// `y = |x|`
    abs;
}

/// `z = alpha * x + beta * row_broadcast(y)` with `x` rank 2 and `y` of
/// length `x.dim(1)`.
pub fn add_row<T: Real>(alpha: T, x: &Tensor<T>, beta: T, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_rank2(x);
    check_same_shape(x, z);
    let m = x.dim(0);
    let n = x.dim(1);
    check_total_dim(y, n);
    ll_math::add_row(m, n, alpha, x.data(), beta, y.data(), z.data_mut());
}

/// `z = alpha * x - beta * row_broadcast(y)`
pub fn sub_row<T: Real>(alpha: T, x: &Tensor<T>, beta: T, y: &Tensor<T>, z: &mut Tensor<T>) {
    add_row(alpha, x, -beta, y, z);
}

/// `z = x * row_broadcast(y)`
pub fn mul_row<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_rank2(x);
    check_same_shape(x, z);
    let m = x.dim(0);
    let n = x.dim(1);
    check_total_dim(y, n);
    ll_math::mul_row(m, n, x.data(), y.data(), z.data_mut());
}

/// `z = x / row_broadcast(y)`
pub fn div_row<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_rank2(x);
    check_same_shape(x, z);
    let m = x.dim(0);
    let n = x.dim(1);
    check_total_dim(y, n);
    ll_math::div_row(m, n, x.data(), y.data(), z.data_mut());
}

/// `z = alpha * x + beta * col_broadcast(y)` with `x` rank 2 and `y` of
/// length `x.dim(0)`.
pub fn add_col<T: Real>(alpha: T, x: &Tensor<T>, beta: T, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_rank2(x);
    check_same_shape(x, z);
    let m = x.dim(0);
    let n = x.dim(1);
    check_total_dim(y, m);
    ll_math::add_col(m, n, alpha, x.data(), beta, y.data(), z.data_mut());
}

/// `z = alpha * x - beta * col_broadcast(y)`
pub fn sub_col<T: Real>(alpha: T, x: &Tensor<T>, beta: T, y: &Tensor<T>, z: &mut Tensor<T>) {
    add_col(alpha, x, -beta, y, z);
}

/// `z = x * col_broadcast(y)`
pub fn mul_col<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_rank2(x);
    check_same_shape(x, z);
    let m = x.dim(0);
    let n = x.dim(1);
    check_total_dim(y, m);
    ll_math::mul_col(m, n, x.data(), y.data(), z.data_mut());
}

/// `z = x / col_broadcast(y)`
pub fn div_col<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_rank2(x);
    check_same_shape(x, z);
    let m = x.dim(0);
    let n = x.dim(1);
    check_total_dim(y, m);
    ll_math::div_col(m, n, x.data(), y.data(), z.data_mut());
}

/// `y = max(alpha, x)` elementwise
pub fn max_scalar<T: Real>(alpha: T, x: &Tensor<T>, y: &mut Tensor<T>) {
    check_same_shape(x, y);
    ll_math::max_scalar(alpha, x.data(), y.data_mut());
}

/// `y = min(alpha, x)` elementwise
pub fn min_scalar<T: Real>(alpha: T, x: &Tensor<T>, y: &mut Tensor<T>) {
    check_same_shape(x, y);
    ll_math::min_scalar(alpha, x.data(), y.data_mut());
}

/// Returns the largest element.
pub fn max<T: Real>(x: &Tensor<T>) -> T {
    ll_math::max(x.data())
}

/// Returns the smallest element.
pub fn min<T: Real>(x: &Tensor<T>) -> T {
    ll_math::min(x.data())
}

/// `z = max(x, y)` elementwise
pub fn max2<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_same_shape(x, y);
    check_same_shape(x, z);
    ll_math::max2(x.data(), y.data(), z.data_mut());
}

/// `z = min(x, y)` elementwise
pub fn min2<T: Real>(x: &Tensor<T>, y: &Tensor<T>, z: &mut Tensor<T>) {
    check_same_shape(x, y);
    check_same_shape(x, z);
    ll_math::min2(x.data(), y.data(), z.data_mut());
}

/// Returns the sum of all elements.
pub fn sum<T: Real>(x: &Tensor<T>) -> T {
    ll_math::sum(x.data())
}

/// Returns the L1 norm.
pub fn norm1<T: Real>(x: &Tensor<T>) -> T {
    ll_math::norm1(x.data())
}

/// Returns the L2 norm.
pub fn norm2<T: Real>(x: &Tensor<T>) -> T {
    ll_math::norm2(x.data())
}

/// Returns the dot product.
pub fn dot<T: Real>(x: &Tensor<T>, y: &Tensor<T>) -> T {
    check_same_shape(x, y);
    ll_math::dot(x.data(), y.data())
}

/// Returns the euclidean distance.
pub fn euclidean_distance<T: Real>(x: &Tensor<T>, y: &Tensor<T>) -> T {
    check_same_shape(x, y);
    ll_math::euclidean_distance(x.data(), y.data())
}

/// `y[j] = alpha * sum_i(x[i][j]) + beta * y[j]`
pub fn sum_row<T: Real>(alpha: T, x: &Tensor<T>, beta: T, y: &mut Tensor<T>) {
    check_rank2(x);
    let m = x.dim(0);
    let n = x.dim(1);
    check_total_dim(y, n);
    ll_math::sum_row(m, n, alpha, x.data(), beta, y.data_mut());
}

/// `y[i] = alpha * sum_j(x[i][j]) + beta * y[i]`
pub fn sum_col<T: Real>(alpha: T, x: &Tensor<T>, beta: T, y: &mut Tensor<T>) {
    check_rank2(x);
    let m = x.dim(0);
    let n = x.dim(1);
    check_total_dim(y, m);
    ll_math::sum_col(m, n, alpha, x.data(), beta, y.data_mut());
}

/// Numerically stable softmax over the whole tensor.
pub fn softmax<T: Real>(x: &Tensor<T>, y: &mut Tensor<T>) {
    check_same_shape(x, y);
    ll_math::softmax(x.data(), y.data_mut());
}

/// `y = alpha * op(a) * x + beta * y` with `a` rank 2.
pub fn gemv<T: Real>(
    trans_a: bool,
    alpha: T,
    a: &Tensor<T>,
    x: &Tensor<T>,
    beta: T,
    y: &mut Tensor<T>,
) {
    check_rank2(a);
    let m = a.dim(0);
    let n = a.dim(1);
    check_total_dim(x, if trans_a { m } else { n });
    check_total_dim(y, if trans_a { n } else { m });
    ll_math::gemv(trans_a, m, n, alpha, a.data(), n, x.data(), beta, y.data_mut());
}

/// `z = alpha * op(x) * op(y) + beta * z`, all rank 2.
pub fn gemm<T: Real>(
    trans_x: bool,
    trans_y: bool,
    alpha: T,
    x: &Tensor<T>,
    y: &Tensor<T>,
    beta: T,
    z: &mut Tensor<T>,
) {
    check_rank2(x);
    check_rank2(y);
    check_rank2(z);
    let m = z.dim(0);
    let n = z.dim(1);
    let k = if trans_x { x.dim(0) } else { x.dim(1) };
    assert!(
        x.dim(0) == if trans_x { k } else { m } && x.dim(1) == if trans_x { m } else { k },
        "inconsistent shapes for gemm: x {} with z {}",
        x.shape(),
        z.shape()
    );
    assert!(
        y.dim(0) == if trans_y { n } else { k } && y.dim(1) == if trans_y { k } else { n },
        "inconsistent shapes for gemm: y {} with z {}",
        y.shape(),
        z.shape()
    );
    ll_math::gemm(trans_x, trans_y, m, n, k, alpha, x.data(), y.data(), beta, z.data_mut());
}
