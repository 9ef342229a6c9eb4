//! Submodule providing the BLAS-like reference kernels over contiguous
//! buffers.
//!
//! Lengths are implied by the slices; the shape-checked wrappers in
//! [`ll_tensor`](crate::math::ll_tensor) validate dims before calling
//! in. Any accelerated substitute for these kernels must stay within a
//! relative error of 5e-3 for `f32` and 1e-3 for `f64`.

use crate::math::Real;

/// Input floor of [`safe_log`].
pub fn safe_log_eps<T: Real>() -> T {
    T::from_f64(1e-6)
}

/// `y[i] = alpha * x[i] + beta`
pub fn axpb<T: Real>(alpha: T, x: &[T], beta: T, y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = alpha * xi + beta;
    }
}

/// `y[i] += alpha * x[i]`
pub fn axpy<T: Real>(alpha: T, x: &[T], y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// `y[i] = alpha * x[i] + beta * y[i]`
pub fn axpby<T: Real>(alpha: T, x: &[T], beta: T, y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = alpha * xi + beta * *yi;
    }
}

/// `z[i] += x[i] * y[i]`
pub fn xypz<T: Real>(x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x).zip(y) {
        *zi += xi * yi;
    }
}

/// `z[i] = x[i] * y[i] + beta * z[i]`
pub fn xypbz<T: Real>(x: &[T], y: &[T], beta: T, z: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x).zip(y) {
        *zi = xi * yi + beta * *zi;
    }
}

/// `z[i] += x[i] / y[i]`
pub fn xdypz<T: Real>(x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x).zip(y) {
        *zi += xi / yi;
    }
}

/// `z[i] = x[i] / y[i] + beta * z[i]`
pub fn xdypbz<T: Real>(x: &[T], y: &[T], beta: T, z: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x).zip(y) {
        *zi = xi / yi + beta * *zi;
    }
}

macro_rules! elementwise_binary {
    ($(#[$doc:meta] $name:ident, $op:tt;)*) => {$(
        #[$doc]
        pub fn $name<T: Real>(x: &[T], y: &[T], z: &mut [T]) {
            debug_assert_eq!(x.len(), y.len());
            debug_assert_eq!(x.len(), z.len());
            for ((zi, &xi), &yi) in z.iter_mut().zip(x).zip(y) {
                *zi = xi $op yi;
            }
        }
    )*};
}

elementwise_binary! {
    /// `z[i] = x[i] + y[i]`
    add, +;
    /// `z[i] = x[i] - y[i]`
    sub, -;
    /// `z[i] = x[i] * y[i]`
    mul, *;
    /// `z[i] = x[i] / y[i]`
    div, /;
}

macro_rules! elementwise_scalar {
    ($(#[$doc:meta] $name:ident, $op:tt;)*) => {$(
        #[$doc]
        pub fn $name<T: Real>(x: &[T], alpha: T, y: &mut [T]) {
            debug_assert_eq!(x.len(), y.len());
            for (yi, &xi) in y.iter_mut().zip(x) {
                *yi = xi $op alpha;
            }
        }
    )*};
}

elementwise_scalar! {
    /// `y[i] = x[i] + alpha`
    add_scalar, +;
    /// `y[i] = x[i] - alpha`
    sub_scalar, -;
    /// `y[i] = x[i] * alpha`
    mul_scalar, *;
    /// `y[i] = x[i] / alpha`
    div_scalar, /;
}

/// `z[i][j] = alpha * x[i][j] + beta * y[j]` over an `m * n` matrix.
pub fn add_row<T: Real>(m: usize, n: usize, alpha: T, x: &[T], beta: T, y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), m * n);
    debug_assert_eq!(y.len(), n);
    debug_assert_eq!(z.len(), m * n);
    for i in 0..m {
        let row = i * n;
        for j in 0..n {
            z[row + j] = alpha * x[row + j] + beta * y[j];
        }
    }
}

/// `z[i][j] = x[i][j] * y[j]` over an `m * n` matrix.
pub fn mul_row<T: Real>(m: usize, n: usize, x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), m * n);
    debug_assert_eq!(y.len(), n);
    debug_assert_eq!(z.len(), m * n);
    for i in 0..m {
        let row = i * n;
        for j in 0..n {
            z[row + j] = x[row + j] * y[j];
        }
    }
}

/// `z[i][j] = x[i][j] / y[j]` over an `m * n` matrix.
pub fn div_row<T: Real>(m: usize, n: usize, x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), m * n);
    debug_assert_eq!(y.len(), n);
    debug_assert_eq!(z.len(), m * n);
    for i in 0..m {
        let row = i * n;
        for j in 0..n {
            z[row + j] = x[row + j] / y[j];
        }
    }
}

/// `z[i][j] = alpha * x[i][j] + beta * y[i]` over an `m * n` matrix.
pub fn add_col<T: Real>(m: usize, n: usize, alpha: T, x: &[T], beta: T, y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), m * n);
    debug_assert_eq!(y.len(), m);
    debug_assert_eq!(z.len(), m * n);
    for i in 0..m {
        let row = i * n;
        let b = beta * y[i];
        for j in 0..n {
            z[row + j] = alpha * x[row + j] + b;
        }
    }
}

/// `z[i][j] = x[i][j] * y[i]` over an `m * n` matrix.
pub fn mul_col<T: Real>(m: usize, n: usize, x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), m * n);
    debug_assert_eq!(y.len(), m);
    debug_assert_eq!(z.len(), m * n);
    for i in 0..m {
        let row = i * n;
        for j in 0..n {
            z[row + j] = x[row + j] * y[i];
        }
    }
}

/// `z[i][j] = x[i][j] / y[i]` over an `m * n` matrix.
pub fn div_col<T: Real>(m: usize, n: usize, x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), m * n);
    debug_assert_eq!(y.len(), m);
    debug_assert_eq!(z.len(), m * n);
    for i in 0..m {
        let row = i * n;
        for j in 0..n {
            z[row + j] = x[row + j] / y[i];
        }
    }
}

macro_rules! elementwise_unary {
    ($(#[$doc:meta] $name:ident, $f:expr;)*) => {$(
        #[$doc]
        pub fn $name<T: Real>(x: &[T], y: &mut [T]) {
            debug_assert_eq!(x.len(), y.len());
            let f = $f;
            for (yi, &xi) in y.iter_mut().zip(x) {
                *yi = f(xi);
            }
        }
    )*};
}

elementwise_unary! {
    /// `y[i] = 1 / x[i]`
    inv, |x: T| T::one() / x;
    /// `y[i] = sqrt(x[i])`
    sqrt, T::sqrt;
    /// `y[i] = cbrt(x[i])`
    cbrt, T::cbrt;
    /// `y[i] = x[i]^2`
    square, |x: T| x * x;
    /// `y[i] = x[i]^3`
    cubic, |x: T| x * x * x;
    /// `y[i] = exp(x[i])`
    exp, T::exp;
    /// `y[i] = exp(x[i]) - 1`
    expm1, T::exp_m1;
    /// `y[i] = ln(x[i])`
    log, T::ln;
    /// `y[i] = ln(max(x[i], eps))`, keeping the log finite near zero
    safe_log, |x: T| x.max(safe_log_eps::<T>()).ln();
    /// `y[i] = 1 / (1 + exp(-x[i]))`
    sigmoid, |x: T| T::one() / (T::one() + (-x).exp());
    /// `y[i] = sin(x[i])`
    sin, T::sin;
    /// `y[i] = asin(x[i])`
    asin, T::asin;
    /// `y[i] = sinh(x[i])`
    sinh, T::sinh;
    /// `y[i] = asinh(x[i])`
    asinh, T::asinh;
    /// `y[i] = cos(x[i])`
    cos, T::cos;
    /// `y[i] = acos(x[i])`
    acos, T::acos;
    /// `y[i] = cosh(x[i])`
    cosh, T::cosh;
    /// `y[i] = acosh(x[i])`
    acosh, T::acosh;
    /// `y[i] = tan(x[i])`
    tan, T::tan;
    /// `y[i] = atan(x[i])`
    atan, T::atan;
    /// `y[i] = tanh(x[i])`
    tanh, T::tanh;
    /// `y[i] = atanh(x[i])`
    atanh, T::atanh;
    /// `y[i] = |x[i]|`
    abs, T::abs;
}

/// `z[i] = x[i]^y[i]`
pub fn pow<T: Real>(x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x).zip(y) {
        *zi = xi.powf(yi);
    }
}

/// `z[i] = x[i]^alpha`
pub fn pow_scalar<T: Real>(x: &[T], alpha: T, z: &mut [T]) {
    debug_assert_eq!(x.len(), z.len());
    for (zi, &xi) in z.iter_mut().zip(x) {
        *zi = xi.powf(alpha);
    }
}

/// `y[i] = max(alpha, x[i])`
pub fn max_scalar<T: Real>(alpha: T, x: &[T], y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = xi.max(alpha);
    }
}

/// `y[i] = min(alpha, x[i])`
pub fn min_scalar<T: Real>(alpha: T, x: &[T], y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = xi.min(alpha);
    }
}

/// Returns the largest element.
pub fn max<T: Real>(x: &[T]) -> T {
    x.iter().fold(T::neg_infinity(), |m, &v| m.max(v))
}

/// Returns the smallest element.
pub fn min<T: Real>(x: &[T]) -> T {
    x.iter().fold(T::infinity(), |m, &v| m.min(v))
}

/// `z[i] = max(x[i], y[i])`
pub fn max2<T: Real>(x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x).zip(y) {
        *zi = xi.max(yi);
    }
}

/// `z[i] = min(x[i], y[i])`
pub fn min2<T: Real>(x: &[T], y: &[T], z: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    debug_assert_eq!(x.len(), z.len());
    for ((zi, &xi), &yi) in z.iter_mut().zip(x).zip(y) {
        *zi = xi.min(yi);
    }
}

/// Returns the sum of all elements.
pub fn sum<T: Real>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |s, &v| s + v)
}

/// Returns the L1 norm.
pub fn norm1<T: Real>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |s, &v| s + v.abs())
}

/// Returns the L2 norm.
pub fn norm2<T: Real>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |s, &v| s + v * v).sqrt()
}

/// Returns the dot product.
pub fn dot<T: Real>(x: &[T], y: &[T]) -> T {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).fold(T::zero(), |s, (&xi, &yi)| s + xi * yi)
}

/// Returns the euclidean distance.
pub fn euclidean_distance<T: Real>(x: &[T], y: &[T]) -> T {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y)
        .fold(T::zero(), |s, (&xi, &yi)| {
            let d = xi - yi;
            s + d * d
        })
        .sqrt()
}

/// `y[j] = alpha * sum_i(x[i][j]) + beta * y[j]` over an `m * n`
/// matrix.
pub fn sum_row<T: Real>(m: usize, n: usize, alpha: T, x: &[T], beta: T, y: &mut [T]) {
    debug_assert_eq!(x.len(), m * n);
    debug_assert_eq!(y.len(), n);
    for yj in y.iter_mut() {
        *yj = beta * *yj;
    }
    for i in 0..m {
        let row = i * n;
        for (j, yj) in y.iter_mut().enumerate() {
            *yj += alpha * x[row + j];
        }
    }
}

/// `y[i] = alpha * sum_j(x[i][j]) + beta * y[i]` over an `m * n`
/// matrix.
pub fn sum_col<T: Real>(m: usize, n: usize, alpha: T, x: &[T], beta: T, y: &mut [T]) {
    debug_assert_eq!(x.len(), m * n);
    debug_assert_eq!(y.len(), m);
    for (i, yi) in y.iter_mut().enumerate() {
        let row = i * n;
        let mut s = T::zero();
        for j in 0..n {
            s += x[row + j];
        }
        *yi = alpha * s + beta * *yi;
    }
}

/// Numerically stable softmax of one row: subtract the max, exponate,
/// normalize.
pub fn softmax<T: Real>(x: &[T], y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    if x.is_empty() {
        return;
    }
    let m = max(x);
    let mut s = T::zero();
    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = (xi - m).exp();
        s += *yi;
    }
    for yi in y.iter_mut() {
        *yi /= s;
    }
}

/// `y = alpha * op(a) * x + beta * y` with `a` an `m * n` row-major
/// matrix of leading dimension `lda` and `op` the optional transpose.
pub fn gemv<T: Real>(
    trans_a: bool,
    m: usize,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    x: &[T],
    beta: T,
    y: &mut [T],
) {
    if trans_a {
        debug_assert_eq!(x.len(), m);
        debug_assert_eq!(y.len(), n);
        for yi in y.iter_mut() {
            *yi = beta * *yi;
        }
        for i in 0..m {
            let row = i * lda;
            for (j, yj) in y.iter_mut().enumerate() {
                *yj += alpha * a[row + j] * x[i];
            }
        }
    } else {
        debug_assert_eq!(x.len(), n);
        debug_assert_eq!(y.len(), m);
        for (i, yi) in y.iter_mut().enumerate() {
            let row = i * lda;
            let mut s = T::zero();
            for j in 0..n {
                s += a[row + j] * x[j];
            }
            *yi = alpha * s + beta * *yi;
        }
    }
}

/// `z = alpha * op(x) * op(y) + beta * z`, all matrices row-major.
///
/// `z` is `m * n`, `op(x)` is `m * k` and `op(y)` is `k * n`; the
/// leading dimensions follow from the transpose flags.
pub fn gemm<T: Real>(
    trans_x: bool,
    trans_y: bool,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    x: &[T],
    y: &[T],
    beta: T,
    z: &mut [T],
) {
    debug_assert_eq!(x.len(), if trans_x { k * m } else { m * k });
    debug_assert_eq!(y.len(), if trans_y { n * k } else { k * n });
    debug_assert_eq!(z.len(), m * n);
    let at = |i: usize, l: usize| {
        if trans_x {
            x[l * m + i]
        } else {
            x[i * k + l]
        }
    };
    let bt = |l: usize, j: usize| {
        if trans_y {
            y[j * k + l]
        } else {
            y[l * n + j]
        }
    };
    for i in 0..m {
        for j in 0..n {
            let mut s = T::zero();
            for l in 0..k {
                s += at(i, l) * bt(l, j);
            }
            z[i * n + j] = alpha * s + beta * z[i * n + j];
        }
    }
}
