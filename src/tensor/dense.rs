//! Submodule providing the owned dense tensor and its borrowed views.

use core::fmt;
use std::borrow::Cow;

use num_traits::{AsPrimitive, One, Zero};
use rand::Rng;

use crate::{
    error::TensorError,
    io::{
        serialize::{
            read_pod_slice, write_pod_slice, Deserialize, ReadView, Scalar, Serialize,
        },
        stream::{InputStream, OutputStream, StreamState},
        string_stream::InputStringStream,
    },
    math::Real,
    tensor::{
        initializer::{
            fill_arange, fill_constant, fill_rand, fill_rand_int, fill_randn,
            fill_randn_truncated, Initializer,
        },
        shape::Shape,
    },
};

/// An owned dense row-major N-D array.
///
/// A tensor is `null` while it has no storage; `resize` gives it a
/// shape and an owned buffer. Borrowed slices of the storage are
/// exposed as [`TensorView`]s, so the owner always outlives its views.
#[derive(Clone, PartialEq, Default)]
pub struct Tensor<T> {
    shape: Shape,
    data: Vec<T>,
}

impl<T> Tensor<T> {
    /// Creates a null tensor.
    #[must_use]
    pub fn new() -> Self {
        Self { shape: Shape::scalar(), data: Vec::new() }
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the rank.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the `i`-th dim.
    #[must_use]
    pub fn dim(&self, i: usize) -> usize {
        self.shape.dim(i)
    }

    /// Returns the total number of elements.
    #[must_use]
    pub fn total_dim(&self) -> usize {
        self.shape.total_dim()
    }

    /// Returns whether the shape has the given rank.
    #[must_use]
    pub fn is_rank(&self, rank: usize) -> bool {
        self.shape.is_rank(rank)
    }

    /// Returns whether the tensor has no storage.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the elements as a flat slice.
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the elements as a flat mutable slice.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns an iterator over the elements in row-major order.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Returns a mutable iterator over the elements.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Returns whether `other` has exactly the same shape.
    #[must_use]
    pub fn same_shape<U>(&self, other: &Tensor<U>) -> bool {
        self.shape == other.shape
    }

    /// Drops the storage and resets the shape.
    pub fn clear(&mut self) {
        self.shape.clear();
        self.data.clear();
    }

    /// Swaps contents with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(&mut self.shape, &mut other.shape);
        core::mem::swap(&mut self.data, &mut other.data);
    }

    /// Reinterprets the dims while preserving `total_dim`; one dim may
    /// be the `-1` wildcard.
    ///
    /// # Errors
    ///
    /// See [`Shape::reshape`].
    pub fn reshape(&mut self, dims: &[i64]) -> Result<&mut Self, TensorError> {
        self.shape.reshape(dims)?;
        Ok(self)
    }

    /// Inserts a dim of 1 at `axis`.
    ///
    /// # Errors
    ///
    /// See [`Shape::expand_dim`].
    pub fn expand_dim(&mut self, axis: usize) -> Result<&mut Self, TensorError> {
        self.shape.expand_dim(axis)?;
        Ok(self)
    }

    /// Removes the dim at `axis`, which must be 1.
    ///
    /// # Errors
    ///
    /// See [`Shape::squeeze`].
    pub fn squeeze(&mut self, axis: usize) -> Result<&mut Self, TensorError> {
        self.shape.squeeze(axis)?;
        Ok(self)
    }
}

impl<T: Clone> Tensor<T> {
    /// Returns a borrowed view of the whole tensor.
    #[must_use]
    pub fn view(&self) -> TensorView<'_, T> {
        TensorView { shape: self.shape, data: Cow::Borrowed(&self.data) }
    }

    /// Returns a rank-1-lower view of the `i`-th slice along axis 0,
    /// sharing storage with the owner.
    ///
    /// # Panics
    ///
    /// Panics when the tensor is rank 0 or `i >= dim(0)`.
    #[must_use]
    pub fn slice(&self, i: usize) -> TensorView<'_, T> {
        let stride = self.slice_stride(i);
        TensorView {
            shape: self.shape.tail(),
            data: Cow::Borrowed(&self.data[i * stride..(i + 1) * stride]),
        }
    }

    /// Mutable counterpart of [`Self::slice`], as a flat slice.
    ///
    /// # Panics
    ///
    /// Panics when the tensor is rank 0 or `i >= dim(0)`.
    pub fn slice_mut(&mut self, i: usize) -> &mut [T] {
        let stride = self.slice_stride(i);
        &mut self.data[i * stride..(i + 1) * stride]
    }

    fn slice_stride(&self, i: usize) -> usize {
        assert!(self.rank() > 0, "cannot slice a rank-0 tensor");
        let d0 = self.dim(0);
        assert!(i < d0, "invalid slice index {i} for shape {}", self.shape);
        self.total_dim() / d0
    }
}

impl<T: Clone + Default> Tensor<T> {
    /// Creates a tensor of default-valued elements with the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidRank`] when the rank exceeds the
    /// supported maximum.
    pub fn from_shape(dims: &[usize]) -> Result<Self, TensorError> {
        let mut tensor = Self::new();
        tensor.resize(dims)?;
        Ok(tensor)
    }

    /// Creates a rank-1 tensor from a vector.
    #[must_use]
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { shape: Shape::rank1(data.len()), data }
    }

    /// Reallocates storage for the given dims; new elements are
    /// default-valued.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidRank`] when the rank exceeds the
    /// supported maximum.
    pub fn resize(&mut self, dims: &[usize]) -> Result<&mut Self, TensorError> {
        self.shape.resize(dims)?;
        self.data.resize(self.shape.total_dim(), T::default());
        Ok(self)
    }

    /// Resizes storage to match a shape.
    ///
    /// # Errors
    ///
    /// See [`Self::resize`].
    pub fn resize_shape(&mut self, shape: &Shape) -> Result<&mut Self, TensorError> {
        self.resize(shape.dims())
    }

    /// Copies elements from a slice without changing the shape.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::TotalDimMismatch`] when the lengths
    /// disagree.
    pub fn set_data(&mut self, data: &[T]) -> Result<&mut Self, TensorError> {
        if self.total_dim() != data.len() {
            return Err(TensorError::TotalDimMismatch {
                left: self.total_dim(),
                right: data.len(),
            });
        }
        self.data.clone_from_slice(data);
        Ok(self)
    }

    /// Copies elements from another tensor without changing the shape.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::TotalDimMismatch`] when the total dims
    /// disagree.
    pub fn set_data_from(&mut self, other: &Tensor<T>) -> Result<&mut Self, TensorError> {
        self.set_data(&other.data)
    }

    /// Reserves storage for at least `capacity` elements.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.data.len() {
            self.data.reserve(capacity - self.data.len());
        }
    }
}

impl<T: Copy + Zero> Tensor<T> {
    /// Fills with a constant.
    pub fn constant(&mut self, c: T) -> &mut Self {
        fill_constant(&mut self.data, c);
        self
    }

    /// Fills with zero.
    pub fn zeros(&mut self) -> &mut Self {
        fill_constant(&mut self.data, T::zero());
        self
    }

    /// Returns the sum of all elements.
    #[must_use]
    pub fn sum(&self) -> T {
        let mut s = T::zero();
        for &v in &self.data {
            s = s + v;
        }
        s
    }
}

impl<T: Copy + Zero + One> Tensor<T> {
    /// Fills with one.
    pub fn ones(&mut self) -> &mut Self {
        fill_constant(&mut self.data, T::one());
        self
    }
}

impl<T> Tensor<T>
where
    T: Copy + 'static,
    usize: AsPrimitive<T>,
{
    /// Fills with 0, 1, 2, ...
    pub fn arange(&mut self) -> &mut Self {
        for (i, v) in self.data.iter_mut().enumerate() {
            *v = i.as_();
        }
        self
    }
}

impl<T: Real> Tensor<T> {
    /// Returns the mean of all elements, zero when empty.
    #[must_use]
    pub fn mean(&self) -> T {
        if self.is_null() {
            return T::zero();
        }
        self.sum() / T::from_usize(self.total_dim())
    }

    /// Returns the sum of absolute values.
    #[must_use]
    pub fn asum(&self) -> T {
        let mut s = T::zero();
        for &v in &self.data {
            s = s + v.abs();
        }
        s
    }

    /// Returns the mean of absolute values, zero when empty.
    #[must_use]
    pub fn amean(&self) -> T {
        if self.is_null() {
            return T::zero();
        }
        self.asum() / T::from_usize(self.total_dim())
    }

    /// Returns the population variance, zero when empty.
    #[must_use]
    pub fn var(&self) -> T {
        if self.is_null() {
            return T::zero();
        }
        let m = self.mean();
        let mut s = T::zero();
        for &v in &self.data {
            let d = v - m;
            s = s + d * d;
        }
        s / T::from_usize(self.total_dim())
    }

    /// Returns the population standard deviation, zero when empty.
    #[must_use]
    pub fn std(&self) -> T {
        self.var().sqrt()
    }

    /// Fills with a uniform distribution over `[min, max)`.
    pub fn rand<R: Rng + ?Sized>(&mut self, rng: &mut R, min: T, max: T) -> &mut Self {
        fill_rand(rng, &mut self.data, min, max);
        self
    }

    /// Fills with a uniform distribution over `[0, 1)`.
    pub fn rand01<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.rand(rng, T::zero(), T::one())
    }

    /// Fills with a normal distribution.
    pub fn randn<R: Rng + ?Sized>(&mut self, rng: &mut R, mean: T, stddev: T) -> &mut Self {
        fill_randn(rng, &mut self.data, mean, stddev);
        self
    }

    /// Fills with the standard normal distribution.
    pub fn randn01<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.randn(rng, T::zero(), T::one())
    }

    /// Fills with uniform integers over `[min, max)`.
    pub fn rand_int<R: Rng + ?Sized>(&mut self, rng: &mut R, min: i32, max: i32) -> &mut Self {
        fill_rand_int(rng, &mut self.data, min, max);
        self
    }

    // Variance-scaling fan size.
    // mode 1: rows, mode 2: cols, mode 3: (rows + cols) / 2.
    fn variance_scaling_fan(&self, mode: i32) -> T {
        assert!(self.is_rank(2), "variance scaling requires a rank-2 shape, got {}", self.shape);
        match mode {
            1 => T::from_usize(self.dim(0)),
            2 => T::from_usize(self.dim(1)),
            _ => T::from_usize(self.dim(0) + self.dim(1)) / T::from_i32(2),
        }
    }

    fn rand_variance_scaling<R: Rng + ?Sized>(&mut self, rng: &mut R, scale: T, mode: i32) -> &mut Self {
        let n = self.variance_scaling_fan(mode);
        let max = (T::from_i32(3) * scale / n).sqrt();
        self.rand(rng, -max, max)
    }

    fn randn_variance_scaling<R: Rng + ?Sized>(&mut self, rng: &mut R, scale: T, mode: i32) -> &mut Self {
        let n = self.variance_scaling_fan(mode);
        let stddev = (scale / n).sqrt();
        fill_randn_truncated(rng, &mut self.data, T::zero(), stddev);
        self
    }

    /// LeCun uniform initializer.
    pub fn rand_lecun<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.rand_variance_scaling(rng, T::one(), 1)
    }

    /// LeCun normal initializer.
    pub fn randn_lecun<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.randn_variance_scaling(rng, T::one(), 1)
    }

    /// Xavier uniform initializer.
    pub fn rand_xavier<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.rand_variance_scaling(rng, T::one(), 3)
    }

    /// Xavier normal initializer.
    pub fn randn_xavier<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.randn_variance_scaling(rng, T::one(), 3)
    }

    /// He uniform initializer.
    pub fn rand_he<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.rand_variance_scaling(rng, T::from_i32(2), 1)
    }

    /// He normal initializer.
    pub fn randn_he<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.randn_variance_scaling(rng, T::from_i32(2), 1)
    }

    /// Fills according to an [`Initializer`].
    ///
    /// # Panics
    ///
    /// Panics on inconsistent parameters or a variance-scaling
    /// initializer over a shape that is not rank 2.
    pub fn rand_init<R: Rng + ?Sized>(&mut self, rng: &mut R, init: Initializer<T>) -> &mut Self {
        match init {
            Initializer::None => self,
            Initializer::Zeros => self.zeros(),
            Initializer::Ones => self.ones(),
            Initializer::Constant(c) => self.constant(c),
            Initializer::Rand { min, max } => self.rand(rng, min, max),
            Initializer::Randn { mean, stddev } => self.randn(rng, mean, stddev),
            Initializer::RandLecun => self.rand_lecun(rng),
            Initializer::RandnLecun => self.randn_lecun(rng),
            Initializer::RandXavier => self.rand_xavier(rng),
            Initializer::RandnXavier => self.randn_xavier(rng),
            Initializer::RandHe => self.rand_he(rng),
            Initializer::RandnHe => self.randn_he(rng),
            Initializer::RandInt { min, max } => {
                let min = min.to_i32().unwrap_or(0);
                let max = max.to_i32().unwrap_or(0);
                self.rand_int(rng, min, max)
            }
            Initializer::Arange => {
                fill_arange(&mut self.data);
                self
            }
        }
    }
}

impl<T> core::ops::Index<usize> for Tensor<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T> core::ops::IndexMut<usize> for Tensor<T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

impl<T: Clone + Default> From<Vec<T>> for Tensor<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T: Clone + Default> From<&[T]> for Tensor<T> {
    fn from(data: &[T]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl<T: Clone + Default, const N: usize> From<[T; N]> for Tensor<T> {
    fn from(data: [T; N]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl<T: Clone + Default> TryFrom<Vec<Vec<T>>> for Tensor<T> {
    type Error = TensorError;

    /// Builds a rank-2 tensor from nested rows, which must agree on
    /// their length.
    fn try_from(rows: Vec<Vec<T>>) -> Result<Self, Self::Error> {
        let d0 = rows.len();
        let d1 = rows.first().map_or(0, Vec::len);
        for row in &rows {
            if row.len() != d1 {
                return Err(TensorError::ColMismatch { left: d1, right: row.len() });
            }
        }
        let mut data = Vec::with_capacity(d0 * d1);
        for row in rows {
            data.extend(row);
        }
        Ok(Self { shape: Shape::rank2(d0, d1), data })
    }
}

impl<T: fmt::Display> fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor{} ", self.shape)?;
        write_slice_text(f, self.shape, &self.data, 3)
    }
}

// Writes nested brackets with at most `summary` leading and trailing
// entries per axis.
fn write_slice_text<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    shape: Shape,
    data: &[T],
    summary: usize,
) -> fmt::Result {
    if shape.rank() == 0 {
        return write!(f, "[]");
    }
    let d0 = shape.dim(0);
    let stride = if d0 == 0 { 0 } else { data.len() / d0 };
    let (head, tail) = if summary * 2 >= d0 { (d0, d0) } else { (summary, d0 - summary) };
    write!(f, "[")?;
    for i in 0..d0 {
        if i >= head && i < tail {
            if i == head {
                write!(f, " ...")?;
            }
            continue;
        }
        if i != 0 {
            write!(f, " ")?;
        }
        if shape.rank() == 1 {
            write!(f, "{}", data[i])?;
        } else {
            write_slice_text(f, shape.tail(), &data[i * stride..(i + 1) * stride], summary)?;
        }
    }
    write!(f, "]")
}

/// A borrowed view into the storage of a [`Tensor`] or a serialized
/// buffer.
///
/// Views parsed from unaligned buffers silently fall back to owned
/// storage; [`TensorView::is_borrowed`] reports which case occurred.
#[derive(Debug, Clone)]
pub struct TensorView<'a, T: Clone> {
    shape: Shape,
    data: Cow<'a, [T]>,
}

impl<T: Clone> Default for TensorView<'_, T> {
    fn default() -> Self {
        Self { shape: Shape::scalar(), data: Cow::Borrowed(&[]) }
    }
}

impl<'a, T: Clone> TensorView<'a, T> {
    /// Views foreign storage with an explicit shape.
    ///
    /// # Panics
    ///
    /// Panics when `data.len()` does not match the shape.
    #[must_use]
    pub fn new(shape: Shape, data: &'a [T]) -> Self {
        assert!(
            data.len() == shape.total_dim(),
            "inconsistent total dim: {} vs {}",
            data.len(),
            shape.total_dim()
        );
        Self { shape, data: Cow::Borrowed(data) }
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the rank.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the `i`-th dim.
    #[must_use]
    pub fn dim(&self, i: usize) -> usize {
        self.shape.dim(i)
    }

    /// Returns the total number of elements.
    #[must_use]
    pub fn total_dim(&self) -> usize {
        self.shape.total_dim()
    }

    /// Returns the elements as a flat slice.
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns whether the view borrows foreign storage rather than
    /// owning a copy.
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }

    /// Returns a rank-1-lower view of the `i`-th slice along axis 0.
    ///
    /// # Panics
    ///
    /// Panics when the view is rank 0 or `i >= dim(0)`.
    #[must_use]
    pub fn slice(&self, i: usize) -> TensorView<'_, T> {
        assert!(self.rank() > 0, "cannot slice a rank-0 tensor");
        let d0 = self.dim(0);
        assert!(i < d0, "invalid slice index {i} for shape {}", self.shape);
        let stride = self.total_dim() / d0;
        TensorView {
            shape: self.shape.tail(),
            data: Cow::Borrowed(&self.data[i * stride..(i + 1) * stride]),
        }
    }

    /// Clones the viewed elements into an owned tensor.
    #[must_use]
    pub fn to_tensor(&self) -> Tensor<T> {
        Tensor { shape: self.shape, data: self.data.to_vec() }
    }
}

impl<T: Clone + PartialEq> PartialEq for TensorView<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}

impl<T: Clone + PartialEq> PartialEq<Tensor<T>> for TensorView<'_, T> {
    fn eq(&self, other: &Tensor<T>) -> bool {
        self.shape == *other.shape() && *self.data == *other.data()
    }
}

impl<T: Clone + PartialEq> PartialEq<TensorView<'_, T>> for Tensor<T> {
    fn eq(&self, other: &TensorView<'_, T>) -> bool {
        other == self
    }
}

impl Serialize for Shape {
    fn write_to(&self, os: &mut dyn OutputStream) {
        (self.rank() as i32).write_le(os);
        for &d in self.dims() {
            (d as i32).write_le(os);
        }
    }
}

impl Deserialize for Shape {
    fn read_from(&mut self, is: &mut dyn InputStream) {
        let rank = i32::read_le(is);
        if !is.is_ok() || rank < 0 || rank as usize > crate::tensor::shape::MAX_RANK {
            is.set_bad();
            return;
        }
        let mut dims = [0usize; crate::tensor::shape::MAX_RANK];
        for d in dims.iter_mut().take(rank as usize) {
            let dim = i32::read_le(is);
            if !is.is_ok() || dim < 0 {
                is.set_bad();
                return;
            }
            *d = dim as usize;
        }
        match Shape::new(&dims[..rank as usize]) {
            Ok(shape) => *self = shape,
            Err(_) => is.set_bad(),
        }
    }
}

impl<'a> ReadView<'a> for Shape {
    fn read_view(&mut self, is: &mut InputStringStream<'a>) {
        self.read_from(is);
    }
}

macro_rules! impl_tensor_serialize {
    ($($t:ty),*) => {$(
        impl Serialize for Tensor<$t> {
            fn write_to(&self, os: &mut dyn OutputStream) {
                self.shape.write_to(os);
                write_pod_slice(os, &self.data);
            }
        }

        impl Deserialize for Tensor<$t> {
            fn read_from(&mut self, is: &mut dyn InputStream) {
                let mut shape = Shape::scalar();
                shape.read_from(is);
                if !is.is_ok() {
                    return;
                }
                self.shape = shape;
                self.data.resize(shape.total_dim(), <$t>::default());
                read_pod_slice(is, &mut self.data);
            }
        }

        impl<'a> ReadView<'a> for TensorView<'a, $t> {
            fn read_view(&mut self, is: &mut InputStringStream<'a>) {
                let mut shape = Shape::scalar();
                shape.read_from(is);
                if !is.is_ok() {
                    return;
                }
                let bytes = shape.total_dim() * core::mem::size_of::<$t>();
                let buf = is.remaining();
                if buf.len() < bytes {
                    is.set_bad();
                    return;
                }
                self.shape = shape;
                self.data = match bytemuck::try_cast_slice::<u8, $t>(&buf[..bytes]) {
                    Ok(slice) => Cow::Borrowed(slice),
                    Err(_) => {
                        // unaligned buffer, keep an owned copy
                        let mut data = vec![<$t>::default(); shape.total_dim()];
                        for (i, v) in data.iter_mut().enumerate() {
                            let mut le = [0u8; core::mem::size_of::<$t>()];
                            let at = i * core::mem::size_of::<$t>();
                            let len = le.len();
                            le.copy_from_slice(&buf[at..at + len]);
                            *v = <$t>::from_le_bytes(le);
                        }
                        Cow::Owned(data)
                    }
                };
                is.skip(bytes);
            }
        }
    )*};
}

impl_tensor_serialize!(f32, f64, i32, i64, u64);

impl Serialize for Tensor<String> {
    fn write_to(&self, os: &mut dyn OutputStream) {
        self.shape.write_to(os);
        for s in &self.data {
            s.write_to(os);
            if !os.is_ok() {
                break;
            }
        }
    }
}

impl Deserialize for Tensor<String> {
    fn read_from(&mut self, is: &mut dyn InputStream) {
        let mut shape = Shape::scalar();
        shape.read_from(is);
        if !is.is_ok() {
            return;
        }
        self.shape = shape;
        self.data.clear();
        self.data.resize(shape.total_dim(), String::new());
        for s in &mut self.data {
            s.read_from(is);
            if !is.is_ok() {
                return;
            }
        }
    }
}

impl<'a> ReadView<'a> for TensorView<'a, String> {
    /// Strings have no flat storage to borrow, so this reads an owned
    /// copy.
    fn read_view(&mut self, is: &mut InputStringStream<'a>) {
        let mut tensor = Tensor::<String>::new();
        tensor.read_from(is);
        if is.is_ok() {
            self.shape = *tensor.shape();
            self.data = Cow::Owned(core::mem::take(&mut tensor.data));
        }
    }
}
