//! Submodule providing the dimension vector of dense tensors.

use core::fmt;

use crate::error::TensorError;

/// The maximum supported rank.
pub const MAX_RANK: usize = 8;

/// An ordered sequence of non-negative dimensions, rank 0 to [`MAX_RANK`].
///
/// A rank-0 shape is the scalar shape; it has no elements and a
/// `total_dim` of zero, which is what empty tensors report.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: [usize; MAX_RANK],
    rank: usize,
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shape").field(&self.dims()).finish()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims().iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}

impl Shape {
    /// Creates a shape from a slice of dims.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidRank`] when more than [`MAX_RANK`]
    /// dims are given.
    pub fn new(dims: &[usize]) -> Result<Self, TensorError> {
        if dims.len() > MAX_RANK {
            return Err(TensorError::InvalidRank { rank: dims.len(), max: MAX_RANK });
        }
        let mut shape = Self::default();
        shape.rank = dims.len();
        shape.dims[..dims.len()].copy_from_slice(dims);
        Ok(shape)
    }

    /// Creates the rank-0 scalar shape.
    #[must_use]
    pub fn scalar() -> Self {
        Self::default()
    }

    /// Creates a rank-1 shape.
    #[must_use]
    pub fn rank1(d0: usize) -> Self {
        let mut shape = Self::default();
        shape.rank = 1;
        shape.dims[0] = d0;
        shape
    }

    /// Creates a rank-2 shape.
    #[must_use]
    pub fn rank2(d0: usize, d1: usize) -> Self {
        let mut shape = Self::default();
        shape.rank = 2;
        shape.dims[0] = d0;
        shape.dims[1] = d1;
        shape
    }

    /// Creates a rank-3 shape.
    #[must_use]
    pub fn rank3(d0: usize, d1: usize, d2: usize) -> Self {
        let mut shape = Self::default();
        shape.rank = 3;
        shape.dims[0] = d0;
        shape.dims[1] = d1;
        shape.dims[2] = d2;
        shape
    }

    /// Returns the rank.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Returns the dims as a slice.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.rank]
    }

    /// Returns the `i`-th dim.
    ///
    /// # Panics
    ///
    /// Panics when `i >= rank`.
    #[must_use]
    pub fn dim(&self, i: usize) -> usize {
        assert!(i < self.rank, "invalid dim index {i} for shape {shape}", shape = self);
        self.dims[i]
    }

    /// Returns the product of all dims, zero for the rank-0 shape.
    #[must_use]
    pub fn total_dim(&self) -> usize {
        if self.rank == 0 {
            return 0;
        }
        self.dims().iter().product()
    }

    /// Returns whether the shape has the given rank.
    #[must_use]
    pub fn is_rank(&self, rank: usize) -> bool {
        self.rank == rank
    }

    /// Returns whether the shape is the rank-0 scalar shape.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.rank == 0
    }

    /// Returns whether the shape holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_dim() == 0
    }

    /// Resets the shape to rank 0.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replaces the dims.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidRank`] when more than [`MAX_RANK`]
    /// dims are given.
    pub fn resize(&mut self, dims: &[usize]) -> Result<&mut Self, TensorError> {
        *self = Self::new(dims)?;
        Ok(self)
    }

    /// Reinterprets the dims while preserving `total_dim`.
    ///
    /// At most one dim may be the `-1` wildcard, which is resolved from
    /// the current `total_dim`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidReshape`] when more than one
    /// wildcard is given, when the wildcard has no integer solution, or
    /// when the fully specified dims do not multiply to `total_dim`.
    pub fn reshape(&mut self, dims: &[i64]) -> Result<&mut Self, TensorError> {
        if dims.len() > MAX_RANK {
            return Err(TensorError::InvalidRank { rank: dims.len(), max: MAX_RANK });
        }
        let total_dim = self.total_dim();
        let invalid = || TensorError::InvalidReshape { total_dim, requested: dims.to_vec() };

        let mut wildcard: Option<usize> = None;
        let mut known: usize = 1;
        for (axis, &d) in dims.iter().enumerate() {
            if d == -1 {
                if wildcard.is_some() {
                    return Err(invalid());
                }
                wildcard = Some(axis);
            } else if d < 0 {
                return Err(invalid());
            } else {
                known *= d as usize;
            }
        }

        let mut new_dims = [0usize; MAX_RANK];
        for (axis, &d) in dims.iter().enumerate() {
            new_dims[axis] = if d == -1 { 0 } else { d as usize };
        }
        if let Some(axis) = wildcard {
            if known == 0 || total_dim % known != 0 {
                return Err(invalid());
            }
            new_dims[axis] = total_dim / known;
        } else if known != total_dim {
            return Err(invalid());
        }

        self.rank = dims.len();
        self.dims = new_dims;
        Ok(self)
    }

    /// Inserts a dim of 1 at `axis`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidAxis`] when `axis > rank`, and
    /// [`TensorError::InvalidRank`] when the shape is already at
    /// [`MAX_RANK`].
    pub fn expand_dim(&mut self, axis: usize) -> Result<&mut Self, TensorError> {
        if axis > self.rank {
            return Err(TensorError::InvalidAxis { axis, dims: self.dims().to_vec() });
        }
        if self.rank == MAX_RANK {
            return Err(TensorError::InvalidRank { rank: self.rank + 1, max: MAX_RANK });
        }
        for i in (axis..self.rank).rev() {
            self.dims[i + 1] = self.dims[i];
        }
        self.dims[axis] = 1;
        self.rank += 1;
        Ok(self)
    }

    /// Removes the dim at `axis`, which must be 1.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidAxis`] when `axis >= rank` or the
    /// dim at `axis` is not 1.
    pub fn squeeze(&mut self, axis: usize) -> Result<&mut Self, TensorError> {
        if axis >= self.rank || self.dims[axis] != 1 {
            return Err(TensorError::InvalidAxis { axis, dims: self.dims().to_vec() });
        }
        for i in axis..self.rank - 1 {
            self.dims[i] = self.dims[i + 1];
        }
        self.rank -= 1;
        self.dims[self.rank] = 0;
        Ok(self)
    }

    /// Returns whether `other` has exactly the same dims.
    #[must_use]
    pub fn same_shape(&self, other: &Shape) -> bool {
        self == other
    }

    /// Returns the shape obtained by dropping the leading dim.
    ///
    /// # Panics
    ///
    /// Panics on a rank-0 shape.
    #[must_use]
    pub(crate) fn tail(&self) -> Shape {
        assert!(self.rank > 0, "cannot slice a rank-0 shape");
        let mut shape = Self::default();
        shape.rank = self.rank - 1;
        shape.dims[..shape.rank].copy_from_slice(&self.dims[1..self.rank]);
        shape
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = TensorError;

    fn try_from(dims: &[usize]) -> Result<Self, Self::Error> {
        Self::new(dims)
    }
}

impl<const N: usize> TryFrom<[usize; N]> for Shape {
    type Error = TensorError;

    fn try_from(dims: [usize; N]) -> Result<Self, Self::Error> {
        Self::new(&dims)
    }
}
