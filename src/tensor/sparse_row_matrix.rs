//! Submodule providing the hash-keyed sparse row matrix used as an
//! embedding table.

use core::cell::UnsafeCell;
use core::fmt;
use core::hash::Hash;
use std::borrow::Cow;

use hashbrown::HashMap;
use rand::Rng;

use crate::{
    error::TensorError,
    io::{
        serialize::{
            read_container_size, Deserialize, ReadView, Scalar, Serialize,
            SERIALIZATION_MAGIC,
        },
        stream::{InputStream, OutputStream, StreamState},
        string_stream::InputStringStream,
    },
    math::Real,
    sync::ReadWriteLock,
    tensor::{
        initializer::{fill_constant, fill_rand, fill_randn, Initializer},
        shape::Shape,
        RowKey,
    },
};

/// A sparse row matrix: a hash map from row id to a fixed-width row of
/// `T`, standing in for a logically infinite `(∞, col)` matrix.
///
/// Rows are materialized on first access and filled by the configured
/// [`Initializer`]. Rows are boxed so their storage never moves when
/// the map rehashes, which the shared wrapper relies on.
#[derive(Clone)]
pub struct SparseRowMatrix<T, I = u64> {
    col: usize,
    rows: HashMap<I, Box<[T]>>,
    initializer: Initializer<T>,
}

impl<T, I> Default for SparseRowMatrix<T, I> {
    fn default() -> Self {
        Self { col: 0, rows: HashMap::new(), initializer: Initializer::None }
    }
}

impl<T: fmt::Display, I: RowKey> fmt::Debug for SparseRowMatrix<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparseRowMatrix(∞,{})", self.col)?;
        for (id, row) in &self.rows {
            write!(f, "row {id}:")?;
            for v in row.iter() {
                write!(f, " {v}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<T, I> SparseRowMatrix<T, I> {
    /// Creates an empty matrix with zero columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the column count.
    #[must_use]
    pub fn col(&self) -> usize {
        self.col
    }

    /// Sets the column count. Existing rows keep their old width, so
    /// this is meant for empty matrices.
    pub fn set_col(&mut self, col: usize) {
        self.col = col;
    }

    /// Returns the logical shape `(0, col)`; the row count is
    /// unbounded.
    #[must_use]
    pub fn shape(&self) -> Shape {
        Shape::rank2(0, self.col)
    }

    /// Returns the number of materialized rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether no row is materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reserves room for `additional` more rows.
    pub fn reserve(&mut self, additional: usize)
    where
        I: Eq + Hash,
    {
        self.rows.reserve(additional);
    }

    /// Drops all rows and resets the column count and initializer.
    pub fn clear(&mut self) {
        self.col = 0;
        self.rows.clear();
        self.initializer = Initializer::None;
    }

    /// Drops all rows, keeping the column count and initializer.
    pub fn zeros(&mut self) {
        self.rows.clear();
    }

    /// Returns an iterator over `(id, row)` pairs in map order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &[T])> + '_
    where
        I: Copy,
    {
        self.rows.iter().map(|(id, row)| (*id, &**row))
    }

    /// Returns a mutable iterator over `(id, row)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut [T])> + '_
    where
        I: Copy,
    {
        self.rows.iter_mut().map(|(id, row)| (*id, &mut **row))
    }
}

impl<T: Real, I: RowKey> SparseRowMatrix<T, I> {
    /// Creates an empty matrix with the given column count.
    #[must_use]
    pub fn with_col(col: usize) -> Self {
        Self { col, ..Self::default() }
    }

    /// Builds a matrix from explicit rows, which must be non-empty and
    /// agree on their length.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ColMismatch`] when `entries` is empty or
    /// the rows disagree on their length.
    pub fn from_rows(entries: &[(I, &[T])]) -> Result<Self, TensorError> {
        let col = entries.first().map_or(0, |(_, row)| row.len());
        if col == 0 {
            return Err(TensorError::ColMismatch { left: 0, right: 0 });
        }
        for (_, row) in entries {
            if row.len() != col {
                return Err(TensorError::ColMismatch { left: col, right: row.len() });
            }
        }
        let mut srm = Self::with_col(col);
        srm.reserve(entries.len());
        for (id, row) in entries {
            srm.assign(*id, row);
        }
        Ok(srm)
    }

    /// Returns the initializer.
    #[must_use]
    pub fn initializer(&self) -> Initializer<T> {
        self.initializer
    }

    /// Sets how absent rows are filled on first access. Only `None`,
    /// `Zeros`, `Ones`, `Constant`, `Rand` and `Randn` apply to rows.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidInitializer`] for the other
    /// variants or inconsistent parameters.
    pub fn set_initializer(&mut self, initializer: Initializer<T>) -> Result<&mut Self, TensorError> {
        initializer.validate()?;
        match initializer {
            Initializer::None
            | Initializer::Zeros
            | Initializer::Ones
            | Initializer::Constant(_)
            | Initializer::Rand { .. }
            | Initializer::Randn { .. } => {
                self.initializer = initializer;
                Ok(self)
            }
            _ => {
                let (p1, p2) = initializer.params();
                Err(TensorError::InvalidInitializer {
                    kind: initializer.kind(),
                    param1: p1.to_f64().unwrap_or(f64::NAN),
                    param2: p2.to_f64().unwrap_or(f64::NAN),
                })
            }
        }
    }

    fn new_row(col: usize, initializer: Initializer<T>, rng: Option<&mut dyn FnMut(&mut [T])>) -> Box<[T]> {
        let mut row = vec![T::zero(); col].into_boxed_slice();
        match initializer {
            Initializer::Ones => fill_constant(&mut row, T::one()),
            Initializer::Constant(c) => fill_constant(&mut row, c),
            Initializer::Rand { .. } | Initializer::Randn { .. } => {
                if let Some(fill) = rng {
                    fill(&mut row);
                }
            }
            _ => {}
        }
        row
    }

    /// Returns the row for `id`, materializing and initializing it on
    /// first access.
    pub fn get_row<R: Rng + ?Sized>(&mut self, rng: &mut R, id: I) -> &mut [T] {
        let col = self.col;
        let initializer = self.initializer;
        self.rows.entry(id).or_insert_with(|| {
            let mut fill = |row: &mut [T]| match initializer {
                Initializer::Rand { min, max } => fill_rand(rng, row, min, max),
                Initializer::Randn { mean, stddev } => fill_randn(rng, row, mean, stddev),
                _ => {}
            };
            Self::new_row(col, initializer, Some(&mut fill))
        })
    }

    /// Returns the row for `id`, materializing a zero row on first
    /// access.
    pub fn get_row_no_init(&mut self, id: I) -> &mut [T] {
        let col = self.col;
        self.rows.entry(id).or_insert_with(|| vec![T::zero(); col].into_boxed_slice())
    }

    /// Returns the row for `id`, or `None` when absent.
    #[must_use]
    pub fn row(&self, id: I) -> Option<&[T]> {
        self.rows.get(&id).map(|row| &**row)
    }

    /// Scalar counterpart of [`Self::get_row`].
    ///
    /// # Panics
    ///
    /// Panics unless `col == 1`.
    pub fn get_scalar<R: Rng + ?Sized>(&mut self, rng: &mut R, id: I) -> &mut T {
        assert_eq!(self.col, 1, "get_scalar requires col 1, got {}", self.col);
        &mut self.get_row(rng, id)[0]
    }

    /// Scalar counterpart of [`Self::get_row_no_init`].
    ///
    /// # Panics
    ///
    /// Panics unless `col == 1`.
    pub fn get_scalar_no_init(&mut self, id: I) -> &mut T {
        assert_eq!(self.col, 1, "get_scalar_no_init requires col 1, got {}", self.col);
        &mut self.get_row_no_init(id)[0]
    }

    /// Returns the scalar for `id`, zero when absent.
    ///
    /// # Panics
    ///
    /// Panics unless `col == 1`.
    #[must_use]
    pub fn scalar(&self, id: I) -> T {
        assert_eq!(self.col, 1, "scalar requires col 1, got {}", self.col);
        self.rows.get(&id).map_or_else(T::zero, |row| row[0])
    }

    /// Copies `col` values into the row for `id`, materializing it if
    /// absent.
    ///
    /// # Panics
    ///
    /// Panics when `values.len() != col`.
    pub fn assign(&mut self, id: I, values: &[T]) {
        assert_eq!(values.len(), self.col, "invalid row length {} for col {}", values.len(), self.col);
        self.get_row_no_init(id).copy_from_slice(values);
    }

    /// Inserts or replaces every row of `other`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ColMismatch`] when the column counts
    /// disagree.
    pub fn upsert(&mut self, other: &Self) -> Result<(), TensorError> {
        self.check_col(other)?;
        self.rows.reserve(other.rows.len());
        for (id, row) in other.iter() {
            self.assign(id, row);
        }
        Ok(())
    }

    /// Inserts or replaces the rows of `other` accepted by `pred`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ColMismatch`] when the column counts
    /// disagree.
    pub fn upsert_if<F>(&mut self, other: &Self, mut pred: F) -> Result<(), TensorError>
    where
        F: FnMut(I, &[T]) -> bool,
    {
        self.check_col(other)?;
        self.rows.reserve(other.rows.len());
        for (id, row) in other.iter() {
            if pred(id, row) {
                self.assign(id, row);
            }
        }
        Ok(())
    }

    /// Inserts the rows of `other` that are absent here, keeping
    /// existing rows.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ColMismatch`] when the column counts
    /// disagree.
    pub fn merge(&mut self, other: &Self) -> Result<(), TensorError> {
        self.check_col(other)?;
        self.rows.reserve(other.rows.len());
        for (id, row) in &other.rows {
            self.rows.entry(*id).or_insert_with(|| row.clone());
        }
        Ok(())
    }

    /// Moving counterpart of [`Self::merge`]; `other` is left empty.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ColMismatch`] when the column counts
    /// disagree.
    pub fn merge_owned(&mut self, other: &mut Self) -> Result<(), TensorError> {
        self.check_col(other)?;
        self.rows.reserve(other.rows.len());
        for (id, row) in other.rows.drain() {
            self.rows.entry(id).or_insert(row);
        }
        Ok(())
    }

    /// Inserts the absent rows of `other` accepted by `pred`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ColMismatch`] when the column counts
    /// disagree.
    pub fn merge_if<F>(&mut self, other: &Self, mut pred: F) -> Result<(), TensorError>
    where
        F: FnMut(I, &[T]) -> bool,
    {
        self.check_col(other)?;
        self.rows.reserve(other.rows.len());
        for (id, row) in other.iter() {
            if pred(id, row) {
                self.rows.entry(id).or_insert_with(|| Box::from(row));
            }
        }
        Ok(())
    }

    /// Removes the rows accepted by `pred`.
    pub fn remove_if<F>(&mut self, mut pred: F)
    where
        F: FnMut(I, &[T]) -> bool,
    {
        self.rows.retain(|id, row| !pred(*id, row));
    }

    /// Removes the rows whose values are all zero.
    pub fn remove_zeros(&mut self) {
        self.remove_if(|_, row| row.iter().all(|v| v.is_zero()));
    }

    fn check_col(&self, other: &Self) -> Result<(), TensorError> {
        if self.col != other.col {
            return Err(TensorError::ColMismatch { left: self.col, right: other.col });
        }
        Ok(())
    }

    // Raw pointer to an existing row's storage; stable across rehash
    // because rows are boxed.
    pub(crate) fn row_ptr(&self, id: I) -> Option<*mut T> {
        self.rows.get(&id).map(|row| row.as_ptr() as *mut T)
    }
}

impl<T: PartialEq, I: RowKey> PartialEq for SparseRowMatrix<T, I>
where
    Initializer<T>: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.col == other.col && self.initializer == other.initializer && self.rows == other.rows
    }
}

macro_rules! impl_srm_serialize {
    ($($t:ty),*) => {$(
        impl<I: RowKey> Serialize for SparseRowMatrix<$t, I> {
            fn write_to(&self, os: &mut dyn OutputStream) {
                SERIALIZATION_MAGIC.write_le(os);
                (self.col as i32).write_le(os);
                self.rows.write_to(os);
                self.initializer.kind().write_le(os);
                let (p1, p2) = self.initializer.params();
                p1.write_le(os);
                p2.write_le(os);
            }
        }

        impl<I: RowKey> Deserialize for SparseRowMatrix<$t, I> {
            fn read_from(&mut self, is: &mut dyn InputStream) {
                let mut head = [0u8; 4];
                if is.peek(&mut head) != 4 {
                    is.set_bad();
                    return;
                }
                if i32::from_le_bytes(head) == SERIALIZATION_MAGIC {
                    let _magic = i32::read_le(is);
                    let col = i32::read_le(is);
                    self.rows.read_from(is);
                    let kind = i32::read_le(is);
                    let p1 = <$t>::read_le(is);
                    let p2 = <$t>::read_le(is);
                    if !is.is_ok() || col < 0 {
                        is.set_bad();
                        return;
                    }
                    match Initializer::from_parts(kind, p1, p2) {
                        Ok(init) => {
                            self.col = col as usize;
                            self.initializer = init;
                        }
                        Err(_) => is.set_bad(),
                    }
                } else {
                    // legacy layout: shape, flat values, id -> offset map
                    self.clear();
                    let mut shape = Shape::scalar();
                    let mut values: Vec<$t> = Vec::new();
                    let mut offsets: HashMap<I, u64> = HashMap::new();
                    shape.read_from(is);
                    values.read_from(is);
                    offsets.read_from(is);
                    let kind = i32::read_le(is);
                    let p1 = <$t>::read_le(is);
                    let p2 = <$t>::read_le(is);
                    if !is.is_ok() || !shape.is_rank(2) {
                        is.set_bad();
                        return;
                    }
                    let col = shape.dim(1);
                    match Initializer::from_parts(kind, p1, p2) {
                        Ok(init) => {
                            self.col = col;
                            self.initializer = init;
                        }
                        Err(_) => {
                            is.set_bad();
                            return;
                        }
                    }
                    for (id, offset) in &offsets {
                        let at = *offset as usize;
                        if at + col > values.len() {
                            is.set_bad();
                            return;
                        }
                        self.assign(*id, &values[at..at + col]);
                    }
                }
            }
        }

        impl<I: RowKey> SparseRowMatrix<$t, I> {
            /// Reads the sparse-row-parameter layouts of old model
            /// files: the magic-tagged layout, or col + row map without
            /// the magic.
            pub fn read_srp(&mut self, is: &mut dyn InputStream) {
                let mut head = [0u8; 4];
                if is.peek(&mut head) != 4 {
                    is.set_bad();
                    return;
                }
                if i32::from_le_bytes(head) == SERIALIZATION_MAGIC {
                    self.read_from(is);
                    return;
                }
                let col = i32::read_le(is);
                self.rows.read_from(is);
                let kind = i32::read_le(is);
                let p1 = <$t>::read_le(is);
                let p2 = <$t>::read_le(is);
                if !is.is_ok() || col < 0 {
                    is.set_bad();
                    return;
                }
                match Initializer::from_parts(kind, p1, p2) {
                    Ok(init) => {
                        self.col = col as usize;
                        self.initializer = init;
                    }
                    Err(_) => is.set_bad(),
                }
            }

            /// Reads the sparse-vector-parameter layout of old model
            /// files: a scalar map, producing a matrix with one column.
            pub fn read_svp(&mut self, is: &mut dyn InputStream) {
                self.clear();
                let mut scalars: HashMap<I, $t> = HashMap::new();
                scalars.read_from(is);
                let kind = i32::read_le(is);
                let p1 = <$t>::read_le(is);
                let p2 = <$t>::read_le(is);
                if !is.is_ok() {
                    return;
                }
                match Initializer::from_parts(kind, p1, p2) {
                    Ok(init) => {
                        self.col = 1;
                        self.initializer = init;
                    }
                    Err(_) => {
                        is.set_bad();
                        return;
                    }
                }
                self.rows.reserve(scalars.len());
                for (id, value) in &scalars {
                    self.assign(*id, core::slice::from_ref(value));
                }
            }
        }

        impl<'a, I: RowKey> ReadView<'a> for SparseRowMatrixView<'a, $t, I> {
            fn read_view(&mut self, is: &mut InputStringStream<'a>) {
                let mut head = [0u8; 4];
                if is.peek(&mut head) != 4 {
                    is.set_bad();
                    return;
                }
                if i32::from_le_bytes(head) != SERIALIZATION_MAGIC {
                    // the legacy layout cannot be viewed
                    is.set_bad();
                    return;
                }
                let _magic = i32::read_le(is);
                let col = i32::read_le(is);
                let Some(size) = read_container_size(is) else {
                    return;
                };
                self.rows.clear();
                self.rows.reserve(size);
                for _ in 0..size {
                    let id = I::read_le(is);
                    let len = i32::read_le(is);
                    if !is.is_ok() || len < 0 {
                        is.set_bad();
                        return;
                    }
                    let bytes = len as usize * core::mem::size_of::<$t>();
                    let buf = is.remaining();
                    if buf.len() < bytes {
                        is.set_bad();
                        return;
                    }
                    let row = match bytemuck::try_cast_slice::<u8, $t>(&buf[..bytes]) {
                        Ok(slice) => Cow::Borrowed(slice),
                        Err(_) => {
                            // unaligned buffer, keep an owned copy
                            let mut row = vec![<$t>::default(); len as usize];
                            for (i, v) in row.iter_mut().enumerate() {
                                let mut le = [0u8; core::mem::size_of::<$t>()];
                                let at = i * core::mem::size_of::<$t>();
                                let le_len = le.len();
                                le.copy_from_slice(&buf[at..at + le_len]);
                                *v = <$t>::from_le_bytes(le);
                            }
                            Cow::Owned(row)
                        }
                    };
                    is.skip(bytes);
                    self.rows.insert(id, row);
                }
                let kind = i32::read_le(is);
                let p1 = <$t>::read_le(is);
                let p2 = <$t>::read_le(is);
                if !is.is_ok() || col < 0 {
                    is.set_bad();
                    return;
                }
                match Initializer::from_parts(kind, p1, p2) {
                    Ok(init) => {
                        self.col = col as usize;
                        self.initializer = init;
                    }
                    Err(_) => is.set_bad(),
                }
            }
        }
    )*};
}

impl_srm_serialize!(f32, f64);

/// A zero-copy view of a serialized [`SparseRowMatrix`]: row storage
/// borrows the parsed buffer, which must outlive the view.
#[derive(Debug, Clone, Default)]
pub struct SparseRowMatrixView<'a, T: Clone, I> {
    col: usize,
    rows: HashMap<I, Cow<'a, [T]>>,
    initializer: Initializer<T>,
}

impl<'a, T: Clone, I: RowKey> SparseRowMatrixView<'a, T, I> {
    /// Creates an empty view with the given column count.
    #[must_use]
    pub fn with_col(col: usize) -> Self {
        Self { col, rows: HashMap::new(), initializer: Initializer::None }
    }

    /// Retains a non-owning row slice of foreign memory.
    ///
    /// # Panics
    ///
    /// Panics when `row.len()` does not match the column count.
    pub fn assign_view(&mut self, id: I, row: &'a [T]) {
        assert_eq!(row.len(), self.col, "invalid row length {} for col {}", row.len(), self.col);
        self.rows.insert(id, Cow::Borrowed(row));
    }

    /// Returns the column count.
    #[must_use]
    pub fn col(&self) -> usize {
        self.col
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the view holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the initializer.
    #[must_use]
    pub fn initializer(&self) -> Initializer<T>
    where
        T: Copy,
    {
        self.initializer
    }

    /// Returns the row for `id`, or `None` when absent.
    #[must_use]
    pub fn row(&self, id: I) -> Option<&[T]> {
        self.rows.get(&id).map(|row| &**row)
    }

    /// Returns an iterator over `(id, row)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (I, &[T])> + '_ {
        self.rows.iter().map(|(id, row)| (*id, &**row))
    }

    /// Returns whether every row borrows the parsed buffer.
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        self.rows.values().all(|row| matches!(row, Cow::Borrowed(_)))
    }

    /// Clones the viewed rows into an owned matrix.
    #[must_use]
    pub fn to_matrix(&self) -> SparseRowMatrix<T, I>
    where
        T: Real,
    {
        let mut srm = SparseRowMatrix::with_col(self.col);
        srm.initializer = self.initializer;
        srm.rows.reserve(self.rows.len());
        for (id, row) in self.iter() {
            srm.rows.insert(id, Box::from(row));
        }
        srm
    }
}

impl<T, I> PartialEq<SparseRowMatrix<T, I>> for SparseRowMatrixView<'_, T, I>
where
    T: Clone + PartialEq,
    I: RowKey,
    Initializer<T>: PartialEq,
{
    fn eq(&self, other: &SparseRowMatrix<T, I>) -> bool {
        self.col == other.col
            && self.initializer == other.initializer
            && self.rows.len() == other.rows.len()
            && self.iter().all(|(id, row)| other.rows.get(&id).is_some_and(|r| **r == *row))
    }
}

impl<T, I> PartialEq<SparseRowMatrixView<'_, T, I>> for SparseRowMatrix<T, I>
where
    T: Clone + PartialEq,
    I: RowKey,
    Initializer<T>: PartialEq,
{
    fn eq(&self, other: &SparseRowMatrixView<'_, T, I>) -> bool {
        other == self
    }
}

/// A sparse row matrix shared between training threads.
///
/// The embedded [`ReadWriteLock`] serializes changes to the row map
/// structure: lookups take the read lock, row creation promotes to the
/// write lock (double-checked). Row *values* are read and written
/// through raw pointers outside the lock; concurrent value updates may
/// race, which Hogwild-style training tolerates by design. Rows are
/// never removed or resized while shared, so the returned pointers
/// stay valid for the lifetime of the wrapper.
pub struct SharedSparseRowMatrix<T, I = u64> {
    inner: UnsafeCell<SparseRowMatrix<T, I>>,
    lock: ReadWriteLock,
}

// The row map is only mutated under the write lock; value races are
// accepted by the training algorithm.
unsafe impl<T: Send + Sync, I: Send + Sync> Sync for SharedSparseRowMatrix<T, I> {}
unsafe impl<T: Send, I: Send> Send for SharedSparseRowMatrix<T, I> {}

impl<T: Real, I: RowKey> SharedSparseRowMatrix<T, I> {
    /// Wraps a matrix for shared use.
    #[must_use]
    pub fn new(srm: SparseRowMatrix<T, I>) -> Self {
        Self { inner: UnsafeCell::new(srm), lock: ReadWriteLock::new() }
    }

    /// Unwraps the matrix.
    #[must_use]
    pub fn into_inner(self) -> SparseRowMatrix<T, I> {
        self.inner.into_inner()
    }

    /// Returns the column count.
    #[must_use]
    pub fn col(&self) -> usize {
        let _guard = self.lock.read();
        // SAFETY: shared access under the read lock.
        unsafe { (*self.inner.get()).col() }
    }

    /// Returns the number of materialized rows.
    #[must_use]
    pub fn len(&self) -> usize {
        let _guard = self.lock.read();
        // SAFETY: shared access under the read lock.
        unsafe { (*self.inner.get()).len() }
    }

    /// Returns whether no row is materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` with shared access to the matrix.
    pub fn with_read<R>(&self, f: impl FnOnce(&SparseRowMatrix<T, I>) -> R) -> R {
        let _guard = self.lock.read();
        // SAFETY: shared access under the read lock.
        f(unsafe { &*self.inner.get() })
    }

    /// Runs `f` with exclusive access to the matrix.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut SparseRowMatrix<T, I>) -> R) -> R {
        let _guard = self.lock.write();
        // SAFETY: exclusive access under the write lock.
        f(unsafe { &mut *self.inner.get() })
    }

    /// Returns a raw pointer to the row for `id`, materializing and
    /// initializing it under the write lock on first access.
    ///
    /// The pointer addresses `col` values and stays valid while the
    /// wrapper lives; writes through it may race with other threads.
    pub fn get_row<R: Rng + ?Sized>(&self, rng: &mut R, id: I) -> *mut T {
        {
            let _guard = self.lock.read();
            // SAFETY: shared access under the read lock.
            if let Some(ptr) = unsafe { (*self.inner.get()).row_ptr(id) } {
                return ptr;
            }
        }
        let _guard = self.lock.write();
        // SAFETY: exclusive access under the write lock.
        unsafe { (*self.inner.get()).get_row(rng, id).as_mut_ptr() }
    }

    /// Returns a raw pointer to the row for `id`, materializing a zero
    /// row under the write lock on first access.
    pub fn get_row_no_init(&self, id: I) -> *mut T {
        {
            let _guard = self.lock.read();
            // SAFETY: shared access under the read lock.
            if let Some(ptr) = unsafe { (*self.inner.get()).row_ptr(id) } {
                return ptr;
            }
        }
        let _guard = self.lock.write();
        // SAFETY: exclusive access under the write lock.
        unsafe { (*self.inner.get()).get_row_no_init(id).as_mut_ptr() }
    }

    /// Copies `col` values into the row for `id` under the write lock.
    pub fn assign(&self, id: I, values: &[T]) {
        let _guard = self.lock.write();
        // SAFETY: exclusive access under the write lock.
        unsafe { (*self.inner.get()).assign(id, values) }
    }

    /// Inserts or replaces every row of `other`, row by row under the
    /// write lock.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ColMismatch`] when the column counts
    /// disagree.
    pub fn upsert(&self, other: &SparseRowMatrix<T, I>) -> Result<(), TensorError> {
        if self.col() != other.col() {
            return Err(TensorError::ColMismatch { left: self.col(), right: other.col() });
        }
        {
            let _guard = self.lock.write();
            // SAFETY: exclusive access under the write lock.
            unsafe { (*self.inner.get()).reserve(other.len()) };
        }
        for (id, row) in other.iter() {
            self.assign(id, row);
        }
        Ok(())
    }

    /// Inserts or replaces the rows of `other` accepted by `pred`.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::ColMismatch`] when the column counts
    /// disagree.
    pub fn upsert_if<F>(&self, other: &SparseRowMatrix<T, I>, mut pred: F) -> Result<(), TensorError>
    where
        F: FnMut(I, &[T]) -> bool,
    {
        if self.col() != other.col() {
            return Err(TensorError::ColMismatch { left: self.col(), right: other.col() });
        }
        for (id, row) in other.iter() {
            if pred(id, row) {
                self.assign(id, row);
            }
        }
        Ok(())
    }
}
