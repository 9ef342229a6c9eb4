//! Submodule providing the binary serialization protocol.
//!
//! Every multi-byte value is written little-endian, on every host.
//! Versioned containers (hash maps, sets, sparse row matrices) start
//! with the magic number [`SERIALIZATION_MAGIC`]; readers peek the
//! first `i32` and fall back to the pre-magic legacy layout when it
//! does not match. New layouts bump a version inside the magic-tagged
//! header rather than change the magic.

use byteorder::{ByteOrder, LittleEndian};
use hashbrown::{HashMap, HashSet};

use crate::io::{
    stream::{InputStream, OutputStream, StreamState},
    string_stream::{InputStringStream, OutputStringStream},
};

/// The magic number tagging versioned binary layouts.
pub const SERIALIZATION_MAGIC: i32 = 0x0a0c_72e7;

/// A fixed-width machine scalar with a defined little-endian wire form.
pub trait Scalar: bytemuck::Pod + Default + PartialEq + Send + Sync + 'static {
    /// Writes the little-endian bytes of `self`.
    fn write_le(&self, os: &mut dyn OutputStream);

    /// Reads a value from its little-endian bytes; returns the default
    /// value on a short read (which latches the stream's bad bit).
    fn read_le(is: &mut dyn InputStream) -> Self;
}

macro_rules! impl_scalar {
    ($t:ty, $size:expr, $write:path, $read:path) => {
        impl Scalar for $t {
            fn write_le(&self, os: &mut dyn OutputStream) {
                let mut buf = [0u8; $size];
                $write(&mut buf, *self);
                os.write(&buf);
            }

            fn read_le(is: &mut dyn InputStream) -> Self {
                let mut buf = [0u8; $size];
                if is.read(&mut buf) == $size {
                    $read(&buf)
                } else {
                    Self::default()
                }
            }
        }
    };
}

impl Scalar for u8 {
    fn write_le(&self, os: &mut dyn OutputStream) {
        os.write(&[*self]);
    }

    fn read_le(is: &mut dyn InputStream) -> Self {
        let mut buf = [0u8; 1];
        if is.read(&mut buf) == 1 {
            buf[0]
        } else {
            0
        }
    }
}

impl Scalar for i8 {
    fn write_le(&self, os: &mut dyn OutputStream) {
        os.write(&[*self as u8]);
    }

    fn read_le(is: &mut dyn InputStream) -> Self {
        u8::read_le(is) as i8
    }
}

impl_scalar!(u16, 2, LittleEndian::write_u16, LittleEndian::read_u16);
impl_scalar!(i16, 2, LittleEndian::write_i16, LittleEndian::read_i16);
impl_scalar!(u32, 4, LittleEndian::write_u32, LittleEndian::read_u32);
impl_scalar!(i32, 4, LittleEndian::write_i32, LittleEndian::read_i32);
impl_scalar!(u64, 8, LittleEndian::write_u64, LittleEndian::read_u64);
impl_scalar!(i64, 8, LittleEndian::write_i64, LittleEndian::read_i64);
impl_scalar!(f32, 4, LittleEndian::write_f32, LittleEndian::read_f32);
impl_scalar!(f64, 8, LittleEndian::write_f64, LittleEndian::read_f64);

/// Writes a scalar slice as one block on little-endian hosts, element
/// by element elsewhere. The wire bytes are identical either way.
pub(crate) fn write_pod_slice<T: Scalar>(os: &mut dyn OutputStream, values: &[T]) {
    if cfg!(target_endian = "little") {
        os.write(bytemuck::cast_slice(values));
    } else {
        for v in values {
            v.write_le(os);
        }
    }
}

/// Counterpart of [`write_pod_slice`].
pub(crate) fn read_pod_slice<T: Scalar>(is: &mut dyn InputStream, values: &mut [T]) {
    if cfg!(target_endian = "little") {
        is.read(bytemuck::cast_slice_mut(values));
    } else {
        for v in values.iter_mut() {
            *v = T::read_le(is);
        }
    }
}

/// An entity with a binary wire form.
pub trait Serialize {
    /// Writes `self` to `os`. Failure latches the stream's bad bit.
    fn write_to(&self, os: &mut dyn OutputStream);
}

/// An entity readable in place from its binary wire form.
pub trait Deserialize {
    /// Reads into `self` from `is`. Failure latches the stream's bad
    /// bit and leaves `self` unspecified but valid.
    fn read_from(&mut self, is: &mut dyn InputStream);
}

/// An entity readable from a borrowed buffer without copying bulk data.
///
/// Views are at most one level deep: scalars, strings and containers
/// of scalars are copied; only tensor storage and sparse-row-matrix
/// rows borrow from the buffer.
pub trait ReadView<'a> {
    /// Reads into `self`, borrowing bulk storage from the stream's
    /// buffer where possible.
    fn read_view(&mut self, is: &mut InputStringStream<'a>);
}

macro_rules! impl_serialize_scalar {
    ($($t:ty),*) => {$(
        impl Serialize for $t {
            fn write_to(&self, os: &mut dyn OutputStream) {
                self.write_le(os);
            }
        }

        impl Deserialize for $t {
            fn read_from(&mut self, is: &mut dyn InputStream) {
                *self = <$t>::read_le(is);
            }
        }

        impl<'a> ReadView<'a> for $t {
            fn read_view(&mut self, is: &mut InputStringStream<'a>) {
                self.read_from(is);
            }
        }
    )*};
}

impl_serialize_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Serialize for String {
    fn write_to(&self, os: &mut dyn OutputStream) {
        (self.len() as i32).write_le(os);
        if !self.is_empty() {
            os.write(self.as_bytes());
        }
    }
}

impl Deserialize for String {
    fn read_from(&mut self, is: &mut dyn InputStream) {
        let size = i32::read_le(is);
        if !is.is_ok() || size < 0 {
            is.set_bad();
            return;
        }
        let mut bytes = vec![0u8; size as usize];
        if is.read(&mut bytes) != size as usize {
            return;
        }
        match String::from_utf8(bytes) {
            Ok(s) => *self = s,
            Err(_) => is.set_bad(),
        }
    }
}

impl<'a> ReadView<'a> for String {
    fn read_view(&mut self, is: &mut InputStringStream<'a>) {
        self.read_from(is);
    }
}

impl<T: Serialize> Serialize for Vec<T> {
    fn write_to(&self, os: &mut dyn OutputStream) {
        (self.len() as i32).write_le(os);
        for v in self {
            v.write_to(os);
            if !os.is_ok() {
                break;
            }
        }
    }
}

impl<T: Deserialize + Default> Deserialize for Vec<T> {
    fn read_from(&mut self, is: &mut dyn InputStream) {
        let size = i32::read_le(is);
        if !is.is_ok() || size < 0 {
            is.set_bad();
            return;
        }
        self.clear();
        self.reserve(size as usize);
        for _ in 0..size {
            let mut v = T::default();
            v.read_from(is);
            if !is.is_ok() {
                return;
            }
            self.push(v);
        }
    }
}

impl<T: Scalar> Serialize for Box<[T]> {
    fn write_to(&self, os: &mut dyn OutputStream) {
        (self.len() as i32).write_le(os);
        if !self.is_empty() {
            write_pod_slice(os, self);
        }
    }
}

impl<T: Scalar> Deserialize for Box<[T]> {
    fn read_from(&mut self, is: &mut dyn InputStream) {
        let size = i32::read_le(is);
        if !is.is_ok() || size < 0 {
            is.set_bad();
            return;
        }
        let mut row = vec![T::default(); size as usize];
        read_pod_slice(is, &mut row);
        if is.is_ok() {
            *self = row.into_boxed_slice();
        }
    }
}

impl<A: Serialize, B: Serialize> Serialize for (A, B) {
    fn write_to(&self, os: &mut dyn OutputStream) {
        self.0.write_to(os);
        self.1.write_to(os);
    }
}

impl<A: Deserialize, B: Deserialize> Deserialize for (A, B) {
    fn read_from(&mut self, is: &mut dyn InputStream) {
        self.0.read_from(is);
        self.1.read_from(is);
    }
}

/// Peeks the leading `i32` of a versioned container and consumes the
/// size header, returning the entry count, or `None` on a bad stream.
pub(crate) fn read_container_size(is: &mut dyn InputStream) -> Option<usize> {
    let mut head = [0u8; 4];
    if is.peek(&mut head) != 4 {
        is.set_bad();
        return None;
    }
    if LittleEndian::read_i32(&head) == SERIALIZATION_MAGIC {
        let _magic = i32::read_le(is);
        let size = u64::read_le(is);
        is.is_ok().then_some(size as usize)
    } else {
        // legacy layout without the magic
        let size = i32::read_le(is);
        if !is.is_ok() || size < 0 {
            is.set_bad();
            return None;
        }
        Some(size as usize)
    }
}

impl<K: Serialize, V: Serialize, S> Serialize for HashMap<K, V, S> {
    fn write_to(&self, os: &mut dyn OutputStream) {
        SERIALIZATION_MAGIC.write_le(os);
        (self.len() as u64).write_le(os);
        for (k, v) in self {
            k.write_to(os);
            v.write_to(os);
            if !os.is_ok() {
                break;
            }
        }
    }
}

impl<K, V, S> Deserialize for HashMap<K, V, S>
where
    K: Deserialize + Default + Eq + core::hash::Hash,
    V: Deserialize + Default,
    S: core::hash::BuildHasher,
{
    fn read_from(&mut self, is: &mut dyn InputStream) {
        let Some(size) = read_container_size(is) else {
            return;
        };
        self.clear();
        self.reserve(size);
        for _ in 0..size {
            let mut k = K::default();
            let mut v = V::default();
            k.read_from(is);
            v.read_from(is);
            if !is.is_ok() {
                return;
            }
            self.insert(k, v);
        }
    }
}

impl<V: Serialize, S> Serialize for HashSet<V, S> {
    fn write_to(&self, os: &mut dyn OutputStream) {
        SERIALIZATION_MAGIC.write_le(os);
        (self.len() as u64).write_le(os);
        for v in self {
            v.write_to(os);
            if !os.is_ok() {
                break;
            }
        }
    }
}

impl<V, S> Deserialize for HashSet<V, S>
where
    V: Deserialize + Default + Eq + core::hash::Hash,
    S: core::hash::BuildHasher,
{
    fn read_from(&mut self, is: &mut dyn InputStream) {
        let Some(size) = read_container_size(is) else {
            return;
        };
        self.clear();
        self.reserve(size);
        for _ in 0..size {
            let mut v = V::default();
            v.read_from(is);
            if !is.is_ok() {
                return;
            }
            self.insert(v);
        }
    }
}

impl<'a, K, V, S> ReadView<'a> for HashMap<K, V, S>
where
    K: Deserialize + Default + Eq + core::hash::Hash,
    V: Deserialize + Default,
    S: core::hash::BuildHasher,
{
    fn read_view(&mut self, is: &mut InputStringStream<'a>) {
        self.read_from(is);
    }
}

impl<'a, V, S> ReadView<'a> for HashSet<V, S>
where
    V: Deserialize + Default + Eq + core::hash::Hash,
    S: core::hash::BuildHasher,
{
    fn read_view(&mut self, is: &mut InputStringStream<'a>) {
        self.read_from(is);
    }
}

/// Serializes `t` into a fresh byte vector, or `None` on failure.
pub fn serialize_to_vec<T: Serialize + ?Sized>(t: &T) -> Option<Vec<u8>> {
    let mut os = OutputStringStream::new();
    t.write_to(&mut os);
    os.is_ok().then(|| os.into_bytes())
}

/// Parses `t` in place from `buf`. Returns whether the whole entity
/// was read successfully.
pub fn parse_from_bytes<T: Deserialize + ?Sized>(buf: &[u8], t: &mut T) -> bool {
    let mut is = InputStringStream::new(buf);
    t.read_from(&mut is);
    is.is_ok()
}

/// Parses `t` in place from `buf`, borrowing bulk storage from it.
/// The buffer must outlive `t`.
pub fn parse_view_from_bytes<'a, T: ReadView<'a> + ?Sized>(buf: &'a [u8], t: &mut T) -> bool {
    let mut is = InputStringStream::new(buf);
    t.read_view(&mut is);
    is.is_ok()
}
