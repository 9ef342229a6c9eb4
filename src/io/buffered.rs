//! Submodule providing the buffered input wrapper.

use crate::io::stream::{InputStream, StreamState};

/// Default buffer size of a [`BufferedInputStream`].
pub const DEFAULT_BUF_SIZE: usize = 64 * 1024;

/// Wraps a slower input stream with a growable read buffer.
///
/// `peek` transparently grows the buffer to satisfy requests larger
/// than the buffered remainder.
#[derive(Debug)]
pub struct BufferedInputStream<S> {
    inner: S,
    buf: Vec<u8>,
    cur: usize,
    end: usize,
    bad: bool,
}

impl<S: InputStream> BufferedInputStream<S> {
    /// Wraps `inner` with the default buffer size.
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_BUF_SIZE)
    }

    /// Wraps `inner` with an explicit buffer size.
    pub fn with_capacity(inner: S, buf_size: usize) -> Self {
        Self { inner, buf: vec![0; buf_size.max(1)], cur: 0, end: 0, bad: false }
    }

    /// Unwraps the underlying stream, discarding buffered bytes.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn fill_empty_buf(&mut self) -> usize {
        let buf_size = self.buf.len();
        let bytes = self.inner.read(&mut self.buf[..buf_size]);
        if bytes == 0 {
            self.bad = true;
            return 0;
        }
        self.cur = 0;
        self.end = bytes;
        bytes
    }

    fn ensure_buf(&mut self, need_bytes: usize) -> usize {
        let mut avail = self.end - self.cur;
        if avail >= need_bytes {
            return avail;
        }

        let need_buf_size = self.cur + need_bytes;
        if need_buf_size > self.buf.len() {
            self.buf.resize(need_buf_size, 0);
        }

        let end = self.end;
        let bytes = self.inner.read(&mut self.buf[end..]);
        if bytes == 0 {
            self.bad = true;
            return avail;
        }
        avail += bytes;
        self.end += bytes;
        avail
    }
}

impl<S: InputStream> StreamState for BufferedInputStream<S> {
    fn is_ok(&self) -> bool {
        !self.bad
    }

    fn set_bad(&mut self) {
        self.bad = true;
    }

    fn clear_bad(&mut self) {
        self.bad = false;
    }
}

impl<S: InputStream> InputStream for BufferedInputStream<S> {
    fn read(&mut self, data: &mut [u8]) -> usize {
        if self.bad {
            return 0;
        }
        let size = data.len();
        let mut need = size;
        let mut avail = self.end - self.cur;
        loop {
            if avail >= need {
                let at = size - need;
                data[at..].copy_from_slice(&self.buf[self.cur..self.cur + need]);
                self.cur += need;
                return size;
            }
            if avail > 0 {
                let at = size - need;
                data[at..at + avail].copy_from_slice(&self.buf[self.cur..self.end]);
                self.cur = self.end;
                need -= avail;
            }
            avail = self.fill_empty_buf();
            if avail == 0 {
                return size - need;
            }
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.bad {
            return None;
        }
        if self.cur == self.end && self.fill_empty_buf() == 0 {
            return None;
        }
        let b = self.buf[self.cur];
        self.cur += 1;
        Some(b)
    }

    fn peek(&mut self, data: &mut [u8]) -> usize {
        if self.bad {
            return 0;
        }
        let avail = self.ensure_buf(data.len());
        let size = data.len().min(avail);
        data[..size].copy_from_slice(&self.buf[self.cur..self.cur + size]);
        size
    }
}
