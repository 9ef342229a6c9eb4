//! Submodule providing the streaming gunzip input wrapper.

use flate2::{Decompress, FlushDecompress, Status};
use log::error;

use crate::io::stream::{InputStream, StreamState};

// Compressed-side buffer size; the decompressed buffer starts 8x as
// large.
const COMP_BUF_SIZE: usize = 64 * 1024;

/// Decompresses a gzip stream on the fly.
///
/// The wrapper keeps a fixed compressed-side buffer and a growable
/// decompressed buffer, so `peek` can satisfy requests larger than one
/// inflate step.
#[derive(Debug)]
pub struct GunzipInputStream<S> {
    inner: S,
    decompress: Decompress,
    comp_buf: Vec<u8>,
    comp_cur: usize,
    comp_end: usize,
    buf: Vec<u8>,
    cur: usize,
    end: usize,
    bad: bool,
}

impl<S: InputStream> GunzipInputStream<S> {
    /// Wraps `inner`, which must carry a gzip member.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            decompress: Decompress::new_gzip(15),
            comp_buf: vec![0; COMP_BUF_SIZE],
            comp_cur: 0,
            comp_end: 0,
            buf: vec![0; COMP_BUF_SIZE * 8],
            cur: 0,
            end: 0,
            bad: false,
        }
    }

    /// Unwraps the underlying stream, discarding buffered bytes.
    pub fn into_inner(self) -> S {
        self.inner
    }

    // Pulls more compressed bytes, compacting any unconsumed remainder
    // to the front of the buffer. Returns whether new input arrived.
    fn grow_input(&mut self) -> bool {
        if self.comp_cur > 0 {
            self.comp_buf.copy_within(self.comp_cur..self.comp_end, 0);
            self.comp_end -= self.comp_cur;
            self.comp_cur = 0;
        }
        if self.comp_end == self.comp_buf.len() {
            return false;
        }
        let end = self.comp_end;
        let bytes = self.inner.read(&mut self.comp_buf[end..]);
        if bytes == 0 {
            return false;
        }
        self.comp_end += bytes;
        true
    }

    // Inflates into `self.buf[at..]`, advancing the compressed cursor.
    // Returns the produced byte count, or `None` on a corrupt stream.
    fn inflate_step(&mut self, at: usize) -> Option<usize> {
        let before_in = self.decompress.total_in();
        let before_out = self.decompress.total_out();
        let status = self
            .decompress
            .decompress(
                &self.comp_buf[self.comp_cur..self.comp_end],
                &mut self.buf[at..],
                FlushDecompress::Sync,
            )
            .map_err(|e| error!("failed to inflate: {e}"))
            .ok()?;
        self.comp_cur += (self.decompress.total_in() - before_in) as usize;
        let produced = (self.decompress.total_out() - before_out) as usize;
        match status {
            Status::Ok | Status::BufError | Status::StreamEnd => Some(produced),
        }
    }

    fn fill_empty_buf(&mut self) -> usize {
        loop {
            if self.comp_cur == self.comp_end && !self.grow_input() {
                self.bad = true;
                return 0;
            }
            let consumed_before = self.comp_cur;
            match self.inflate_step(0) {
                None => {
                    self.bad = true;
                    return 0;
                }
                Some(0) => {
                    // only header or trailer bytes were consumed; a
                    // step with no progress at all needs more input
                    if self.comp_cur == consumed_before && !self.grow_input() {
                        self.bad = true;
                        return 0;
                    }
                }
                Some(produced) => {
                    self.cur = 0;
                    self.end = produced;
                    return produced;
                }
            }
        }
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

        loop {
            if self.comp_cur == self.comp_end && !self.grow_input() {
                self.bad = true;
                return avail;
            }
            let consumed_before = self.comp_cur;
            let end = self.end;
            match self.inflate_step(end) {
                None => {
                    self.bad = true;
                    return avail;
                }
                Some(produced) => {
                    if produced == 0 && self.comp_cur == consumed_before && !self.grow_input() {
                        self.bad = true;
                        return avail;
                    }
                    avail += produced;
                    self.end += produced;
                    if avail >= need_bytes {
                        return avail;
                    }
                }
            }
        }
    }
}

impl<S: InputStream> StreamState for GunzipInputStream<S> {
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

impl<S: InputStream> InputStream for GunzipInputStream<S> {
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
