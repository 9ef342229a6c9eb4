//! Submodule providing the stream traits shared by every transport.
//!
//! Streams report failure through a sticky bad bit instead of
//! `Result`s: once a stream goes bad, every subsequent operation is a
//! no-op that keeps the bit set. Callers check with [`StreamState::is_ok`].

/// Sticky error state carried by every stream.
pub trait StreamState {
    /// Returns whether the stream is still usable.
    fn is_ok(&self) -> bool;

    /// Returns whether the stream has latched a failure.
    fn bad(&self) -> bool {
        !self.is_ok()
    }

    /// Latches the bad bit.
    fn set_bad(&mut self);

    /// Clears the bad bit. Discouraged: the bit exists so that failures
    /// cannot be silently ignored.
    fn clear_bad(&mut self);
}

/// A byte source.
pub trait InputStream: StreamState {
    /// Reads up to `data.len()` bytes. A short read latches the bad bit
    /// and returns the number of bytes actually transferred.
    fn read(&mut self, data: &mut [u8]) -> usize;

    /// Reads a single byte, or `None` at end of input (latching the bad
    /// bit).
    fn read_byte(&mut self) -> Option<u8>;

    /// Reads up to `data.len()` bytes without consuming them. A short
    /// peek returns the available byte count.
    fn peek(&mut self, data: &mut [u8]) -> usize;
}

/// A byte sink.
pub trait OutputStream: StreamState {
    /// Writes `data`. A short write latches the bad bit and returns the
    /// number of bytes actually transferred.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Flushes buffered bytes to the underlying transport.
    fn flush(&mut self) -> bool {
        true
    }
}

impl StreamState for Box<dyn InputStream> {
    fn is_ok(&self) -> bool {
        (**self).is_ok()
    }

    fn set_bad(&mut self) {
        (**self).set_bad();
    }

    fn clear_bad(&mut self) {
        (**self).clear_bad();
    }
}

impl InputStream for Box<dyn InputStream> {
    fn read(&mut self, data: &mut [u8]) -> usize {
        (**self).read(data)
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn peek(&mut self, data: &mut [u8]) -> usize {
        (**self).peek(data)
    }
}

impl StreamState for Box<dyn OutputStream> {
    fn is_ok(&self) -> bool {
        (**self).is_ok()
    }

    fn set_bad(&mut self) {
        (**self).set_bad();
    }

    fn clear_bad(&mut self) {
        (**self).clear_bad();
    }
}

impl OutputStream for Box<dyn OutputStream> {
    fn write(&mut self, data: &[u8]) -> usize {
        (**self).write(data)
    }

    fn flush(&mut self) -> bool {
        (**self).flush()
    }
}

/// Reads bytes into `line` until `delim` (consumed, not stored) or end
/// of input, replacing invalid UTF-8. Returns `false` once the stream
/// is bad and nothing was read, so it can drive a `while` loop.
pub fn read_line_delim(is: &mut dyn InputStream, line: &mut String, delim: u8) -> bool {
    line.clear();
    let mut bytes = Vec::new();
    let more = loop {
        match is.read_byte() {
            Some(b) if b == delim => break true,
            Some(b) => bytes.push(b),
            None => break !bytes.is_empty(),
        }
    };
    *line = String::from_utf8_lossy(&bytes).into_owned();
    more
}

/// Reads a `\n`-terminated line. See [`read_line_delim`].
pub fn read_line(is: &mut dyn InputStream, line: &mut String) -> bool {
    read_line_delim(is, line, b'\n')
}
