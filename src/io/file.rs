//! Submodule providing the local file stream.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use log::error;

use crate::{
    error::StreamError,
    io::{
        path::is_stdin_stdout_path,
        stream::{InputStream, OutputStream, StreamState},
    },
};

/// Open-mode bits of a [`FileStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenMode(u32);

impl OpenMode {
    /// No mode.
    pub const NONE: OpenMode = OpenMode(0);
    /// Append to the end of the file.
    pub const APPEND: OpenMode = OpenMode(0x01);
    /// Truncate the file on open.
    pub const TRUNCATE: OpenMode = OpenMode(0x02);
    /// Open for reading.
    pub const IN: OpenMode = OpenMode(0x04);
    /// Open for writing.
    pub const OUT: OpenMode = OpenMode(0x08);

    /// Returns whether every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: OpenMode) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl core::ops::BitOr for OpenMode {
    type Output = OpenMode;

    fn bitor(self, rhs: OpenMode) -> OpenMode {
        OpenMode(self.0 | rhs.0)
    }
}

fn open_options(mode: OpenMode) -> Result<OpenOptions, StreamError> {
    let mut options = OpenOptions::new();
    let m = mode.0;
    if m == OpenMode::IN.0 {
        options.read(true);
    } else if m == OpenMode::OUT.0 || m == (OpenMode::OUT | OpenMode::TRUNCATE).0 {
        options.write(true).create(true).truncate(true);
    } else if m == OpenMode::APPEND.0 || m == (OpenMode::APPEND | OpenMode::OUT).0 {
        options.append(true).create(true);
    } else if m == (OpenMode::OUT | OpenMode::IN).0 {
        options.read(true).write(true);
    } else if m == (OpenMode::OUT | OpenMode::IN | OpenMode::TRUNCATE).0 {
        options.read(true).write(true).create(true).truncate(true);
    } else if m == (OpenMode::IN | OpenMode::APPEND).0
        || m == (OpenMode::OUT | OpenMode::IN | OpenMode::APPEND).0
    {
        options.read(true).append(true).create(true);
    } else {
        return Err(StreamError::InvalidOpenMode { mode: m });
    }
    Ok(options)
}

#[derive(Debug, Default)]
enum FileHandle {
    #[default]
    Null,
    File(File),
    Stdin,
    Stdout,
}

/// A stream over a local file, or standard input/output for the path
/// `-`.
#[derive(Debug)]
pub struct FileStream {
    handle: FileHandle,
    mode: OpenMode,
    bad: bool,
}

impl Default for FileStream {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStream {
    /// Creates a closed stream; it is bad until opened.
    #[must_use]
    pub fn new() -> Self {
        Self { handle: FileHandle::Null, mode: OpenMode::NONE, bad: true }
    }

    /// Opens a stream over `path`; closed as a side effect of opening,
    /// and bad until the open succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidOpenMode`] on an unsupported mode
    /// combination and [`StreamError::Open`] when the operating system
    /// refuses the path.
    pub fn open(&mut self, path: &str, mode: OpenMode) -> Result<(), StreamError> {
        self.close();

        if is_stdin_stdout_path(path) {
            if mode.contains(OpenMode::IN) {
                self.handle = FileHandle::Stdin;
            } else if mode.contains(OpenMode::OUT) {
                self.handle = FileHandle::Stdout;
            } else {
                return Err(StreamError::InvalidOpenMode { mode: mode.bits() });
            }
        } else {
            let file = open_options(mode)?
                .open(path)
                .map_err(|source| StreamError::Open { path: path.to_string(), source })?;
            self.handle = FileHandle::File(file);
        }
        self.mode = mode;
        self.bad = false;
        Ok(())
    }

    /// Returns whether the stream holds an open handle.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self.handle, FileHandle::Null)
    }

    /// Releases the handle; the stream is bad afterwards.
    pub fn close(&mut self) {
        self.handle = FileHandle::Null;
        self.mode = OpenMode::NONE;
        self.bad = true;
    }

    fn read_impl(reader: &mut impl Read, data: &mut [u8]) -> usize {
        let mut done = 0;
        while done < data.len() {
            match reader.read(&mut data[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("failed to read: {e}");
                    break;
                }
            }
        }
        done
    }

    fn write_impl(writer: &mut impl Write, data: &[u8]) -> usize {
        let mut done = 0;
        while done < data.len() {
            match writer.write(&data[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("failed to write: {e}");
                    break;
                }
            }
        }
        done
    }
}

impl StreamState for FileStream {
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

impl InputStream for FileStream {
    fn read(&mut self, data: &mut [u8]) -> usize {
        if self.bad {
            return 0;
        }
        let bytes = match &mut self.handle {
            FileHandle::File(file) => Self::read_impl(file, data),
            FileHandle::Stdin => Self::read_impl(&mut std::io::stdin().lock(), data),
            _ => 0,
        };
        if bytes < data.len() {
            self.bad = true;
        }
        bytes
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        if self.read(&mut byte) == 1 {
            Some(byte[0])
        } else {
            None
        }
    }

    fn peek(&mut self, data: &mut [u8]) -> usize {
        if self.bad {
            return 0;
        }
        match &mut self.handle {
            FileHandle::File(file) => {
                let offset = match file.stream_position() {
                    Ok(offset) => offset,
                    Err(e) => {
                        error!("failed to tell: {e}");
                        self.bad = true;
                        return 0;
                    }
                };
                let bytes = Self::read_impl(file, data);
                if bytes < data.len() {
                    self.bad = true;
                }
                if let Err(e) = file.seek(SeekFrom::Start(offset)) {
                    error!("failed to seek: {e}");
                    self.bad = true;
                }
                bytes
            }
            _ => {
                // stdin cannot rewind
                self.bad = true;
                0
            }
        }
    }
}

impl OutputStream for FileStream {
    fn write(&mut self, data: &[u8]) -> usize {
        if self.bad {
            return 0;
        }
        let bytes = match &mut self.handle {
            FileHandle::File(file) => Self::write_impl(file, data),
            FileHandle::Stdout => Self::write_impl(&mut std::io::stdout().lock(), data),
            _ => 0,
        };
        if bytes < data.len() {
            self.bad = true;
        }
        bytes
    }

    fn flush(&mut self) -> bool {
        if !self.mode.contains(OpenMode::OUT) && !self.mode.contains(OpenMode::APPEND) {
            return true;
        }
        let result = match &mut self.handle {
            FileHandle::File(file) => file.flush(),
            FileHandle::Stdout => std::io::stdout().lock().flush(),
            _ => Ok(()),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                error!("failed to flush: {e}");
                false
            }
        }
    }
}
