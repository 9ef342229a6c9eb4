//! Submodule providing path-driven stream opening: local or HDFS
//! transport, gzip or raw payload, standard input/output for `-`.

use crate::{
    error::StreamError,
    io::{
        buffered::BufferedInputStream,
        file::{FileStream, OpenMode},
        gzip::GunzipInputStream,
        path::{is_gzip_file, is_hdfs_path},
        stream::{InputStream, OutputStream, StreamState},
    },
};

#[cfg(unix)]
fn open_hdfs_input(file: &str) -> Result<Box<dyn InputStream>, StreamError> {
    use crate::io::{
        file_system::parse_hdfs_name_node,
        hdfs::{HdfsFileStream, HdfsHandle, HdfsOpenMode},
    };
    if !crate::io::hdfs::has_hdfs() {
        return Err(StreamError::HdfsUnavailable);
    }
    let (host, port) =
        parse_hdfs_name_node(file).ok_or_else(|| StreamError::InvalidHdfsPath(file.to_string()))?;
    let handle = HdfsHandle::connect(&host, port)?;
    let is = HdfsFileStream::open(handle, file, HdfsOpenMode::In)?;
    Ok(if is_gzip_file(file) {
        Box::new(GunzipInputStream::new(is))
    } else {
        Box::new(BufferedInputStream::new(is))
    })
}

#[cfg(not(unix))]
fn open_hdfs_input(_file: &str) -> Result<Box<dyn InputStream>, StreamError> {
    Err(StreamError::HdfsUnavailable)
}

#[cfg(unix)]
fn open_hdfs_output(file: &str) -> Result<Box<dyn OutputStream>, StreamError> {
    use crate::io::{
        file_system::parse_hdfs_name_node,
        hdfs::{HdfsFileStream, HdfsHandle, HdfsOpenMode},
    };
    if !crate::io::hdfs::has_hdfs() {
        return Err(StreamError::HdfsUnavailable);
    }
    let (host, port) =
        parse_hdfs_name_node(file).ok_or_else(|| StreamError::InvalidHdfsPath(file.to_string()))?;
    let handle = HdfsHandle::connect(&host, port)?;
    let os = HdfsFileStream::open(handle, file, HdfsOpenMode::Out)?;
    Ok(Box::new(os))
}

#[cfg(not(unix))]
fn open_hdfs_output(_file: &str) -> Result<Box<dyn OutputStream>, StreamError> {
    Err(StreamError::HdfsUnavailable)
}

/// An input stream opened by path.
///
/// `hdfs://` paths read from HDFS, `-` from standard input, everything
/// else from a local file. Paths ending in `.gz` are decompressed on
/// the fly; others are wrapped in a read buffer.
pub struct AutoInputFileStream {
    is: Option<Box<dyn InputStream>>,
    bad: bool,
}

impl Default for AutoInputFileStream {
    fn default() -> Self {
        Self { is: None, bad: true }
    }
}

impl AutoInputFileStream {
    /// Opens `file`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Open`] for local failures and the HDFS
    /// error kinds for `hdfs://` paths.
    pub fn open(file: &str) -> Result<Self, StreamError> {
        let is: Box<dyn InputStream> = if is_hdfs_path(file) {
            open_hdfs_input(file)?
        } else {
            let mut fs = FileStream::new();
            fs.open(file, OpenMode::IN)?;
            if is_gzip_file(file) {
                Box::new(GunzipInputStream::new(fs))
            } else {
                Box::new(BufferedInputStream::new(fs))
            }
        };
        Ok(Self { is: Some(is), bad: false })
    }

    /// Returns whether the stream holds an open transport.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is.is_some()
    }

    /// Releases the transport; the stream is bad afterwards.
    pub fn close(&mut self) {
        self.is = None;
        self.bad = true;
    }
}

impl StreamState for AutoInputFileStream {
    fn is_ok(&self) -> bool {
        !self.bad
    }

    fn set_bad(&mut self) {
        self.bad = true;
    }

    fn clear_bad(&mut self) {
        self.bad = false;
        if let Some(is) = &mut self.is {
            is.clear_bad();
        }
    }
}

impl InputStream for AutoInputFileStream {
    fn read(&mut self, data: &mut [u8]) -> usize {
        let Some(is) = &mut self.is else {
            return 0;
        };
        let bytes = is.read(data);
        self.bad = !is.is_ok();
        bytes
    }

    fn read_byte(&mut self) -> Option<u8> {
        let is = self.is.as_mut()?;
        let byte = is.read_byte();
        self.bad = !is.is_ok();
        byte
    }

    fn peek(&mut self, data: &mut [u8]) -> usize {
        let Some(is) = &mut self.is else {
            return 0;
        };
        let bytes = is.peek(data);
        self.bad = !is.is_ok();
        bytes
    }
}

/// An output stream opened by path: HDFS for `hdfs://`, standard
/// output for `-`, a local file otherwise.
pub struct AutoOutputFileStream {
    os: Option<Box<dyn OutputStream>>,
    bad: bool,
}

impl Default for AutoOutputFileStream {
    fn default() -> Self {
        Self { os: None, bad: true }
    }
}

impl AutoOutputFileStream {
    /// Opens `file` for writing, truncating an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Open`] for local failures and the HDFS
    /// error kinds for `hdfs://` paths.
    pub fn open(file: &str) -> Result<Self, StreamError> {
        let os: Box<dyn OutputStream> = if is_hdfs_path(file) {
            open_hdfs_output(file)?
        } else {
            let mut fs = FileStream::new();
            fs.open(file, OpenMode::OUT)?;
            Box::new(fs)
        };
        Ok(Self { os: Some(os), bad: false })
    }

    /// Returns whether the stream holds an open transport.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.os.is_some()
    }

    /// Releases the transport; the stream is bad afterwards.
    pub fn close(&mut self) {
        self.os = None;
        self.bad = true;
    }
}

impl StreamState for AutoOutputFileStream {
    fn is_ok(&self) -> bool {
        !self.bad
    }

    fn set_bad(&mut self) {
        self.bad = true;
    }

    fn clear_bad(&mut self) {
        self.bad = false;
        if let Some(os) = &mut self.os {
            os.clear_bad();
        }
    }
}

impl OutputStream for AutoOutputFileStream {
    fn write(&mut self, data: &[u8]) -> usize {
        let Some(os) = &mut self.os else {
            return 0;
        };
        let bytes = os.write(data);
        self.bad = !os.is_ok();
        bytes
    }

    fn flush(&mut self) -> bool {
        match &mut self.os {
            Some(os) => os.flush(),
            None => false,
        }
    }
}
