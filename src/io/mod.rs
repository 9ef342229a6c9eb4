//! Submodule providing streams, file systems and binary serialization.

pub mod auto;
pub mod buffered;
pub mod file;
pub mod file_system;
pub mod gzip;
pub mod hdfs;
pub mod path;
pub mod serialize;
pub mod stream;
pub mod string_stream;

pub use auto::{AutoInputFileStream, AutoOutputFileStream};
pub use buffered::BufferedInputStream;
pub use file::{FileStream, OpenMode};
pub use file_system::{AutoFileSystem, FileSystem, LocalFileSystem};
pub use gzip::GunzipInputStream;
pub use path::{FilePath, FileStat, FileType};
pub use serialize::{
    parse_from_bytes, parse_view_from_bytes, serialize_to_vec, Deserialize, ReadView, Scalar,
    Serialize, SERIALIZATION_MAGIC,
};
pub use stream::{read_line, read_line_delim, InputStream, OutputStream, StreamState};
pub use string_stream::{InputStringStream, OutputStringStream};
