//! Submodule defining the error types of the crate.

/// Error enumeration for tensor, shape and sparse-row-matrix operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum TensorError {
    /// The rank exceeds the supported maximum.
    #[error("invalid rank {rank}, the maximum supported rank is {max}")]
    InvalidRank {
        /// The offending rank.
        rank: usize,
        /// The maximum supported rank.
        max: usize,
    },
    /// The requested reshape has no solution or more than one wildcard.
    #[error("invalid reshape of {total_dim} elements to {requested:?}")]
    InvalidReshape {
        /// Total number of elements of the source shape.
        total_dim: usize,
        /// The requested dims, `-1` marking the wildcard.
        requested: Vec<i64>,
    },
    /// Two entities disagree on their total number of elements.
    #[error("inconsistent total dim: {left} vs {right}")]
    TotalDimMismatch {
        /// Total dim of the destination.
        left: usize,
        /// Total dim of the source.
        right: usize,
    },
    /// Two sparse row matrices disagree on their column count.
    #[error("inconsistent col: {left} vs {right}")]
    ColMismatch {
        /// Column count of the destination.
        left: usize,
        /// Column count of the source.
        right: usize,
    },
    /// An axis is out of range, or names a dim that cannot be squeezed.
    #[error("invalid axis {axis} for shape {dims:?}")]
    InvalidAxis {
        /// The offending axis.
        axis: usize,
        /// The dims of the shape.
        dims: Vec<usize>,
    },
    /// The initializer parameters are inconsistent.
    #[error("invalid initializer: type {kind}, params {param1}, {param2}")]
    InvalidInitializer {
        /// The wire tag of the initializer.
        kind: i32,
        /// First parameter.
        param1: f64,
        /// Second parameter.
        param2: f64,
    },
}

/// Error enumeration for stream and file-system operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The open-mode combination is not valid.
    #[error("invalid open mode: {mode:#x}")]
    InvalidOpenMode {
        /// The offending mode bits.
        mode: u32,
    },
    /// The operating system refused to open the file.
    #[error("failed to open {path}: {source}")]
    Open {
        /// The path being opened.
        path: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// The path is `-` but the operation does not support stdio.
    #[error("standard input/output does not support {0}")]
    StdioUnsupported(&'static str),
    /// libhdfs could not be loaded, so `hdfs://` paths are unusable.
    #[error("hdfs is unavailable: libhdfs could not be loaded")]
    HdfsUnavailable,
    /// The `hdfs://` path does not name a valid name node.
    #[error("invalid hdfs path: {0}")]
    InvalidHdfsPath(String),
    /// Connecting to the HDFS name node failed.
    #[error("failed to connect to hdfs name node {host}:{port}")]
    HdfsConnect {
        /// Name node host, or `default`.
        host: String,
        /// Name node port, 0 for the default.
        port: u16,
    },
    /// Opening an HDFS file failed.
    #[error("failed to open hdfs file {0}")]
    HdfsOpen(String),
}
