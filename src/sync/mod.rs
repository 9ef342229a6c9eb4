//! Submodule providing the reader-writer primitive used to protect
//! sparse-row-matrix structure in multi-threaded training.

pub mod read_write_lock;

pub use read_write_lock::ReadWriteLock;
