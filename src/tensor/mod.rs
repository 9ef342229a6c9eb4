//! Submodule providing the tensor and sparse-matrix data model.

pub mod csr;
pub mod dense;
pub mod feature_id;
pub mod initializer;
pub mod shape;
pub mod sparse_row_matrix;

use core::fmt::{Debug, Display};
use core::hash::Hash;

pub use csr::{CsrMatrix, CsrRow};
pub use dense::{Tensor, TensorView};
pub use feature_id::{group_id, make_feature_id, sub_feature_id};
pub use initializer::Initializer;
use num_traits::{AsPrimitive, PrimInt};
pub use shape::{Shape, MAX_RANK};
pub use sparse_row_matrix::{SharedSparseRowMatrix, SparseRowMatrix, SparseRowMatrixView};

use crate::io::serialize::{Deserialize, Scalar, Serialize};

/// Integer type keying sparse rows and CSR columns, typically a 64-bit
/// feature id.
pub trait RowKey:
    PrimInt
    + AsPrimitive<usize>
    + Scalar
    + Serialize
    + Deserialize
    + Default
    + Eq
    + Hash
    + Debug
    + Display
{
}

impl<T> RowKey for T where
    T: PrimInt
        + AsPrimitive<usize>
        + Scalar
        + Serialize
        + Deserialize
        + Default
        + Eq
        + Hash
        + Debug
        + Display
{
}
