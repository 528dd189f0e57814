//! Scalar types shared by the resolver, the creator and the index variants.

mod data_type;
mod dataset;
mod value;

pub use data_type::DataType;
pub use dataset::{ColumnElement, ColumnValues, Dataset, NullBitmap};
pub use value::ScalarValue;

/// 0-based position of a row within the indexed column
pub type RowOffset = u64;
