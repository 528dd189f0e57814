//! The capability every scalar index variant implements.

use std::fmt;
use std::ops::Bound;

use crate::blob::BinarySet;
use crate::errors::{IndexError, IndexResult};
use crate::types::{DataType, Dataset, RowOffset, ScalarValue};

use super::IndexType;

/// A concrete scalar index.
///
/// Variants start empty. `build` or `load` populates them; the creator
/// guarantees at most one of the two succeeds. Every lookup returns row
/// offsets ascending without duplicates, and null rows never match a value
/// predicate. Lookups and `serialize` on an empty index fail with `NotBuilt`.
pub trait ScalarIndex: Send + Sync + fmt::Debug {
    fn index_type(&self) -> IndexType;

    fn data_type(&self) -> DataType;

    /// Rows indexed, nulls included. Zero while empty.
    fn row_count(&self) -> usize;

    /// Populate from raw column values.
    ///
    /// On error the index is left exactly as it was.
    fn build(&mut self, dataset: &Dataset) -> IndexResult<()>;

    /// Produce the blob set for this index. Never mutates the index.
    fn serialize(&self) -> IndexResult<BinarySet>;

    /// Populate from a blob set produced by `serialize`.
    ///
    /// All blobs are decoded before any state is replaced.
    fn load(&mut self, blobs: &BinarySet) -> IndexResult<()>;

    /// Rows whose value equals any of `values`
    fn lookup_in(&self, values: &[ScalarValue]) -> IndexResult<Vec<RowOffset>>;

    /// Non-null rows whose value equals none of `values`
    fn lookup_not_in(&self, values: &[ScalarValue]) -> IndexResult<Vec<RowOffset>>;

    /// Rows whose value lies within the bounds
    fn lookup_range(
        &self,
        lower: Bound<&ScalarValue>,
        upper: Bound<&ScalarValue>,
    ) -> IndexResult<Vec<RowOffset>>;

    /// Rows whose string value starts with `prefix`
    fn lookup_prefix(&self, _prefix: &str) -> IndexResult<Vec<RowOffset>> {
        Err(IndexError::UnsupportedOperation {
            index_type: self.index_type(),
            operation: "prefix lookup",
        })
    }

    /// Rows that were null at build time
    fn null_rows(&self) -> IndexResult<Vec<RowOffset>>;
}

/// Merge row lists into one ascending, duplicate-free list.
pub(crate) fn merge_rows(mut rows: Vec<RowOffset>) -> Vec<RowOffset> {
    rows.sort_unstable();
    rows.dedup();
    rows
}

/// Reject prefix lookups on non-string columns.
pub(crate) fn check_prefix_supported(index_type: IndexType, data_type: DataType) -> IndexResult<()> {
    if data_type.is_string() {
        Ok(())
    } else {
        Err(IndexError::UnsupportedOperation {
            index_type,
            operation: "prefix lookup on a non-string column",
        })
    }
}

/// Reject datasets whose type tag differs from the index column type.
pub(crate) fn check_dataset_type(data_type: DataType, dataset: &Dataset) -> IndexResult<()> {
    if dataset.data_type() != data_type {
        return Err(IndexError::type_mismatch(data_type, dataset.data_type()));
    }
    Ok(())
}
