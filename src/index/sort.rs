//! Sorted index
//!
//! Keeps every non-null `(key, row)` pair in one vector sorted by key, then
//! row. Point, range and prefix lookups are binary searches over that
//! vector.
//!
//! Blob layout (`sort_data`):
//!
//! ```text
//! count (u32) | { key (column width), row (u64) }*
//! ```

use std::ops::Bound;

use tracing::debug;

use crate::blob::{BinarySet, BlobReader, BlobWriter};
use crate::config::Config;
use crate::errors::{IndexError, IndexResult};
use crate::types::{DataType, Dataset, RowOffset, ScalarValue};

use super::key::{key_bounds, ColumnScan, ScalarKey};
use super::meta::{IndexBase, IndexMeta};
use super::traits::{check_dataset_type, check_prefix_supported, merge_rows, ScalarIndex};
use super::IndexType;

pub const SORT_DATA_BLOB: &str = "sort_data";

/// Sorted (key, row) index; the default for numeric columns.
#[derive(Debug)]
pub struct SortIndex {
    data_type: DataType,
    params: Config,
    base: Option<IndexBase>,
    data: Vec<(ScalarKey, RowOffset)>,
}

impl SortIndex {
    pub fn new(data_type: DataType, params: &Config) -> Self {
        Self {
            data_type,
            params: params.clone(),
            base: None,
            data: Vec::new(),
        }
    }

    fn base(&self) -> IndexResult<&IndexBase> {
        self.base.as_ref().ok_or(IndexError::NotBuilt)
    }

    /// Slice of entries whose key lies within the bounds
    fn entries_within(
        &self,
        lower: &Bound<ScalarKey>,
        upper: &Bound<ScalarKey>,
    ) -> &[(ScalarKey, RowOffset)] {
        let start = match lower {
            Bound::Included(lo) => self.data.partition_point(|(k, _)| k < lo),
            Bound::Excluded(lo) => self.data.partition_point(|(k, _)| k <= lo),
            Bound::Unbounded => 0,
        };
        let end = match upper {
            Bound::Included(hi) => self.data.partition_point(|(k, _)| k <= hi),
            Bound::Excluded(hi) => self.data.partition_point(|(k, _)| k < hi),
            Bound::Unbounded => self.data.len(),
        };
        if start >= end {
            return &[];
        }
        &self.data[start..end]
    }

    fn encode_data(&self) -> IndexResult<Vec<u8>> {
        let mut w = BlobWriter::new();
        w.put_count(self.data.len())?;
        for (key, row) in &self.data {
            key.encode(self.data_type, &mut w)?;
            w.put_u64(*row);
        }
        Ok(w.into_inner())
    }

    fn decode_data(&self, bytes: &[u8], base: &IndexBase) -> IndexResult<Vec<(ScalarKey, RowOffset)>> {
        let mut r = BlobReader::new(SORT_DATA_BLOB, bytes);
        let count = r.read_count(ScalarKey::min_encoded_size(self.data_type) + 8)?;

        let expected = base.meta.row_count - base.meta.null_count;
        if count as u64 != expected {
            return Err(r.corrupt(format!("{count} entries, header expects {expected}")));
        }

        let mut data = Vec::with_capacity(count);
        for _ in 0..count {
            let key = ScalarKey::decode(self.data_type, &mut r)?;
            let row = r.read_u64()?;
            data.push((key, row));
        }
        r.finish()?;

        if data.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::corrupt(SORT_DATA_BLOB, "entries not sorted"));
        }
        let rows: Vec<RowOffset> = data.iter().map(|(_, row)| *row).collect();
        base.check_coverage(SORT_DATA_BLOB, &rows)?;
        Ok(data)
    }
}

impl ScalarIndex for SortIndex {
    fn index_type(&self) -> IndexType {
        IndexType::Sort
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn row_count(&self) -> usize {
        self.base.as_ref().map_or(0, IndexBase::row_count)
    }

    fn build(&mut self, dataset: &Dataset) -> IndexResult<()> {
        check_dataset_type(self.data_type, dataset)?;

        let scan = ColumnScan::from_dataset(dataset);
        let mut data = scan.entries;
        data.sort_unstable();

        let meta = IndexMeta::new(
            IndexType::Sort,
            self.data_type,
            scan.row_count,
            scan.null_rows.len(),
            &self.params,
        );
        debug!(entries = data.len(), nulls = scan.null_rows.len(), "sorted index built");

        self.data = data;
        self.base = Some(IndexBase::new(meta, scan.null_rows));
        Ok(())
    }

    fn serialize(&self) -> IndexResult<BinarySet> {
        let base = self.base()?;
        let mut blobs = BinarySet::new();
        base.write_to(&mut blobs)?;
        blobs.append(SORT_DATA_BLOB, self.encode_data()?);
        Ok(blobs)
    }

    fn load(&mut self, blobs: &BinarySet) -> IndexResult<()> {
        let base = IndexBase::read_from(blobs, self.data_type, IndexType::Sort)?;
        let data = self.decode_data(blobs.read(SORT_DATA_BLOB)?, &base)?;

        self.data = data;
        self.base = Some(base);
        Ok(())
    }

    fn lookup_in(&self, values: &[ScalarValue]) -> IndexResult<Vec<RowOffset>> {
        self.base()?;
        let mut rows = Vec::new();
        for value in values {
            let key = ScalarKey::from_value(self.data_type, value)?;
            let bound = Bound::Included(key);
            rows.extend(self.entries_within(&bound, &bound).iter().map(|(_, row)| *row));
        }
        Ok(merge_rows(rows))
    }

    fn lookup_not_in(&self, values: &[ScalarValue]) -> IndexResult<Vec<RowOffset>> {
        let matched = self.lookup_in(values)?;
        Ok(self.base()?.complement(&matched))
    }

    fn lookup_range(
        &self,
        lower: Bound<&ScalarValue>,
        upper: Bound<&ScalarValue>,
    ) -> IndexResult<Vec<RowOffset>> {
        self.base()?;
        let Some((lower, upper)) = key_bounds(self.data_type, lower, upper)? else {
            return Ok(Vec::new());
        };
        let rows = self.entries_within(&lower, &upper).iter().map(|(_, row)| *row).collect();
        Ok(merge_rows(rows))
    }

    fn lookup_prefix(&self, prefix: &str) -> IndexResult<Vec<RowOffset>> {
        self.base()?;
        check_prefix_supported(IndexType::Sort, self.data_type)?;

        let lower = Bound::Included(ScalarKey::String(prefix.to_string()));
        let rows = self
            .entries_within(&lower, &Bound::Unbounded)
            .iter()
            .take_while(|(key, _)| key.as_str().is_some_and(|s| s.starts_with(prefix)))
            .map(|(_, row)| *row)
            .collect();
        Ok(merge_rows(rows))
    }

    fn null_rows(&self) -> IndexResult<Vec<RowOffset>> {
        Ok(self.base()?.null_rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(dataset: Dataset) -> SortIndex {
        let mut index = SortIndex::new(dataset.data_type(), &Config::new());
        index.build(&dataset).unwrap();
        index
    }

    #[test]
    fn test_range_skips_nulls() {
        let index = built(Dataset::from_options(vec![Some(3), Some(1), Some(2), None, Some(5)]));
        let rows = index
            .lookup_range(Bound::Included(&ScalarValue::Int(1)), Bound::Included(&ScalarValue::Int(3)))
            .unwrap();
        assert_eq!(rows, vec![0, 1, 2]);
        assert_eq!(index.null_rows().unwrap(), vec![3]);
    }

    #[test]
    fn test_exclusive_and_open_bounds() {
        let index = built(Dataset::from_values(vec![10i64, 20, 30, 40]));
        let rows = index
            .lookup_range(Bound::Excluded(&ScalarValue::Int(10)), Bound::Excluded(&ScalarValue::Int(40)))
            .unwrap();
        assert_eq!(rows, vec![1, 2]);

        let rows = index
            .lookup_range(Bound::Unbounded, Bound::Included(&ScalarValue::Int(20)))
            .unwrap();
        assert_eq!(rows, vec![0, 1]);

        let rows = index
            .lookup_range(Bound::Included(&ScalarValue::Int(50)), Bound::Unbounded)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let index = built(Dataset::from_values(vec![1i32, 2, 3]));
        let rows = index
            .lookup_range(Bound::Included(&ScalarValue::Int(3)), Bound::Included(&ScalarValue::Int(1)))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_in_and_not_in() {
        let index = built(Dataset::from_options(vec![Some(7i16), Some(8), None, Some(7), Some(9)]));
        let values = [ScalarValue::Int(7), ScalarValue::Int(9)];
        assert_eq!(index.lookup_in(&values).unwrap(), vec![0, 3, 4]);
        assert_eq!(index.lookup_not_in(&values).unwrap(), vec![1]);
    }

    #[test]
    fn test_float_column() {
        let index = built(Dataset::from_values(vec![1.5f64, -2.0, 0.0, 3.25]));
        let rows = index
            .lookup_range(Bound::Included(&ScalarValue::Float(-1.0)), Bound::Unbounded)
            .unwrap();
        assert_eq!(rows, vec![0, 2, 3]);
        assert_eq!(index.lookup_in(&[ScalarValue::Int(0)]).unwrap(), vec![2]);
    }

    #[test]
    fn test_signed_zeros_compare_equal() {
        let index = built(Dataset::from_values(vec![-0.0f64, 0.0, 1.0]));
        let zero = ScalarValue::Float(0.0);
        assert_eq!(index.lookup_in(std::slice::from_ref(&zero)).unwrap(), vec![0, 1]);
        assert_eq!(index.lookup_not_in(std::slice::from_ref(&zero)).unwrap(), vec![2]);
        let rows = index
            .lookup_range(Bound::Included(&zero), Bound::Included(&ScalarValue::Float(1.0)))
            .unwrap();
        assert_eq!(rows, vec![0, 1, 2]);
        let rows = index
            .lookup_range(Bound::Unbounded, Bound::Excluded(&ScalarValue::Float(-0.0)))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_prefix_on_strings() {
        let words = vec!["apple", "apricot", "banana", "app", "ap"];
        let index = built(Dataset::from_values(words.into_iter().map(String::from).collect()));
        assert_eq!(index.lookup_prefix("app").unwrap(), vec![0, 3]);
        assert_eq!(index.lookup_prefix("ap").unwrap(), vec![0, 1, 3, 4]);
        assert!(index.lookup_prefix("z").unwrap().is_empty());
    }

    #[test]
    fn test_prefix_on_numbers_unsupported() {
        let index = built(Dataset::from_values(vec![1i64]));
        let err = index.lookup_prefix("1").unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_UNSUPPORTED_OPERATION");
    }

    #[test]
    fn test_empty_index_not_built() {
        let index = SortIndex::new(DataType::Int64, &Config::new());
        assert_eq!(index.serialize().unwrap_err(), IndexError::NotBuilt);
        assert_eq!(index.lookup_in(&[ScalarValue::Int(1)]).unwrap_err(), IndexError::NotBuilt);
        assert_eq!(index.row_count(), 0);
    }

    #[test]
    fn test_serialize_load_roundtrip() {
        let index = built(Dataset::from_options(vec![Some(5i8), None, Some(-3), Some(5)]));
        let blobs = index.serialize().unwrap();
        assert_eq!(
            blobs.names().collect::<Vec<_>>(),
            vec!["index_meta", "null_rows", SORT_DATA_BLOB]
        );

        let mut loaded = SortIndex::new(DataType::Int8, &Config::new());
        loaded.load(&blobs).unwrap();
        assert_eq!(loaded.row_count(), 4);
        assert_eq!(loaded.data, index.data);
        assert_eq!(loaded.serialize().unwrap(), blobs);
    }

    #[test]
    fn test_unsorted_blob_rejected() {
        let index = built(Dataset::from_values(vec![1i64, 2]));
        let mut blobs = index.serialize().unwrap();

        let mut w = BlobWriter::new();
        w.put_count(2).unwrap();
        for (key, row) in [(2i64, 1u64), (1, 0)] {
            ScalarKey::Int(key).encode(DataType::Int64, &mut w).unwrap();
            w.put_u64(row);
        }
        blobs.append(SORT_DATA_BLOB, w.into_inner());

        let mut loaded = SortIndex::new(DataType::Int64, &Config::new());
        let err = loaded.load(&blobs).unwrap_err();
        assert_eq!(err.code(), "AERO_DATA_CORRUPTION");
        assert_eq!(loaded.row_count(), 0);
    }

    #[test]
    fn test_wrong_dataset_type_leaves_index_empty() {
        let mut index = SortIndex::new(DataType::Int32, &Config::new());
        let err = index.build(&Dataset::from_values(vec![1i64])).unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_TYPE_MISMATCH");
        assert!(index.serialize().is_err());
    }
}
