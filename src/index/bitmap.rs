//! Bitmap index
//!
//! One packed row bitmap per distinct value. Meant for low cardinality
//! columns: building fails once the number of distinct values exceeds
//! `bitmap_cardinality_limit` (default 1000).
//!
//! Blob layout:
//!
//! ```text
//! bitmap_keys: key count (u32) | key*
//! bitmap_bits: bitmap count (u32) | { byte length (u32), bits }*
//! ```
//!
//! Bitmaps are LSB-first, one bit per row, and appear in key order.

use std::collections::BTreeMap;
use std::ops::Bound;

use tracing::{debug, warn};

use crate::blob::{BinarySet, BlobReader, BlobWriter};
use crate::config::{Config, BITMAP_CARDINALITY_LIMIT_KEY, DEFAULT_BITMAP_CARDINALITY_LIMIT};
use crate::errors::{IndexError, IndexResult};
use crate::types::{DataType, Dataset, RowOffset, ScalarValue};

use super::key::{key_bounds, ColumnScan, ScalarKey};
use super::meta::{IndexBase, IndexMeta};
use super::traits::{check_dataset_type, check_prefix_supported, ScalarIndex};
use super::IndexType;

pub const BITMAP_KEYS_BLOB: &str = "bitmap_keys";
pub const BITMAP_BITS_BLOB: &str = "bitmap_bits";

/// Fixed-length set of rows, one bit per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBitmap {
    bits: Vec<u8>,
    len: usize,
}

impl RowBitmap {
    /// Empty bitmap covering `len` rows
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(8)],
            len,
        }
    }

    fn from_bytes(blob: &str, bits: &[u8], len: usize) -> IndexResult<Self> {
        if bits.len() != len.div_ceil(8) {
            return Err(IndexError::corrupt(
                blob,
                format!("bitmap holds {} bytes, {len} rows need {}", bits.len(), len.div_ceil(8)),
            ));
        }
        let bitmap = Self {
            bits: bits.to_vec(),
            len,
        };
        if len % 8 != 0 {
            let tail = bits[bits.len() - 1] >> (len % 8);
            if tail != 0 {
                return Err(IndexError::corrupt(blob, "bits set past the last row"));
            }
        }
        Ok(bitmap)
    }

    pub fn set(&mut self, row: RowOffset) {
        let row = row as usize;
        if row < self.len {
            self.bits[row / 8] |= 1 << (row % 8);
        }
    }

    pub fn contains(&self, row: RowOffset) -> bool {
        let row = row as usize;
        row < self.len && self.bits[row / 8] & (1 << (row % 8)) != 0
    }

    /// Add every row of `other`
    pub fn union_with(&mut self, other: &RowBitmap) {
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a |= b;
        }
    }

    /// Set rows, ascending
    pub fn rows(&self) -> Vec<RowOffset> {
        (0..self.len as RowOffset).filter(|row| self.contains(*row)).collect()
    }

    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}

/// Bitmap per distinct value; the default for BOOL columns.
#[derive(Debug)]
pub struct BitmapIndex {
    data_type: DataType,
    params: Config,
    cardinality_limit: usize,
    base: Option<IndexBase>,
    bitmaps: BTreeMap<ScalarKey, RowBitmap>,
}

impl BitmapIndex {
    /// Create an empty index.
    ///
    /// `bitmap_cardinality_limit` must be a positive integer.
    pub fn new(data_type: DataType, params: &Config) -> IndexResult<Self> {
        let cardinality_limit = params
            .get_parsed::<usize>(BITMAP_CARDINALITY_LIMIT_KEY)?
            .unwrap_or(DEFAULT_BITMAP_CARDINALITY_LIMIT);
        if cardinality_limit == 0 {
            return Err(IndexError::invalid_parameter(
                BITMAP_CARDINALITY_LIMIT_KEY,
                "must be greater than zero",
            ));
        }

        Ok(Self {
            data_type,
            params: params.clone(),
            cardinality_limit,
            base: None,
            bitmaps: BTreeMap::new(),
        })
    }

    pub fn cardinality_limit(&self) -> usize {
        self.cardinality_limit
    }

    /// Number of distinct values indexed
    pub fn cardinality(&self) -> usize {
        self.bitmaps.len()
    }

    fn base(&self) -> IndexResult<&IndexBase> {
        self.base.as_ref().ok_or(IndexError::NotBuilt)
    }

    /// Rows set in any of `bitmaps`, ascending
    fn union_rows<'a>(
        &self,
        base: &IndexBase,
        bitmaps: impl Iterator<Item = &'a RowBitmap>,
    ) -> Vec<RowOffset> {
        let mut acc = RowBitmap::new(base.row_count());
        for bitmap in bitmaps {
            acc.union_with(bitmap);
        }
        acc.rows()
    }

    fn encode(&self) -> IndexResult<(Vec<u8>, Vec<u8>)> {
        let mut keys = BlobWriter::new();
        let mut bits = BlobWriter::new();
        keys.put_count(self.bitmaps.len())?;
        bits.put_count(self.bitmaps.len())?;
        for (key, bitmap) in &self.bitmaps {
            key.encode(self.data_type, &mut keys)?;
            bits.put_bytes(bitmap.as_bytes())?;
        }
        Ok((keys.into_inner(), bits.into_inner()))
    }

    fn decode(
        &self,
        key_bytes: &[u8],
        bit_bytes: &[u8],
        base: &IndexBase,
    ) -> IndexResult<BTreeMap<ScalarKey, RowBitmap>> {
        let mut keys_r = BlobReader::new(BITMAP_KEYS_BLOB, key_bytes);
        let key_count = keys_r.read_count(ScalarKey::min_encoded_size(self.data_type))?;
        let mut keys = Vec::with_capacity(key_count);
        for _ in 0..key_count {
            let key = ScalarKey::decode(self.data_type, &mut keys_r)?;
            if keys.last().is_some_and(|last| *last >= key) {
                return Err(keys_r.corrupt("keys not strictly ascending"));
            }
            keys.push(key);
        }
        keys_r.finish()?;

        let mut bits_r = BlobReader::new(BITMAP_BITS_BLOB, bit_bytes);
        let bitmap_count = bits_r.read_count(4)?;
        if bitmap_count != key_count {
            return Err(bits_r.corrupt(format!("{bitmap_count} bitmaps for {key_count} keys")));
        }

        let mut bitmaps = BTreeMap::new();
        let mut all_rows = Vec::new();
        for key in keys {
            let bytes = bits_r.read_bytes()?;
            let bitmap = RowBitmap::from_bytes(BITMAP_BITS_BLOB, bytes, base.row_count())?;
            let rows = bitmap.rows();
            if rows.is_empty() {
                return Err(bits_r.corrupt("empty bitmap"));
            }
            all_rows.extend(rows);
            bitmaps.insert(key, bitmap);
        }
        bits_r.finish()?;

        base.check_coverage(BITMAP_BITS_BLOB, &all_rows)?;
        Ok(bitmaps)
    }
}

impl ScalarIndex for BitmapIndex {
    fn index_type(&self) -> IndexType {
        IndexType::Bitmap
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
        let mut bitmaps: BTreeMap<ScalarKey, RowBitmap> = BTreeMap::new();
        for (key, row) in scan.entries {
            if !bitmaps.contains_key(&key) && bitmaps.len() == self.cardinality_limit {
                warn!(
                    limit = self.cardinality_limit,
                    data_type = %self.data_type,
                    "bitmap cardinality limit exceeded"
                );
                return Err(IndexError::BuildFailed(format!(
                    "more than {} distinct values; raise {} or use another index type",
                    self.cardinality_limit, BITMAP_CARDINALITY_LIMIT_KEY
                )));
            }
            bitmaps
                .entry(key)
                .or_insert_with(|| RowBitmap::new(scan.row_count))
                .set(row);
        }

        let meta = IndexMeta::new(
            IndexType::Bitmap,
            self.data_type,
            scan.row_count,
            scan.null_rows.len(),
            &self.params,
        );
        debug!(cardinality = bitmaps.len(), nulls = scan.null_rows.len(), "bitmap index built");

        self.bitmaps = bitmaps;
        self.base = Some(IndexBase::new(meta, scan.null_rows));
        Ok(())
    }

    fn serialize(&self) -> IndexResult<BinarySet> {
        let base = self.base()?;
        let (keys, bits) = self.encode()?;
        let mut blobs = BinarySet::new();
        base.write_to(&mut blobs)?;
        blobs.append(BITMAP_KEYS_BLOB, keys);
        blobs.append(BITMAP_BITS_BLOB, bits);
        Ok(blobs)
    }

    fn load(&mut self, blobs: &BinarySet) -> IndexResult<()> {
        let base = IndexBase::read_from(blobs, self.data_type, IndexType::Bitmap)?;
        let bitmaps = self.decode(
            blobs.read(BITMAP_KEYS_BLOB)?,
            blobs.read(BITMAP_BITS_BLOB)?,
            &base,
        )?;

        self.bitmaps = bitmaps;
        self.base = Some(base);
        Ok(())
    }

    fn lookup_in(&self, values: &[ScalarValue]) -> IndexResult<Vec<RowOffset>> {
        let base = self.base()?;
        let keys = values
            .iter()
            .map(|v| ScalarKey::from_value(self.data_type, v))
            .collect::<IndexResult<Vec<_>>>()?;
        Ok(self.union_rows(base, keys.iter().filter_map(|k| self.bitmaps.get(k))))
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
        let base = self.base()?;
        let Some((lower, upper)) = key_bounds(self.data_type, lower, upper)? else {
            return Ok(Vec::new());
        };
        let matched = self.bitmaps.range((lower, upper)).map(|(_, bitmap)| bitmap);
        Ok(self.union_rows(base, matched))
    }

    fn lookup_prefix(&self, prefix: &str) -> IndexResult<Vec<RowOffset>> {
        let base = self.base()?;
        check_prefix_supported(IndexType::Bitmap, self.data_type)?;

        let start = ScalarKey::String(prefix.to_string());
        let matched = self
            .bitmaps
            .range(start..)
            .take_while(|(key, _)| key.as_str().is_some_and(|s| s.starts_with(prefix)))
            .map(|(_, bitmap)| bitmap);
        Ok(self.union_rows(base, matched))
    }

    fn null_rows(&self) -> IndexResult<Vec<RowOffset>> {
        Ok(self.base()?.null_rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(dataset: Dataset) -> BitmapIndex {
        let mut index = BitmapIndex::new(dataset.data_type(), &Config::new()).unwrap();
        index.build(&dataset).unwrap();
        index
    }

    #[test]
    fn test_row_bitmap() {
        let mut bitmap = RowBitmap::new(10);
        bitmap.set(0);
        bitmap.set(9);
        bitmap.set(42);
        assert_eq!(bitmap.rows(), vec![0, 9]);
        assert_eq!(bitmap.count(), 2);
        assert_eq!(bitmap.as_bytes().len(), 2);
    }

    #[test]
    fn test_row_bitmap_rejects_stray_bits() {
        let err = RowBitmap::from_bytes("bits", &[0x00, 0x04], 10).unwrap_err();
        assert!(err.to_string().contains("past the last row"));
        assert!(RowBitmap::from_bytes("bits", &[0x00], 10).is_err());
        assert!(RowBitmap::from_bytes("bits", &[0xff, 0x03], 10).is_ok());
    }

    #[test]
    fn test_bool_column() {
        let index = built(Dataset::from_options(vec![Some(true), Some(false), None, Some(true)]));
        assert_eq!(index.cardinality(), 2);
        assert_eq!(index.lookup_in(&[ScalarValue::Bool(true)]).unwrap(), vec![0, 3]);
        assert_eq!(index.lookup_not_in(&[ScalarValue::Bool(true)]).unwrap(), vec![1]);
        assert_eq!(index.null_rows().unwrap(), vec![2]);
    }

    #[test]
    fn test_int_range() {
        let index = built(Dataset::from_values(vec![3i8, 1, 4, 1, 5]));
        let rows = index
            .lookup_range(Bound::Included(&ScalarValue::Int(1)), Bound::Excluded(&ScalarValue::Int(4)))
            .unwrap();
        assert_eq!(rows, vec![0, 1, 3]);
    }

    #[test]
    fn test_string_prefix() {
        let words = ["red", "green", "grey", "blue"].map(String::from).to_vec();
        let index = built(Dataset::from_values(words));
        assert_eq!(index.lookup_prefix("gre").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_cardinality_limit() {
        let params = Config::from_pairs([(BITMAP_CARDINALITY_LIMIT_KEY, "2")]);
        let mut index = BitmapIndex::new(DataType::Int32, &params).unwrap();

        assert!(index.build(&Dataset::from_values(vec![1, 2, 1, 2])).is_ok());

        let err = index.build(&Dataset::from_values(vec![1, 2, 3])).unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_BUILD_FAILED");
        assert_eq!(index.cardinality(), 2);
    }

    #[test]
    fn test_invalid_limit() {
        for value in ["0", "-1", "many"] {
            let params = Config::from_pairs([(BITMAP_CARDINALITY_LIMIT_KEY, value)]);
            let err = BitmapIndex::new(DataType::Int32, &params).unwrap_err();
            assert_eq!(err.code(), "AERO_INDEX_INVALID_PARAMETER", "{value}");
        }
    }

    #[test]
    fn test_roundtrip() {
        let index = built(Dataset::from_options(vec![Some(7i64), None, Some(7), Some(-1)]));
        let blobs = index.serialize().unwrap();
        assert_eq!(
            blobs.names().collect::<Vec<_>>(),
            vec!["index_meta", "null_rows", BITMAP_KEYS_BLOB, BITMAP_BITS_BLOB]
        );

        let mut loaded = BitmapIndex::new(DataType::Int64, &Config::new()).unwrap();
        loaded.load(&blobs).unwrap();
        assert_eq!(loaded.bitmaps, index.bitmaps);
        assert_eq!(loaded.lookup_in(&[ScalarValue::Int(7)]).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_key_bitmap_count_mismatch_rejected() {
        let index = built(Dataset::from_values(vec![true, false]));
        let mut blobs = index.serialize().unwrap();

        let mut w = BlobWriter::new();
        w.put_count(1).unwrap();
        w.put_bytes(&[0x03]).unwrap();
        blobs.append(BITMAP_BITS_BLOB, w.into_inner());

        let mut loaded = BitmapIndex::new(DataType::Bool, &Config::new()).unwrap();
        let err = loaded.load(&blobs).unwrap_err();
        assert_eq!(err.code(), "AERO_DATA_CORRUPTION");
        assert_eq!(loaded.cardinality(), 0);
    }
}
