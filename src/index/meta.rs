//! Self-describing index metadata
//!
//! Every serialized index starts with two blobs shared by all variants:
//!
//! - `index_meta`: JSON header naming the variant and the column type
//! - `null_rows`: u32 count + u64 offsets (LE) of the rows that were null
//!
//! `index_meta` is what lets a loader reject a blob set built for another
//! column type or variant before touching any variant bytes.
//!
//! ```text
//! {"format_version":1,"index_type":"SORT","data_type":"INT32",
//!  "row_count":5,"null_count":1,"build_id":"…","built_at":"…",
//!  "index_params":{}}
//! ```

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blob::{BinarySet, BlobReader, BlobWriter};
use crate::config::Config;
use crate::errors::{IndexError, IndexResult};
use crate::types::{DataType, RowOffset};

use super::IndexType;

/// Name of the metadata blob
pub const META_BLOB: &str = "index_meta";

/// Name of the null rows blob
pub const NULL_ROWS_BLOB: &str = "null_rows";

/// Current metadata format version
pub const FORMAT_VERSION: u32 = 1;

/// Header describing one serialized index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Format version (always 1)
    pub format_version: u32,
    /// Variant that produced the blob set
    pub index_type: IndexType,
    /// Declared column type
    pub data_type: DataType,
    /// Rows indexed, nulls included
    pub row_count: u64,
    /// Null rows
    pub null_count: u64,
    /// Identifier assigned when the index was built
    pub build_id: Uuid,
    /// RFC3339 timestamp of the build
    pub built_at: String,
    /// Index parameters in effect at build time
    pub index_params: BTreeMap<String, String>,
}

impl IndexMeta {
    /// Header for a freshly built index
    pub fn new(
        index_type: IndexType,
        data_type: DataType,
        row_count: usize,
        null_count: usize,
        index_params: &Config,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            index_type,
            data_type,
            row_count: row_count as u64,
            null_count: null_count as u64,
            build_id: Uuid::new_v4(),
            built_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            index_params: index_params.to_map(),
        }
    }

    /// Serializes the header to JSON bytes
    pub fn to_blob(&self) -> IndexResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| IndexError::BuildFailed(format!("failed to serialize {META_BLOB}: {e}")))
    }

    /// Read the header from a blob set.
    ///
    /// A missing header means the set is not a scalar index at all; bytes
    /// that fail to verify or parse are corruption.
    pub fn from_blob_set(blobs: &BinarySet) -> IndexResult<Self> {
        if !blobs.contains(META_BLOB) {
            return Err(IndexError::IncompatibleBlobSet(format!(
                "blob set has no {META_BLOB} blob"
            )));
        }
        let bytes = blobs.read(META_BLOB)?;
        serde_json::from_slice(bytes)
            .map_err(|e| IndexError::corrupt(META_BLOB, format!("invalid metadata: {e}")))
    }

    /// Reject headers written for another format, column type or variant.
    pub fn check_compatible(&self, data_type: DataType, index_type: IndexType) -> IndexResult<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(IndexError::IncompatibleBlobSet(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.data_type != data_type {
            return Err(IndexError::IncompatibleBlobSet(format!(
                "blob set holds a {} index, creator expects {}",
                self.data_type, data_type
            )));
        }
        if self.index_type != index_type {
            return Err(IndexError::IncompatibleBlobSet(format!(
                "blob set holds a {} index, creator expects {}",
                self.index_type, index_type
            )));
        }
        Ok(())
    }
}

/// State shared by every populated variant: the header and the null rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBase {
    pub meta: IndexMeta,
    pub null_rows: Vec<RowOffset>,
}

impl IndexBase {
    pub fn new(meta: IndexMeta, null_rows: Vec<RowOffset>) -> Self {
        Self { meta, null_rows }
    }

    pub fn row_count(&self) -> usize {
        self.meta.row_count as usize
    }

    /// Write `index_meta` and `null_rows`, in that order.
    pub fn write_to(&self, blobs: &mut BinarySet) -> IndexResult<()> {
        blobs.append(META_BLOB, self.meta.to_blob()?);

        let mut w = BlobWriter::new();
        w.put_count(self.null_rows.len())?;
        for row in &self.null_rows {
            w.put_u64(*row);
        }
        blobs.append(NULL_ROWS_BLOB, w.into_inner());
        Ok(())
    }

    /// Read and validate the shared blobs.
    pub fn read_from(
        blobs: &BinarySet,
        data_type: DataType,
        index_type: IndexType,
    ) -> IndexResult<Self> {
        let meta = IndexMeta::from_blob_set(blobs)?;
        meta.check_compatible(data_type, index_type)?;

        let bytes = blobs.read(NULL_ROWS_BLOB)?;
        let mut r = BlobReader::new(NULL_ROWS_BLOB, bytes);
        let count = r.read_count(8)?;
        let mut null_rows = Vec::with_capacity(count);
        for _ in 0..count {
            null_rows.push(r.read_u64()?);
        }
        r.finish()?;

        if null_rows.len() as u64 != meta.null_count {
            return Err(IndexError::corrupt(
                NULL_ROWS_BLOB,
                format!("{} null rows, header says {}", null_rows.len(), meta.null_count),
            ));
        }
        check_rows(NULL_ROWS_BLOB, &null_rows, meta.row_count)?;

        Ok(Self { meta, null_rows })
    }

    /// Check that `rows` and the null rows together cover every row exactly once.
    pub fn check_coverage(&self, blob: &str, rows: &[RowOffset]) -> IndexResult<()> {
        let total = rows.len() as u64 + self.meta.null_count;
        if total != self.meta.row_count {
            return Err(IndexError::corrupt(
                blob,
                format!("{} rows indexed, header expects {}", total, self.meta.row_count),
            ));
        }

        let mut seen = vec![false; self.row_count()];
        for row in self.null_rows.iter().chain(rows) {
            match seen.get_mut(*row as usize) {
                None => {
                    return Err(IndexError::corrupt(
                        blob,
                        format!("row offset {row} out of range"),
                    ))
                }
                Some(true) => {
                    return Err(IndexError::corrupt(blob, format!("row {row} indexed twice")))
                }
                Some(slot) => *slot = true,
            }
        }
        Ok(())
    }

    /// Valid rows not contained in `matched` (sorted ascending).
    pub fn complement(&self, matched: &[RowOffset]) -> Vec<RowOffset> {
        let mut excluded = self.null_rows.iter().chain(matched.iter()).copied().collect::<Vec<_>>();
        excluded.sort_unstable();
        excluded.dedup();

        let mut out = Vec::with_capacity(self.row_count().saturating_sub(excluded.len()));
        let mut skip = excluded.iter().peekable();
        for row in 0..self.meta.row_count {
            if skip.peek() == Some(&&row) {
                skip.next();
                continue;
            }
            out.push(row);
        }
        out
    }
}

/// Rows must be strictly ascending and below `row_count`.
pub fn check_rows(blob: &str, rows: &[RowOffset], row_count: u64) -> IndexResult<()> {
    if let Some(window) = rows.windows(2).find(|w| w[0] >= w[1]) {
        return Err(IndexError::corrupt(
            blob,
            format!("row offsets not ascending: {} then {}", window[0], window[1]),
        ));
    }
    if let Some(last) = rows.last() {
        if *last >= row_count {
            return Err(IndexError::corrupt(
                blob,
                format!("row offset {last} out of range for {row_count} rows"),
            ));
        }
    }
    Ok(())
}
