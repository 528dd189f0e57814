//! Trie index for string columns
//!
//! Distinct strings are kept in a sorted dictionary; each row stores the id
//! of its string. Every prefix of the key space maps to a contiguous id
//! range, so prefix and range lookups resolve to one id interval and a pass
//! over the row ids.
//!
//! The dictionary is front coded: each entry stores the number of bytes it
//! shares with the previous entry and the remaining suffix.
//!
//! Blob layout:
//!
//! ```text
//! trie_dictionary: count (u32) | { shared (u32), suffix (u32 len + bytes) }*
//! trie_postings:   count (u32) | id (u32)*      u32::MAX marks a null row
//! ```

use std::collections::BTreeSet;
use std::ops::{Bound, Range};

use tracing::debug;

use crate::blob::{BinarySet, BlobReader, BlobWriter};
use crate::config::Config;
use crate::errors::{IndexError, IndexResult};
use crate::types::{DataType, Dataset, RowOffset, ScalarValue};

use super::key::{key_bounds, ColumnScan, ScalarKey};
use super::meta::{IndexBase, IndexMeta};
use super::traits::{check_dataset_type, ScalarIndex};
use super::IndexType;

pub const TRIE_DICTIONARY_BLOB: &str = "trie_dictionary";
pub const TRIE_POSTINGS_BLOB: &str = "trie_postings";

/// Id stored for null rows
const NULL_ID: u32 = u32::MAX;

/// Sorted string dictionary plus one dictionary id per row.
#[derive(Debug)]
pub struct TrieIndex {
    data_type: DataType,
    params: Config,
    base: Option<IndexBase>,
    dictionary: Vec<String>,
    row_ids: Vec<u32>,
}

impl TrieIndex {
    /// Create an empty index. Only string columns are accepted.
    pub fn new(data_type: DataType, params: &Config) -> IndexResult<Self> {
        if !data_type.is_string() {
            return Err(IndexError::IncompatibleIndexType {
                index_type: IndexType::Trie,
                data_type,
            });
        }
        Ok(Self {
            data_type,
            params: params.clone(),
            base: None,
            dictionary: Vec::new(),
            row_ids: Vec::new(),
        })
    }

    /// Number of distinct strings
    pub fn dictionary_len(&self) -> usize {
        self.dictionary.len()
    }

    fn base(&self) -> IndexResult<&IndexBase> {
        self.base.as_ref().ok_or(IndexError::NotBuilt)
    }

    fn text(&self, key: ScalarKey) -> IndexResult<String> {
        match key {
            ScalarKey::String(s) => Ok(s),
            other => Err(IndexError::type_mismatch(
                format!("{} value", self.data_type),
                format!("{other:?}"),
            )),
        }
    }

    fn id_of(&self, value: &ScalarValue) -> IndexResult<Option<u32>> {
        let s = self.text(ScalarKey::from_value(self.data_type, value)?)?;
        Ok(self
            .dictionary
            .binary_search(&s)
            .ok()
            .map(|id| id as u32))
    }

    /// Dictionary ids whose strings lie within the bounds
    fn id_range(&self, lower: &Bound<String>, upper: &Bound<String>) -> Range<usize> {
        let dict = &self.dictionary;
        let start = match lower {
            Bound::Included(lo) => dict.partition_point(|s| s < lo),
            Bound::Excluded(lo) => dict.partition_point(|s| s <= lo),
            Bound::Unbounded => 0,
        };
        let end = match upper {
            Bound::Included(hi) => dict.partition_point(|s| s <= hi),
            Bound::Excluded(hi) => dict.partition_point(|s| s < hi),
            Bound::Unbounded => dict.len(),
        };
        start..end.max(start)
    }

    /// Dictionary ids of strings starting with `prefix`
    fn prefix_range(&self, prefix: &str) -> Range<usize> {
        let start = self.dictionary.partition_point(|s| s.as_str() < prefix);
        let len = self.dictionary[start..]
            .iter()
            .take_while(|s| s.starts_with(prefix))
            .count();
        start..start + len
    }

    fn rows_where(&self, matches: impl Fn(usize) -> bool) -> Vec<RowOffset> {
        self.row_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| **id != NULL_ID && matches(**id as usize))
            .map(|(row, _)| row as RowOffset)
            .collect()
    }

    fn encode_dictionary(&self) -> IndexResult<Vec<u8>> {
        let mut w = BlobWriter::new();
        w.put_count(self.dictionary.len())?;
        let mut previous: &[u8] = &[];
        for entry in &self.dictionary {
            let bytes = entry.as_bytes();
            let shared = previous
                .iter()
                .zip(bytes)
                .take_while(|(a, b)| a == b)
                .count();
            w.put_count(shared)?;
            w.put_bytes(&bytes[shared..])?;
            previous = bytes;
        }
        Ok(w.into_inner())
    }

    fn encode_postings(&self) -> IndexResult<Vec<u8>> {
        let mut w = BlobWriter::new();
        w.put_count(self.row_ids.len())?;
        for id in &self.row_ids {
            w.put_u32(*id);
        }
        Ok(w.into_inner())
    }

    fn decode_dictionary(bytes: &[u8]) -> IndexResult<Vec<String>> {
        let mut r = BlobReader::new(TRIE_DICTIONARY_BLOB, bytes);
        let count = r.read_count(8)?;
        let mut dictionary: Vec<String> = Vec::with_capacity(count);
        let mut previous: Vec<u8> = Vec::new();

        for _ in 0..count {
            let shared = r.read_u32()? as usize;
            if shared > previous.len() {
                return Err(r.corrupt(format!(
                    "shared prefix {shared} longer than previous entry ({} bytes)",
                    previous.len()
                )));
            }
            let mut entry = previous[..shared].to_vec();
            entry.extend_from_slice(r.read_bytes()?);

            let text = String::from_utf8(entry.clone())
                .map_err(|_| r.corrupt("dictionary entry is not valid UTF-8"))?;
            if dictionary.last().is_some_and(|last| *last >= text) {
                return Err(r.corrupt("dictionary not strictly ascending"));
            }
            dictionary.push(text);
            previous = entry;
        }
        r.finish()?;
        Ok(dictionary)
    }

    fn decode_postings(bytes: &[u8], dictionary_len: usize, base: &IndexBase) -> IndexResult<Vec<u32>> {
        let mut r = BlobReader::new(TRIE_POSTINGS_BLOB, bytes);
        let count = r.read_count(4)?;
        if count as u64 != base.meta.row_count {
            return Err(r.corrupt(format!(
                "{count} row ids, header expects {}",
                base.meta.row_count
            )));
        }

        let mut used = vec![false; dictionary_len];
        let mut null_rows = Vec::new();
        let mut row_ids = Vec::with_capacity(count);
        for row in 0..count {
            let id = r.read_u32()?;
            if id == NULL_ID {
                null_rows.push(row as RowOffset);
            } else {
                match used.get_mut(id as usize) {
                    Some(slot) => *slot = true,
                    None => return Err(r.corrupt(format!("row {row} has unknown id {id}"))),
                }
            }
            row_ids.push(id);
        }
        r.finish()?;

        if null_rows != base.null_rows {
            return Err(IndexError::corrupt(
                TRIE_POSTINGS_BLOB,
                "null row ids disagree with null_rows",
            ));
        }
        if let Some(id) = used.iter().position(|u| !u) {
            return Err(IndexError::corrupt(
                TRIE_POSTINGS_BLOB,
                format!("dictionary entry {id} is not referenced by any row"),
            ));
        }
        Ok(row_ids)
    }
}

impl ScalarIndex for TrieIndex {
    fn index_type(&self) -> IndexType {
        IndexType::Trie
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
        let distinct: BTreeSet<&str> = scan.entries.iter().filter_map(|(k, _)| k.as_str()).collect();
        if distinct.len() >= NULL_ID as usize {
            return Err(IndexError::BuildFailed(format!(
                "{} distinct strings exceed the dictionary capacity",
                distinct.len()
            )));
        }
        let dictionary: Vec<String> = distinct.into_iter().map(String::from).collect();

        let mut row_ids = vec![NULL_ID; scan.row_count];
        for (key, row) in &scan.entries {
            let Some(s) = key.as_str() else { continue };
            if let Ok(id) = dictionary.binary_search_by(|d| d.as_str().cmp(s)) {
                row_ids[*row as usize] = id as u32;
            }
        }

        let meta = IndexMeta::new(
            IndexType::Trie,
            self.data_type,
            scan.row_count,
            scan.null_rows.len(),
            &self.params,
        );
        debug!(dictionary = dictionary.len(), nulls = scan.null_rows.len(), "trie index built");

        self.dictionary = dictionary;
        self.row_ids = row_ids;
        self.base = Some(IndexBase::new(meta, scan.null_rows));
        Ok(())
    }

    fn serialize(&self) -> IndexResult<BinarySet> {
        let base = self.base()?;
        let mut blobs = BinarySet::new();
        base.write_to(&mut blobs)?;
        blobs.append(TRIE_DICTIONARY_BLOB, self.encode_dictionary()?);
        blobs.append(TRIE_POSTINGS_BLOB, self.encode_postings()?);
        Ok(blobs)
    }

    fn load(&mut self, blobs: &BinarySet) -> IndexResult<()> {
        let base = IndexBase::read_from(blobs, self.data_type, IndexType::Trie)?;
        let dictionary = Self::decode_dictionary(blobs.read(TRIE_DICTIONARY_BLOB)?)?;
        let row_ids = Self::decode_postings(blobs.read(TRIE_POSTINGS_BLOB)?, dictionary.len(), &base)?;

        self.dictionary = dictionary;
        self.row_ids = row_ids;
        self.base = Some(base);
        Ok(())
    }

    fn lookup_in(&self, values: &[ScalarValue]) -> IndexResult<Vec<RowOffset>> {
        self.base()?;
        let mut wanted = vec![false; self.dictionary.len()];
        for value in values {
            if let Some(id) = self.id_of(value)? {
                wanted[id as usize] = true;
            }
        }
        Ok(self.rows_where(|id| wanted[id]))
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
        let to_text = |b: Bound<ScalarKey>| -> IndexResult<Bound<String>> {
            Ok(match b {
                Bound::Included(k) => Bound::Included(self.text(k)?),
                Bound::Excluded(k) => Bound::Excluded(self.text(k)?),
                Bound::Unbounded => Bound::Unbounded,
            })
        };
        let ids = self.id_range(&to_text(lower)?, &to_text(upper)?);
        Ok(self.rows_where(|id| ids.contains(&id)))
    }

    fn lookup_prefix(&self, prefix: &str) -> IndexResult<Vec<RowOffset>> {
        self.base()?;
        let ids = self.prefix_range(prefix);
        Ok(self.rows_where(|id| ids.contains(&id)))
    }

    fn null_rows(&self) -> IndexResult<Vec<RowOffset>> {
        Ok(self.base()?.null_rows.clone())
    }
}
