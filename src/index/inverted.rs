//! Inverted index
//!
//! Maps every distinct value to the ascending list of rows holding it.
//! Postings live in a `BTreeMap` so iteration order is deterministic and
//! range scans walk keys in order.
//!
//! String columns may be indexed case-insensitively (`case_sensitive=false`):
//! terms and lookup values are folded to lower case.
//!
//! Blob layout (`inverted_terms`):
//!
//! ```text
//! case_sensitive (u8) | term count (u32) | { term, posting count (u32), row (u64)* }*
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Bound;

use tracing::debug;

use crate::blob::{BinarySet, BlobReader, BlobWriter};
use crate::config::{Config, CASE_SENSITIVE_KEY};
use crate::errors::{IndexError, IndexResult};
use crate::types::{DataType, Dataset, RowOffset, ScalarValue};

use super::key::{key_bounds, ColumnScan, ScalarKey};
use super::meta::{check_rows, IndexBase, IndexMeta};
use super::traits::{check_dataset_type, check_prefix_supported, merge_rows, ScalarIndex};
use super::IndexType;

pub const INVERTED_TERMS_BLOB: &str = "inverted_terms";

/// Term to postings map.
///
/// Postings are always sorted ascending.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostingTree {
    tree: BTreeMap<ScalarKey, Vec<RowOffset>>,
}

impl PostingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row for a term.
    ///
    /// Maintains sorted ascending order.
    pub fn insert(&mut self, key: ScalarKey, row: RowOffset) {
        let rows = self.tree.entry(key).or_default();
        match rows.binary_search(&row) {
            Ok(_) => {}
            Err(pos) => rows.insert(pos, row),
        }
    }

    /// Rows for an exact term
    pub fn lookup_eq(&self, key: &ScalarKey) -> &[RowOffset] {
        self.tree.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows for every term within the bounds, sorted ascending
    pub fn lookup_range(&self, lower: Bound<&ScalarKey>, upper: Bound<&ScalarKey>) -> Vec<RowOffset> {
        let rows = self
            .tree
            .range((lower, upper))
            .flat_map(|(_, rows)| rows.iter().copied())
            .collect();
        merge_rows(rows)
    }

    /// Rows for every string term starting with `prefix`
    pub fn lookup_prefix(&self, prefix: &str) -> Vec<RowOffset> {
        let start = ScalarKey::String(prefix.to_string());
        let rows = self
            .tree
            .range((Bound::Included(&start), Bound::Unbounded))
            .take_while(|(key, _)| key.as_str().is_some_and(|s| s.starts_with(prefix)))
            .flat_map(|(_, rows)| rows.iter().copied())
            .collect();
        merge_rows(rows)
    }

    /// Returns the number of distinct terms
    pub fn term_count(&self) -> usize {
        self.tree.len()
    }

    /// Returns the total number of postings
    pub fn posting_count(&self) -> usize {
        self.tree.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScalarKey, &Vec<RowOffset>)> {
        self.tree.iter()
    }
}

/// Term to postings index; the default for string columns.
#[derive(Debug)]
pub struct InvertedIndex {
    data_type: DataType,
    params: Config,
    case_sensitive: bool,
    base: Option<IndexBase>,
    terms: PostingTree,
}

impl InvertedIndex {
    /// Create an empty index.
    ///
    /// `case_sensitive` is only accepted for string columns.
    pub fn new(data_type: DataType, params: &Config) -> IndexResult<Self> {
        let case_sensitive = match params.get_bool(CASE_SENSITIVE_KEY)? {
            Some(_) if !data_type.is_string() => {
                return Err(IndexError::invalid_parameter(
                    CASE_SENSITIVE_KEY,
                    format!("only applies to string columns, not {data_type}"),
                ))
            }
            Some(flag) => flag,
            None => true,
        };

        Ok(Self {
            data_type,
            params: params.clone(),
            case_sensitive,
            base: None,
            terms: PostingTree::new(),
        })
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn base(&self) -> IndexResult<&IndexBase> {
        self.base.as_ref().ok_or(IndexError::NotBuilt)
    }

    fn fold_key(&self, key: ScalarKey) -> ScalarKey {
        match key {
            ScalarKey::String(s) if !self.case_sensitive => ScalarKey::String(s.to_lowercase()),
            other => other,
        }
    }

    fn lookup_key(&self, value: &ScalarValue) -> IndexResult<ScalarKey> {
        Ok(self.fold_key(ScalarKey::from_value(self.data_type, value)?))
    }

    fn fold_value<'v>(&self, value: &'v ScalarValue) -> Cow<'v, ScalarValue> {
        match value {
            ScalarValue::String(s) if !self.case_sensitive => {
                Cow::Owned(ScalarValue::String(s.to_lowercase()))
            }
            other => Cow::Borrowed(other),
        }
    }

    fn encode_terms(&self) -> IndexResult<Vec<u8>> {
        let mut w = BlobWriter::new();
        w.put_u8(u8::from(self.case_sensitive));
        w.put_count(self.terms.term_count())?;
        for (key, rows) in self.terms.iter() {
            key.encode(self.data_type, &mut w)?;
            w.put_count(rows.len())?;
            for row in rows {
                w.put_u64(*row);
            }
        }
        Ok(w.into_inner())
    }

    fn decode_terms(&self, bytes: &[u8], base: &IndexBase) -> IndexResult<(bool, PostingTree)> {
        let mut r = BlobReader::new(INVERTED_TERMS_BLOB, bytes);
        let case_sensitive = match r.read_u8()? {
            0 => false,
            1 => true,
            other => return Err(r.corrupt(format!("invalid case flag {other}"))),
        };

        let term_count = r.read_count(ScalarKey::min_encoded_size(self.data_type) + 4)?;
        let mut tree = BTreeMap::new();
        let mut all_rows = Vec::new();
        let mut previous: Option<ScalarKey> = None;

        for _ in 0..term_count {
            let key = ScalarKey::decode(self.data_type, &mut r)?;
            if previous.as_ref().is_some_and(|p| *p >= key) {
                return Err(r.corrupt("terms not strictly ascending"));
            }
            if !case_sensitive {
                if let Some(s) = key.as_str() {
                    if s.to_lowercase() != s {
                        return Err(r.corrupt(format!("term {s:?} is not case folded")));
                    }
                }
            }

            let posting_count = r.read_count(8)?;
            if posting_count == 0 {
                return Err(r.corrupt("term with empty posting list"));
            }
            let mut rows = Vec::with_capacity(posting_count);
            for _ in 0..posting_count {
                rows.push(r.read_u64()?);
            }
            check_rows(INVERTED_TERMS_BLOB, &rows, base.meta.row_count)?;

            all_rows.extend_from_slice(&rows);
            previous = Some(key.clone());
            tree.insert(key, rows);
        }
        r.finish()?;

        base.check_coverage(INVERTED_TERMS_BLOB, &all_rows)?;
        Ok((case_sensitive, PostingTree { tree }))
    }
}

impl ScalarIndex for InvertedIndex {
    fn index_type(&self) -> IndexType {
        IndexType::Inverted
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
        let mut terms = PostingTree::new();
        for (key, row) in scan.entries {
            terms.insert(self.fold_key(key), row);
        }

        let meta = IndexMeta::new(
            IndexType::Inverted,
            self.data_type,
            scan.row_count,
            scan.null_rows.len(),
            &self.params,
        );
        debug!(
            terms = terms.term_count(),
            postings = terms.posting_count(),
            case_sensitive = self.case_sensitive,
            "inverted index built"
        );

        self.terms = terms;
        self.base = Some(IndexBase::new(meta, scan.null_rows));
        Ok(())
    }

    fn serialize(&self) -> IndexResult<BinarySet> {
        let base = self.base()?;
        let mut blobs = BinarySet::new();
        base.write_to(&mut blobs)?;
        blobs.append(INVERTED_TERMS_BLOB, self.encode_terms()?);
        Ok(blobs)
    }

    fn load(&mut self, blobs: &BinarySet) -> IndexResult<()> {
        let base = IndexBase::read_from(blobs, self.data_type, IndexType::Inverted)?;
        let (case_sensitive, terms) = self.decode_terms(blobs.read(INVERTED_TERMS_BLOB)?, &base)?;

        self.case_sensitive = case_sensitive;
        self.terms = terms;
        self.base = Some(base);
        Ok(())
    }

    fn lookup_in(&self, values: &[ScalarValue]) -> IndexResult<Vec<RowOffset>> {
        self.base()?;
        let mut rows = Vec::new();
        for value in values {
            let key = self.lookup_key(value)?;
            rows.extend_from_slice(self.terms.lookup_eq(&key));
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
        let lower = lower.map(|v| self.fold_value(v));
        let upper = upper.map(|v| self.fold_value(v));
        let bounds = key_bounds(
            self.data_type,
            lower.as_ref().map(|v| &**v),
            upper.as_ref().map(|v| &**v),
        )?;
        let Some((lower, upper)) = bounds else {
            return Ok(Vec::new());
        };
        Ok(self.terms.lookup_range(lower.as_ref(), upper.as_ref()))
    }

    fn lookup_prefix(&self, prefix: &str) -> IndexResult<Vec<RowOffset>> {
        self.base()?;
        check_prefix_supported(IndexType::Inverted, self.data_type)?;

        if self.case_sensitive {
            Ok(self.terms.lookup_prefix(prefix))
        } else {
            Ok(self.terms.lookup_prefix(&prefix.to_lowercase()))
        }
    }

    fn null_rows(&self) -> IndexResult<Vec<RowOffset>> {
        Ok(self.base()?.null_rows.clone())
    }
}
