//! Named blob sets
//!
//! A `BinarySet` is the serialized form of one index: an insertion-ordered
//! list of named byte buffers. Names are unique; appending an existing name
//! replaces the bytes in place and keeps its position.

use crate::errors::{IndexError, IndexResult};

use super::checksum::{compute_checksum, verify_checksum};

/// One named artifact of a serialized index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
    checksum: u32,
}

impl Blob {
    /// Wrap bytes, computing their checksum
    pub fn new(data: Vec<u8>) -> Self {
        let checksum = compute_checksum(&data);
        Self { data, checksum }
    }

    /// Wrap bytes with a checksum recorded elsewhere.
    ///
    /// The pair is not verified here; `verify` or `BinarySet::read` does that.
    pub fn with_checksum(data: Vec<u8>, checksum: u32) -> Self {
        Self { data, checksum }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Whether the bytes still match the recorded checksum
    pub fn verify(&self) -> bool {
        verify_checksum(&self.data, self.checksum)
    }
}

/// Insertion-ordered mapping from blob name to blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinarySet {
    entries: Vec<(String, Blob)>,
}

impl BinarySet {
    /// Creates an empty blob set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `data` under `name`, computing its checksum.
    pub fn append(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.insert_blob(name.into(), Blob::new(data));
    }

    /// Append an existing blob under `name`.
    pub fn insert_blob(&mut self, name: String, blob: Blob) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = blob,
            None => self.entries.push((name, blob)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Blob> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Read the verified bytes of a blob.
    ///
    /// A missing blob or a checksum mismatch is reported as corruption.
    pub fn read(&self, name: &str) -> IndexResult<&[u8]> {
        let blob = self
            .get(name)
            .ok_or_else(|| IndexError::corrupt(name, "blob missing from blob set"))?;
        if !blob.verify() {
            return Err(IndexError::corrupt(
                name,
                format!(
                    "checksum mismatch: computed {:08x}, stored {:08x}",
                    compute_checksum(blob.data()),
                    blob.checksum()
                ),
            ));
        }
        Ok(blob.data())
    }

    /// Blob names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Blob)> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all blob sizes in bytes
    pub fn total_size(&self) -> usize {
        self.entries.iter().map(|(_, b)| b.size()).sum()
    }
}
