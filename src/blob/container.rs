//! Packed blob set container
//!
//! A blob set can be packed into one buffer for transports that move a
//! single payload. The layout is:
//!
//! ```text
//! +------------------+
//! | Magic "ABLS"     | (4 bytes)
//! +------------------+
//! | Format Version   | (u8)
//! +------------------+
//! | Blob Count       | (u32 LE)
//! +------------------+
//! | Blob Entries     | name (length-prefixed string)
//! |   (repeated)     | data (length-prefixed bytes)
//! |                  | checksum (u32 LE, CRC32 of data)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! The trailing checksum covers all bytes except the checksum itself.
//! Blob names, bytes and order survive a pack/unpack cycle exactly.

use crate::errors::{IndexError, IndexResult};

use super::checksum::compute_checksum;
use super::codec::{BlobReader, BlobWriter};
use super::set::{BinarySet, Blob};

const MAGIC: &[u8; 4] = b"ABLS";
const FORMAT_VERSION: u8 = 1;
const CONTAINER: &str = "<packed blob set>";

// magic + version + count + checksum
const MIN_PACKED_SIZE: usize = 4 + 1 + 4 + 4;
// name length + data length + checksum
const MIN_ENTRY_SIZE: usize = 4 + 4 + 4;

impl BinarySet {
    /// Pack the whole set into one checksummed buffer.
    pub fn to_bytes(&self) -> IndexResult<Vec<u8>> {
        let mut w = BlobWriter::new();
        w.put_raw(MAGIC);
        w.put_u8(FORMAT_VERSION);
        w.put_count(self.len())?;
        for (name, blob) in self.iter() {
            w.put_str(name)?;
            w.put_bytes(blob.data())?;
            w.put_u32(blob.checksum());
        }

        let mut packed = w.into_inner();
        let checksum = compute_checksum(&packed);
        packed.extend_from_slice(&checksum.to_le_bytes());
        Ok(packed)
    }

    /// Unpack a buffer produced by `to_bytes`, verifying every checksum.
    pub fn from_bytes(data: &[u8]) -> IndexResult<Self> {
        if data.len() < MIN_PACKED_SIZE {
            return Err(IndexError::corrupt(
                CONTAINER,
                format!("{} bytes is shorter than the minimum {}", data.len(), MIN_PACKED_SIZE),
            ));
        }

        let checksum_offset = data.len() - 4;
        let stored = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed = compute_checksum(&data[..checksum_offset]);
        if computed != stored {
            return Err(IndexError::corrupt(
                CONTAINER,
                format!("checksum mismatch: computed {computed:08x}, stored {stored:08x}"),
            ));
        }

        let mut r = BlobReader::new(CONTAINER, &data[..checksum_offset]);
        if r.read_raw(4)? != MAGIC {
            return Err(r.corrupt("bad magic"));
        }
        let version = r.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(r.corrupt(format!("unsupported container version {version}")));
        }

        let count = r.read_count(MIN_ENTRY_SIZE)?;
        let mut set = BinarySet::new();
        for _ in 0..count {
            let name = r.read_string()?;
            let bytes = r.read_bytes()?.to_vec();
            let checksum = r.read_u32()?;
            let blob = Blob::with_checksum(bytes, checksum);
            if !blob.verify() {
                return Err(IndexError::corrupt(name, "checksum mismatch in packed entry"));
            }
            if set.contains(&name) {
                return Err(r.corrupt(format!("duplicate blob name {name:?}")));
            }
            set.insert_blob(name, blob);
        }
        r.finish()?;

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> BinarySet {
        let mut set = BinarySet::new();
        set.append("index_meta", br#"{"format_version":1}"#.to_vec());
        set.append("null_rows", vec![0; 8]);
        set.append("sort_data", (0u8..=255).collect());
        set
    }

    #[test]
    fn test_pack_unpack_preserves_order_and_bytes() {
        let set = sample_set();
        let packed = set.to_bytes().unwrap();
        let unpacked = BinarySet::from_bytes(&packed).unwrap();

        assert_eq!(unpacked, set);
        assert_eq!(
            unpacked.names().collect::<Vec<_>>(),
            vec!["index_meta", "null_rows", "sort_data"]
        );
    }

    #[test]
    fn test_empty_set_packs() {
        let packed = BinarySet::new().to_bytes().unwrap();
        assert_eq!(packed.len(), MIN_PACKED_SIZE);
        assert!(BinarySet::from_bytes(&packed).unwrap().is_empty());
    }

    #[test]
    fn test_every_flipped_byte_detected() {
        let packed = sample_set().to_bytes().unwrap();
        for i in 0..packed.len() {
            let mut corrupted = packed.clone();
            corrupted[i] ^= 0x5A;
            let err = BinarySet::from_bytes(&corrupted).unwrap_err();
            assert_eq!(err.code(), "AERO_DATA_CORRUPTION", "byte {i} not detected");
        }
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let packed = sample_set().to_bytes().unwrap();
        assert!(BinarySet::from_bytes(&packed[..packed.len() - 1]).is_err());
        assert!(BinarySet::from_bytes(&packed[..5]).is_err());
    }

    #[test]
    fn test_deterministic_packing() {
        let set = sample_set();
        assert_eq!(set.to_bytes().unwrap(), set.to_bytes().unwrap());
    }
}
