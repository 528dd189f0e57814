//! CRC32 checksums for serialized index blobs
//!
//! - Every blob carries the checksum of its bytes
//! - Every read of a blob during load validates it
//! - Packed blob sets carry a trailing checksum over the whole buffer
//!
//! Uses CRC32 (IEEE polynomial).

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies that the computed checksum matches the expected checksum.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_deterministic() {
        let data = b"sorted index payload";
        assert_eq!(compute_checksum(data), compute_checksum(data));
    }

    #[test]
    fn test_checksum_detects_single_bit_flip() {
        let mut data = vec![0x10, 0x20, 0x30, 0x40];
        let original = compute_checksum(&data);
        data[3] ^= 0x01;
        assert_ne!(original, compute_checksum(&data));
        assert!(!verify_checksum(&data, original));
    }
}
