//! Binary blob sets for aerodb scalar indexes
//!
//! The serialized form of an index is a `BinarySet`: an ordered bundle of
//! named byte buffers. Producers and consumers outside this crate treat it
//! as opaque payload.
//!
//! # Invariants
//!
//! - Insertion order is preserved and is part of the serialized form
//! - Every blob carries a CRC32 of its bytes
//! - Reads during load verify the checksum; mismatch is corruption
//! - Packing to a single buffer is byte-exact and order-preserving

mod checksum;
mod codec;
mod container;
mod set;

pub use checksum::{compute_checksum, verify_checksum};
pub use codec::{BlobReader, BlobWriter};
pub use set::{BinarySet, Blob};
