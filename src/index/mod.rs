//! Scalar index subsystem
//!
//! Resolves which variant indexes a column and implements the variants.
//!
//! # Variants
//!
//! - SORT: sorted (value, row) pairs, default for numeric columns
//! - INVERTED: term to postings map, default for string columns
//! - BITMAP: bitset per distinct value, default for BOOL columns
//! - TRIE: sorted string dictionary with prefix lookups
//!
//! # Invariants
//!
//! - Lookups return row offsets ascending, without duplicates
//! - Null rows never match a value predicate
//! - A serialized index starts with `index_meta` and `null_rows`
//! - Loading decodes and validates every blob before replacing any state

mod bitmap;
mod factory;
mod index_type;
mod inverted;
mod key;
mod meta;
mod resolver;
mod sort;
mod traits;
mod trie;

pub use bitmap::{BitmapIndex, RowBitmap, BITMAP_BITS_BLOB, BITMAP_KEYS_BLOB};
pub use factory::create_index;
pub use index_type::IndexType;
pub use inverted::{InvertedIndex, PostingTree, INVERTED_TERMS_BLOB};
pub use key::{key_bounds, ColumnScan, ScalarKey};
pub use meta::{IndexMeta, FORMAT_VERSION, META_BLOB, NULL_ROWS_BLOB};
pub use resolver::{default_index_type, resolve};
pub use sort::{SortIndex, SORT_DATA_BLOB};
pub use traits::ScalarIndex;
pub use trie::{TrieIndex, TRIE_DICTIONARY_BLOB, TRIE_POSTINGS_BLOB};
