//! Variant construction

use crate::config::Config;
use crate::errors::{IndexError, IndexResult};
use crate::types::DataType;

use super::bitmap::BitmapIndex;
use super::inverted::InvertedIndex;
use super::sort::SortIndex;
use super::traits::ScalarIndex;
use super::trie::TrieIndex;
use super::IndexType;

/// Create an empty index of `index_type` for a column of `data_type`.
///
/// Variant parameters are validated here, so a bad parameter fails before
/// any data is seen.
pub fn create_index(
    data_type: DataType,
    index_type: IndexType,
    index_params: &Config,
) -> IndexResult<Box<dyn ScalarIndex>> {
    if !data_type.is_scalar() {
        return Err(IndexError::UnsupportedType { data_type });
    }
    if !index_type.supports(data_type) {
        return Err(IndexError::IncompatibleIndexType {
            index_type,
            data_type,
        });
    }

    let index: Box<dyn ScalarIndex> = match index_type {
        IndexType::Sort => Box::new(SortIndex::new(data_type, index_params)),
        IndexType::Inverted => Box::new(InvertedIndex::new(data_type, index_params)?),
        IndexType::Bitmap => Box::new(BitmapIndex::new(data_type, index_params)?),
        IndexType::Trie => Box::new(TrieIndex::new(data_type, index_params)?),
    };
    Ok(index)
}
