//! Concrete index variant identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::IndexError;
use crate::types::DataType;

/// Identifier of a concrete scalar index variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    /// Sorted (value, row) pairs; range capable
    Sort,
    /// Term dictionary with posting lists
    Inverted,
    /// One bitset per distinct value
    Bitmap,
    /// Sorted string dictionary with prefix lookups
    Trie,
}

impl IndexType {
    pub const ALL: [IndexType; 4] = [
        IndexType::Sort,
        IndexType::Inverted,
        IndexType::Bitmap,
        IndexType::Trie,
    ];

    /// Returns the canonical name stored in serialized metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Sort => "SORT",
            IndexType::Inverted => "INVERTED",
            IndexType::Bitmap => "BITMAP",
            IndexType::Trie => "TRIE",
        }
    }

    /// Whether this variant can index columns of `data_type`.
    pub fn supports(&self, data_type: DataType) -> bool {
        match self {
            IndexType::Sort => data_type.is_scalar(),
            IndexType::Inverted => {
                data_type.is_integer() || data_type.is_floating() || data_type.is_string()
            }
            IndexType::Bitmap => {
                data_type.is_bool() || data_type.is_integer() || data_type.is_string()
            }
            IndexType::Trie => data_type.is_string(),
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IndexType {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SORT" | "STL_SORT" => Ok(IndexType::Sort),
            "INVERTED" => Ok(IndexType::Inverted),
            "BITMAP" => Ok(IndexType::Bitmap),
            "TRIE" | "MARISA-TRIE" | "MARISA_TRIE" => Ok(IndexType::Trie),
            _ => Err(IndexError::invalid_parameter(
                crate::config::INDEX_TYPE_KEY,
                format!("unknown index type {s:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!("stl_sort".parse::<IndexType>().unwrap(), IndexType::Sort);
        assert_eq!("marisa-trie".parse::<IndexType>().unwrap(), IndexType::Trie);
        assert_eq!(" Bitmap ".parse::<IndexType>().unwrap(), IndexType::Bitmap);
        assert!("hnsw".parse::<IndexType>().is_err());
    }

    #[test]
    fn test_every_scalar_type_has_a_variant() {
        for dt in DataType::ALL.into_iter().filter(DataType::is_scalar) {
            assert!(IndexType::ALL.iter().any(|it| it.supports(dt)), "{dt}");
        }
    }

    #[test]
    fn test_non_scalar_types_unsupported() {
        for it in IndexType::ALL {
            assert!(!it.supports(DataType::Json));
            assert!(!it.supports(DataType::FloatVector));
        }
    }

    #[test]
    fn test_compatibility_table() {
        assert!(!IndexType::Inverted.supports(DataType::Bool));
        assert!(!IndexType::Bitmap.supports(DataType::Double));
        assert!(!IndexType::Trie.supports(DataType::Int64));
        assert!(IndexType::Sort.supports(DataType::Bool));
    }
}
