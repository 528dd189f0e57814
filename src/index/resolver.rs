//! Index type resolution
//!
//! `resolve` maps a declared data type and the index parameters to exactly
//! one variant. It is pure: same input, same answer, no side effects.
//!
//! Defaults:
//! - BOOL                      -> BITMAP
//! - INT8..INT64, FLOAT, DOUBLE -> SORT
//! - STRING, VARCHAR           -> INVERTED
//!
//! An explicit `index_type` parameter overrides the default and must name a
//! variant compatible with the data type.

use crate::config::{Config, INDEX_TYPE_KEY};
use crate::errors::{IndexError, IndexResult};
use crate::types::DataType;

use super::IndexType;

/// Default variant for a data type, `None` when the type has no index.
pub fn default_index_type(data_type: DataType) -> Option<IndexType> {
    if data_type.is_bool() {
        Some(IndexType::Bitmap)
    } else if data_type.is_integer() || data_type.is_floating() {
        Some(IndexType::Sort)
    } else if data_type.is_string() {
        Some(IndexType::Inverted)
    } else {
        None
    }
}

/// Resolve the variant for `data_type` under `index_params`.
pub fn resolve(data_type: DataType, index_params: &Config) -> IndexResult<IndexType> {
    let default = default_index_type(data_type).ok_or(IndexError::UnsupportedType { data_type })?;

    let Some(requested) = index_params.get(INDEX_TYPE_KEY) else {
        return Ok(default);
    };

    let index_type: IndexType = requested.parse()?;
    if !index_type.supports(data_type) {
        return Err(IndexError::IncompatibleIndexType {
            index_type,
            data_type,
        });
    }
    Ok(index_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_type(name: &str) -> Config {
        Config::from_pairs([(INDEX_TYPE_KEY, name)])
    }

    #[test]
    fn test_defaults() {
        let empty = Config::new();
        assert_eq!(resolve(DataType::Bool, &empty).unwrap(), IndexType::Bitmap);
        assert_eq!(resolve(DataType::Int32, &empty).unwrap(), IndexType::Sort);
        assert_eq!(resolve(DataType::Double, &empty).unwrap(), IndexType::Sort);
        assert_eq!(resolve(DataType::VarChar, &empty).unwrap(), IndexType::Inverted);
    }

    #[test]
    fn test_override() {
        assert_eq!(
            resolve(DataType::VarChar, &with_type("marisa-trie")).unwrap(),
            IndexType::Trie
        );
        assert_eq!(
            resolve(DataType::Int8, &with_type("bitmap")).unwrap(),
            IndexType::Bitmap
        );
    }

    #[test]
    fn test_unsupported_type() {
        for dt in [DataType::None, DataType::Json, DataType::BinaryVector, DataType::FloatVector] {
            let err = resolve(dt, &Config::new()).unwrap_err();
            assert_eq!(err, IndexError::UnsupportedType { data_type: dt });
        }
    }

    #[test]
    fn test_unsupported_type_wins_over_override() {
        let err = resolve(DataType::FloatVector, &with_type("sort")).unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_incompatible_override() {
        let err = resolve(DataType::Bool, &with_type("inverted")).unwrap_err();
        assert_eq!(
            err,
            IndexError::IncompatibleIndexType {
                index_type: IndexType::Inverted,
                data_type: DataType::Bool,
            }
        );
    }

    #[test]
    fn test_unknown_name_is_invalid_parameter() {
        let err = resolve(DataType::Int64, &with_type("ivf_flat")).unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_INVALID_PARAMETER");
    }

    #[test]
    fn test_unrelated_keys_ignored() {
        let params = Config::from_pairs([("bucket_size", "16"), ("whatever", "x")]);
        assert_eq!(resolve(DataType::Int64, &params).unwrap(), IndexType::Sort);
    }
}
