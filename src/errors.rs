//! Scalar index error types
//!
//! Error codes:
//! - AERO_INDEX_UNSUPPORTED_TYPE (CONFIGURATION)
//! - AERO_INDEX_INCOMPATIBLE_TYPE (CONFIGURATION)
//! - AERO_INDEX_INVALID_PARAMETER (CONFIGURATION)
//! - AERO_INDEX_ALREADY_POPULATED (LIFECYCLE)
//! - AERO_INDEX_NOT_BUILT (LIFECYCLE)
//! - AERO_INDEX_TYPE_MISMATCH (DATA)
//! - AERO_INDEX_NULL_NOT_ALLOWED (DATA)
//! - AERO_INDEX_INCOMPATIBLE_BLOB_SET (DATA)
//! - AERO_DATA_CORRUPTION (DATA)
//! - AERO_INDEX_BUILD_FAILED (DATA)
//! - AERO_INDEX_UNSUPPORTED_OPERATION (DATA)
//!
//! Every index error fails the current call only. None of them is fatal to
//! the process.

use std::fmt;

use thiserror::Error;

use crate::builder::CreatorState;
use crate::index::IndexType;
use crate::types::DataType;

/// What the caller has to fix when an error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Type or parameter choice is wrong; detected at construction.
    Configuration,
    /// The creator was driven out of order.
    Lifecycle,
    /// The column or the serialized artifact is unusable.
    Data,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "CONFIGURATION",
            ErrorCategory::Lifecycle => "LIFECYCLE",
            ErrorCategory::Data => "DATA",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors produced while resolving, building, serializing or loading a
/// scalar index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("data type {data_type} has no scalar index")]
    UnsupportedType { data_type: DataType },

    #[error("index type {index_type} is not compatible with data type {data_type}")]
    IncompatibleIndexType {
        index_type: IndexType,
        data_type: DataType,
    },

    #[error("invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("index already {state}")]
    AlreadyPopulated { state: CreatorState },

    #[error("index has not been built or loaded")]
    NotBuilt,

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("column is not nullable but contains {null_count} null values")]
    NullNotAllowed { null_count: usize },

    #[error("incompatible blob set: {0}")]
    IncompatibleBlobSet(String),

    #[error("corrupt blob {blob}: {reason}")]
    CorruptData { blob: String, reason: String },

    #[error("index build failed: {0}")]
    BuildFailed(String),

    #[error("{index_type} index does not support {operation}")]
    UnsupportedOperation {
        index_type: IndexType,
        operation: &'static str,
    },
}

impl IndexError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(key: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::InvalidParameter {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        IndexError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a data corruption error for the named blob
    pub fn corrupt(blob: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::CorruptData {
            blob: blob.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::UnsupportedType { .. } => "AERO_INDEX_UNSUPPORTED_TYPE",
            IndexError::IncompatibleIndexType { .. } => "AERO_INDEX_INCOMPATIBLE_TYPE",
            IndexError::InvalidParameter { .. } => "AERO_INDEX_INVALID_PARAMETER",
            IndexError::AlreadyPopulated { .. } => "AERO_INDEX_ALREADY_POPULATED",
            IndexError::NotBuilt => "AERO_INDEX_NOT_BUILT",
            IndexError::TypeMismatch { .. } => "AERO_INDEX_TYPE_MISMATCH",
            IndexError::NullNotAllowed { .. } => "AERO_INDEX_NULL_NOT_ALLOWED",
            IndexError::IncompatibleBlobSet(_) => "AERO_INDEX_INCOMPATIBLE_BLOB_SET",
            IndexError::CorruptData { .. } => "AERO_DATA_CORRUPTION",
            IndexError::BuildFailed(_) => "AERO_INDEX_BUILD_FAILED",
            IndexError::UnsupportedOperation { .. } => "AERO_INDEX_UNSUPPORTED_OPERATION",
        }
    }

    /// Returns the category the error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            IndexError::UnsupportedType { .. }
            | IndexError::IncompatibleIndexType { .. }
            | IndexError::InvalidParameter { .. } => ErrorCategory::Configuration,
            IndexError::AlreadyPopulated { .. } | IndexError::NotBuilt => ErrorCategory::Lifecycle,
            IndexError::TypeMismatch { .. }
            | IndexError::NullNotAllowed { .. }
            | IndexError::IncompatibleBlobSet(_)
            | IndexError::CorruptData { .. }
            | IndexError::BuildFailed(_)
            | IndexError::UnsupportedOperation { .. } => ErrorCategory::Data,
        }
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(IndexError::NotBuilt.code(), "AERO_INDEX_NOT_BUILT");
        assert_eq!(
            IndexError::corrupt("sort_data", "truncated").code(),
            "AERO_DATA_CORRUPTION"
        );
        assert_eq!(
            IndexError::UnsupportedType {
                data_type: DataType::FloatVector
            }
            .code(),
            "AERO_INDEX_UNSUPPORTED_TYPE"
        );
    }

    #[test]
    fn test_categories() {
        let config = IndexError::IncompatibleIndexType {
            index_type: IndexType::Trie,
            data_type: DataType::Bool,
        };
        assert_eq!(config.category(), ErrorCategory::Configuration);

        let lifecycle = IndexError::AlreadyPopulated {
            state: CreatorState::Built,
        };
        assert_eq!(lifecycle.category(), ErrorCategory::Lifecycle);

        let data = IndexError::type_mismatch(DataType::Int32, DataType::VarChar);
        assert_eq!(data.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_error_display() {
        let err = IndexError::AlreadyPopulated {
            state: CreatorState::Loaded,
        };
        assert_eq!(err.to_string(), "index already loaded");

        let err = IndexError::corrupt("trie_postings", "unexpected end of blob");
        let display = err.to_string();
        assert!(display.contains("trie_postings"));
        assert!(display.contains("unexpected end of blob"));
    }
}
