//! Column data types
//!
//! Scalar kinds (indexable):
//! - BOOL
//! - INT8, INT16, INT32, INT64
//! - FLOAT (32-bit), DOUBLE (64-bit)
//! - STRING, VARCHAR
//!
//! Non-scalar kinds (NONE, JSON, BINARY_VECTOR, FLOAT_VECTOR) are accepted as
//! declared column types but have no scalar index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::IndexError;

/// Declared data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    /// No type declared
    None,
    /// Boolean
    Bool,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// UTF-8 string
    String,
    /// UTF-8 string with a declared maximum length
    #[serde(rename = "VARCHAR")]
    VarChar,
    /// JSON document
    Json,
    /// Packed binary vector
    BinaryVector,
    /// Float vector
    FloatVector,
}

impl DataType {
    /// All declared kinds, scalar and non-scalar.
    pub const ALL: [DataType; 13] = [
        DataType::None,
        DataType::Bool,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float,
        DataType::Double,
        DataType::String,
        DataType::VarChar,
        DataType::Json,
        DataType::BinaryVector,
        DataType::FloatVector,
    ];

    /// Returns the canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::None => "NONE",
            DataType::Bool => "BOOL",
            DataType::Int8 => "INT8",
            DataType::Int16 => "INT16",
            DataType::Int32 => "INT32",
            DataType::Int64 => "INT64",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::String => "STRING",
            DataType::VarChar => "VARCHAR",
            DataType::Json => "JSON",
            DataType::BinaryVector => "BINARY_VECTOR",
            DataType::FloatVector => "FLOAT_VECTOR",
        }
    }

    /// Whether values of this type can be held by a scalar index.
    pub fn is_scalar(&self) -> bool {
        self.is_bool() || self.is_integer() || self.is_floating() || self.is_string()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, DataType::Bool)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, DataType::String | DataType::VarChar)
    }

    /// Inclusive value range of an integer type.
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            DataType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            DataType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            DataType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            DataType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DataType {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        DataType::ALL
            .into_iter()
            .find(|dt| dt.as_str() == name)
            .ok_or_else(|| IndexError::invalid_parameter("data_type", format!("unknown data type {s:?}")))
    }
}
