//! Column datasets handed to `build`
//!
//! A dataset is a typed vector of raw values plus an optional validity
//! bitmap. The bitmap is bit-packed LSB-first; a set bit marks a present
//! value, a cleared bit a null. Without a bitmap every row is valid.

use crate::errors::{IndexError, IndexResult};

use super::DataType;

/// Raw column values, one physical vector per scalar kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<String>),
}

impl ColumnValues {
    /// Number of values
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Bool(v) => v.len(),
            ColumnValues::Int8(v) => v.len(),
            ColumnValues::Int16(v) => v.len(),
            ColumnValues::Int32(v) => v.len(),
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Double(v) => v.len(),
            ColumnValues::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the physical type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValues::Bool(_) => "bool values",
            ColumnValues::Int8(_) => "int8 values",
            ColumnValues::Int16(_) => "int16 values",
            ColumnValues::Int32(_) => "int32 values",
            ColumnValues::Int64(_) => "int64 values",
            ColumnValues::Float(_) => "float values",
            ColumnValues::Double(_) => "double values",
            ColumnValues::String(_) => "string values",
        }
    }

    /// Whether these values can carry the given declared type.
    ///
    /// STRING and VARCHAR share the string representation.
    pub fn fits(&self, data_type: DataType) -> bool {
        matches!(
            (self, data_type),
            (ColumnValues::Bool(_), DataType::Bool)
                | (ColumnValues::Int8(_), DataType::Int8)
                | (ColumnValues::Int16(_), DataType::Int16)
                | (ColumnValues::Int32(_), DataType::Int32)
                | (ColumnValues::Int64(_), DataType::Int64)
                | (ColumnValues::Float(_), DataType::Float)
                | (ColumnValues::Double(_), DataType::Double)
                | (ColumnValues::String(_), DataType::String | DataType::VarChar)
        )
    }
}

/// Bit-packed validity bitmap (set bit = value present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullBitmap {
    bits: Vec<u8>,
    len: usize,
}

impl NullBitmap {
    /// Build a bitmap from one flag per row
    pub fn from_validity(validity: &[bool]) -> Self {
        let mut bits = vec![0u8; validity.len().div_ceil(8)];
        for (i, valid) in validity.iter().enumerate() {
            if *valid {
                bits[i / 8] |= 1 << (i % 8);
            }
        }
        Self {
            bits,
            len: validity.len(),
        }
    }

    /// Wrap an already packed bitmap covering `len` rows.
    pub fn from_bytes(bits: Vec<u8>, len: usize) -> IndexResult<Self> {
        let needed = len.div_ceil(8);
        if bits.len() < needed {
            return Err(IndexError::type_mismatch(
                format!("{needed} validity bytes for {len} rows"),
                format!("{} bytes", bits.len()),
            ));
        }
        Ok(Self { bits, len })
    }

    /// Whether row `i` holds a value. Rows past the end are treated as null.
    pub fn is_valid(&self, i: usize) -> bool {
        i < self.len && self.bits[i / 8] & (1 << (i % 8)) != 0
    }

    /// Number of rows covered
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of cleared bits
    pub fn null_count(&self) -> usize {
        (0..self.len).filter(|i| !self.is_valid(*i)).count()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}

/// Native element types that map onto a column representation.
pub trait ColumnElement: Sized + Default {
    /// Declared type produced by `Dataset::from_values`
    const DATA_TYPE: DataType;

    fn into_column(values: Vec<Self>) -> ColumnValues;
}

macro_rules! impl_column_element {
    ($t:ty, $dt:expr, $variant:ident) => {
        impl ColumnElement for $t {
            const DATA_TYPE: DataType = $dt;

            fn into_column(values: Vec<Self>) -> ColumnValues {
                ColumnValues::$variant(values)
            }
        }
    };
}

impl_column_element!(bool, DataType::Bool, Bool);
impl_column_element!(i8, DataType::Int8, Int8);
impl_column_element!(i16, DataType::Int16, Int16);
impl_column_element!(i32, DataType::Int32, Int32);
impl_column_element!(i64, DataType::Int64, Int64);
impl_column_element!(f32, DataType::Float, Float);
impl_column_element!(f64, DataType::Double, Double);
impl_column_element!(String, DataType::String, String);

/// Raw column values to index.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data_type: DataType,
    values: ColumnValues,
    validity: Option<NullBitmap>,
}

impl Dataset {
    /// Create a dataset with an explicit type tag.
    ///
    /// Fails with `TypeMismatch` if the values cannot carry `data_type`.
    pub fn new(data_type: DataType, values: ColumnValues) -> IndexResult<Self> {
        if !values.fits(data_type) {
            return Err(IndexError::type_mismatch(data_type, values.type_name()));
        }
        Ok(Self {
            data_type,
            values,
            validity: None,
        })
    }

    /// Create a dataset without nulls, typed after the element type
    pub fn from_values<T: ColumnElement>(values: Vec<T>) -> Self {
        Self {
            data_type: T::DATA_TYPE,
            values: T::into_column(values),
            validity: None,
        }
    }

    /// Create a dataset where `None` marks a null row
    pub fn from_options<T: ColumnElement>(values: Vec<Option<T>>) -> Self {
        let validity: Vec<bool> = values.iter().map(Option::is_some).collect();
        let values: Vec<T> = values.into_iter().map(Option::unwrap_or_default).collect();
        Self {
            data_type: T::DATA_TYPE,
            values: T::into_column(values),
            validity: Some(NullBitmap::from_validity(&validity)),
        }
    }

    /// Attach a validity bitmap. Its length must equal the value count.
    pub fn with_validity(mut self, validity: NullBitmap) -> IndexResult<Self> {
        if validity.len() != self.values.len() {
            return Err(IndexError::type_mismatch(
                format!("validity bitmap of {} rows", self.values.len()),
                format!("{} rows", validity.len()),
            ));
        }
        self.validity = Some(validity);
        Ok(self)
    }

    /// Number of rows, nulls included
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn validity(&self) -> Option<&NullBitmap> {
        self.validity.as_ref()
    }

    pub fn is_valid(&self, row: usize) -> bool {
        match &self.validity {
            Some(bitmap) => bitmap.is_valid(row),
            None => row < self.len(),
        }
    }

    pub fn null_count(&self) -> usize {
        self.validity.as_ref().map_or(0, NullBitmap::null_count)
    }
}
