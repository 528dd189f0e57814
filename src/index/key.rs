//! Index keys
//!
//! Every variant stores column values as `ScalarKey`s. Integer widths widen
//! to `i64`; floats are stored as order-preserving bits so keys have a total
//! order. Serialized keys use the declared width of the column type.

use std::ops::Bound;

use crate::blob::{BlobReader, BlobWriter};
use crate::errors::{IndexError, IndexResult};
use crate::types::{ColumnValues, DataType, Dataset, RowOffset, ScalarValue};

/// Index key representing one column value.
///
/// Ordering within one column type is the natural value order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarKey {
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value of any width
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// String value
    String(String),
}

impl ScalarKey {
    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering. `-0.0` and `0.0` map to
    /// the same key.
    pub fn from_float(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits // Negative: flip all bits
        } else {
            bits ^ (1 << 63) // Positive: flip sign bit
        };
        ScalarKey::Float(ordered)
    }

    fn float_from_ordered(ordered: u64) -> f64 {
        let bits = if (ordered >> 63) == 1 {
            ordered ^ (1 << 63)
        } else {
            !ordered
        };
        f64::from_bits(bits)
    }

    /// Convert a lookup value into a key for a column of `data_type`.
    ///
    /// Integers are accepted for float columns. Values for FLOAT columns are
    /// narrowed to f32 so they compare equal to stored values.
    pub fn from_value(data_type: DataType, value: &ScalarValue) -> IndexResult<Self> {
        match (value, data_type) {
            (ScalarValue::Bool(b), DataType::Bool) => Ok(ScalarKey::Bool(*b)),
            (ScalarValue::Int(i), dt) if dt.is_integer() => Ok(ScalarKey::Int(*i)),
            (ScalarValue::Int(i), DataType::Float) => Ok(ScalarKey::from_float(*i as f32 as f64)),
            (ScalarValue::Int(i), DataType::Double) => Ok(ScalarKey::from_float(*i as f64)),
            (ScalarValue::Float(f), DataType::Float) => Ok(ScalarKey::from_float(*f as f32 as f64)),
            (ScalarValue::Float(f), DataType::Double) => Ok(ScalarKey::from_float(*f)),
            (ScalarValue::String(s), dt) if dt.is_string() => Ok(ScalarKey::String(s.clone())),
            (value, dt) => Err(IndexError::type_mismatch(
                format!("{dt} value"),
                format!("{} value {}", value.type_name(), value),
            )),
        }
    }

    /// Convert back into a lookup value
    pub fn to_value(&self) -> ScalarValue {
        match self {
            ScalarKey::Bool(b) => ScalarValue::Bool(*b),
            ScalarKey::Int(i) => ScalarValue::Int(*i),
            ScalarKey::Float(bits) => ScalarValue::Float(Self::float_from_ordered(*bits)),
            ScalarKey::String(s) => ScalarValue::String(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarKey::String(s) => Some(s),
            _ => None,
        }
    }

    /// Smallest encoded size of a key of `data_type`
    pub fn min_encoded_size(data_type: DataType) -> usize {
        match data_type {
            DataType::Bool | DataType::Int8 => 1,
            DataType::Int16 => 2,
            DataType::Int32 | DataType::Float => 4,
            DataType::Int64 | DataType::Double => 8,
            // length prefix of an empty string
            _ => 4,
        }
    }

    /// Encode with the declared width of `data_type`
    pub fn encode(&self, data_type: DataType, w: &mut BlobWriter) -> IndexResult<()> {
        match (self, data_type) {
            (ScalarKey::Bool(b), DataType::Bool) => w.put_u8(u8::from(*b)),
            (ScalarKey::Int(i), DataType::Int8) => w.put_u8(*i as i8 as u8),
            (ScalarKey::Int(i), DataType::Int16) => w.put_u16(*i as i16 as u16),
            (ScalarKey::Int(i), DataType::Int32) => w.put_u32(*i as i32 as u32),
            (ScalarKey::Int(i), DataType::Int64) => w.put_u64(*i as u64),
            (ScalarKey::Float(bits), DataType::Float) => {
                let v = Self::float_from_ordered(*bits) as f32;
                w.put_u32(v.to_bits());
            }
            (ScalarKey::Float(bits), DataType::Double) => {
                w.put_u64(Self::float_from_ordered(*bits).to_bits());
            }
            (ScalarKey::String(s), dt) if dt.is_string() => w.put_str(s)?,
            (key, dt) => {
                return Err(IndexError::BuildFailed(format!(
                    "key {key:?} cannot be encoded as {dt}"
                )))
            }
        }
        Ok(())
    }

    /// Decode a key written by `encode`
    pub fn decode(data_type: DataType, r: &mut BlobReader<'_>) -> IndexResult<Self> {
        let key = match data_type {
            DataType::Bool => match r.read_u8()? {
                0 => ScalarKey::Bool(false),
                1 => ScalarKey::Bool(true),
                other => return Err(r.corrupt(format!("invalid bool byte {other}"))),
            },
            DataType::Int8 => ScalarKey::Int(r.read_u8()? as i8 as i64),
            DataType::Int16 => ScalarKey::Int(r.read_u16()? as i16 as i64),
            DataType::Int32 => ScalarKey::Int(r.read_u32()? as i32 as i64),
            DataType::Int64 => ScalarKey::Int(r.read_u64()? as i64),
            DataType::Float => ScalarKey::from_float(f32::from_bits(r.read_u32()?) as f64),
            DataType::Double => ScalarKey::from_float(f64::from_bits(r.read_u64()?)),
            dt if dt.is_string() => ScalarKey::String(r.read_string()?),
            dt => return Err(r.corrupt(format!("no key encoding for {dt}"))),
        };
        Ok(key)
    }
}

/// Convert lookup bounds into key bounds.
///
/// Returns `None` when the bounds describe an empty range, so callers never
/// hand an inverted range to an ordered map.
pub fn key_bounds(
    data_type: DataType,
    lower: Bound<&ScalarValue>,
    upper: Bound<&ScalarValue>,
) -> IndexResult<Option<(Bound<ScalarKey>, Bound<ScalarKey>)>> {
    let convert = |b: Bound<&ScalarValue>| -> IndexResult<Bound<ScalarKey>> {
        Ok(match b {
            Bound::Included(v) => Bound::Included(ScalarKey::from_value(data_type, v)?),
            Bound::Excluded(v) => Bound::Excluded(ScalarKey::from_value(data_type, v)?),
            Bound::Unbounded => Bound::Unbounded,
        })
    };
    let lower = convert(lower)?;
    let upper = convert(upper)?;

    let empty = match (&lower, &upper) {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi))
        | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
        _ => false,
    };
    Ok((!empty).then_some((lower, upper)))
}

/// One pass over a dataset: valid rows as keys, null rows apart.
#[derive(Debug, Clone, Default)]
pub struct ColumnScan {
    /// (key, row) for every non-null row, in row order
    pub entries: Vec<(ScalarKey, RowOffset)>,
    /// Null rows ascending
    pub null_rows: Vec<RowOffset>,
    /// Total rows, nulls included
    pub row_count: usize,
}

impl ColumnScan {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        fn collect<T>(
            dataset: &Dataset,
            values: &[T],
            to_key: impl Fn(&T) -> ScalarKey,
        ) -> (Vec<(ScalarKey, RowOffset)>, Vec<RowOffset>) {
            let mut entries = Vec::with_capacity(values.len());
            let mut nulls = Vec::new();
            for (row, value) in values.iter().enumerate() {
                if dataset.is_valid(row) {
                    entries.push((to_key(value), row as RowOffset));
                } else {
                    nulls.push(row as RowOffset);
                }
            }
            (entries, nulls)
        }

        let (entries, null_rows) = match dataset.values() {
            ColumnValues::Bool(v) => collect(dataset, v, |b| ScalarKey::Bool(*b)),
            ColumnValues::Int8(v) => collect(dataset, v, |i| ScalarKey::Int(*i as i64)),
            ColumnValues::Int16(v) => collect(dataset, v, |i| ScalarKey::Int(*i as i64)),
            ColumnValues::Int32(v) => collect(dataset, v, |i| ScalarKey::Int(*i as i64)),
            ColumnValues::Int64(v) => collect(dataset, v, |i| ScalarKey::Int(*i)),
            ColumnValues::Float(v) => collect(dataset, v, |f| ScalarKey::from_float(*f as f64)),
            ColumnValues::Double(v) => collect(dataset, v, |f| ScalarKey::from_float(*f)),
            ColumnValues::String(v) => collect(dataset, v, |s| ScalarKey::String(s.clone())),
        };

        Self {
            entries,
            null_rows,
            row_count: dataset.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_ordering() {
        let values = [f64::NEG_INFINITY, -2.5, -1e-9, 0.0, 1e-9, 3.0, f64::INFINITY];
        let keys: Vec<_> = values.iter().map(|v| ScalarKey::from_float(*v)).collect();
        for i in 1..keys.len() {
            assert!(keys[i - 1] < keys[i], "{} vs {}", values[i - 1], values[i]);
        }
    }

    #[test]
    fn test_signed_zeros_share_a_key() {
        assert_eq!(ScalarKey::from_float(-0.0), ScalarKey::from_float(0.0));
        assert_eq!(
            ScalarKey::from_value(DataType::Float, &ScalarValue::Float(-0.0)).unwrap(),
            ScalarKey::from_value(DataType::Float, &ScalarValue::Int(0)).unwrap()
        );

        let mut w = BlobWriter::new();
        w.put_u64((-0.0f64).to_bits());
        let bytes = w.into_inner();
        let mut r = BlobReader::new("sort_data", &bytes);
        assert_eq!(ScalarKey::decode(DataType::Double, &mut r).unwrap(), ScalarKey::from_float(0.0));
    }

    #[test]
    fn test_float_bits_reversible() {
        for v in [-1234.5f64, -0.0, 0.0, 42.0, f64::MAX] {
            assert_eq!(ScalarKey::from_float(v).to_value(), ScalarValue::Float(v));
        }
    }

    #[test]
    fn test_from_value_checks_kind() {
        assert_eq!(
            ScalarKey::from_value(DataType::Int16, &ScalarValue::Int(7)).unwrap(),
            ScalarKey::Int(7)
        );
        let err = ScalarKey::from_value(DataType::Bool, &ScalarValue::Int(1)).unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_TYPE_MISMATCH");
        assert!(ScalarKey::from_value(DataType::VarChar, &ScalarValue::Float(1.0)).is_err());
    }

    #[test]
    fn test_float_column_narrows_lookup_value() {
        let stored = ScalarKey::from_float(1.1f32 as f64);
        let probe = ScalarKey::from_value(DataType::Float, &ScalarValue::Float(1.1)).unwrap();
        assert_eq!(stored, probe);
    }

    #[test]
    fn test_encoded_widths() {
        let cases = [
            (DataType::Bool, ScalarKey::Bool(true), 1),
            (DataType::Int8, ScalarKey::Int(-5), 1),
            (DataType::Int16, ScalarKey::Int(-300), 2),
            (DataType::Int32, ScalarKey::Int(70_000), 4),
            (DataType::Int64, ScalarKey::Int(i64::MIN), 8),
            (DataType::Float, ScalarKey::from_float(0.5), 4),
            (DataType::Double, ScalarKey::from_float(-0.25), 8),
            (DataType::VarChar, ScalarKey::String("abc".into()), 7),
        ];
        for (dt, key, width) in cases {
            let mut w = BlobWriter::new();
            key.encode(dt, &mut w).unwrap();
            let bytes = w.into_inner();
            assert_eq!(bytes.len(), width, "{dt}");

            let mut r = BlobReader::new("keys", &bytes);
            assert_eq!(ScalarKey::decode(dt, &mut r).unwrap(), key, "{dt}");
        }
    }

    #[test]
    fn test_invalid_bool_byte_is_corruption() {
        let bytes = [7u8];
        let mut r = BlobReader::new("keys", &bytes);
        let err = ScalarKey::decode(DataType::Bool, &mut r).unwrap_err();
        assert_eq!(err.code(), "AERO_DATA_CORRUPTION");
    }

    #[test]
    fn test_key_bounds_empty_ranges() {
        let five = ScalarValue::Int(5);
        let three = ScalarValue::Int(3);
        assert!(key_bounds(DataType::Int32, Bound::Included(&five), Bound::Included(&three))
            .unwrap()
            .is_none());
        assert!(key_bounds(DataType::Int32, Bound::Excluded(&five), Bound::Included(&five))
            .unwrap()
            .is_none());
        assert!(key_bounds(DataType::Int32, Bound::Included(&five), Bound::Included(&five))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_column_scan_splits_nulls() {
        let ds = Dataset::from_options(vec![Some(3), Some(1), None, Some(5)]);
        let scan = ColumnScan::from_dataset(&ds);
        assert_eq!(scan.row_count, 4);
        assert_eq!(scan.null_rows, vec![2]);
        assert_eq!(
            scan.entries,
            vec![
                (ScalarKey::Int(3), 0),
                (ScalarKey::Int(1), 1),
                (ScalarKey::Int(5), 3)
            ]
        );
    }
}
