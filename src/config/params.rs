//! Flat string-keyed parameter maps
//!
//! Type parameters and index parameters both arrive as flat key/value maps.
//! They are parsed once and never mutated. Consumers read the keys they know
//! and ignore the rest.
//!
//! Accepted JSON shapes:
//!
//! ```text
//! {"index_type": "sort", "bitmap_cardinality_limit": 64}
//! [{"key": "index_type", "value": "sort"}]
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::{IndexError, IndexResult};

/// Immutable parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    params: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct KeyValuePair {
    key: String,
    value: Value,
}

impl Config {
    /// Creates an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from key/value pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Parse a JSON object or a JSON list of `{"key", "value"}` pairs.
    ///
    /// Blank input yields an empty config. String, number and boolean values
    /// are kept as their string form; anything else is rejected.
    pub fn from_json(json: &str) -> IndexResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: Value = serde_json::from_str(json)
            .map_err(|e| IndexError::invalid_parameter("<config>", format!("invalid JSON: {e}")))?;

        let mut params = BTreeMap::new();
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    let value = Self::scalar_to_string(&key, value)?;
                    params.insert(key, value);
                }
            }
            Value::Array(_) => {
                let pairs: Vec<KeyValuePair> = serde_json::from_value(value).map_err(|e| {
                    IndexError::invalid_parameter("<config>", format!("invalid key/value list: {e}"))
                })?;
                for pair in pairs {
                    let value = Self::scalar_to_string(&pair.key, pair.value)?;
                    params.insert(pair.key, value);
                }
            }
            other => {
                return Err(IndexError::invalid_parameter(
                    "<config>",
                    format!("expected an object or key/value list, got {other}"),
                ))
            }
        }

        Ok(Self { params })
    }

    fn scalar_to_string(key: &str, value: Value) -> IndexResult<String> {
        match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(IndexError::invalid_parameter(
                key,
                format!("expected a string, number or boolean, got {other}"),
            )),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Parse a value with `FromStr`. Absent keys yield `None`.
    pub fn get_parsed<T>(&self, key: &str) -> IndexResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| IndexError::invalid_parameter(key, format!("{raw:?}: {e}")))
            })
            .transpose()
    }

    /// Parse a boolean flag: true/false, 1/0, yes/no (case-insensitive).
    pub fn get_bool(&self, key: &str) -> IndexResult<Option<bool>> {
        self.get(key)
            .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(IndexError::invalid_parameter(
                    key,
                    format!("{raw:?} is not a boolean"),
                )),
            })
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of the entries, for embedding in serialized metadata
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.params.clone()
    }
}
