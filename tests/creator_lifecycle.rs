//! Creator Lifecycle Tests
//!
//! Tests for creator invariants:
//! - The variant is resolved at construction, deterministically
//! - Build and Load populate the creator at most once
//! - Serialize and index access require a populated creator
//! - Rejected calls leave the creator unchanged

use std::ops::Bound;

use aerodb_scalar_index::{
    create_scalar_index, resolve, Config, CreatorState, DataType, Dataset, ErrorCategory,
    IndexError, IndexType, ScalarIndexCreator, ScalarValue,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn creator(data_type: DataType) -> ScalarIndexCreator {
    ScalarIndexCreator::new(data_type, &Config::new(), &Config::new()).unwrap()
}

fn creator_with(data_type: DataType, index_type: IndexType) -> ScalarIndexCreator {
    let params = Config::from_pairs([("index_type", index_type.as_str())]);
    ScalarIndexCreator::new(data_type, &Config::new(), &params).unwrap()
}

fn ints() -> Dataset {
    Dataset::from_options(vec![Some(3), Some(1), Some(2), None, Some(5)])
}

// =============================================================================
// Resolution Tests
// =============================================================================

/// Default resolution is stable across repeated calls.
#[test]
fn test_resolution_stable() {
    for dt in DataType::ALL.into_iter().filter(|dt| dt.is_scalar()) {
        let first = resolve(dt, &Config::new()).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve(dt, &Config::new()).unwrap(), first);
        }
        assert_eq!(creator(dt).index_type(), first);
    }
}

/// Non-scalar types have no index.
#[test]
fn test_unsupported_types() {
    for dt in [DataType::None, DataType::Json, DataType::BinaryVector, DataType::FloatVector] {
        let err = ScalarIndexCreator::new(dt, &Config::new(), &Config::new()).unwrap_err();
        assert_eq!(err, IndexError::UnsupportedType { data_type: dt });
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}

/// An explicit variant must be compatible with the column type.
#[test]
fn test_incompatible_override() {
    let err = create_scalar_index(DataType::Int64, "", r#"{"index_type": "TRIE"}"#).unwrap_err();
    assert_eq!(
        err,
        IndexError::IncompatibleIndexType {
            index_type: IndexType::Trie,
            data_type: DataType::Int64,
        }
    );
}

/// Parameters arrive as key/value pair lists too.
#[test]
fn test_key_value_pair_params() {
    let index_params = r#"[{"key": "index_type", "value": "marisa-trie"}]"#;
    let creator = create_scalar_index(DataType::VarChar, "[]", index_params).unwrap();
    assert_eq!(creator.index_type(), IndexType::Trie);
    assert_eq!(creator.index_params().get("index_type"), Some("marisa-trie"));
}

/// Malformed parameter JSON is a configuration error.
#[test]
fn test_malformed_params() {
    let err = create_scalar_index(DataType::Int32, "", "{not json").unwrap_err();
    assert_eq!(err.code(), "AERO_INDEX_INVALID_PARAMETER");

    let err = create_scalar_index(DataType::Int32, "", r#"{"index_type": {"nested": 1}}"#)
        .unwrap_err();
    assert_eq!(err.code(), "AERO_INDEX_INVALID_PARAMETER");
}

// =============================================================================
// State Machine Tests
// =============================================================================

/// Build twice is rejected; the first build stays queryable.
#[test]
fn test_build_twice() {
    let mut c = creator(DataType::Int32);
    c.build(&ints()).unwrap();

    let err = c.build(&Dataset::from_values(vec![9, 9, 9])).unwrap_err();
    assert_eq!(err, IndexError::AlreadyPopulated { state: CreatorState::Built });
    assert_eq!(err.category(), ErrorCategory::Lifecycle);

    let rows = c.index().unwrap().lookup_in(&[ScalarValue::Int(5)]).unwrap();
    assert_eq!(rows, vec![4]);
    assert_eq!(c.index().unwrap().row_count(), 5);
}

/// Load after Build is rejected.
#[test]
fn test_load_after_build() {
    let mut c = creator(DataType::Int32);
    c.build(&ints()).unwrap();
    let blobs = c.serialize().unwrap();

    let err = c.load(&blobs).unwrap_err();
    assert_eq!(err, IndexError::AlreadyPopulated { state: CreatorState::Built });
    assert_eq!(c.state(), CreatorState::Built);
}

/// Build after Load is rejected.
#[test]
fn test_build_after_load() {
    let mut source = creator(DataType::Int32);
    source.build(&ints()).unwrap();
    let blobs = source.serialize().unwrap();

    let mut c = creator(DataType::Int32);
    c.load(&blobs).unwrap();
    assert_eq!(c.state(), CreatorState::Loaded);

    let err = c.build(&ints()).unwrap_err();
    assert_eq!(err, IndexError::AlreadyPopulated { state: CreatorState::Loaded });
    assert_eq!(err.to_string(), "index already loaded");
}

/// Serialize before population is rejected.
#[test]
fn test_serialize_before_population() {
    for dt in [DataType::Bool, DataType::Int64, DataType::Double, DataType::VarChar] {
        let c = creator(dt);
        assert_eq!(c.serialize().unwrap_err(), IndexError::NotBuilt);
        assert!(!c.is_populated());
    }
}

/// Dataset type must equal the declared type; nothing changes on mismatch.
#[test]
fn test_type_mismatch_no_mutation() {
    let mut c = creator(DataType::Int64);
    let err = c.build(&Dataset::from_values(vec!["a".to_string()])).unwrap_err();
    assert_eq!(err.code(), "AERO_INDEX_TYPE_MISMATCH");
    assert_eq!(err.category(), ErrorCategory::Data);
    assert_eq!(c.state(), CreatorState::Uninitialized);
    assert_eq!(c.serialize().unwrap_err(), IndexError::NotBuilt);

    // STRING data is not VARCHAR data
    let mut c = creator(DataType::VarChar);
    let err = c.build(&Dataset::from_values(vec!["a".to_string()])).unwrap_err();
    assert_eq!(err.code(), "AERO_INDEX_TYPE_MISMATCH");
}

/// A failing variant build leaves the creator uninitialized.
#[test]
fn test_variant_build_failure() {
    let params = Config::from_pairs([("bitmap_cardinality_limit", "2")]);
    let mut c = ScalarIndexCreator::new(DataType::Int32, &Config::new(), &params).unwrap();
    assert_eq!(c.index_type(), IndexType::Sort);

    let params = Config::from_pairs([("index_type", "BITMAP"), ("bitmap_cardinality_limit", "2")]);
    let mut bitmap = ScalarIndexCreator::new(DataType::Int32, &Config::new(), &params).unwrap();
    let err = bitmap.build(&ints()).unwrap_err();
    assert_eq!(err.code(), "AERO_INDEX_BUILD_FAILED");
    assert_eq!(bitmap.state(), CreatorState::Uninitialized);

    // the limit only applies to bitmap indexes
    assert!(c.build(&ints()).is_ok());
    assert!(bitmap.build(&Dataset::from_values(vec![1, 2, 1])).is_ok());
}

/// The index can be handed over once populated.
#[test]
fn test_into_index() {
    let mut c = creator_with(DataType::VarChar, IndexType::Trie);
    let words = ["north", "south", "northeast"].map(String::from).to_vec();
    let dataset = Dataset::new(DataType::VarChar, aerodb_scalar_index::ColumnValues::String(words))
        .unwrap();
    c.build(&dataset).unwrap();

    let index = c.into_index().unwrap();
    assert_eq!(index.index_type(), IndexType::Trie);
    assert_eq!(index.lookup_prefix("north").unwrap(), vec![0, 2]);
}

/// Lookups on an empty range return nothing.
#[test]
fn test_empty_range() {
    let mut c = creator(DataType::Int32);
    c.build(&ints()).unwrap();
    let rows = c
        .index()
        .unwrap()
        .lookup_range(Bound::Included(&ScalarValue::Int(4)), Bound::Excluded(&ScalarValue::Int(4)))
        .unwrap();
    assert!(rows.is_empty());
}

/// Creators are shareable across threads for concurrent serialization.
#[test]
fn test_concurrent_serialize() {
    use std::sync::Arc;
    use std::thread;

    let mut c = creator(DataType::Double);
    c.build(&Dataset::from_values(vec![0.5, 1.5, -3.0])).unwrap();
    let c = Arc::new(c);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = Arc::clone(&c);
            thread::spawn(move || c.serialize().unwrap())
        })
        .collect();
    let sets: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(sets.windows(2).all(|w| w[0] == w[1]));
}
