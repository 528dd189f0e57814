//! aerodb-scalar-index - Scalar column indexes for aerodb
//!
//! Picks an index variant for a column from its data type and parameters,
//! builds the index from raw column values, serializes it into a named blob
//! set and loads it back.
//!
//! # Example
//!
//! ```
//! use std::ops::Bound;
//! use aerodb_scalar_index::{Config, DataType, Dataset, ScalarIndexCreator, ScalarValue};
//!
//! let mut creator = ScalarIndexCreator::new(DataType::Int32, &Config::new(), &Config::new())?;
//! creator.build(&Dataset::from_options(vec![Some(3), Some(1), Some(2), None, Some(5)]))?;
//! let blobs = creator.serialize()?;
//!
//! let mut loaded = ScalarIndexCreator::new(DataType::Int32, &Config::new(), &Config::new())?;
//! loaded.load(&blobs)?;
//! let rows = loaded.index()?.lookup_range(
//!     Bound::Included(&ScalarValue::Int(1)),
//!     Bound::Included(&ScalarValue::Int(3)),
//! )?;
//! assert_eq!(rows, vec![0, 1, 2]);
//! # Ok::<(), aerodb_scalar_index::IndexError>(())
//! ```

pub mod blob;
pub mod builder;
pub mod config;
pub mod errors;
pub mod index;
pub mod observability;
pub mod types;

pub use blob::{BinarySet, Blob};
pub use builder::{create_scalar_index, CreatorState, IndexCreator, ScalarIndexCreator};
pub use config::Config;
pub use errors::{ErrorCategory, IndexError, IndexResult};
pub use index::{resolve, IndexType, ScalarIndex};
pub use types::{ColumnValues, DataType, Dataset, NullBitmap, RowOffset, ScalarValue};
