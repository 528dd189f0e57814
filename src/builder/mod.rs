//! Index creator subsystem
//!
//! A creator is constructed from a column type plus type and index
//! parameters, then populated exactly once by `build` or `load`.
//!
//! # Invariants
//!
//! - The variant is fixed at construction and never changes
//! - At most one of `build` / `load` ever succeeds
//! - `serialize` never mutates the index
//! - A failed call leaves the creator unchanged

mod creator;

pub use creator::{create_scalar_index, CreatorState, IndexCreator, ScalarIndexCreator};
