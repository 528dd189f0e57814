//! Type and index parameters
//!
//! Parameters are validated lazily by whichever component consumes them:
//! the resolver reads `index_type`, each variant reads its own tuning keys,
//! the creator reads the column's `nullable` flag.

mod params;

pub use params::Config;

/// Index parameter naming the variant to build.
pub const INDEX_TYPE_KEY: &str = "index_type";

/// Bitmap index: maximum number of distinct values.
pub const BITMAP_CARDINALITY_LIMIT_KEY: &str = "bitmap_cardinality_limit";

/// Default for `bitmap_cardinality_limit`.
pub const DEFAULT_BITMAP_CARDINALITY_LIMIT: usize = 1000;

/// Inverted index on string columns: fold terms to lower case when false.
pub const CASE_SENSITIVE_KEY: &str = "case_sensitive";

/// Type parameter: whether the column may hold nulls (default true).
pub const NULLABLE_KEY: &str = "nullable";
