//! Observability for the index lifecycle
//!
//! - Structured events through `tracing`, each tagged with an [`Event`]
//! - Deterministic counters in a [`MetricsRegistry`]
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. The library installs no subscriber; the embedding process decides
//!    where events go
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use aerodb_scalar_index::observability::MetricsRegistry;
//! use aerodb_scalar_index::{Config, DataType, Dataset, ScalarIndexCreator};
//!
//! let metrics = Arc::new(MetricsRegistry::new());
//! let mut creator = ScalarIndexCreator::new(DataType::Int64, &Config::new(), &Config::new())?
//!     .with_metrics(Arc::clone(&metrics));
//! creator.build(&Dataset::from_values(vec![4i64, 2, 9]))?;
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.builds, 1);
//! assert_eq!(snapshot.rows_indexed, 3);
//! # Ok::<(), aerodb_scalar_index::IndexError>(())
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};
