//! Scalar index creator
//!
//! Owns one concrete index and enforces its lifecycle:
//!
//! ```text
//! Uninitialized --build--> Built
//! Uninitialized --load---> Loaded
//! ```
//!
//! Built and Loaded are terminal. Every rejected call leaves the creator
//! exactly as it was.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::blob::BinarySet;
use crate::config::{Config, NULLABLE_KEY};
use crate::errors::{IndexError, IndexResult};
use crate::index::{create_index, resolve, IndexMeta, IndexType, ScalarIndex};
use crate::observability::{Event, MetricsRegistry};
use crate::types::{DataType, Dataset};

/// Lifecycle state of a creator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorState {
    /// Constructed, holds no data
    Uninitialized,
    /// Populated by `build`
    Built,
    /// Populated by `load`
    Loaded,
}

impl CreatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatorState::Uninitialized => "uninitialized",
            CreatorState::Built => "built",
            CreatorState::Loaded => "loaded",
        }
    }

    /// Whether the index holds data
    pub fn is_populated(&self) -> bool {
        !matches!(self, CreatorState::Uninitialized)
    }
}

impl fmt::Display for CreatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three lifecycle operations every index creator offers.
pub trait IndexCreator: Send + Sync {
    fn build(&mut self, dataset: &Dataset) -> IndexResult<()>;

    fn serialize(&self) -> IndexResult<BinarySet>;

    fn load(&mut self, blobs: &BinarySet) -> IndexResult<()>;
}

/// Creator for one scalar column index.
///
/// The variant is resolved and instantiated at construction, so every
/// configuration error surfaces before any data is handled.
#[derive(Debug)]
pub struct ScalarIndexCreator {
    data_type: DataType,
    index_type: IndexType,
    type_params: Config,
    index_params: Config,
    nullable: bool,
    index: Box<dyn ScalarIndex>,
    state: CreatorState,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ScalarIndexCreator {
    /// Resolve the variant for `data_type` and create an empty index.
    ///
    /// # Errors
    ///
    /// - `UnsupportedType` when the data type has no scalar index
    /// - `IncompatibleIndexType` when `index_type` names a variant that
    ///   cannot index the data type
    /// - `InvalidParameter` for malformed parameter values
    pub fn new(data_type: DataType, type_params: &Config, index_params: &Config) -> IndexResult<Self> {
        let index_type = resolve(data_type, index_params)?;
        let nullable = type_params.get_bool(NULLABLE_KEY)?.unwrap_or(true);
        let index = create_index(data_type, index_type, index_params)?;

        info!(
            event = %Event::IndexResolved,
            data_type = %data_type,
            index_type = %index_type,
            "scalar index resolved"
        );

        Ok(Self {
            data_type,
            index_type,
            type_params: type_params.clone(),
            index_params: index_params.clone(),
            nullable,
            index,
            state: CreatorState::Uninitialized,
            metrics: None,
        })
    }

    /// Like `new`, with both parameter sets given as JSON.
    pub fn from_json(data_type: DataType, type_params: &str, index_params: &str) -> IndexResult<Self> {
        let type_params = Config::from_json(type_params)?;
        let index_params = Config::from_json(index_params)?;
        Self::new(data_type, &type_params, &index_params)
    }

    /// Record lifecycle counters into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Populate the index from raw column values.
    ///
    /// # Errors
    ///
    /// - `AlreadyPopulated` after a successful build or load
    /// - `TypeMismatch` when the dataset type differs from the column type
    /// - `NullNotAllowed` when the column is declared `nullable=false` and
    ///   the dataset holds nulls
    /// - Variant errors such as `BuildFailed`
    pub fn build(&mut self, dataset: &Dataset) -> IndexResult<()> {
        info!(
            event = %Event::IndexBuildBegin,
            data_type = %self.data_type,
            index_type = %self.index_type,
            rows = dataset.len(),
            "scalar index build"
        );

        match self.try_build(dataset) {
            Ok(()) => {
                self.state = CreatorState::Built;
                if let Some(metrics) = &self.metrics {
                    metrics.record_build(dataset.len() as u64);
                }
                info!(
                    event = %Event::IndexBuildComplete,
                    data_type = %self.data_type,
                    index_type = %self.index_type,
                    rows = dataset.len(),
                    nulls = dataset.null_count(),
                    "scalar index built"
                );
                Ok(())
            }
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_build_failure();
                }
                warn!(
                    event = %Event::IndexBuildFailed,
                    data_type = %self.data_type,
                    index_type = %self.index_type,
                    code = err.code(),
                    error = %err,
                    "scalar index build failed"
                );
                Err(err)
            }
        }
    }

    fn try_build(&mut self, dataset: &Dataset) -> IndexResult<()> {
        if self.state.is_populated() {
            return Err(IndexError::AlreadyPopulated { state: self.state });
        }
        if dataset.data_type() != self.data_type {
            return Err(IndexError::type_mismatch(self.data_type, dataset.data_type()));
        }
        let null_count = dataset.null_count();
        if !self.nullable && null_count > 0 {
            return Err(IndexError::NullNotAllowed { null_count });
        }
        self.index.build(dataset)
    }

    /// Produce the blob set of the populated index.
    ///
    /// Read-only; repeated calls return identical blob sets.
    pub fn serialize(&self) -> IndexResult<BinarySet> {
        if !self.state.is_populated() {
            return Err(IndexError::NotBuilt);
        }
        let blobs = self.index.serialize()?;

        if let Some(metrics) = &self.metrics {
            metrics.record_serialization(blobs.total_size() as u64);
        }
        info!(
            event = %Event::IndexSerialized,
            data_type = %self.data_type,
            index_type = %self.index_type,
            blobs = blobs.len(),
            bytes = blobs.total_size(),
            "scalar index serialized"
        );
        Ok(blobs)
    }

    /// Populate the index from a blob set produced by `serialize`.
    ///
    /// # Errors
    ///
    /// - `AlreadyPopulated` after a successful build or load
    /// - `IncompatibleBlobSet` when the set has no metadata or was written
    ///   for another column type, variant or format version
    /// - `CorruptData` for checksum failures and malformed blobs
    pub fn load(&mut self, blobs: &BinarySet) -> IndexResult<()> {
        info!(
            event = %Event::IndexLoadBegin,
            data_type = %self.data_type,
            index_type = %self.index_type,
            blobs = blobs.len(),
            "scalar index load"
        );

        match self.try_load(blobs) {
            Ok(()) => {
                self.state = CreatorState::Loaded;
                if let Some(metrics) = &self.metrics {
                    metrics.record_load();
                }
                info!(
                    event = %Event::IndexLoadComplete,
                    data_type = %self.data_type,
                    index_type = %self.index_type,
                    rows = self.index.row_count(),
                    "scalar index loaded"
                );
                Ok(())
            }
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_load_rejection();
                }
                warn!(
                    event = %Event::IndexLoadRejected,
                    data_type = %self.data_type,
                    index_type = %self.index_type,
                    code = err.code(),
                    error = %err,
                    "scalar index load rejected"
                );
                Err(err)
            }
        }
    }

    fn try_load(&mut self, blobs: &BinarySet) -> IndexResult<()> {
        if self.state.is_populated() {
            return Err(IndexError::AlreadyPopulated { state: self.state });
        }
        let meta = IndexMeta::from_blob_set(blobs)?;
        meta.check_compatible(self.data_type, self.index_type)?;
        self.index.load(blobs)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn state(&self) -> CreatorState {
        self.state
    }

    pub fn is_populated(&self) -> bool {
        self.state.is_populated()
    }

    pub fn type_params(&self) -> &Config {
        &self.type_params
    }

    pub fn index_params(&self) -> &Config {
        &self.index_params
    }

    /// Whether the column accepts nulls (`nullable` type param, default true)
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Borrow the populated index for lookups
    pub fn index(&self) -> IndexResult<&dyn ScalarIndex> {
        if !self.state.is_populated() {
            return Err(IndexError::NotBuilt);
        }
        Ok(self.index.as_ref())
    }

    /// Hand the populated index over to the caller
    pub fn into_index(self) -> IndexResult<Box<dyn ScalarIndex>> {
        if !self.state.is_populated() {
            return Err(IndexError::NotBuilt);
        }
        info!(
            event = %Event::IndexReleased,
            data_type = %self.data_type,
            index_type = %self.index_type,
            state = %self.state,
            "scalar index released"
        );
        Ok(self.index)
    }
}

impl IndexCreator for ScalarIndexCreator {
    fn build(&mut self, dataset: &Dataset) -> IndexResult<()> {
        ScalarIndexCreator::build(self, dataset)
    }

    fn serialize(&self) -> IndexResult<BinarySet> {
        ScalarIndexCreator::serialize(self)
    }

    fn load(&mut self, blobs: &BinarySet) -> IndexResult<()> {
        ScalarIndexCreator::load(self, blobs)
    }
}

/// Create a boxed scalar index creator from JSON parameter sets.
pub fn create_scalar_index(
    data_type: DataType,
    type_params: &str,
    index_params: &str,
) -> IndexResult<Box<ScalarIndexCreator>> {
    ScalarIndexCreator::from_json(data_type, type_params, index_params).map(Box::new)
}
