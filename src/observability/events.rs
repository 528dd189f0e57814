//! Observable index lifecycle events
//!
//! Every lifecycle log line carries one of these as its `event` field.
//! Events are explicit and typed.

use std::fmt;

/// Observable events of the scalar index lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Construction
    /// Variant chosen for a column
    IndexResolved,

    // Build
    /// Build begins
    IndexBuildBegin,
    /// Build complete, index populated
    IndexBuildComplete,
    /// Build rejected or failed
    IndexBuildFailed,

    // Serialize
    /// Blob set produced
    IndexSerialized,

    // Load
    /// Load begins
    IndexLoadBegin,
    /// Load complete, index populated
    IndexLoadComplete,
    /// Blob set rejected
    IndexLoadRejected,

    // Hand-off
    /// Index moved out of its creator
    IndexReleased,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::IndexResolved => "INDEX_RESOLVED",
            Event::IndexBuildBegin => "INDEX_BUILD_BEGIN",
            Event::IndexBuildComplete => "INDEX_BUILD_COMPLETE",
            Event::IndexBuildFailed => "INDEX_BUILD_FAILED",
            Event::IndexSerialized => "INDEX_SERIALIZED",
            Event::IndexLoadBegin => "INDEX_LOAD_BEGIN",
            Event::IndexLoadComplete => "INDEX_LOAD_COMPLETE",
            Event::IndexLoadRejected => "INDEX_LOAD_REJECTED",
            Event::IndexReleased => "INDEX_RELEASED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
