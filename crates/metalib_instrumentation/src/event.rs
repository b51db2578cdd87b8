//! Metric events emitted by the library loader.

use serde::{Deserialize, Serialize};

/// Structured, type-safe metric events emitted by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MetricEvent {
    /// A cache lookup performed on behalf of an import.
    LibraryCacheAccess { key: String, hit: bool },
    /// A library was materialised and inserted into the cache.
    LibraryImported {
        key: String,
        /// Source kind the identifier was classified as.
        kind: String,
        /// Build mode used, or `"load"` for precompiled archives.
        mode: String,
        duration_us: u64,
    },
    /// The external compiler finished running.
    ToolchainInvoked {
        program: String,
        /// `None` when the process was terminated by a signal.
        exit_code: Option<i32>,
        stdin_bytes: u64,
        duration_us: u64,
    },
    /// SPIR-V translation failed and the empty program stub was substituted.
    TranslationFallback { reason: String },
    /// A temporary compiled artifact was cleaned up.
    ArtifactRemoved { path: String, existed: bool },
}
