//! Error types for the verification suite.
//!
//! Only structurally invalid inputs are errors. A computed value that misses
//! its reference is a measurement outcome and is reported as `passed = false`
//! in the result record, never through this module.
//!
//! ## Hierarchy
//!
//! ```text
//! VerifyError (top-level)
//! ├── ConfigError   (grid / gate / tolerance validation, config file loading)
//! └── serde_json::Error
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Convenient `Result` alias for driver-level functions.
pub type VerifyResult<T> = Result<T, VerifyError>;

// ── VerifyError ──────────────────────────────────────────────────────────────

/// Top-level error type for the verification suite.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A configuration validation or loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ── ConfigError ──────────────────────────────────────────────────────────────

/// Fail-fast rejection of inputs that would make a check verify nothing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A grid axis is too short to contain any interior node.
    #[error("Grid axis {axis} has {size} nodes; at least 3 are needed for an interior node")]
    NoInteriorNodes {
        /// Index of the offending axis.
        axis: usize,
        /// Number of nodes along that axis.
        size: usize,
    },

    /// The grid has neither 2 nor 3 axes.
    #[error("Unsupported lattice dimension {dims}; expected 2 or 3")]
    UnsupportedDimension {
        /// Number of axes supplied.
        dims: usize,
    },

    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// The schedule has more gates than the subset enumeration can cover.
    #[error("Schedule has {count} gates; inclusion-exclusion supports at most {max}")]
    TooManyGates {
        /// Gates supplied.
        count: usize,
        /// Supported maximum.
        max: usize,
    },

    /// A gate index does not exist in the schedule.
    #[error("Gate index {index} is out of range for a schedule of {len} gates")]
    GateIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of gates in the schedule.
        len: usize,
    },

    /// A configuration file could not be read from disk.
    #[error("Cannot read config file `{path}`: {source}")]
    FileRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file contains malformed JSON.
    #[error("Cannot parse config file `{path}`: {source}")]
    ParseError {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue { field, reason: reason.into() }
    }
}
