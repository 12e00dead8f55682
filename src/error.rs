//! Error type shared by the fallible table operations.

use thiserror::Error;

/// Result alias for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors surfaced by sizing and configuration.
///
/// Both variants leave the table exactly as it was before the failing
/// call: target sizes are computed before any storage is touched.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TableError {
    /// No admissible bucket count satisfies a sizing request; the ladder
    /// of precomputed sizes is exhausted. Never silently capped.
    #[error("no admissible bucket count >= {required}")]
    SizesExhausted { required: usize },

    /// `set_max_load_factor` was given a factor at or below the minimum
    /// threshold, which would force runaway bucket growth.
    #[error("max load factor {factor} is too small")]
    InvalidLoadFactor { factor: f64 },
}
