//! Error types for the spatial core.
//!
//! Queries and mutations of the base registry and the building placer never
//! fail: unknown lookups resolve to `None` and an exhausted placement search
//! is reported through a log diagnostic. Errors only arise at the loading
//! boundary (configuration files, map construction).

use thiserror::Error;

/// Result type alias using [`SpatialError`].
pub type Result<T> = std::result::Result<T, SpatialError>;

/// Top-level error type for the spatial core.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a RON document.
    #[error("Failed to parse RON: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// Configuration values are out of range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Map dimensions are zero or inconsistent.
    #[error("Invalid map dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width in tiles.
        width: i32,
        /// Requested height in tiles.
        height: i32,
    },

    /// An ASCII terrain row contained an unknown character.
    #[error("Unknown terrain character '{ch}' at ({x}, {y})")]
    UnknownTerrain {
        /// The offending character.
        ch: char,
        /// Column of the character.
        x: i32,
        /// Row of the character.
        y: i32,
    },
}
