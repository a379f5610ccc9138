//! Error types for whipcam-core.

use thiserror::Error;

/// Result type alias for whipcam operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A camera record whose arrays do not agree with its declared shape.
///
/// These are data-definition bugs. Document construction stops at the
/// first one; there is no partial output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataShapeError {
    /// A coordinate or radius array is shorter than the active pixel count.
    #[error("camera {nadc}: {array} has {len} entries but npix is {npix}")]
    RaggedCoordinates {
        nadc: u32,
        array: &'static str,
        len: usize,
        npix: usize,
    },

    /// The neighbor table has fewer rows than active pixels.
    #[error("camera {nadc}: neighbor table has {rows} rows but npix is {npix}")]
    PixelCountExceedsTable { nadc: u32, rows: usize, npix: usize },

    /// A neighbor row exhausted its fixed width without a `-1`.
    #[error("neighbor row {row} has no -1 sentinel within its width of {width}")]
    MissingSentinel { row: usize, width: usize },

    /// A coordinate or radius of an active pixel is NaN or infinite.
    #[error("camera {nadc}: {array}[{pixel}] is not finite ({value})")]
    NonFiniteCoordinate {
        nadc: u32,
        array: &'static str,
        pixel: usize,
        value: f32,
    },

    /// Rows of a neighbor table with differing widths.
    #[error("neighbor row {row} has {len} cells, expected {width}")]
    RaggedNeighborRows { row: usize, len: usize, width: usize },
}

/// Core error types for whipcam operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Inconsistent camera geometry.
    #[error("data shape error: {0}")]
    DataShape(#[from] DataShapeError),

    /// Malformed JSON input.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A manifest entry names a table the dataset does not have.
    #[error("unknown geometry table: {0}")]
    UnknownTable(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A parsed geometry document is not shaped like one.
    #[error("invalid geometry document: {0}")]
    InvalidDocument(String),

    /// The process-wide dataset has already been installed.
    #[error("geometry dataset already installed")]
    AlreadyInstalled,
}
