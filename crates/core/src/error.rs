//! Error types for trendr

use thiserror::Error;

/// Main error type for trendr operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Missing band: {0}")]
    MissingBand(String),

    #[error("Duplicate band name: {0}")]
    DuplicateBand(String),

    #[error("Invalid year range: start {start} > end {end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Invalid day window: {0}")]
    InvalidDayWindow(String),

    #[error("Degenerate region: polygon must have at least 3 points enclosing a non-zero area")]
    DegenerateRegion,

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A remote computation (collection query, segmentation, export) failed.
    /// `stage` names the pipeline stage whose request was rejected.
    #[error("Remote computation failed at {stage}: {message}")]
    Remote { stage: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::Remote`] for the given stage.
    pub fn remote(stage: &str, message: impl Into<String>) -> Self {
        Error::Remote {
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for trendr operations
pub type Result<T> = std::result::Result<T, Error>;
