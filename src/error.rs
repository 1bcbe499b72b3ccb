//! Error types for the poster pipeline

use thiserror::Error;

/// Rejections raised before any projection happens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    /// Horizontal radius is zero, negative, or not finite
    #[error("viewport radius must be a positive number of meters, got {0}")]
    DegenerateRadius(f64),

    /// Output canvas has no area
    #[error("output canvas must be non-empty, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },

    /// Center coordinate is not a finite lat/lon
    #[error("viewport center is not a valid coordinate ({lat}, {lon})")]
    InvalidCenter { lat: f64, lon: f64 },
}

/// Errors raised by a [`Stage`](crate::stage::Stage)
#[derive(Error, Debug)]
pub enum StageError {
    /// The stage was destroyed and can no longer be drawn on or exported
    #[error("stage has been destroyed")]
    Destroyed,

    /// Backing surface could not be allocated at the requested size
    #[error("cannot allocate a {width}x{height} surface")]
    InvalidSize { width: u32, height: u32 },

    /// A theme color string did not parse
    #[error("invalid color {value:?}: {reason}")]
    Color { value: String, reason: String },

    /// PNG encoding failed
    #[error("raster encoding failed: {0}")]
    Encode(String),
}

/// Errors that stop a render job
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Viewport(#[from] ViewportError),

    #[error(transparent)]
    Stage(#[from] StageError),

    /// The caller cancelled the job at a chunk boundary
    #[error("render cancelled")]
    Cancelled,
}

/// Errors while reading map data or themes
#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    Utf8 {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("invalid Overpass JSON: {0}")]
    Overpass(#[from] simd_json::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}
