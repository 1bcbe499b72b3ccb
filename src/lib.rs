//! City map posters from OpenStreetMap vector data.
//!
//! Categorized geometry and a [`Theme`] go in; a [`Stage`] with retained,
//! z-ordered layers comes out, drawn chunk by chunk by a [`RenderJob`] and
//! exportable as PNG at 1x, 2x or 3x.

pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod map;
pub mod poster;
pub mod stage;

pub use config::RenderOptions;
pub use data::{
    categorize, classify, load_elements, CategorizedMapData, Category, GeoElement, Member,
    Relation, Tags, Theme, Way,
};
pub use error::{DataError, RenderError, StageError, ViewportError};
pub use geo::{format_coordinates, LatLon};
pub use map::{
    project, unproject, ProgressObserver, RenderJob, RenderPhase, RenderProgress, Viewport,
    ViewportTransform,
};
pub use poster::{export_filename, generate_poster, PosterRequest, PosterView};
pub use stage::{create_stage, FontSource, PixelRatio, Stage};
