pub mod labels;
mod paths;
mod projection;
mod renderer;
pub mod style;

pub use paths::{build_paths, project_ring, BatchBuilder, PathBatch, Polyline, DEFAULT_MAX_BATCH_PATHS};
pub use projection::{project, unproject, Viewport, ViewportTransform, EARTH_RADIUS, MAX_LAT};
pub use renderer::{PosterRequest, ProgressObserver, RenderJob, RenderPhase, RenderProgress};
pub use style::StyleKey;
