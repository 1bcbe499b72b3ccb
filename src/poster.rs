//! Poster entry point and per-view stage ownership.

use tracing::debug;

use crate::config::RenderOptions;
use crate::data::{CategorizedMapData, Theme};
use crate::error::{RenderError, StageError};
use crate::map::{ProgressObserver, RenderJob, Viewport};
use crate::stage::{PixelRatio, Stage};

pub use crate::map::PosterRequest;

/// Start a render. The returned job already holds a stage with the
/// background painted; step it (or iterate it) to draw the rest. Only a
/// degenerate viewport is returned as `Err`; other failures end the job in
/// its `Error` phase.
pub fn generate_poster<'a>(
    data: &'a CategorizedMapData,
    theme: &'a Theme,
    request: &'a PosterRequest,
    options: &RenderOptions,
    observer: Option<ProgressObserver<'a>>,
) -> Result<RenderJob<'a>, RenderError> {
    RenderJob::start(data, theme, request, options, observer)
}

/// `{city}_{theme}_{HD|QHD|4K}.png`
pub fn export_filename(city: &str, theme: &str, ratio: PixelRatio) -> String {
    format!("{city}_{theme}_{}.png", ratio.label())
}

/// Holds the one live stage of a poster view
#[derive(Debug, Default)]
pub struct PosterView {
    stage: Option<Stage>,
}

impl PosterView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    /// Start a new render, destroying the current stage once the request
    /// is known to be renderable
    pub fn begin<'a>(
        &mut self,
        data: &'a CategorizedMapData,
        theme: &'a Theme,
        request: &'a PosterRequest,
        options: &RenderOptions,
        observer: Option<ProgressObserver<'a>>,
    ) -> Result<RenderJob<'a>, RenderError> {
        Viewport::new(request.center, request.radius_m, options.width, options.height).fit()?;
        self.clear();
        generate_poster(data, theme, request, options, observer)
    }

    /// Take ownership of a finished (or failed) job's stage
    pub fn install(&mut self, stage: Stage) {
        self.clear();
        self.stage = Some(stage);
    }

    /// Render to completion and keep the result. Returns the error that
    /// stopped the job; the partial stage is kept either way.
    pub fn render(
        &mut self,
        data: &CategorizedMapData,
        theme: &Theme,
        request: &PosterRequest,
        options: &RenderOptions,
    ) -> Result<Option<RenderError>, RenderError> {
        let (stage, error) = self.begin(data, theme, request, options, None)?.run();
        self.install(stage);
        Ok(error)
    }

    pub fn export(&self, ratio: PixelRatio) -> Result<Vec<u8>, StageError> {
        self.stage
            .as_ref()
            .ok_or(StageError::Destroyed)?
            .export_raster(ratio)
    }

    pub fn clear(&mut self) {
        if let Some(mut stage) = self.stage.take() {
            debug!("releasing previous poster stage");
            stage.destroy();
        }
    }
}

impl Drop for PosterView {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Way;
    use crate::geo::LatLon;
    use crate::stage::{FontSource, LayerKind};

    fn options() -> RenderOptions {
        RenderOptions {
            width: 120,
            height: 160,
            fonts: FontSource::None,
            ..Default::default()
        }
    }

    fn request() -> PosterRequest {
        PosterRequest {
            city: "Lyon".into(),
            country: "France".into(),
            center: LatLon::new(45.764, 4.8357),
            radius_m: 2_000.0,
        }
    }

    fn data() -> CategorizedMapData {
        CategorizedMapData {
            roads: vec![Way {
                id: 1,
                geometry: vec![
                    Some(LatLon::new(45.76, 4.83)),
                    Some(LatLon::new(45.77, 4.84)),
                ],
                tags: [("highway".to_string(), "primary".to_string())].into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename("Paris", "noir", PixelRatio::Uhd),
            "Paris_noir_4K.png"
        );
        assert_eq!(
            export_filename("Lyon", "feature_based", PixelRatio::Hd),
            "Lyon_feature_based_HD.png"
        );
    }

    #[test]
    fn test_generate_returns_stage_with_background() {
        let (data, theme, req) = (data(), Theme::feature_based(), request());
        let job = generate_poster(&data, &theme, &req, &options(), None).unwrap();
        assert_eq!(job.stage().items(LayerKind::Background).unwrap().len(), 1);
    }

    #[test]
    fn test_view_render_and_export() {
        let (data, theme, req) = (data(), Theme::feature_based(), request());
        let mut view = PosterView::new();
        assert!(matches!(
            view.export(PixelRatio::Hd),
            Err(StageError::Destroyed)
        ));

        let error = view.render(&data, &theme, &req, &options()).unwrap();
        assert!(error.is_none());
        let png = view.export(PixelRatio::Qhd).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(view.stage().unwrap().width(), 120);
    }

    #[test]
    fn test_new_render_releases_previous_stage() {
        let (data, theme, req) = (data(), Theme::feature_based(), request());
        let mut view = PosterView::new();
        view.render(&data, &theme, &req, &options()).unwrap();
        assert!(view.stage().is_some());

        let job = view.begin(&data, &theme, &req, &options(), None).unwrap();
        assert!(view.stage().is_none());
        let (stage, _) = job.run();
        view.install(stage);
        assert!(!view.stage().unwrap().is_destroyed());
    }

    #[test]
    fn test_degenerate_request_keeps_current_poster() {
        let (data, theme, req) = (data(), Theme::feature_based(), request());
        let mut view = PosterView::new();
        view.render(&data, &theme, &req, &options()).unwrap();

        let mut bad = request();
        bad.radius_m = 0.0;
        assert!(matches!(
            view.begin(&data, &theme, &bad, &options(), None),
            Err(RenderError::Viewport(_))
        ));
        let stage = view.stage().unwrap();
        assert!(!stage.is_destroyed());
        assert_eq!(stage.items(LayerKind::Roads).unwrap().len(), 1);
    }

    #[test]
    fn test_degenerate_request_leaves_view_empty() {
        let (data, theme) = (data(), Theme::feature_based());
        let mut req = request();
        req.radius_m = -1.0;
        let mut view = PosterView::new();
        assert!(matches!(
            view.render(&data, &theme, &req, &options()),
            Err(RenderError::Viewport(_))
        ));
        assert!(view.stage().is_none());
    }
}
