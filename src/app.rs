use city_poster::{
    CategorizedMapData, PosterRequest, PosterView, RenderError, RenderJob, RenderOptions,
    RenderProgress, Stage, Theme,
};
use tracing::info;

/// Terminal host state. Borrows its inputs for as long as renders run.
pub struct App<'a> {
    pub data: &'a CategorizedMapData,
    pub theme: &'a Theme,
    pub request: &'a PosterRequest,
    options: &'a RenderOptions,
    /// Holds the finished stage once a job is done
    pub view: PosterView,
    job: Option<RenderJob<'a>>,
    /// Every progress event of the current render, oldest first
    pub history: Vec<RenderProgress>,
    /// Why the last render stopped early
    pub failure: Option<String>,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(
        data: &'a CategorizedMapData,
        theme: &'a Theme,
        request: &'a PosterRequest,
        options: &'a RenderOptions,
    ) -> Self {
        Self {
            data,
            theme,
            request,
            options,
            view: PosterView::new(),
            job: None,
            history: Vec::new(),
            failure: None,
            should_quit: false,
        }
    }

    /// Start (or restart) the render. Any previous stage is released first.
    pub fn start(&mut self) -> Result<(), RenderError> {
        self.job = None;
        self.history.clear();
        self.failure = None;
        let job = self
            .view
            .begin(self.data, self.theme, self.request, self.options, None)?;
        self.job = Some(job);
        Ok(())
    }

    /// Advance the running job by one chunk
    pub fn tick(&mut self) {
        let Some(job) = self.job.as_mut() else {
            return;
        };
        if let Some(progress) = job.step() {
            self.history.push(progress);
        }
        if job.is_finished() {
            if let Some(job) = self.job.take() {
                let (stage, error) = job.into_parts();
                self.failure = error.map(|e| e.to_string());
                info!(failed = self.failure.is_some(), "render job finished");
                self.view.install(stage);
            }
        }
    }

    pub fn is_rendering(&self) -> bool {
        self.job.is_some()
    }

    /// `q` cancels a running job, otherwise quits
    pub fn cancel_or_quit(&mut self) {
        match self.job.as_mut() {
            Some(job) => job.cancel(),
            None => self.should_quit = true,
        }
    }

    /// The stage being drawn, or the last finished one
    pub fn stage(&self) -> Option<&Stage> {
        match &self.job {
            Some(job) => Some(job.stage()),
            None => self.view.stage(),
        }
    }

    pub fn latest(&self) -> Option<&RenderProgress> {
        self.history.last()
    }

    pub fn percent(&self) -> u8 {
        self.latest().map_or(0, |p| p.percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use city_poster::{FontSource, LatLon, Way};

    fn fixtures() -> (CategorizedMapData, Theme, PosterRequest, RenderOptions) {
        let data = CategorizedMapData {
            roads: (0..5)
                .map(|i| Way {
                    id: i,
                    geometry: vec![
                        Some(LatLon::new(52.37, 4.89 + i as f64 * 0.001)),
                        Some(LatLon::new(52.38, 4.90)),
                    ],
                    tags: [("highway".to_string(), "tertiary".to_string())].into(),
                })
                .collect(),
            ..Default::default()
        };
        let request = PosterRequest {
            city: "Amsterdam".into(),
            country: "Netherlands".into(),
            center: LatLon::new(52.3676, 4.9041),
            radius_m: 3_000.0,
        };
        let options = RenderOptions {
            width: 90,
            height: 120,
            road_chunk: 2,
            fonts: FontSource::None,
            ..Default::default()
        };
        (data, Theme::noir(), request, options)
    }

    #[test]
    fn test_ticks_until_stage_installed() {
        let (data, theme, request, options) = fixtures();
        let mut app = App::new(&data, &theme, &request, &options);
        app.start().unwrap();
        assert!(app.is_rendering());
        assert!(app.stage().is_some());

        for _ in 0..100 {
            app.tick();
        }
        assert!(!app.is_rendering());
        assert_eq!(app.percent(), 100);
        assert!(app.failure.is_none());
        assert!(app.view.stage().is_some());
        // three road chunks of two
        assert_eq!(app.history.iter().filter(|p| p.stage == "Roads").count(), 3);
    }

    #[test]
    fn test_quit_key_cancels_then_quits() {
        let (data, theme, request, options) = fixtures();
        let mut app = App::new(&data, &theme, &request, &options);
        app.start().unwrap();
        app.tick();
        app.cancel_or_quit();
        assert!(!app.should_quit);
        app.tick();
        assert!(!app.is_rendering());
        assert_eq!(app.latest(), Some(&RenderProgress::ERROR));
        assert!(app.failure.is_some());

        app.cancel_or_quit();
        assert!(app.should_quit);
    }
}
