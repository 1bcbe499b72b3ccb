//! Poster compositor.
//!
//! A [`RenderJob`] is a resumable state machine. [`RenderJob::start`] paints
//! the background synchronously, after which each call to
//! [`RenderJob::step`] processes one bounded chunk of elements and reports
//! progress. The host decides when to call it again, so a UI loop can keep
//! handling input between chunks.
//!
//! Layer order is fixed: water areas, parks, waterways, roads, fades, text.
//! Paths are collected per layer over all of its chunks, so batch z-order
//! holds across chunk boundaries. The collected batches are then painted one
//! per step.

use std::collections::VecDeque;
use std::ops::Range;
use tracing::{debug, info, warn};

use crate::config::RenderOptions;
use crate::data::{CategorizedMapData, ColorSlot, GeoElement, Theme, Way};
use crate::error::RenderError;
use crate::geo::LatLon;
use crate::map::labels;
use crate::map::paths::{build_paths, project_ring, BatchBuilder, PathBatch};
use crate::map::projection::{Viewport, ViewportTransform};
use crate::map::style::{road_rule, waterway_rule, StyleKey};
use crate::stage::{parse_color, Drawable, Fill, FontBook, LayerKind, PaintMode, Stage};

/// What a poster shows: place names and the area around a point
#[derive(Debug, Clone, PartialEq)]
pub struct PosterRequest {
    pub city: String,
    pub country: String,
    pub center: LatLon,
    /// Horizontal half-extent in meters
    pub radius_m: f64,
}

/// Progress event: stage label and overall percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    pub stage: &'static str,
    pub percent: u8,
}

impl RenderProgress {
    pub const DONE: RenderProgress = RenderProgress {
        stage: "Done",
        percent: 100,
    };
    pub const ERROR: RenderProgress = RenderProgress {
        stage: "Error",
        percent: 0,
    };

    pub fn is_terminal(&self) -> bool {
        *self == Self::DONE || *self == Self::ERROR
    }
}

pub type ProgressObserver<'a> = Box<dyn FnMut(&RenderProgress) + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    BackgroundDrawn,
    DrawingWaterAreas,
    DrawingParks,
    DrawingWaterways,
    DrawingRoads,
    Finalizing,
    Done,
    Error,
}

impl RenderPhase {
    pub fn label(self) -> &'static str {
        match self {
            RenderPhase::Idle => "Idle",
            RenderPhase::BackgroundDrawn => "Background",
            RenderPhase::DrawingWaterAreas => "Water areas",
            RenderPhase::DrawingParks => "Parks",
            RenderPhase::DrawingWaterways => "Waterways",
            RenderPhase::DrawingRoads => "Roads",
            RenderPhase::Finalizing => "Finalizing",
            RenderPhase::Done => "Done",
            RenderPhase::Error => "Error",
        }
    }

    /// Share of the overall percentage this phase covers
    fn allocation(self) -> (f32, f32) {
        match self {
            RenderPhase::Idle | RenderPhase::BackgroundDrawn => (0.0, 0.0),
            RenderPhase::DrawingWaterAreas => (0.0, 15.0),
            RenderPhase::DrawingParks => (15.0, 30.0),
            RenderPhase::DrawingWaterways => (30.0, 45.0),
            RenderPhase::DrawingRoads => (45.0, 90.0),
            RenderPhase::Finalizing => (90.0, 100.0),
            RenderPhase::Done => (100.0, 100.0),
            RenderPhase::Error => (0.0, 0.0),
        }
    }

    /// Progress `fraction` (0..=1) of the way through this phase's share
    fn progress_at(self, fraction: f32) -> RenderProgress {
        let (start, end) = self.allocation();
        RenderProgress {
            stage: self.label(),
            percent: (start + (end - start) * fraction).round() as u8,
        }
    }
}

/// Batches of a fully collected layer, waiting to be painted
struct PendingLayer {
    batches: VecDeque<PathBatch>,
    total: usize,
    layer: LayerKind,
    mode: PaintMode,
    next: RenderPhase,
}

/// One poster render in progress. Owns its [`Stage`] until handed back.
pub struct RenderJob<'a> {
    data: &'a CategorizedMapData,
    theme: &'a Theme,
    request: &'a PosterRequest,
    options: RenderOptions,
    transform: ViewportTransform,
    stage: Stage,
    phase: RenderPhase,
    cursor: usize,
    batches: BatchBuilder,
    pending: Option<PendingLayer>,
    observer: Option<ProgressObserver<'a>>,
    last_percent: u8,
    error: Option<RenderError>,
    cancel_requested: bool,
}

impl<'a> RenderJob<'a> {
    /// Validate the viewport, create the stage and paint the background.
    ///
    /// A degenerate viewport is rejected here, before a stage exists. Any
    /// later failure, the background included, is reported through the
    /// progress channel and leaves the job in `Error`.
    pub fn start(
        data: &'a CategorizedMapData,
        theme: &'a Theme,
        request: &'a PosterRequest,
        options: &RenderOptions,
        observer: Option<ProgressObserver<'a>>,
    ) -> Result<Self, RenderError> {
        let viewport = Viewport::new(request.center, request.radius_m, options.width, options.height);
        let transform = viewport.fit()?;
        let stage = Stage::new(options.width, options.height, FontBook::load(&options.fonts))?;

        info!(
            city = %request.city,
            theme = %theme.name,
            radius_m = request.radius_m,
            elements = data.len(),
            "starting poster render"
        );

        let mut job = Self {
            data,
            theme,
            request,
            options: options.clone(),
            transform,
            stage,
            phase: RenderPhase::Idle,
            cursor: 0,
            batches: BatchBuilder::new(),
            pending: None,
            observer,
            last_percent: 0,
            error: None,
            cancel_requested: false,
        };
        if let Err(error) = job.draw_background() {
            job.fail(error);
        }
        Ok(job)
    }

    /// The stage as drawn so far
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, RenderPhase::Done | RenderPhase::Error)
    }

    pub fn error(&self) -> Option<&RenderError> {
        self.error.as_ref()
    }

    /// Stop at the next chunk boundary. Layers already committed stay.
    pub fn cancel(&mut self) {
        self.cancel_requested = true;
    }

    /// Run one chunk: either a slice of a layer's elements or one batch of
    /// a finished layer. Returns the progress it produced, or `None` once
    /// the job has reached `Done` or `Error`.
    pub fn step(&mut self) -> Option<RenderProgress> {
        let outcome = match self.phase {
            RenderPhase::Done | RenderPhase::Error => return None,
            _ if self.cancel_requested => Err(RenderError::Cancelled),
            _ if self.pending.is_some() => self.paint_next_batch(),
            RenderPhase::Idle | RenderPhase::BackgroundDrawn => {
                self.enter(RenderPhase::DrawingWaterAreas);
                self.water_chunk()
            }
            RenderPhase::DrawingWaterAreas => self.water_chunk(),
            RenderPhase::DrawingParks => {
                let data = self.data;
                self.polygon_chunk(&data.parks, ColorSlot::Parks, LayerKind::Parks, RenderPhase::DrawingWaterways)
            }
            RenderPhase::DrawingWaterways => {
                let scale = self.options.scale();
                let theme = self.theme;
                let chunk = self.options.waterway_chunk;
                let data = self.data;
                self.line_chunk(
                    &data.waterways,
                    chunk,
                    |w| waterway_rule(w.tag("waterway")).key(theme, scale),
                    LayerKind::Waterways,
                    RenderPhase::DrawingRoads,
                )
            }
            RenderPhase::DrawingRoads => {
                let scale = self.options.scale();
                let theme = self.theme;
                let chunk = self.options.road_chunk;
                let data = self.data;
                self.line_chunk(
                    &data.roads,
                    chunk,
                    |w| road_rule(w.tag("highway")).key(theme, scale),
                    LayerKind::Roads,
                    RenderPhase::Finalizing,
                )
            }
            RenderPhase::Finalizing => self.finalize(),
        };
        Some(match outcome {
            Ok(progress) => self.emit(progress),
            Err(e) => self.fail(e),
        })
    }

    /// Step until finished
    pub fn run(mut self) -> (Stage, Option<RenderError>) {
        while self.step().is_some() {}
        self.into_parts()
    }

    /// Hand the stage back, with the error that stopped the job if any
    pub fn into_parts(self) -> (Stage, Option<RenderError>) {
        (self.stage, self.error)
    }

    fn draw_background(&mut self) -> Result<(), RenderError> {
        let fill = Fill::Solid(parse_color(&self.theme.bg)?);
        self.stage.draw(
            LayerKind::Background,
            Drawable::Rect {
                x: 0.0,
                y: 0.0,
                width: self.stage.width() as f32,
                height: self.stage.height() as f32,
                fill,
            },
        )?;
        self.phase = RenderPhase::BackgroundDrawn;
        Ok(())
    }

    fn enter(&mut self, phase: RenderPhase) {
        debug!(phase = phase.label(), "entering render phase");
        self.phase = phase;
        self.cursor = 0;
    }

    fn next_range(&self, len: usize, chunk: usize) -> Range<usize> {
        let start = self.cursor.min(len);
        start..(start + chunk.max(1)).min(len)
    }

    fn water_chunk(&mut self) -> Result<RenderProgress, RenderError> {
        let data = self.data;
        self.polygon_chunk(&data.water_areas, ColorSlot::Water, LayerKind::WaterAreas, RenderPhase::DrawingParks)
    }

    /// One chunk of a filled layer (water areas, parks)
    fn polygon_chunk(
        &mut self,
        elements: &'a [GeoElement],
        slot: ColorSlot,
        layer: LayerKind,
        next: RenderPhase,
    ) -> Result<RenderProgress, RenderError> {
        let range = self.next_range(elements.len(), self.options.polygon_chunk);
        let key = StyleKey::new(self.theme.color(slot), 0.0, 0);
        let paths = build_paths(&elements[range.clone()], &self.transform, GeoElement::rings);
        self.batches.extend(&key, paths);
        self.finish_chunk(range, elements.len(), layer, PaintMode::Fill, next)
    }

    /// One chunk of a stroked layer (waterways, roads)
    fn line_chunk<F>(
        &mut self,
        ways: &'a [Way],
        chunk: usize,
        style: F,
        layer: LayerKind,
        next: RenderPhase,
    ) -> Result<RenderProgress, RenderError>
    where
        F: Fn(&Way) -> StyleKey,
    {
        let range = self.next_range(ways.len(), chunk);
        for way in &ways[range.clone()] {
            if let Some(path) = project_ring(&way.geometry, &self.transform) {
                self.batches.push(&style(way), path);
            }
        }
        self.finish_chunk(range, ways.len(), layer, PaintMode::Stroke, next)
    }

    /// Collecting covers the first half of a layer's progress share. Once
    /// the last chunk is in, the layer's batches are queued lowest z-layer
    /// first and the first one is painted right away.
    fn finish_chunk(
        &mut self,
        range: Range<usize>,
        total: usize,
        layer: LayerKind,
        mode: PaintMode,
        next: RenderPhase,
    ) -> Result<RenderProgress, RenderError> {
        self.cursor = range.end;
        if range.end < total {
            let collected = range.end as f32 / total as f32;
            return Ok(self.phase.progress_at(0.5 * collected));
        }

        let batches = self.batches.finish(self.options.max_batch_paths);
        debug!(layer = ?layer, batches = batches.len(), "layer collected");
        self.pending = Some(PendingLayer {
            total: batches.len(),
            batches: batches.into(),
            layer,
            mode,
            next,
        });
        self.paint_next_batch()
    }

    /// Paint one queued batch; the layer is done when the queue empties
    fn paint_next_batch(&mut self) -> Result<RenderProgress, RenderError> {
        let phase = self.phase;
        let Some(pending) = self.pending.as_mut() else {
            return Ok(phase.progress_at(1.0));
        };
        if let Some(batch) = pending.batches.pop_front() {
            let color = parse_color(&batch.key.color)?;
            self.stage.draw(
                pending.layer,
                Drawable::Paths {
                    batch,
                    color,
                    mode: pending.mode,
                },
            )?;
        }

        let remaining = pending.batches.len();
        let fraction = if pending.total == 0 {
            1.0
        } else {
            0.5 + 0.5 * (pending.total - remaining) as f32 / pending.total as f32
        };
        if remaining == 0 {
            let next = pending.next;
            self.pending = None;
            self.enter(next);
        }
        Ok(phase.progress_at(fraction))
    }

    /// Two steps: fades, then the text block
    fn finalize(&mut self) -> Result<RenderProgress, RenderError> {
        let width = self.stage.width() as f32;
        let height = self.stage.height() as f32;

        if self.cursor == 0 {
            let gradient = parse_color(&self.theme.gradient_color)?;
            for fade in labels::fades(width, height, gradient) {
                self.stage.draw(LayerKind::Overlay, fade)?;
            }
            self.cursor = 1;
            return Ok(RenderPhase::Finalizing.progress_at(0.5));
        }

        let text = parse_color(&self.theme.text)?;
        let items = labels::typography(
            width,
            height,
            self.options.scale(),
            &self.request.city,
            &self.request.country,
            self.request.center,
            text,
        );
        for item in items {
            self.stage.draw(LayerKind::Text, item)?;
        }
        self.enter(RenderPhase::Done);
        info!(city = %self.request.city, "poster render finished");
        Ok(RenderProgress::DONE)
    }

    fn emit(&mut self, mut progress: RenderProgress) -> RenderProgress {
        progress.percent = progress.percent.max(self.last_percent);
        self.last_percent = progress.percent;
        if let Some(observer) = self.observer.as_mut() {
            observer(&progress);
        }
        progress
    }

    fn fail(&mut self, error: RenderError) -> RenderProgress {
        warn!(phase = self.phase.label(), %error, "poster render stopped");
        self.phase = RenderPhase::Error;
        self.error = Some(error);
        let progress = RenderProgress::ERROR;
        if let Some(observer) = self.observer.as_mut() {
            observer(&progress);
        }
        progress
    }
}

/// Progress events, one per chunk, ending with `Done` or `Error`
impl Iterator for RenderJob<'_> {
    type Item = RenderProgress;

    fn next(&mut self) -> Option<RenderProgress> {
        self.step()
    }
}
