//! The render surface a poster is drawn on.
//!
//! A [`Stage`] keeps every committed item in an ordered list of layers and
//! paints each item onto a 1x backing pixmap as it arrives, so a partially
//! rendered stage is always viewable. Exports at higher pixel ratios replay
//! the retained layers onto a larger pixmap.

mod paint;
mod text;

pub use paint::{parse_color, with_opacity};
pub use text::{FontBook, FontSource, TextOutline};

use glam::Vec2;
use std::sync::Arc;
use tiny_skia::{Color, Pixmap, Transform};
use tracing::debug;

use crate::error::StageError;
use crate::map::PathBatch;

/// Which part of the poster a layer holds. Also the fixed draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    Background,
    WaterAreas,
    Parks,
    Waterways,
    Roads,
    Overlay,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Color),
    /// Top-to-bottom linear gradient across the rect
    VerticalGradient { top: Color, bottom: Color },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    /// Closed rings, filled
    Fill,
    /// Open polylines, stroked with the batch width
    Stroke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// `position.x` is the horizontal center
    Center,
    /// `position.x` is the right edge
    Right,
}

/// A single line of poster text
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    /// Anchor point; `y` is the top of the line box
    pub position: Vec2,
    pub size: f32,
    pub bold: bool,
    pub anchor: Anchor,
    pub color: Color,
}

/// Retained drawing command
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Fill,
    },
    Paths {
        batch: PathBatch,
        color: Color,
        mode: PaintMode,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
    Text(TextItem),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub items: Vec<Drawable>,
}

/// Export resolution multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelRatio {
    #[default]
    Hd = 1,
    Qhd = 2,
    Uhd = 3,
}

impl PixelRatio {
    pub fn factor(self) -> u32 {
        self as u32
    }

    /// Label used in export file names
    pub fn label(self) -> &'static str {
        match self {
            PixelRatio::Hd => "HD",
            PixelRatio::Qhd => "QHD",
            PixelRatio::Uhd => "4K",
        }
    }

    pub fn from_factor(factor: u32) -> Option<Self> {
        match factor {
            1 => Some(PixelRatio::Hd),
            2 => Some(PixelRatio::Qhd),
            3 => Some(PixelRatio::Uhd),
            _ => None,
        }
    }
}

/// Owned render surface for one poster
pub struct Stage {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    /// `None` once destroyed
    surface: Option<Pixmap>,
    fonts: Arc<FontBook>,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &self.layers.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Create a stage whose labels use the installed system fonts
pub fn create_stage(width: u32, height: u32) -> Result<Stage, StageError> {
    Stage::new(width, height, FontBook::system())
}

impl Stage {
    pub fn new(width: u32, height: u32, fonts: Arc<FontBook>) -> Result<Self, StageError> {
        let surface = Pixmap::new(width, height).ok_or(StageError::InvalidSize { width, height })?;
        Ok(Self {
            width,
            height,
            layers: Vec::new(),
            surface: Some(surface),
            fonts,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_destroyed(&self) -> bool {
        self.surface.is_none()
    }

    /// Commit an item on top of everything drawn so far
    pub fn draw(&mut self, kind: LayerKind, item: Drawable) -> Result<(), StageError> {
        let surface = self.surface.as_mut().ok_or(StageError::Destroyed)?;
        paint::paint(surface, &item, Transform::identity(), &self.fonts);

        match self.layers.last_mut() {
            Some(layer) if layer.kind == kind => layer.items.push(item),
            _ => self.layers.push(Layer {
                kind,
                items: vec![item],
            }),
        }
        Ok(())
    }

    pub fn layers(&self) -> Result<&[Layer], StageError> {
        self.ensure_live()?;
        Ok(&self.layers)
    }

    /// Items of every layer of `kind`, in draw order
    pub fn items(&self, kind: LayerKind) -> Result<Vec<&Drawable>, StageError> {
        Ok(self
            .layers()?
            .iter()
            .filter(|l| l.kind == kind)
            .flat_map(|l| l.items.iter())
            .collect())
    }

    /// The 1x surface as painted so far
    pub fn surface(&self) -> Result<&Pixmap, StageError> {
        self.surface.as_ref().ok_or(StageError::Destroyed)
    }

    /// Replay all layers at `factor`x into a new pixmap
    pub fn rasterize(&self, factor: u32) -> Result<Pixmap, StageError> {
        self.ensure_live()?;
        let factor = factor.max(1);
        let (width, height) = (self.width * factor, self.height * factor);
        let mut pixmap =
            Pixmap::new(width, height).ok_or(StageError::InvalidSize { width, height })?;
        let ts = Transform::from_scale(factor as f32, factor as f32);
        for item in self.layers.iter().flat_map(|l| l.items.iter()) {
            paint::paint(&mut pixmap, item, ts, &self.fonts);
        }
        Ok(pixmap)
    }

    /// Encode the stage as PNG at `ratio` times its size
    pub fn export_raster(&self, ratio: PixelRatio) -> Result<Vec<u8>, StageError> {
        let pixmap = match ratio {
            PixelRatio::Hd => self.surface()?.clone(),
            _ => self.rasterize(ratio.factor())?,
        };
        debug!(
            width = pixmap.width(),
            height = pixmap.height(),
            "encoding poster png"
        );
        pixmap
            .encode_png()
            .map_err(|e| StageError::Encode(e.to_string()))
    }

    /// Release every retained batch and the backing surface. Safe to repeat.
    pub fn destroy(&mut self) {
        if self.surface.take().is_some() {
            let items: usize = self.layers.iter().map(|l| l.items.len()).sum();
            debug!(layers = self.layers.len(), items, "stage destroyed");
        }
        self.layers = Vec::new();
    }

    fn ensure_live(&self) -> Result<(), StageError> {
        if self.is_destroyed() {
            Err(StageError::Destroyed)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::StyleKey;

    fn stage() -> Stage {
        Stage::new(40, 30, Arc::new(FontBook::empty())).unwrap()
    }

    fn background(color: &str) -> Drawable {
        Drawable::Rect {
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 30.0,
            fill: Fill::Solid(parse_color(color).unwrap()),
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            Stage::new(0, 10, Arc::new(FontBook::empty())),
            Err(StageError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_draw_paints_surface_immediately() {
        let mut s = stage();
        s.draw(LayerKind::Background, background("#FF0000")).unwrap();
        let px = s.surface().unwrap().pixel(5, 5).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 0, 0, 255));
    }

    #[test]
    fn test_consecutive_items_share_a_layer() {
        let mut s = stage();
        let key = StyleKey::new("#000", 1.0, 0);
        let batch = |x: f32| Drawable::Paths {
            batch: PathBatch {
                key: key.clone(),
                paths: vec![vec![Vec2::new(x, 0.0), Vec2::new(x, 30.0)]],
            },
            color: Color::BLACK,
            mode: PaintMode::Stroke,
        };
        s.draw(LayerKind::Background, background("#fff")).unwrap();
        s.draw(LayerKind::Roads, batch(5.0)).unwrap();
        s.draw(LayerKind::Roads, batch(10.0)).unwrap();

        let kinds: Vec<_> = s.layers().unwrap().iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LayerKind::Background, LayerKind::Roads]);
        assert_eq!(s.items(LayerKind::Roads).unwrap().len(), 2);
    }

    #[test]
    fn test_stroke_batch_marks_pixels() {
        let mut s = stage();
        s.draw(LayerKind::Background, background("#FFFFFF")).unwrap();
        s.draw(
            LayerKind::Roads,
            Drawable::Paths {
                batch: PathBatch {
                    key: StyleKey::new("#000000", 3.0, 4),
                    paths: vec![vec![Vec2::new(0.0, 15.0), Vec2::new(40.0, 15.0)]],
                },
                color: Color::BLACK,
                mode: PaintMode::Stroke,
            },
        )
        .unwrap();
        let px = s.surface().unwrap().pixel(20, 15).unwrap();
        assert!(px.red() < 64, "expected a dark road pixel, got {}", px.red());
        let untouched = s.surface().unwrap().pixel(20, 2).unwrap();
        assert_eq!(untouched.red(), 255);
    }

    #[test]
    fn test_export_scales_with_ratio() {
        let mut s = stage();
        s.draw(LayerKind::Background, background("#336699")).unwrap();
        assert_eq!(s.rasterize(3).unwrap().width(), 120);
        assert_eq!(s.rasterize(3).unwrap().height(), 90);

        let png = s.export_raster(PixelRatio::Qhd).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_destroy_is_idempotent_and_fails_fast_after() {
        let mut s = stage();
        s.draw(LayerKind::Background, background("#000")).unwrap();
        s.destroy();
        s.destroy();
        assert!(s.is_destroyed());
        assert!(matches!(s.layers(), Err(StageError::Destroyed)));
        assert!(matches!(
            s.export_raster(PixelRatio::Hd),
            Err(StageError::Destroyed)
        ));
        assert!(matches!(
            s.draw(LayerKind::Background, background("#000")),
            Err(StageError::Destroyed)
        ));
    }

    #[test]
    fn test_pixel_ratio_labels() {
        assert_eq!(PixelRatio::from_factor(2), Some(PixelRatio::Qhd));
        assert_eq!(PixelRatio::from_factor(4), None);
        assert_eq!(PixelRatio::Uhd.label(), "4K");
        assert_eq!(PixelRatio::Uhd.factor(), 3);
    }
}
