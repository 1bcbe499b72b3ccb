//! Glyph outlines for poster labels.
//!
//! Faces are picked once through `fontdb` and kept as raw bytes; every label
//! is shaped by walking `ttf-parser` advances (no kerning or ligatures) and
//! converting glyph outlines into a tiny-skia path.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tiny_skia::{Path, PathBuilder};
use tracing::{debug, warn};

/// Where label fonts come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSource {
    /// Installed system fonts, preferring Roboto then any sans-serif
    #[default]
    System,
    /// No fonts: text items are kept but paint nothing
    None,
    /// Explicit font files
    Files(Vec<PathBuf>),
}

struct FaceData {
    data: Vec<u8>,
    index: u32,
}

/// A laid-out label with its top-left corner at the origin
pub struct TextOutline {
    /// `None` when the text has no visible glyphs
    pub path: Option<Path>,
    pub width: f32,
}

/// Regular and bold faces used for poster labels
#[derive(Default)]
pub struct FontBook {
    regular: Option<FaceData>,
    bold: Option<FaceData>,
}

const PREFERRED_FAMILY: &str = "Roboto";

impl FontBook {
    pub fn empty() -> Self {
        Self::default()
    }

    /// System fonts are scanned once per process
    pub fn system() -> Arc<FontBook> {
        static SYSTEM: OnceLock<Arc<FontBook>> = OnceLock::new();
        SYSTEM
            .get_or_init(|| {
                let mut db = fontdb::Database::new();
                db.load_system_fonts();
                Arc::new(Self::from_database(&db))
            })
            .clone()
    }

    pub fn load(source: &FontSource) -> Arc<FontBook> {
        match source {
            FontSource::System => Self::system(),
            FontSource::None => Arc::new(Self::empty()),
            FontSource::Files(paths) => {
                let mut db = fontdb::Database::new();
                for path in paths {
                    if let Err(e) = db.load_font_file(path) {
                        warn!(path = %path.display(), error = %e, "failed to load font");
                    }
                }
                Arc::new(Self::from_database(&db))
            }
        }
    }

    fn from_database(db: &fontdb::Database) -> Self {
        let book = Self {
            regular: pick_face(db, fontdb::Weight::NORMAL),
            bold: pick_face(db, fontdb::Weight::BOLD),
        };
        if book.regular.is_none() {
            warn!("no usable font found, poster labels will not be painted");
        }
        book
    }

    pub fn has_glyphs(&self) -> bool {
        self.regular.is_some()
    }

    /// Lay out `text` at `size` px. Falls back to the regular face for bold.
    pub fn layout(&self, text: &str, size: f32, bold: bool) -> Option<TextOutline> {
        let face = if bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref()
        }?;
        let face = ttf_parser::Face::parse(&face.data, face.index).ok()?;

        let scale = size / face.units_per_em() as f32;
        let mut sink = OutlineSink {
            builder: PathBuilder::new(),
            scale,
            x: 0.0,
            baseline: face.ascender() as f32 * scale,
        };

        let mut pen = 0.0;
        for ch in text.chars() {
            let Some(glyph) = face.glyph_index(ch) else {
                pen += size * 0.3;
                continue;
            };
            sink.x = pen;
            let _ = face.outline_glyph(glyph, &mut sink);
            pen += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
        }

        Some(TextOutline {
            path: sink.builder.finish(),
            width: pen,
        })
    }
}

fn pick_face(db: &fontdb::Database, weight: fontdb::Weight) -> Option<FaceData> {
    let families = [
        fontdb::Family::Name(PREFERRED_FAMILY),
        fontdb::Family::SansSerif,
    ];
    let query = fontdb::Query {
        families: &families,
        weight,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db
        .query(&query)
        .or_else(|| db.faces().next().map(|f| f.id))?;
    let face = db.with_face_data(id, |data, index| FaceData {
        data: data.to_vec(),
        index,
    });
    if face.is_some() {
        debug!(?weight, "selected label font");
    }
    face
}

/// Glyph units (y up, origin on baseline) to label pixels (y down)
struct OutlineSink {
    builder: PathBuilder,
    scale: f32,
    x: f32,
    baseline: f32,
}

impl OutlineSink {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for OutlineSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_book_lays_out_nothing() {
        let book = FontBook::empty();
        assert!(!book.has_glyphs());
        assert!(book.layout("PARIS", 60.0, true).is_none());
    }

    #[test]
    fn test_font_source_from_json() {
        let src: FontSource = serde_json::from_str(r#""none""#).unwrap();
        assert_eq!(src, FontSource::None);
        let src: FontSource = serde_json::from_str(r#"{"files": ["a.ttf"]}"#).unwrap();
        assert_eq!(src, FontSource::Files(vec![PathBuf::from("a.ttf")]));
    }

    #[test]
    fn test_missing_font_files_give_empty_book() {
        let book = FontBook::load(&FontSource::Files(vec![PathBuf::from(
            "/nonexistent/font.ttf",
        )]));
        assert!(!book.has_glyphs());
    }
}
