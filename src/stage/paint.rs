use glam::Vec2;
use tiny_skia::{
    Color, FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Paint, Path, PathBuilder,
    Pixmap, Point, Rect, SpreadMode, Stroke, Transform,
};

use super::text::FontBook;
use super::{Anchor, Drawable, Fill, PaintMode};
use crate::error::StageError;
use crate::map::PathBatch;

/// Parse a CSS color string (`#rgb`, `#rrggbb`, `rgba(..)`, named colors...)
pub fn parse_color(value: &str) -> Result<Color, StageError> {
    let parsed = csscolorparser::parse(value).map_err(|e| StageError::Color {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    let [r, g, b, a] = parsed.to_array();
    Color::from_rgba(r as f32, g as f32, b as f32, a as f32).ok_or_else(|| StageError::Color {
        value: value.to_string(),
        reason: "component out of range".to_string(),
    })
}

pub fn with_opacity(mut color: Color, opacity: f32) -> Color {
    color.set_alpha((color.alpha() * opacity).clamp(0.0, 1.0));
    color
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

/// All paths of a batch as subpaths of one tiny-skia path
fn batch_path(batch: &PathBatch, close: bool) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for path in &batch.paths {
        let mut points = path.iter();
        let Some(first) = points.next() else {
            continue;
        };
        pb.move_to(first.x, first.y);
        for p in points {
            pb.line_to(p.x, p.y);
        }
        if close {
            pb.close();
        }
    }
    pb.finish()
}

fn segment(from: Vec2, to: Vec2) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(from.x, from.y);
    pb.line_to(to.x, to.y);
    pb.finish()
}

/// Paint one retained item. `ts` maps stage pixels to surface pixels.
pub(crate) fn paint(pixmap: &mut Pixmap, item: &Drawable, ts: Transform, fonts: &FontBook) {
    match item {
        Drawable::Rect {
            x,
            y,
            width,
            height,
            fill,
        } => {
            let Some(r) = Rect::from_xywh(*x, *y, *width, *height) else {
                return;
            };
            let paint = match *fill {
                Fill::Solid(color) => solid(color),
                Fill::VerticalGradient { top, bottom } => {
                    let Some(shader) = LinearGradient::new(
                        Point::from_xy(0.0, *y),
                        Point::from_xy(0.0, *y + *height),
                        vec![GradientStop::new(0.0, top), GradientStop::new(1.0, bottom)],
                        SpreadMode::Pad,
                        Transform::identity(),
                    ) else {
                        return;
                    };
                    Paint {
                        shader,
                        anti_alias: true,
                        ..Default::default()
                    }
                }
            };
            pixmap.fill_rect(r, &paint, ts, None);
        }
        Drawable::Paths { batch, color, mode } => {
            let close = *mode == PaintMode::Fill;
            let Some(path) = batch_path(batch, close) else {
                return;
            };
            let paint = solid(*color);
            match mode {
                PaintMode::Fill => pixmap.fill_path(&path, &paint, FillRule::Winding, ts, None),
                PaintMode::Stroke => {
                    pixmap.stroke_path(&path, &paint, &round_stroke(batch.key.width), ts, None)
                }
            }
        }
        Drawable::Line {
            from,
            to,
            color,
            width,
        } => {
            if let Some(path) = segment(*from, *to) {
                pixmap.stroke_path(&path, &solid(*color), &round_stroke(*width), ts, None);
            }
        }
        Drawable::Text(label) => {
            let Some(outline) = fonts.layout(&label.text, label.size, label.bold) else {
                return;
            };
            let Some(path) = outline.path else {
                return;
            };
            let left = match label.anchor {
                Anchor::Center => label.position.x - outline.width / 2.0,
                Anchor::Right => label.position.x - outline.width,
            };
            let placed = ts.pre_translate(left, label.position.y);
            pixmap.fill_path(&path, &solid(label.color), FillRule::Winding, placed, None);
        }
    }
}
