use glam::Vec2;
use tiny_skia::Color;

use crate::geo::{format_coordinates, LatLon};
use crate::stage::{with_opacity, Anchor, Drawable, Fill, TextItem};

pub const ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Fraction of the canvas height covered by each fade
const FADE: f32 = 0.25;

/// City names are spread out by joining letters with two spaces
pub fn letter_spaced(city: &str) -> String {
    let upper = city.to_uppercase();
    let mut out = String::with_capacity(upper.len() * 3);
    for (i, ch) in upper.chars().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push(ch);
    }
    out
}

/// Top and bottom fades into the gradient color
pub fn fades(width: f32, height: f32, color: Color) -> [Drawable; 2] {
    let clear = with_opacity(color, 0.0);
    let band = height * FADE;
    [
        Drawable::Rect {
            x: 0.0,
            y: 0.0,
            width,
            height: band,
            fill: Fill::VerticalGradient {
                top: color,
                bottom: clear,
            },
        },
        Drawable::Rect {
            x: 0.0,
            y: height - band,
            width,
            height: band,
            fill: Fill::VerticalGradient {
                top: clear,
                bottom: color,
            },
        },
    ]
}

/// Text block along the bottom of the poster. Sizes are for a 1200px wide
/// canvas and multiplied by `scale`.
pub fn typography(
    width: f32,
    height: f32,
    scale: f32,
    city: &str,
    country: &str,
    center: LatLon,
    color: Color,
) -> Vec<Drawable> {
    let mid = width / 2.0;
    let text = |text: String, y: f32, size: f32, bold: bool, opacity: f32| {
        Drawable::Text(TextItem {
            text,
            position: Vec2::new(mid, y),
            size: size * scale,
            bold,
            anchor: Anchor::Center,
            color: with_opacity(color, opacity),
        })
    };

    vec![
        text(letter_spaced(city), height * 0.86 - 50.0 * scale, 60.0, true, 1.0),
        text(country.to_uppercase(), height * 0.90, 22.0, false, 1.0),
        text(format_coordinates(center), height * 0.93, 14.0, false, 0.7),
        Drawable::Line {
            from: Vec2::new(width * 0.4, height * 0.88),
            to: Vec2::new(width * 0.6, height * 0.88),
            color,
            width: scale,
        },
        Drawable::Text(TextItem {
            text: ATTRIBUTION.to_string(),
            position: Vec2::new(width - 10.0 * scale, height - 20.0 * scale),
            size: 10.0 * scale,
            bold: false,
            anchor: Anchor::Right,
            color: with_opacity(color, 0.5),
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_spacing() {
        assert_eq!(letter_spaced("Paris"), "P  A  R  I  S");
        assert_eq!(letter_spaced(""), "");
        assert_eq!(letter_spaced("São"), "S  Ã  O");
    }

    #[test]
    fn test_fades_cover_top_and_bottom_quarters() {
        let [top, bottom] = fades(1200.0, 1600.0, Color::WHITE);
        let Drawable::Rect { y, height, fill, .. } = top else {
            panic!("expected rect");
        };
        assert_eq!((y, height), (0.0, 400.0));
        let Fill::VerticalGradient { top: from, bottom: to } = fill else {
            panic!("expected gradient");
        };
        assert_eq!(from.alpha(), 1.0);
        assert_eq!(to.alpha(), 0.0);

        let Drawable::Rect { y, .. } = bottom else {
            panic!("expected rect");
        };
        assert_eq!(y, 1200.0);
    }

    #[test]
    fn test_typography_contents() {
        let items = typography(
            1200.0,
            1600.0,
            1.0,
            "Paris",
            "France",
            LatLon::new(48.8566, 2.3522),
            Color::BLACK,
        );
        let texts: Vec<&str> = items
            .iter()
            .filter_map(|d| match d {
                Drawable::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                "P  A  R  I  S",
                "FRANCE",
                "48.8566° N / 2.3522° E",
                ATTRIBUTION
            ]
        );
        assert!(items.iter().any(|d| matches!(d, Drawable::Line { .. })));
        let Drawable::Text(attribution) = &items[4] else {
            panic!("expected text");
        };
        assert_eq!(attribution.anchor, Anchor::Right);
        assert_eq!(attribution.position, Vec2::new(1190.0, 1580.0));
    }
}
