use std::hash::{Hash, Hasher};

use crate::data::{ColorSlot, Theme};

/// Batching key: everything that changes how a path is painted
#[derive(Debug, Clone)]
pub struct StyleKey {
    pub color: String,
    pub width: f32,
    /// Draw rank within a layer, higher is painted later
    pub z_layer: u8,
}

impl StyleKey {
    pub fn new(color: impl Into<String>, width: f32, z_layer: u8) -> Self {
        Self {
            color: color.into(),
            width,
            z_layer,
        }
    }
}

impl PartialEq for StyleKey {
    fn eq(&self, other: &Self) -> bool {
        self.color == other.color
            && self.width.to_bits() == other.width.to_bits()
            && self.z_layer == other.z_layer
    }
}

impl Eq for StyleKey {}

impl Hash for StyleKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.color.hash(state);
        self.width.to_bits().hash(state);
        self.z_layer.hash(state);
    }
}

/// One row of a tag → style table
#[derive(Debug, Clone, Copy)]
pub struct StyleRule {
    pub values: &'static [&'static str],
    pub slot: ColorSlot,
    pub width: f32,
    pub z_layer: u8,
}

/// `highway=*` classification. First matching row wins.
pub static ROAD_RULES: &[StyleRule] = &[
    StyleRule {
        values: &["motorway", "motorway_link"],
        slot: ColorSlot::RoadMotorway,
        width: 3.0,
        z_layer: 4,
    },
    StyleRule {
        values: &["trunk", "trunk_link", "primary", "primary_link"],
        slot: ColorSlot::RoadPrimary,
        width: 2.5,
        z_layer: 3,
    },
    StyleRule {
        values: &["secondary", "secondary_link"],
        slot: ColorSlot::RoadSecondary,
        width: 2.0,
        z_layer: 2,
    },
    StyleRule {
        values: &["tertiary", "tertiary_link"],
        slot: ColorSlot::RoadTertiary,
        width: 1.5,
        z_layer: 1,
    },
    StyleRule {
        values: &["residential", "living_street", "unclassified"],
        slot: ColorSlot::RoadResidential,
        width: 1.0,
        z_layer: 0,
    },
];

pub static ROAD_FALLBACK: StyleRule = StyleRule {
    values: &[],
    slot: ColorSlot::RoadDefault,
    width: 1.0,
    z_layer: 0,
};

/// `waterway=*` widths. Ranked so rivers paint over streams.
pub static WATERWAY_RULES: &[StyleRule] = &[
    StyleRule {
        values: &["river"],
        slot: ColorSlot::Water,
        width: 3.0,
        z_layer: 3,
    },
    StyleRule {
        values: &["canal"],
        slot: ColorSlot::Water,
        width: 2.5,
        z_layer: 2,
    },
    StyleRule {
        values: &["stream"],
        slot: ColorSlot::Water,
        width: 1.5,
        z_layer: 1,
    },
];

pub static WATERWAY_FALLBACK: StyleRule = StyleRule {
    values: &[],
    slot: ColorSlot::Water,
    width: 1.0,
    z_layer: 0,
};

fn lookup<'r>(rules: &'r [StyleRule], fallback: &'r StyleRule, value: Option<&str>) -> &'r StyleRule {
    value
        .and_then(|v| rules.iter().find(|r| r.values.contains(&v)))
        .unwrap_or(fallback)
}

impl StyleRule {
    /// Materialize against a theme. `scale` multiplies the stroke width.
    pub fn key(&self, theme: &Theme, scale: f32) -> StyleKey {
        StyleKey::new(theme.color(self.slot), self.width * scale, self.z_layer)
    }
}

pub fn road_rule(highway: Option<&str>) -> &'static StyleRule {
    lookup(ROAD_RULES, &ROAD_FALLBACK, highway)
}

pub fn waterway_rule(waterway: Option<&str>) -> &'static StyleRule {
    lookup(WATERWAY_RULES, &WATERWAY_FALLBACK, waterway)
}

/// Style for a road given its `highway` tag
pub fn resolve_road(highway: Option<&str>, theme: &Theme) -> StyleKey {
    road_rule(highway).key(theme, 1.0)
}

/// Style for a linear waterway given its `waterway` tag
pub fn resolve_waterway(waterway: Option<&str>, theme: &Theme) -> StyleKey {
    waterway_rule(waterway).key(theme, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_table() {
        let theme = Theme::feature_based();
        let cases = [
            ("motorway", "#0A0A0A", 3.0, 4),
            ("motorway_link", "#0A0A0A", 3.0, 4),
            ("trunk", "#1A1A1A", 2.5, 3),
            ("primary_link", "#1A1A1A", 2.5, 3),
            ("secondary", "#2A2A2A", 2.0, 2),
            ("tertiary_link", "#3A3A3A", 1.5, 1),
            ("living_street", "#4A4A4A", 1.0, 0),
            ("unclassified", "#4A4A4A", 1.0, 0),
        ];
        for (highway, color, width, z) in cases {
            let key = resolve_road(Some(highway), &theme);
            assert_eq!(key, StyleKey::new(color, width, z), "highway={highway}");
        }
    }

    #[test]
    fn test_unknown_and_missing_highway_use_default() {
        let theme = Theme::feature_based();
        let expected = StyleKey::new(theme.road_default.clone(), 1.0, 0);
        assert_eq!(resolve_road(Some("footway"), &theme), expected);
        assert_eq!(resolve_road(None, &theme), expected);
    }

    #[test]
    fn test_waterway_widths() {
        let theme = Theme::feature_based();
        let width = |w: Option<&str>| resolve_waterway(w, &theme).width;
        assert_eq!(width(Some("river")), 3.0);
        assert_eq!(width(Some("canal")), 2.5);
        assert_eq!(width(Some("stream")), 1.5);
        assert_eq!(width(Some("ditch")), 1.0);
        assert_eq!(width(None), 1.0);
        assert_eq!(resolve_waterway(Some("river"), &theme).color, theme.water);
    }

    #[test]
    fn test_waterway_rank_follows_width() {
        let mut rules: Vec<&StyleRule> = WATERWAY_RULES.iter().collect();
        rules.push(&WATERWAY_FALLBACK);
        rules.sort_by_key(|r| r.z_layer);
        assert!(rules.windows(2).all(|w| w[0].width < w[1].width));
    }

    #[test]
    fn test_scaled_key() {
        let theme = Theme::noir();
        let key = road_rule(Some("motorway")).key(&theme, 2.0);
        assert_eq!(key.width, 6.0);
        assert_eq!(key.z_layer, 4);
    }
}
