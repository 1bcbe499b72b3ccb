use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DataError;

/// A poster color scheme. Colors are CSS color strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub bg: String,
    pub text: String,
    pub gradient_color: String,
    pub water: String,
    pub parks: String,
    pub road_motorway: String,
    pub road_primary: String,
    pub road_secondary: String,
    pub road_tertiary: String,
    pub road_residential: String,
    pub road_default: String,
}

/// Named color entries of a [`Theme`], used by the style tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    Water,
    Parks,
    RoadMotorway,
    RoadPrimary,
    RoadSecondary,
    RoadTertiary,
    RoadResidential,
    RoadDefault,
}

impl Theme {
    pub fn color(&self, slot: ColorSlot) -> &str {
        match slot {
            ColorSlot::Water => &self.water,
            ColorSlot::Parks => &self.parks,
            ColorSlot::RoadMotorway => &self.road_motorway,
            ColorSlot::RoadPrimary => &self.road_primary,
            ColorSlot::RoadSecondary => &self.road_secondary,
            ColorSlot::RoadTertiary => &self.road_tertiary,
            ColorSlot::RoadResidential => &self.road_residential,
            ColorSlot::RoadDefault => &self.road_default,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Look up a theme shipped with the crate
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "feature_based" => Some(Self::feature_based()),
            "noir" => Some(Self::noir()),
            _ => None,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["feature_based", "noir"]
    }

    /// Classic black-on-white with road hierarchy in greys
    pub fn feature_based() -> Self {
        Self {
            name: "feature_based".into(),
            description: Some("Classic black & white with road hierarchy".into()),
            bg: "#FFFFFF".into(),
            text: "#000000".into(),
            gradient_color: "#FFFFFF".into(),
            water: "#C0C0C0".into(),
            parks: "#F0F0F0".into(),
            road_motorway: "#0A0A0A".into(),
            road_primary: "#1A1A1A".into(),
            road_secondary: "#2A2A2A".into(),
            road_tertiary: "#3A3A3A".into(),
            road_residential: "#4A4A4A".into(),
            road_default: "#3A3A3A".into(),
        }
    }

    pub fn noir() -> Self {
        Self {
            name: "noir".into(),
            description: Some("Pure black background with white roads".into()),
            bg: "#000000".into(),
            text: "#FFFFFF".into(),
            gradient_color: "#000000".into(),
            water: "#0A0A0A".into(),
            parks: "#111111".into(),
            road_motorway: "#FFFFFF".into(),
            road_primary: "#E0E0E0".into(),
            road_secondary: "#B0B0B0".into(),
            road_tertiary: "#909090".into(),
            road_residential: "#707070".into(),
            road_default: "#909090".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_json_without_description() {
        let json = r##"{
            "name": "ocean", "bg": "#F1F6F8", "text": "#1A3A4A", "gradient_color": "#F1F6F8",
            "water": "#B8D8E8", "parks": "#D8EAE8", "road_motorway": "#1A5F7A",
            "road_primary": "#2A7A9A", "road_secondary": "#4A9AB8", "road_tertiary": "#70B8D0",
            "road_residential": "#A0D0E0", "road_default": "#70B8D0"
        }"##;
        let theme = Theme::from_json(json).unwrap();
        assert_eq!(theme.name, "ocean");
        assert_eq!(theme.description, None);
        assert_eq!(theme.color(ColorSlot::RoadMotorway), "#1A5F7A");
    }

    #[test]
    fn test_theme_missing_field_is_rejected() {
        assert!(matches!(
            Theme::from_json(r#"{"name": "broken"}"#),
            Err(DataError::Json(_))
        ));
    }

    #[test]
    fn test_builtins() {
        for name in Theme::builtin_names() {
            assert_eq!(Theme::builtin(name).unwrap().name, *name);
        }
        assert!(Theme::builtin("nope").is_none());
    }
}
