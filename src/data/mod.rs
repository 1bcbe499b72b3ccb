mod categorize;
mod features;
mod overpass;
mod theme;

pub use categorize::{categorize, classify, Category};
pub use features::{elements_from_geojson, load_geojson};
pub use overpass::{load_overpass, parse_overpass};
pub use theme::{ColorSlot, Theme};

use crate::geo::LatLon;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::DataError;

pub type Tags = HashMap<String, String>;

/// Polyline as fetched. `None` marks a point clipped by the fetch bbox.
pub type Geometry = Vec<Option<LatLon>>;

/// An OSM way with inline geometry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Way {
    pub id: i64,
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default)]
    pub tags: Tags,
}

/// One member of a relation. Way members carry geometry, node members don't.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Relation {
    pub id: i64,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoElement {
    Way(Way),
    Relation(Relation),
}

impl GeoElement {
    pub fn id(&self) -> i64 {
        match self {
            GeoElement::Way(w) => w.id,
            GeoElement::Relation(r) => r.id,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            GeoElement::Way(w) => &w.tags,
            GeoElement::Relation(r) => &r.tags,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags().get(key).map(String::as_str)
    }

    /// Every ring/polyline the element draws: a way's own geometry,
    /// or each way member of a relation.
    pub fn rings(&self) -> impl Iterator<Item = &[Option<LatLon>]> + '_ {
        let (own, members): (Option<&Geometry>, &[Member]) = match self {
            GeoElement::Way(w) => (Some(&w.geometry), &[]),
            GeoElement::Relation(r) => (None, &r.members),
        };
        own.into_iter()
            .chain(members.iter().filter_map(|m| m.geometry.as_ref()))
            .map(Vec::as_slice)
    }
}

impl Way {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Render input, already split into its four layers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedMapData {
    pub roads: Vec<Way>,
    pub water_areas: Vec<GeoElement>,
    pub waterways: Vec<Way>,
    pub parks: Vec<GeoElement>,
}

impl CategorizedMapData {
    pub fn len(&self) -> usize {
        self.roads.len() + self.water_areas.len() + self.waterways.len() + self.parks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge another categorized set in, keeping order within each layer
    pub fn extend(&mut self, other: CategorizedMapData) {
        self.roads.extend(other.roads);
        self.water_areas.extend(other.water_areas);
        self.waterways.extend(other.waterways);
        self.parks.extend(other.parks);
    }
}

/// Load a data file as Overpass JSON, or as GeoJSON when it is not an
/// Overpass response.
pub fn load_elements(path: &Path) -> Result<Vec<GeoElement>, DataError> {
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_elements(bytes, &path.display().to_string())
}

fn parse_elements(bytes: Vec<u8>, origin: &str) -> Result<Vec<GeoElement>, DataError> {
    let text = String::from_utf8(bytes).map_err(|source| DataError::Utf8 {
        path: origin.to_string(),
        source,
    })?;
    // simd-json parses in place, so it gets its own copy
    match parse_overpass(text.as_bytes().to_vec()) {
        Ok(elements) => Ok(elements),
        Err(overpass) => elements_from_geojson(&text).map_err(|geojson| {
            debug!(path = origin, %geojson, "input is not GeoJSON either");
            overpass
        }),
    }
}
