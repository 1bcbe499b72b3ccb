use rayon::prelude::*;
use tracing::debug;

use super::{CategorizedMapData, GeoElement};

/// Layer an element is drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Road,
    WaterArea,
    Waterway,
    Park,
}

const PARK_LANDUSE: &[&str] = &["grass", "forest", "meadow"];

/// Decide an element's layer from its tags.
///
/// Anything with a `highway` tag is a road or nothing: highway relations
/// (routes, pedestrian areas) are dropped rather than drawn as another layer.
pub fn classify(element: &GeoElement) -> Option<Category> {
    let is_way = matches!(element, GeoElement::Way(_));

    if element.tag("highway").is_some() {
        return is_way.then_some(Category::Road);
    }
    if element.tag("natural") == Some("water") {
        return Some(Category::WaterArea);
    }
    if element.tag("waterway").is_some() {
        return is_way.then_some(Category::Waterway);
    }
    if element.tag("leisure") == Some("park")
        || element
            .tag("landuse")
            .is_some_and(|l| PARK_LANDUSE.contains(&l))
    {
        return Some(Category::Park);
    }
    None
}

/// Partition raw elements into the four render layers.
/// Order within each layer follows input order.
pub fn categorize(elements: Vec<GeoElement>) -> CategorizedMapData {
    let total = elements.len();
    let tagged: Vec<(Option<Category>, GeoElement)> = elements
        .into_par_iter()
        .map(|e| (classify(&e), e))
        .collect();

    let mut data = CategorizedMapData::default();
    let mut dropped = 0usize;
    for (category, element) in tagged {
        match (category, element) {
            (Some(Category::Road), GeoElement::Way(w)) => data.roads.push(w),
            (Some(Category::Waterway), GeoElement::Way(w)) => data.waterways.push(w),
            (Some(Category::WaterArea), e) => data.water_areas.push(e),
            (Some(Category::Park), e) => data.parks.push(e),
            _ => dropped += 1,
        }
    }

    debug!(
        total,
        roads = data.roads.len(),
        water_areas = data.water_areas.len(),
        waterways = data.waterways.len(),
        parks = data.parks.len(),
        dropped,
        "categorized elements"
    );
    data
}
