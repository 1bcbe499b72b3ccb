use geojson::{Feature, GeoJson, Value};
use std::fs;
use std::path::Path;

use super::{GeoElement, Geometry, Member, Relation, Tags, Way};
use crate::error::DataError;
use crate::geo::LatLon;

/// Load a GeoJSON file as map elements
pub fn load_geojson(path: &Path) -> Result<Vec<GeoElement>, DataError> {
    let content = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    elements_from_geojson(&content)
}

/// Convert GeoJSON features into ways and relations.
/// Properties become tags; points are ignored.
pub fn elements_from_geojson(content: &str) -> Result<Vec<GeoElement>, DataError> {
    let geojson: GeoJson = content.parse()?;
    let mut out = Vec::new();

    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for (idx, feature) in fc.features.iter().enumerate() {
                push_feature(feature, idx as i64, &mut out);
            }
        }
        GeoJson::Feature(f) => push_feature(&f, 0, &mut out),
        GeoJson::Geometry(g) => push_value(&g.value, 0, Tags::new(), &mut out),
    }

    Ok(out)
}

fn push_feature(feature: &Feature, fallback_id: i64, out: &mut Vec<GeoElement>) {
    let Some(ref geometry) = feature.geometry else {
        return;
    };
    let id = feature
        .id
        .as_ref()
        .and_then(|id| match id {
            geojson::feature::Id::Number(n) => n.as_i64(),
            geojson::feature::Id::String(s) => s.parse().ok(),
        })
        .unwrap_or(fallback_id);
    push_value(&geometry.value, id, feature_tags(feature), out);
}

fn feature_tags(feature: &Feature) -> Tags {
    let Some(props) = feature.properties.as_ref() else {
        return Tags::new();
    };
    props
        .iter()
        .filter_map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k.clone(), value))
        })
        .collect()
}

/// GeoJSON positions are `[lon, lat]`
fn ring(coords: &[Vec<f64>]) -> Geometry {
    coords
        .iter()
        .map(|c| match c.as_slice() {
            [lon, lat, ..] => Some(LatLon::new(*lat, *lon)),
            _ => None,
        })
        .collect()
}

fn member(role: &str, coords: &[Vec<f64>]) -> Member {
    Member {
        role: role.to_string(),
        geometry: Some(ring(coords)),
    }
}

fn polygon_members(rings: &[Vec<Vec<f64>>], members: &mut Vec<Member>) {
    for (i, coords) in rings.iter().enumerate() {
        members.push(member(if i == 0 { "outer" } else { "inner" }, coords));
    }
}

fn push_value(value: &Value, id: i64, tags: Tags, out: &mut Vec<GeoElement>) {
    match value {
        Value::LineString(coords) => out.push(GeoElement::Way(Way {
            id,
            geometry: ring(coords),
            tags,
        })),
        Value::Polygon(rings) if rings.len() == 1 => out.push(GeoElement::Way(Way {
            id,
            geometry: ring(&rings[0]),
            tags,
        })),
        Value::Polygon(rings) => {
            let mut members = Vec::with_capacity(rings.len());
            polygon_members(rings, &mut members);
            out.push(GeoElement::Relation(Relation { id, members, tags }));
        }
        Value::MultiLineString(lines) => out.push(GeoElement::Relation(Relation {
            id,
            members: lines.iter().map(|l| member("", l)).collect(),
            tags,
        })),
        Value::MultiPolygon(polygons) => {
            let mut members = Vec::new();
            for rings in polygons {
                polygon_members(rings, &mut members);
            }
            out.push(GeoElement::Relation(Relation { id, members, tags }));
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                push_value(&g.value, id, tags.clone(), out);
            }
        }
        _ => {}
    }
}
