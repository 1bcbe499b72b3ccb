//! Overpass API JSON responses.
//!
//! Accepts both `out geom` output (coordinates inline on ways and relation
//! members) and the older `out body; >; out skel` output where ways only list
//! node ids and the nodes follow as separate elements.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::{GeoElement, Geometry, Member, Relation, Tags, Way};
use crate::error::DataError;
use crate::geo::LatLon;

#[derive(Deserialize)]
struct RawResponse {
    elements: Vec<RawElement>,
}

#[derive(Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    nodes: Option<Vec<i64>>,
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    members: Option<Vec<RawMember>>,
    #[serde(default)]
    tags: Option<Tags>,
}

#[derive(Deserialize)]
struct RawMember {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "ref", default)]
    reference: i64,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Option<Geometry>,
}

/// Read and parse an Overpass JSON file
pub fn load_overpass(path: &Path) -> Result<Vec<GeoElement>, DataError> {
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_overpass(bytes)
}

/// Parse an Overpass JSON body into ways and relations with inline geometry.
/// Node elements are consumed as coordinate sources and not returned.
pub fn parse_overpass(mut bytes: Vec<u8>) -> Result<Vec<GeoElement>, DataError> {
    let response: RawResponse = simd_json::serde::from_slice(&mut bytes)?;

    let nodes: HashMap<i64, LatLon> = response
        .elements
        .iter()
        .filter(|e| e.kind == "node")
        .filter_map(|e| Some((e.id, LatLon::new(e.lat?, e.lon?))))
        .collect();

    let mut way_geometry: HashMap<i64, Geometry> = HashMap::new();
    let mut out = Vec::with_capacity(response.elements.len().saturating_sub(nodes.len()));
    let mut relations = Vec::new();

    for el in response.elements {
        match el.kind.as_str() {
            "way" => {
                let geometry = match (el.geometry, el.nodes) {
                    (Some(g), _) => g,
                    (None, Some(ids)) => ids.iter().map(|id| nodes.get(id).copied()).collect(),
                    (None, None) => Vec::new(),
                };
                if !nodes.is_empty() {
                    way_geometry.insert(el.id, geometry.clone());
                }
                out.push(GeoElement::Way(Way {
                    id: el.id,
                    geometry,
                    tags: el.tags.unwrap_or_default(),
                }));
            }
            "relation" => relations.push(el),
            _ => {}
        }
    }

    // Relations last so legacy member refs can find their ways
    for el in relations {
        let members = el
            .members
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.kind != "node")
            .map(|m| Member {
                geometry: m
                    .geometry
                    .or_else(|| way_geometry.get(&m.reference).cloned()),
                role: m.role,
            })
            .collect();
        out.push(GeoElement::Relation(Relation {
            id: el.id,
            members,
            tags: el.tags.unwrap_or_default(),
        }));
    }

    debug!(
        elements = out.len(),
        nodes = nodes.len(),
        "parsed overpass response"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_out_geom() {
        let body = br#"{
            "version": 0.6,
            "generator": "Overpass API",
            "elements": [
                {"type": "way", "id": 1, "geometry": [null, {"lat": 1, "lon": 1}, {"lat": 2, "lon": 2}],
                 "tags": {"highway": "motorway"}},
                {"type": "relation", "id": 2, "members": [
                    {"type": "way", "ref": 10, "role": "outer",
                     "geometry": [{"lat": 0, "lon": 0}, {"lat": 0, "lon": 1}, {"lat": 1, "lon": 1}]},
                    {"type": "node", "ref": 11, "role": "label", "lat": 0.5, "lon": 0.5}
                 ], "tags": {"natural": "water"}}
            ]
        }"#;
        let elements = parse_overpass(body.to_vec()).unwrap();
        assert_eq!(elements.len(), 2);

        let GeoElement::Way(way) = &elements[0] else {
            panic!("expected way");
        };
        assert_eq!(way.geometry[0], None);
        assert_eq!(way.geometry[2], Some(LatLon::new(2.0, 2.0)));
        assert_eq!(way.tag("highway"), Some("motorway"));

        let GeoElement::Relation(rel) = &elements[1] else {
            panic!("expected relation");
        };
        assert_eq!(rel.members.len(), 1);
        assert_eq!(rel.members[0].role, "outer");
    }

    #[test]
    fn test_parse_legacy_node_refs() {
        let body = br#"{"elements": [
            {"type": "way", "id": 5, "nodes": [100, 101, 999], "tags": {"leisure": "park"}},
            {"type": "relation", "id": 6, "members": [{"type": "way", "ref": 5, "role": "outer"}]},
            {"type": "node", "id": 100, "lat": 10.0, "lon": 20.0},
            {"type": "node", "id": 101, "lat": 10.5, "lon": 20.5}
        ]}"#;
        let elements = parse_overpass(body.to_vec()).unwrap();
        assert_eq!(elements.len(), 2);

        let GeoElement::Way(way) = &elements[0] else {
            panic!("expected way");
        };
        assert_eq!(
            way.geometry,
            vec![
                Some(LatLon::new(10.0, 20.0)),
                Some(LatLon::new(10.5, 20.5)),
                None
            ]
        );

        let GeoElement::Relation(rel) = &elements[1] else {
            panic!("expected relation");
        };
        assert_eq!(rel.members[0].geometry.as_ref(), Some(&way.geometry));
    }

    #[test]
    fn test_parse_requires_elements() {
        let geojson = br#"{"type":"FeatureCollection","features":[]}"#;
        assert!(matches!(
            parse_overpass(geojson.to_vec()),
            Err(DataError::Overpass(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_overpass(b"not json".to_vec()),
            Err(DataError::Overpass(_))
        ));
    }
}
