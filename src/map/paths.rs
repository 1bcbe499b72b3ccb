use glam::Vec2;
use std::collections::HashMap;

use crate::geo::LatLon;
use crate::map::projection::ViewportTransform;
use crate::map::style::StyleKey;

/// Pixel-space polyline (or ring, for filled layers)
pub type Polyline = Vec<Vec2>;

/// Upper bound on paths in a single draw call
pub const DEFAULT_MAX_BATCH_PATHS: usize = 2000;

/// Paths that share one style and are painted with one draw call
#[derive(Debug, Clone, PartialEq)]
pub struct PathBatch {
    pub key: StyleKey,
    pub paths: Vec<Polyline>,
}

impl PathBatch {
    pub fn point_count(&self) -> usize {
        self.paths.iter().map(Vec::len).sum()
    }
}

/// Project one coordinate sequence. Missing or non-finite points are
/// dropped without splitting the line; fewer than 2 survivors yields `None`.
pub fn project_ring(ring: &[Option<LatLon>], transform: &ViewportTransform) -> Option<Polyline> {
    let points: Polyline = ring
        .iter()
        .flatten()
        .filter(|p| p.is_finite())
        .map(|p| transform.to_canvas(p.lat, p.lon))
        .collect();
    (points.len() >= 2).then_some(points)
}

/// Turn elements into pixel paths.
///
/// `extract` yields the coordinate sequences of an element (one for a way,
/// one per way member for a relation). Output order follows input order.
pub fn build_paths<'e, E, F, I>(
    elements: &'e [E],
    transform: &ViewportTransform,
    extract: F,
) -> Vec<Polyline>
where
    F: Fn(&'e E) -> I,
    I: IntoIterator<Item = &'e [Option<LatLon>]>,
{
    elements
        .iter()
        .flat_map(|e| extract(e))
        .filter_map(|ring| project_ring(ring, transform))
        .collect()
}

/// Accumulates paths per style, then emits z-ordered, size-capped batches.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    groups: Vec<(StyleKey, Vec<Polyline>)>,
    index: HashMap<StyleKey, usize>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &StyleKey, path: Polyline) {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.groups.push((key.clone(), Vec::new()));
                self.index.insert(key.clone(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[idx].1.push(path);
    }

    pub fn extend(&mut self, key: &StyleKey, paths: impl IntoIterator<Item = Polyline>) {
        for path in paths {
            self.push(key, path);
        }
    }

    pub fn path_count(&self) -> usize {
        self.groups.iter().map(|(_, p)| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drain into batches sorted by ascending z-layer. Styles on the same
    /// layer keep first-seen order; paths keep insertion order. A group over
    /// `max_paths` is split into consecutive batches of the same style.
    pub fn finish(&mut self, max_paths: usize) -> Vec<PathBatch> {
        let max_paths = max_paths.max(1);
        self.index.clear();
        let mut groups = std::mem::take(&mut self.groups);
        groups.sort_by_key(|(key, _)| key.z_layer);

        let mut batches = Vec::new();
        for (key, paths) in groups {
            if paths.len() <= max_paths {
                batches.push(PathBatch { key, paths });
                continue;
            }
            let mut rest = paths;
            while !rest.is_empty() {
                let tail = rest.split_off(rest.len().min(max_paths));
                batches.push(PathBatch {
                    key: key.clone(),
                    paths: rest,
                });
                rest = tail;
            }
        }
        batches
    }
}
