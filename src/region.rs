// src/region.rs
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use geo::{BoundingRect, Contains, LineString, MultiPolygon, Point, Rect};
use geojson::{FeatureCollection, GeoJson};
use rayon::prelude::*;

use crate::io::reader::GeoInfo;

/// A country-boundary table loaded from a GeoJSON FeatureCollection.
///
/// Stands in for the hosted platform's boundary dataset: each feature is a
/// (multi)polygon with string attributes, and a region is selected by
/// attribute equality.
pub struct BoundaryTable {
    features: Vec<BoundaryFeature>,
}

struct BoundaryFeature {
    properties: serde_json::Map<String, serde_json::Value>,
    polygons: MultiPolygon<f64>,
}

impl BoundaryTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading boundary table {}", path.as_ref().display()))?;
        let geojson: GeoJson = text
            .parse()
            .with_context(|| format!("parsing boundary table {}", path.as_ref().display()))?;

        let collection: FeatureCollection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => return Err(anyhow!("boundary table must be a FeatureCollection")),
        };

        let mut features = Vec::new();
        for feature in collection.features {
            let Some(geometry) = feature.geometry else {
                continue;
            };
            let Some(polygons) = to_multipolygon(geometry) else {
                // Non-polygon features (points, lines) cannot bound a raster
                continue;
            };
            features.push(BoundaryFeature {
                properties: feature.properties.unwrap_or_default(),
                polygons,
            });
        }

        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Select the region whose `attribute` equals `value`.
    ///
    /// Several matching features are unioned into one region; no match
    /// yields an empty region that blanks every downstream raster. Both are
    /// data states, not errors.
    pub fn select(&self, attribute: &str, value: &str) -> Region {
        let mut polygons = Vec::new();
        for feature in &self.features {
            let matches = feature
                .properties
                .get(attribute)
                .and_then(|v| v.as_str())
                .map(|v| v == value)
                .unwrap_or(false);
            if matches {
                polygons.extend(feature.polygons.0.iter().cloned());
            }
        }

        if polygons.is_empty() {
            log::warn!(
                "boundary filter {} == {:?} matched no feature; region is empty",
                attribute,
                value
            );
        }

        Region::new(MultiPolygon(polygons))
    }
}

/// The selected region: one (multi)polygon in lon/lat plus its bbox.
#[derive(Clone)]
pub struct Region {
    polygons: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
}

impl Region {
    pub fn new(polygons: MultiPolygon<f64>) -> Self {
        let bbox = polygons.bounding_rect();
        Self { polygons, bbox }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.0.is_empty()
    }

    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    /// Bounding-box intersection test against a scene footprint.
    ///
    /// An empty region intersects nothing.
    pub fn intersects_bounds(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
        match self.bbox {
            Some(bbox) => {
                bbox.min().x <= max_x
                    && bbox.max().x >= min_x
                    && bbox.min().y <= max_y
                    && bbox.max().y >= min_y
            }
            None => false,
        }
    }

    /// All polygon rings (exterior and interior), for outline rendering.
    pub fn rings(&self) -> impl Iterator<Item = &LineString<f64>> {
        self.polygons
            .0
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
    }

    /// Rasterize the region onto a pixel grid.
    ///
    /// Returns one flag per pixel in row-major order; a pixel is inside when
    /// its center falls within the region. An empty region produces an
    /// all-false mask.
    pub fn mask(&self, geo: &GeoInfo) -> Vec<bool> {
        let (width, height) = (geo.width, geo.height);
        let gt = geo.geo_transform;

        if self.is_empty() {
            return vec![false; width * height];
        }
        let bbox = self.bbox.expect("non-empty region has a bbox");

        let mut mask = vec![false; width * height];
        mask.par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, row_mask)| {
                for (col, flag) in row_mask.iter_mut().enumerate() {
                    let (x, y) = pixel_center(&gt, col, row);
                    if x < bbox.min().x || x > bbox.max().x || y < bbox.min().y || y > bbox.max().y
                    {
                        continue;
                    }
                    *flag = self.polygons.contains(&Point::new(x, y));
                }
            });

        mask
    }
}

/// Georeferenced coordinates of a pixel center.
fn pixel_center(gt: &[f64; 6], col: usize, row: usize) -> (f64, f64) {
    let fc = col as f64 + 0.5;
    let fr = row as f64 + 0.5;
    (
        gt[0] + fc * gt[1] + fr * gt[2],
        gt[3] + fc * gt[4] + fr * gt[5],
    )
}

/// Convert a GeoJSON geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}
