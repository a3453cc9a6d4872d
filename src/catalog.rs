// src/catalog.rs
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::region::Region;

/// A local scene catalog, standing in for the hosted platform's image
/// collection: per-scene acquisition metadata plus band-name to GeoTIFF
/// path mappings. All scenes of one catalog share a single pixel grid.
#[derive(Deserialize, Serialize, Debug)]
pub struct SceneCatalog {
    pub scenes: Vec<Scene>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Scene {
    pub id: String,
    /// Acquisition date (ISO 8601 calendar date)
    pub date: NaiveDate,
    /// Scene-wide cloudy pixel percentage, 0-100
    pub cloud_cover: f64,
    /// Footprint in lon/lat
    pub bounds: SceneBounds,
    /// Band identifier -> single-band GeoTIFF path
    pub bands: HashMap<String, PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct SceneBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Scene {
    pub fn band_path(&self, band: &str) -> Result<&PathBuf> {
        self.bands
            .get(band)
            .ok_or_else(|| anyhow!("scene {} has no band {}", self.id, band))
    }
}

impl SceneCatalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading scene catalog {}", path.as_ref().display()))?;
        let catalog: SceneCatalog = serde_json::from_str(&text)
            .with_context(|| format!("parsing scene catalog {}", path.as_ref().display()))?;
        Ok(catalog)
    }

    /// Select the scenes contributing to the composite: footprint intersects
    /// the region, acquisition date within `[start, end]`, cloud cover below
    /// the threshold.
    ///
    /// An empty result is a normal state (the composite is then fully
    /// nodata), mirroring how an empty filtered collection behaves upstream.
    pub fn filter(
        &self,
        region: &Region,
        start: NaiveDate,
        end: NaiveDate,
        max_cloud_cover: f64,
    ) -> Vec<&Scene> {
        let in_bounds: Vec<&Scene> = self
            .scenes
            .iter()
            .filter(|s| {
                region.intersects_bounds(
                    s.bounds.min_lon,
                    s.bounds.min_lat,
                    s.bounds.max_lon,
                    s.bounds.max_lat,
                )
            })
            .collect();

        let in_dates: Vec<&Scene> = in_bounds
            .iter()
            .copied()
            .filter(|s| s.date >= start && s.date <= end)
            .collect();

        let selected: Vec<&Scene> = in_dates
            .iter()
            .copied()
            .filter(|s| s.cloud_cover < max_cloud_cover)
            .collect();

        log::info!(
            "scene filter: {} total, {} in bounds, {} in {}..={}, {} below {}% cloud cover",
            self.scenes.len(),
            in_bounds.len(),
            in_dates.len(),
            start,
            end,
            selected.len(),
            max_cloud_cover
        );

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn scene(id: &str, date: &str, cloud_cover: f64, min_lon: f64) -> Scene {
        Scene {
            id: id.to_string(),
            date: date.parse().unwrap(),
            cloud_cover,
            bounds: SceneBounds {
                min_lon,
                min_lat: 0.0,
                max_lon: min_lon + 1.0,
                max_lat: 1.0,
            },
            bands: HashMap::new(),
        }
    }

    fn test_region() -> Region {
        let p = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        Region::new(MultiPolygon(vec![p]))
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_filter_cloud_threshold_is_strict() {
        let catalog = SceneCatalog {
            scenes: vec![
                scene("a", "2024-06-01", 29.9, 0.0),
                scene("b", "2024-06-02", 30.0, 0.0),
                scene("c", "2024-06-03", 45.0, 0.0),
            ],
        };

        let selected = catalog.filter(&test_region(), date("2024-01-01"), date("2024-12-31"), 30.0);
        let ids: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_filter_date_interval_inclusive() {
        let catalog = SceneCatalog {
            scenes: vec![
                scene("before", "2023-12-31", 0.0, 0.0),
                scene("start", "2024-01-01", 0.0, 0.0),
                scene("end", "2024-12-31", 0.0, 0.0),
                scene("after", "2025-01-01", 0.0, 0.0),
            ],
        };

        let selected = catalog.filter(&test_region(), date("2024-01-01"), date("2024-12-31"), 100.0);
        let ids: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["start", "end"]);
    }

    #[test]
    fn test_filter_bounds() {
        let catalog = SceneCatalog {
            scenes: vec![
                scene("near", "2024-06-01", 0.0, 1.5),
                scene("far", "2024-06-01", 0.0, 50.0),
            ],
        };

        let selected = catalog.filter(&test_region(), date("2024-01-01"), date("2024-12-31"), 100.0);
        let ids: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["near"]);
    }

    #[test]
    fn test_filter_empty_region_selects_nothing() {
        let catalog = SceneCatalog {
            scenes: vec![scene("a", "2024-06-01", 0.0, 0.0)],
        };
        let empty = Region::new(MultiPolygon(vec![]));
        assert!(catalog
            .filter(&empty, date("2024-01-01"), date("2024-12-31"), 100.0)
            .is_empty());
    }

    #[test]
    fn test_catalog_json_shape() {
        let json = r#"{
            "scenes": [{
                "id": "S2A_20240101",
                "date": "2024-01-01",
                "cloud_cover": 12.5,
                "bounds": {"min_lon": 68.0, "min_lat": 8.0, "max_lon": 69.0, "max_lat": 9.0},
                "bands": {"B04": "b04.tif", "B08": "b08.tif", "SCL": "scl.tif"}
            }]
        }"#;
        let catalog: SceneCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.scenes.len(), 1);
        assert_eq!(catalog.scenes[0].date, date("2024-01-01"));
        assert!(catalog.scenes[0].band_path("B08").is_ok());
        assert!(catalog.scenes[0].band_path("B02").is_err());
    }
}
