// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Full pipeline configuration, read from a JSON file.
///
/// Everything the original map script hardcoded as script-level constants
/// (dates, thresholds, band ids, palettes, legend strings) is an explicit
/// parameter here; only the dataset paths are mandatory.
#[derive(Deserialize, Serialize, Debug)]
pub struct PipelineConfig {
    pub boundary: BoundaryConfig,
    /// Scene catalog JSON path
    pub catalog: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_max_cloud_cover")]
    pub max_cloud_cover: f64,
    #[serde(default = "default_nir_band")]
    pub nir_band: String,
    #[serde(default = "default_red_band")]
    pub red_band: String,
    #[serde(default = "default_scl_band")]
    pub scl_band: String,
    /// SCL codes masked out before compositing; defaults to shadow, cloud
    /// medium/high and cirrus.
    #[serde(default)]
    pub scl_masked_codes: Option<Vec<u16>>,
    #[serde(default = "default_class_breaks")]
    pub class_breaks: [f32; 3],
    #[serde(default)]
    pub ndvi_vis: NdviVis,
    #[serde(default = "default_class_palette")]
    pub class_palette: Vec<String>,
    #[serde(default = "default_legend_title")]
    pub legend_title: String,
    #[serde(default = "default_legend_labels")]
    pub legend_labels: Vec<String>,
    #[serde(default = "default_boundary_color")]
    pub boundary_color: String,
    #[serde(default)]
    pub output: OutputParams,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct BoundaryConfig {
    /// Boundary table GeoJSON path
    pub path: PathBuf,
    /// Attribute used to select the region
    pub attribute: String,
    /// Attribute value that must match exactly
    pub value: String,
}

/// Display range and palette for the continuous NDVI layer.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NdviVis {
    pub min: f32,
    pub max: f32,
    pub palette: Vec<String>,
}

impl Default for NdviVis {
    fn default() -> Self {
        Self {
            min: -0.2,
            max: 0.9,
            palette: vec!["blue".into(), "white".into(), "green".into()],
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct OutputParams {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Write NDVI as float32 instead of fixed-point int16
    #[serde(default)]
    pub float: bool,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: i32,
    #[serde(default = "default_compress")]
    pub compress: String,
    #[serde(default = "default_compress_level")]
    pub compress_level: u8,
    #[serde(default = "default_true")]
    pub tiled: bool,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            float: false,
            scale_factor: default_scale_factor(),
            compress: default_compress(),
            compress_level: default_compress_level(),
            tiled: true,
        }
    }
}

fn default_max_cloud_cover() -> f64 {
    30.0
}

fn default_nir_band() -> String {
    "B08".to_string()
}

fn default_red_band() -> String {
    "B04".to_string()
}

fn default_scl_band() -> String {
    "SCL".to_string()
}

fn default_class_breaks() -> [f32; 3] {
    [0.0, 0.2, 0.5]
}

fn default_class_palette() -> Vec<String> {
    vec![
        "#1f78b4".to_string(), // Water
        "#b15928".to_string(), // Bare soil / Built-up
        "#a6d854".to_string(), // Sparse vegetation
        "#006400".to_string(), // Dense vegetation
    ]
}

fn default_legend_title() -> String {
    "NDVI Classification Legend".to_string()
}

fn default_legend_labels() -> Vec<String> {
    vec![
        "1  Water (NDVI < 0.0)".to_string(),
        "2  Bare soil / Built-up (0.0-0.2)".to_string(),
        "3  Sparse vegetation (0.2-0.5)".to_string(),
        "4  Dense vegetation (> 0.5)".to_string(),
    ]
}

fn default_boundary_color() -> String {
    "yellow".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_scale_factor() -> i32 {
    10000
}

fn default_compress() -> String {
    "DEFLATE".to_string()
}

fn default_compress_level() -> u8 {
    6
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading pipeline config {}", path.as_ref().display()))?;
        let config: PipelineConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing pipeline config {}", path.as_ref().display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with. Authoring
    /// mistakes fail here; degenerate *data* (empty region, zero scenes)
    /// does not.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.max_cloud_cover) {
            return Err(anyhow!(
                "max_cloud_cover must be within 0-100, got {}",
                self.max_cloud_cover
            ));
        }
        if self.end_date < self.start_date {
            return Err(anyhow!(
                "end_date {} precedes start_date {}",
                self.end_date,
                self.start_date
            ));
        }
        let b = &self.class_breaks;
        if !(b[0] < b[1] && b[1] < b[2]) {
            return Err(anyhow!(
                "class_breaks must be strictly ascending, got {:?}",
                b
            ));
        }
        if self.class_palette.len() != 4 {
            return Err(anyhow!(
                "class_palette must list exactly 4 colors, got {}",
                self.class_palette.len()
            ));
        }
        if self.legend_labels.len() != 4 {
            return Err(anyhow!(
                "legend_labels must list exactly 4 entries, got {}",
                self.legend_labels.len()
            ));
        }
        if self.ndvi_vis.palette.len() < 2 {
            return Err(anyhow!("ndvi_vis.palette needs at least 2 colors"));
        }
        if self.ndvi_vis.min >= self.ndvi_vis.max {
            return Err(anyhow!(
                "ndvi_vis range is empty: min {} >= max {}",
                self.ndvi_vis.min,
                self.ndvi_vis.max
            ));
        }
        Ok(())
    }
}
