// src/processing/classify.rs
use anyhow::{anyhow, Result};
use gdal::raster::Buffer;
use rayon::prelude::*;

use crate::{NODATA_VALUE_CLASS, NODATA_VALUE_FLOAT};

/// Vegetation cover classes derived from NDVI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VegClass {
    Water = 1,
    Barren = 2,
    SparseVegetation = 3,
    DenseVegetation = 4,
}

impl VegClass {
    pub const ALL: [VegClass; 4] = [
        VegClass::Water,
        VegClass::Barren,
        VegClass::SparseVegetation,
        VegClass::DenseVegetation,
    ];

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            VegClass::Water => "Water",
            VegClass::Barren => "Bare soil / Built-up",
            VegClass::SparseVegetation => "Sparse vegetation",
            VegClass::DenseVegetation => "Dense vegetation",
        }
    }
}

/// Rule-based NDVI classifier.
///
/// Three ascending breaks split the index range into four classes. The
/// ladder is evaluated top to bottom with strict less-than tests, so a value
/// equal to a break always lands in the higher class:
///
/// - index < breaks[0] -> Water
/// - index < breaks[1] -> Bare soil / Built-up
/// - index < breaks[2] -> Sparse vegetation
/// - otherwise         -> Dense vegetation
pub struct Classifier {
    breaks: [f32; 3],
}

impl Classifier {
    pub const DEFAULT_BREAKS: [f32; 3] = [0.0, 0.2, 0.5];

    pub fn new(breaks: [f32; 3]) -> Result<Self> {
        if !(breaks[0] < breaks[1] && breaks[1] < breaks[2]) {
            return Err(anyhow!(
                "class breaks must be strictly ascending, got {:?}",
                breaks
            ));
        }
        Ok(Self { breaks })
    }

    /// Classify a single index value; nodata (sentinel or NaN) stays
    /// nodata (class 0), never a defaulted class.
    pub fn classify_value(&self, value: f32) -> u8 {
        if value == NODATA_VALUE_FLOAT || value.is_nan() {
            NODATA_VALUE_CLASS
        } else if value < self.breaks[0] {
            VegClass::Water.code()
        } else if value < self.breaks[1] {
            VegClass::Barren.code()
        } else if value < self.breaks[2] {
            VegClass::SparseVegetation.code()
        } else {
            VegClass::DenseVegetation.code()
        }
    }

    /// Classify an index raster into a u8 class raster.
    pub fn classify(&self, index: &Buffer<f32>) -> Buffer<u8> {
        let shape = index.shape();
        let data = index.data();
        let mut result_data = vec![NODATA_VALUE_CLASS; shape.0 * shape.1];

        result_data
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, result)| {
                *result = self.classify_value(data[i]);
            });

        Buffer::new(shape, result_data)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            breaks: Self::DEFAULT_BREAKS,
        }
    }
}
