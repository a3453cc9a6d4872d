// src/processing/mask.rs
use anyhow::{anyhow, Result};
use gdal::raster::Buffer;

use crate::utils::gdal_ext::TypedBuffer;
use crate::NODATA_VALUE_FLOAT;

/// Scene classification codes excluded from compositing.
///
/// 3 = cloud shadow, 8 = cloud medium probability, 9 = cloud high
/// probability, 10 = cirrus.
pub const DEFAULT_MASKED_CODES: [u16; 4] = [3, 8, 9, 10];

/// Cloud mask driven by the scene classification layer (SCL).
///
/// Pixels whose SCL code is one of the excluded codes become nodata in the
/// reflectance bands; every other pixel passes through unchanged. The SCL
/// codes themselves are never modified.
pub struct SclMask {
    masked_codes: Vec<u16>,
}

impl SclMask {
    pub fn new(masked_codes: Option<Vec<u16>>) -> Self {
        Self {
            masked_codes: masked_codes.unwrap_or_else(|| DEFAULT_MASKED_CODES.to_vec()),
        }
    }

    /// True when the SCL code at this pixel excludes it from compositing.
    pub fn is_masked(&self, code: u16) -> bool {
        self.masked_codes.contains(&code)
    }

    /// Apply the mask to one reflectance band in place.
    ///
    /// The SCL buffer may be U8 or U16 depending on the driver that produced
    /// the scene; both are accepted. Shapes must match.
    pub fn apply(&self, scl: &TypedBuffer, band: &mut Buffer<f32>) -> Result<()> {
        if scl.shape() != band.shape() {
            return Err(anyhow!(
                "SCL shape {:?} does not match band shape {:?}",
                scl.shape(),
                band.shape()
            ));
        }
        if scl.as_f32().is_some() {
            return Err(anyhow!("SCL band must be integer-typed"));
        }

        for (i, value) in band.data_mut().iter_mut().enumerate() {
            // code_at only fails on float buffers, rejected above
            let code = scl.code_at(i).unwrap();
            if self.is_masked(code) {
                *value = NODATA_VALUE_FLOAT;
            }
        }

        Ok(())
    }
}

impl Default for SclMask {
    fn default() -> Self {
        Self::new(None)
    }
}
