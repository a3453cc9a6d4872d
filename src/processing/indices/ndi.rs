// src/processing/indices/ndi.rs
use crate::processing::indices::IndexCalculator;
use crate::utils::gdal_ext::TypedBuffer;
use crate::NODATA_VALUE_FLOAT;
use rayon::prelude::*;

/// Normalized Difference Index (NDI) calculator: (A - B) / (A + B).
///
/// NDVI is the instance over NIR and RED composite bands. Nodata in either
/// input propagates, and a zero denominator yields nodata rather than an
/// error; both are ordinary missing-data states of the output.
pub struct NDI {
    band_a_index: usize,
    band_b_index: usize,
    name: String,
}

impl NDI {
    pub fn new(band_a_index: usize, band_b_index: usize, name: Option<String>) -> Self {
        Self {
            band_a_index,
            band_b_index,
            name: name.unwrap_or_else(|| "NDI".to_string()),
        }
    }

    /// NDVI over [nir, red] inputs.
    pub fn ndvi() -> Self {
        Self::new(0, 1, Some("NDVI".to_string()))
    }
}

impl IndexCalculator for NDI {
    fn calculate(&self, inputs: &[TypedBuffer]) -> TypedBuffer {
        // Extract input bands
        let band_a = &inputs[self.band_a_index];
        let band_b = &inputs[self.band_b_index];

        match (band_a, band_b) {
            (TypedBuffer::F32(a), TypedBuffer::F32(b)) => {
                let shape = a.shape();
                let a_data = a.data();
                let b_data = b.data();

                // Preallocate result buffer
                let mut result_data = vec![NODATA_VALUE_FLOAT; shape.0 * shape.1];

                // Calculate NDI in parallel
                result_data.par_iter_mut().enumerate().for_each(|(i, result)| {
                    let a_val = a_data[i];
                    let b_val = b_data[i];

                    if a_val == NODATA_VALUE_FLOAT
                        || b_val == NODATA_VALUE_FLOAT
                        || a_val.is_nan()
                        || b_val.is_nan()
                    {
                        return;
                    }

                    let sum = a_val + b_val;
                    if sum != 0.0 {
                        *result = (a_val - b_val) / sum;
                    }
                });

                // Return result as TypedBuffer
                TypedBuffer::F32(gdal::raster::Buffer::new(shape, result_data))
            }
            _ => panic!("Unsupported input types for NDI calculation"),
        }
    }

    fn required_bands(&self) -> usize {
        2 // NDI requires exactly 2 bands
    }

    fn name(&self) -> &str {
        &self.name
    }
}
