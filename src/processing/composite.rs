// src/processing/composite.rs
use anyhow::{anyhow, Result};
use gdal::raster::Buffer;
use rayon::prelude::*;

use crate::{NODATA_VALUE_CLASS, NODATA_VALUE_FLOAT};

/// Per-pixel median compositor over a stack of masked scene bands.
///
/// Every scene contributes with equal weight; masked (nodata) observations
/// are skipped. A pixel with no unmasked observation in any scene stays
/// nodata, which is a normal state of the output rather than an error.
pub struct MedianCompositor;

impl MedianCompositor {
    /// Reduce one band's scene stack to a single composite buffer.
    ///
    /// All buffers must share the same shape. An empty stack yields a fully
    /// nodata composite only when a shape is supplied by the caller, so here
    /// it is rejected: the caller decides what an empty collection means.
    pub fn composite(&self, stack: &[Buffer<f32>]) -> Result<Buffer<f32>> {
        let first = stack
            .first()
            .ok_or_else(|| anyhow!("cannot composite an empty scene stack"))?;
        let shape = first.shape();
        for buffer in stack {
            if buffer.shape() != shape {
                return Err(anyhow!(
                    "scene band shape {:?} does not match stack shape {:?}",
                    buffer.shape(),
                    shape
                ));
            }
        }

        let slices: Vec<&[f32]> = stack.iter().map(|b| b.data()).collect();
        let mut result_data = vec![NODATA_VALUE_FLOAT; shape.0 * shape.1];

        result_data
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, result)| {
                // NaN counts as missing alongside the nodata sentinel
                let mut samples: Vec<f32> = slices
                    .iter()
                    .map(|s| s[i])
                    .filter(|&v| v != NODATA_VALUE_FLOAT && !v.is_nan())
                    .collect();

                if !samples.is_empty() {
                    *result = median(&mut samples);
                }
            });

        Ok(Buffer::new(shape, result_data))
    }
}

/// Median of a non-empty sample set; mean of the two middle values for even
/// counts.
fn median(samples: &mut [f32]) -> f32 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = samples.len();
    if n % 2 == 1 {
        samples[n / 2]
    } else {
        (samples[n / 2 - 1] + samples[n / 2]) / 2.0
    }
}

/// Set pixels outside the region to float nodata.
///
/// `inside` is the rasterized region mask, one flag per pixel in row-major
/// order. A fully false mask (unmatched boundary filter) empties the raster.
pub fn clip_f32(band: &mut Buffer<f32>, inside: &[bool]) -> Result<()> {
    let (w, h) = band.shape();
    if inside.len() != w * h {
        return Err(anyhow!(
            "region mask length {} does not match raster size {}",
            inside.len(),
            w * h
        ));
    }

    band.data_mut()
        .par_iter_mut()
        .zip(inside.par_iter())
        .for_each(|(value, &keep)| {
            if !keep {
                *value = NODATA_VALUE_FLOAT;
            }
        });

    Ok(())
}

/// Set class pixels outside the region to the class nodata code.
pub fn clip_u8(band: &mut Buffer<u8>, inside: &[bool]) -> Result<()> {
    let (w, h) = band.shape();
    if inside.len() != w * h {
        return Err(anyhow!(
            "region mask length {} does not match raster size {}",
            inside.len(),
            w * h
        ));
    }

    band.data_mut()
        .par_iter_mut()
        .zip(inside.par_iter())
        .for_each(|(value, &keep)| {
            if !keep {
                *value = NODATA_VALUE_CLASS;
            }
        });

    Ok(())
}
