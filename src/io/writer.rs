// src/io/writer.rs
use std::path::Path;

use anyhow::Result;
use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::{DriverManager, DriverType, Metadata};

use crate::utils::fixed_point::to_fixed_point;
use crate::{NODATA_VALUE_CLASS, NODATA_VALUE_FLOAT, NODATA_VALUE_INT};

use super::reader::GeoInfo;

/// Output encoding knobs shared by every written raster.
pub struct WriteOptions {
    pub compress: String,
    pub compress_level: u8,
    pub tiled: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: "DEFLATE".to_string(),
            compress_level: 6,
            tiled: true,
        }
    }
}

fn creation_options(options: &WriteOptions) -> RasterCreationOptions {
    let mut opts = Vec::new();

    // Add compression if not NONE
    if options.compress.to_uppercase() != "NONE" {
        opts.push(format!("COMPRESS={}", options.compress.to_uppercase()));

        match options.compress.to_uppercase().as_str() {
            "DEFLATE" => opts.push(format!("ZLEVEL={}", options.compress_level.min(9))),
            "ZSTD" => opts.push(format!("ZSTD_LEVEL={}", options.compress_level.min(22))),
            _ => {}
        }
    }

    if options.tiled {
        opts.push("TILED=YES".to_string());
    }

    opts.push("NUM_THREADS=ALL_CPUS".to_string());

    RasterCreationOptions::from_iter(opts)
}

/// Write a float32 raster with the shared nodata sentinel.
pub fn write_f32(
    buffer: &Buffer<f32>,
    geo_info: &GeoInfo,
    output_path: &Path,
    description: &str,
    options: &WriteOptions,
) -> Result<()> {
    let driver = DriverManager::get_output_driver_for_dataset_name(output_path, DriverType::Raster)
        .ok_or_else(|| anyhow::anyhow!("unknown output format for {}", output_path.display()))?;

    let shape = buffer.shape();
    let mut output = driver.create_with_band_type_with_options::<f32, _>(
        output_path,
        shape.0,
        shape.1,
        1,
        &creation_options(options),
    )?;

    output.set_projection(&geo_info.projection)?;
    output.set_geo_transform(&geo_info.geo_transform)?;

    let mut output_band = output.rasterband(1)?;
    output_band.set_no_data_value(Some(NODATA_VALUE_FLOAT as f64))?;
    output_band.set_description(description)?;

    let mut out = Buffer::new(shape, buffer.data().to_vec());
    output_band.write((0, 0), shape, &mut out)?;
    output.flush_cache()?;

    Ok(())
}

/// Write a [-1, 1] index raster as fixed-point int16.
///
/// The band carries SCALE/OFFSET metadata so readers recover float values.
pub fn write_fixed_point(
    buffer: &Buffer<f32>,
    geo_info: &GeoInfo,
    output_path: &Path,
    description: &str,
    scale_factor: i32,
    options: &WriteOptions,
) -> Result<()> {
    let driver = DriverManager::get_output_driver_for_dataset_name(output_path, DriverType::Raster)
        .ok_or_else(|| anyhow::anyhow!("unknown output format for {}", output_path.display()))?;

    let shape = buffer.shape();
    let mut output = driver.create_with_band_type_with_options::<i16, _>(
        output_path,
        shape.0,
        shape.1,
        1,
        &creation_options(options),
    )?;

    output.set_projection(&geo_info.projection)?;
    output.set_geo_transform(&geo_info.geo_transform)?;

    let mut output_band = output.rasterband(1)?;
    output_band.set_no_data_value(Some(NODATA_VALUE_INT as f64))?;
    output_band.set_metadata_item("SCALE", &format!("{}", 1.0 / scale_factor as f64), "")?;
    output_band.set_metadata_item("OFFSET", "0", "")?;
    output_band.set_description(&format!("{} (scaled by {})", description, scale_factor))?;

    let fixed_data = to_fixed_point(buffer.data(), scale_factor);
    let mut out = Buffer::new(shape, fixed_data);
    output_band.write((0, 0), shape, &mut out)?;
    output.flush_cache()?;

    Ok(())
}

/// Write a class raster as byte, class 0 = nodata.
pub fn write_u8(
    buffer: &Buffer<u8>,
    geo_info: &GeoInfo,
    output_path: &Path,
    description: &str,
    options: &WriteOptions,
) -> Result<()> {
    let driver = DriverManager::get_output_driver_for_dataset_name(output_path, DriverType::Raster)
        .ok_or_else(|| anyhow::anyhow!("unknown output format for {}", output_path.display()))?;

    let shape = buffer.shape();
    let mut output = driver.create_with_band_type_with_options::<u8, _>(
        output_path,
        shape.0,
        shape.1,
        1,
        &creation_options(options),
    )?;

    output.set_projection(&geo_info.projection)?;
    output.set_geo_transform(&geo_info.geo_transform)?;

    let mut output_band = output.rasterband(1)?;
    output_band.set_no_data_value(Some(NODATA_VALUE_CLASS as f64))?;
    output_band.set_description(description)?;

    let mut out = Buffer::new(shape, buffer.data().to_vec());
    output_band.write((0, 0), shape, &mut out)?;
    output.flush_cache()?;

    Ok(())
}
