// src/pipeline.rs
use std::fs;

use anyhow::{Context, Result};
use gdal::raster::Buffer;
use itertools::{Itertools, MinMaxResult};

use crate::catalog::SceneCatalog;
use crate::config::PipelineConfig;
use crate::io::{self, WriteOptions};
use crate::processing::composite::{clip_f32, MedianCompositor};
use crate::processing::indices::{IndexCalculator, NDI};
use crate::processing::{Classifier, SclMask, VegClass};
use crate::region::BoundaryTable;
use crate::render::{self, LegendEntry, Rgb};
use crate::utils::gdal_ext::TypedBuffer;
use crate::NODATA_VALUE_FLOAT;

/// Run the full compositing / NDVI / classification pipeline.
///
/// Stages flow strictly forward: region -> scene filter -> masked read ->
/// median composite -> NDVI -> classification -> rendering. Degenerate data
/// (empty region, zero surviving scenes) flows through as nodata or stops
/// early with a warning; only broken inputs are errors.
pub fn run(config: &PipelineConfig) -> Result<()> {
    fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("creating output dir {}", config.output.dir.display()))?;

    let write_options = WriteOptions {
        compress: config.output.compress.clone(),
        compress_level: config.output.compress_level,
        tiled: config.output.tiled,
    };

    // 1) Region
    let table = BoundaryTable::load(&config.boundary.path)?;
    log::info!("boundary table: {} features", table.len());
    let region = table.select(&config.boundary.attribute, &config.boundary.value);

    // Legend is static configuration; it renders even when the data side
    // degenerates to nothing.
    let class_palette = config
        .class_palette
        .iter()
        .map(|c| Rgb::parse(c))
        .collect::<Result<Vec<_>>>()?;
    let legend_entries: Vec<LegendEntry> = class_palette
        .iter()
        .zip(&config.legend_labels)
        .map(|(&color, label)| LegendEntry {
            color,
            label: label.clone(),
        })
        .collect();
    render::write_legend(
        &config.output.dir.join("legend.svg"),
        &config.legend_title,
        &legend_entries,
    )?;

    // 2) Scene filter
    let catalog = SceneCatalog::load(&config.catalog)?;
    let scenes = catalog.filter(
        &region,
        config.start_date,
        config.end_date,
        config.max_cloud_cover,
    );
    if scenes.is_empty() {
        log::warn!("no scenes selected; nothing to composite");
        return Ok(());
    }

    // 3) Masked read
    let mask = SclMask::new(config.scl_masked_codes.clone());
    let reader = io::SceneReader::new(None, mask);
    let band_names = vec![config.nir_band.clone(), config.red_band.clone()];
    let (scene_bands, geo_info) = reader.read(&scenes, &band_names, &config.scl_band)?;
    log::info!(
        "read {} scenes on a {}x{} grid",
        scene_bands.len(),
        geo_info.width,
        geo_info.height
    );

    // 4) Median composite, clipped to the region
    let region_mask = region.mask(&geo_info);
    let mut stacks: Vec<Vec<Buffer<f32>>> = band_names.iter().map(|_| Vec::new()).collect();
    for scene in scene_bands {
        for (i, band) in scene.bands.into_iter().enumerate() {
            stacks[i].push(band);
        }
    }

    let compositor = MedianCompositor;
    let mut composites = Vec::with_capacity(stacks.len());
    for (name, stack) in band_names.iter().zip(stacks) {
        let mut composite = compositor.composite(&stack)?;
        clip_f32(&mut composite, &region_mask)?;
        io::write_f32(
            &composite,
            &geo_info,
            &config.output.dir.join(format!("composite_{}.tif", name)),
            &format!("{} median composite", name),
            &write_options,
        )?;
        composites.push(composite);
    }

    // 5) NDVI from the NIR and RED composites
    let red = composites.pop().expect("two composite bands");
    let nir = composites.pop().expect("two composite bands");
    let ndi = NDI::ndvi();
    let inputs = [TypedBuffer::F32(nir), TypedBuffer::F32(red)];
    let ndvi = ndi
        .calculate(&inputs)
        .into_f32()
        .expect("NDI produces an f32 buffer");
    log_index_range(ndi.name(), &ndvi);

    let ndvi_path = config.output.dir.join("ndvi.tif");
    if config.output.float {
        io::write_f32(&ndvi, &geo_info, &ndvi_path, ndi.name(), &write_options)?;
    } else {
        io::write_fixed_point(
            &ndvi,
            &geo_info,
            &ndvi_path,
            ndi.name(),
            config.output.scale_factor,
            &write_options,
        )?;
    }

    // 6) Threshold classification
    let classifier = Classifier::new(config.class_breaks)?;
    let classes = classifier.classify(&ndvi);
    log_class_histogram(&classes);
    io::write_u8(
        &classes,
        &geo_info,
        &config.output.dir.join("ndvi_class.tif"),
        "NDVI classification",
        &write_options,
    )?;

    // 7) Map overlays
    let boundary = render::boundary_overlay(&region, &geo_info, Rgb::parse(&config.boundary_color)?)?;
    render::save_png(&boundary, &config.output.dir.join("boundary.png"))?;

    let ndvi_img = render::ndvi_overlay(&ndvi, &config.ndvi_vis)?;
    render::save_png(&ndvi_img, &config.output.dir.join("ndvi.png"))?;

    let class_img = render::class_overlay(&classes, &class_palette)?;
    render::save_png(&class_img, &config.output.dir.join("ndvi_class.png"))?;

    log::info!("pipeline complete: {}", config.output.dir.display());
    Ok(())
}

fn log_index_range(name: &str, index: &Buffer<f32>) {
    let minmax = index
        .data()
        .iter()
        .filter(|&&v| v != NODATA_VALUE_FLOAT && !v.is_nan())
        .minmax_by(|a, b| a.partial_cmp(b).expect("NaN filtered out"));

    match minmax {
        MinMaxResult::MinMax(lo, hi) => log::info!("{} range: {:.4}..{:.4}", name, lo, hi),
        MinMaxResult::OneElement(v) => log::info!("{} range: single value {:.4}", name, v),
        MinMaxResult::NoElements => log::warn!("{} is fully nodata", name),
    }
}

fn log_class_histogram(classes: &Buffer<u8>) {
    let mut counts = [0usize; 5];
    for &code in classes.data() {
        if (code as usize) < counts.len() {
            counts[code as usize] += 1;
        }
    }
    for class in VegClass::ALL {
        log::info!(
            "class {} ({}): {} px",
            class.code(),
            class.label(),
            counts[class.code() as usize]
        );
    }
    log::debug!("nodata: {} px", counts[0]);
}
