// src/render/map.rs
use std::path::Path;

use anyhow::{anyhow, Result};
use gdal::raster::Buffer;
use image::RgbaImage;

use crate::config::NdviVis;
use crate::io::reader::GeoInfo;
use crate::region::Region;
use crate::render::colormap::{classes_to_rgba, f32_to_rgba, Gradient, Rgb};

/// Continuous NDVI overlay: palette gradient stretched over the display
/// range, nodata transparent.
pub fn ndvi_overlay(ndvi: &Buffer<f32>, vis: &NdviVis) -> Result<RgbaImage> {
    let gradient = Gradient::from_palette(&vis.palette)?;
    let rgba = f32_to_rgba(ndvi, vis.min, vis.max, &gradient);
    into_image(ndvi.shape(), rgba)
}

/// Categorical class overlay painted from the class palette.
pub fn class_overlay(classes: &Buffer<u8>, palette: &[Rgb]) -> Result<RgbaImage> {
    let rgba = classes_to_rgba(classes, palette);
    into_image(classes.shape(), rgba)
}

/// Region outline on a transparent canvas.
///
/// Every polygon ring is projected into pixel space through the inverse
/// geotransform and stroked segment by segment.
pub fn boundary_overlay(region: &Region, geo: &GeoInfo, color: Rgb) -> Result<RgbaImage> {
    let mut rgba = vec![0u8; geo.width * geo.height * 4];

    for ring in region.rings() {
        let pixels: Vec<(f64, f64)> = ring
            .coords()
            .map(|c| world_to_pixel(&geo.geo_transform, c.x, c.y))
            .collect::<Result<_>>()?;

        for segment in pixels.windows(2) {
            draw_segment(
                &mut rgba,
                geo.width,
                geo.height,
                segment[0],
                segment[1],
                color,
            );
        }
    }

    into_image((geo.width, geo.height), rgba)
}

pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .map_err(|e| anyhow!("writing {}: {}", path.display(), e))
}

fn into_image(shape: (usize, usize), rgba: Vec<u8>) -> Result<RgbaImage> {
    let (width, height) = shape;
    RgbaImage::from_raw(width as u32, height as u32, rgba)
        .ok_or_else(|| anyhow!("RGBA buffer does not match {}x{}", width, height))
}

/// Invert the affine geotransform to map world coordinates to pixel space.
fn world_to_pixel(gt: &[f64; 6], x: f64, y: f64) -> Result<(f64, f64)> {
    let det = gt[1] * gt[5] - gt[2] * gt[4];
    if det == 0.0 {
        return Err(anyhow!("geotransform is not invertible"));
    }
    let dx = x - gt[0];
    let dy = y - gt[3];
    let col = (gt[5] * dx - gt[2] * dy) / det;
    let row = (-gt[4] * dx + gt[1] * dy) / det;
    Ok((col, row))
}

/// Bresenham stroke between two pixel-space points, clipped to the canvas.
fn draw_segment(
    rgba: &mut [u8],
    width: usize,
    height: usize,
    from: (f64, f64),
    to: (f64, f64),
    color: Rgb,
) {
    let (x0, y0) = (from.0.round() as i64, from.1.round() as i64);
    let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
            let offset = (y as usize * width + x as usize) * 4;
            rgba[offset] = color.r;
            rgba[offset + 1] = color.g;
            rgba[offset + 2] = color.b;
            rgba[offset + 3] = 255;
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
