// src/render/colormap.rs
use anyhow::{anyhow, Result};
use gdal::raster::Buffer;

use crate::NODATA_VALUE_FLOAT;

/// RGB color with channels in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` hex or one of the CSS color names the display
    /// configuration uses.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(anyhow!("expected #rrggbb, got {:?}", s));
            }
            let r = u8::from_str_radix(&hex[0..2], 16)?;
            let g = u8::from_str_radix(&hex[2..4], 16)?;
            let b = u8::from_str_radix(&hex[4..6], 16)?;
            return Ok(Self::new(r, g, b));
        }

        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(Self::new(0, 0, 0)),
            "white" => Ok(Self::new(255, 255, 255)),
            "red" => Ok(Self::new(255, 0, 0)),
            "green" => Ok(Self::new(0, 128, 0)),
            "blue" => Ok(Self::new(0, 0, 255)),
            "yellow" => Ok(Self::new(255, 255, 0)),
            "cyan" => Ok(Self::new(0, 255, 255)),
            "magenta" => Ok(Self::new(255, 0, 255)),
            "brown" => Ok(Self::new(165, 42, 42)),
            "gray" | "grey" => Ok(Self::new(128, 128, 128)),
            _ => Err(anyhow!("unknown color {:?}", s)),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

/// Multi-stop linear gradient over [0, 1].
///
/// Palettes from the display configuration become evenly spaced stops, the
/// way the hosted platform spreads a palette list across the value range.
#[derive(Debug, Clone)]
pub struct Gradient {
    stops: Vec<ColorStop>,
}

impl Gradient {
    pub fn from_palette(palette: &[String]) -> Result<Self> {
        if palette.len() < 2 {
            return Err(anyhow!("gradient needs at least 2 colors"));
        }
        let last = (palette.len() - 1) as f64;
        let stops = palette
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Ok(ColorStop {
                    t: i as f64 / last,
                    color: Rgb::parse(name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { stops })
    }

    /// Interpolated color at `t`, clamped to the gradient's ends.
    pub fn evaluate(&self, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);

        let first = self.stops.first().expect("gradient has stops");
        if t <= first.t {
            return first.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.t {
                let span = hi.t - lo.t;
                let f = if span > 0.0 { (t - lo.t) / span } else { 0.0 };
                return Rgb::new(
                    lerp(lo.color.r, hi.color.r, f),
                    lerp(lo.color.g, hi.color.g, f),
                    lerp(lo.color.b, hi.color.b, f),
                );
            }
        }

        self.stops.last().expect("gradient has stops").color
    }
}

fn lerp(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round() as u8
}

/// Normalize a float raster into RGBA through a gradient.
///
/// Values are stretched over `[min, max]` and clamped; nodata pixels render
/// fully transparent. Row-major, 4 bytes per pixel.
pub fn f32_to_rgba(buffer: &Buffer<f32>, min: f32, max: f32, gradient: &Gradient) -> Vec<u8> {
    let data = buffer.data();
    let range = (max - min) as f64;
    let inv_range = if range > 0.0 { 1.0 / range } else { 1.0 };

    let mut rgba = vec![0u8; data.len() * 4];
    for (i, &value) in data.iter().enumerate() {
        if value == NODATA_VALUE_FLOAT || !value.is_finite() {
            continue; // stays transparent
        }
        let t = (value as f64 - min as f64) * inv_range;
        let Rgb { r, g, b } = gradient.evaluate(t);
        let offset = i * 4;
        rgba[offset] = r;
        rgba[offset + 1] = g;
        rgba[offset + 2] = b;
        rgba[offset + 3] = 255;
    }
    rgba
}

/// Paint a class raster into RGBA from a categorical palette.
///
/// Class codes are 1-based; code 0 (nodata) renders transparent, as does
/// any code beyond the palette.
pub fn classes_to_rgba(buffer: &Buffer<u8>, palette: &[Rgb]) -> Vec<u8> {
    let data = buffer.data();
    let mut rgba = vec![0u8; data.len() * 4];
    for (i, &code) in data.iter().enumerate() {
        if code == 0 {
            continue;
        }
        let Some(&Rgb { r, g, b }) = palette.get(code as usize - 1) else {
            continue;
        };
        let offset = i * 4;
        rgba[offset] = r;
        rgba[offset + 1] = g;
        rgba[offset + 2] = b;
        rgba[offset + 3] = 255;
    }
    rgba
}
