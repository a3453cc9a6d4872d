// src/render/legend.rs
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::render::colormap::Rgb;

/// One legend row: color box plus label.
#[derive(Debug, Clone)]
pub struct LegendEntry {
    pub color: Rgb,
    pub label: String,
}

// Panel layout. Mirrors the fixed-position legend panel of the original
// map: padded white card, bold title, stacked color/label rows.
const PAD_X: f64 = 15.0;
const PAD_Y: f64 = 8.0;
const TITLE_SIZE: f64 = 14.0;
const LABEL_SIZE: f64 = 12.0;
const BOX_SIZE: f64 = 16.0;
const ROW_GAP: f64 = 6.0;
const BOX_LABEL_GAP: f64 = 8.0;
const PANEL_WIDTH: f64 = 260.0;

/// Render the legend panel as an SVG document.
pub fn legend_svg(title: &str, entries: &[LegendEntry]) -> String {
    let rows = entries.len() as f64;
    let height = PAD_Y * 2.0 + TITLE_SIZE + PAD_Y + rows * (BOX_SIZE + ROW_GAP);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{PANEL_WIDTH}" height="{height}" viewBox="0 0 {PANEL_WIDTH} {height}">"#
    );
    let _ = writeln!(
        svg,
        r#"  <rect x="0" y="0" width="{PANEL_WIDTH}" height="{height}" fill="white"/>"#
    );

    let title_y = PAD_Y + TITLE_SIZE;
    let _ = writeln!(
        svg,
        r#"  <text x="{PAD_X}" y="{title_y}" font-family="sans-serif" font-size="{TITLE_SIZE}" font-weight="bold">{}</text>"#,
        escape(title)
    );

    for (i, entry) in entries.iter().enumerate() {
        let row_top = title_y + PAD_Y + i as f64 * (BOX_SIZE + ROW_GAP);
        let text_y = row_top + BOX_SIZE - (BOX_SIZE - LABEL_SIZE) / 2.0;
        let text_x = PAD_X + BOX_SIZE + BOX_LABEL_GAP;
        let _ = writeln!(
            svg,
            r#"  <rect x="{PAD_X}" y="{row_top}" width="{BOX_SIZE}" height="{BOX_SIZE}" fill="{}"/>"#,
            entry.color.to_hex()
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{text_x}" y="{text_y}" font-family="sans-serif" font-size="{LABEL_SIZE}">{}</text>"#,
            escape(&entry.label)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn write_legend(path: &Path, title: &str, entries: &[LegendEntry]) -> Result<()> {
    fs::write(path, legend_svg(title, entries))
        .with_context(|| format!("writing legend {}", path.display()))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<LegendEntry> {
        vec![
            LegendEntry {
                color: Rgb::new(31, 120, 180),
                label: "1  Water (NDVI < 0.0)".to_string(),
            },
            LegendEntry {
                color: Rgb::new(0, 100, 0),
                label: "4  Dense vegetation (> 0.5)".to_string(),
            },
        ]
    }

    #[test]
    fn test_legend_rows_in_order() {
        let svg = legend_svg("NDVI Classification Legend", &entries());

        assert!(svg.contains("NDVI Classification Legend"));
        let water = svg.find("1  Water").unwrap();
        let dense = svg.find("4  Dense vegetation").unwrap();
        assert!(water < dense);

        assert!(svg.contains("#1f78b4"));
        assert!(svg.contains("#006400"));
        assert_eq!(svg.matches("<rect").count(), 3); // background + 2 boxes
    }

    #[test]
    fn test_legend_escapes_labels() {
        let rows = vec![LegendEntry {
            color: Rgb::new(0, 0, 0),
            label: "a < b & c".to_string(),
        }];
        let svg = legend_svg("t", &rows);
        assert!(svg.contains("a &lt; b &amp; c"));
    }
}
