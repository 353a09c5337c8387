use std::sync::{Arc, OnceLock};

use image::{Rgb, RgbImage};
use tracing::warn;

use crate::foundation::error::{VariantError, VariantResult};

/// Size and fill of the diagnostic image emitted when every compositing tier failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaceholderSpec {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Fill color.
    pub rgb: [u8; 3],
}

impl Default for PlaceholderSpec {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            rgb: [255, 0, 0],
        }
    }
}

/// Build the placeholder for `color`, labelled with the visibility check outcome.
///
/// Text is rasterized from SVG with system fonts; if that fails the plain fill is returned so
/// this never fails.
pub fn placeholder_image(color: &str, validation_passed: bool, spec: &PlaceholderSpec) -> RgbImage {
    let svg = placeholder_svg(color, validation_passed, spec);
    match rasterize_svg(&svg, spec.width, spec.height) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, "placeholder text rendering failed, using plain fill");
            RgbImage::from_pixel(spec.width, spec.height, Rgb(spec.rgb))
        }
    }
}

fn placeholder_svg(color: &str, validation_passed: bool, spec: &PlaceholderSpec) -> String {
    let [r, g, b] = spec.rgb;
    let status = if validation_passed { "PASSED" } else { "FAILED" };
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r##"<rect width="{w}" height="{h}" fill="#{r:02x}{g:02x}{b:02x}"/>"##,
            r#"<text x="10" y="34" font-family="sans-serif" font-size="24" fill="white">Render failed for: {color}</text>"#,
            r#"<text x="10" y="74" font-family="sans-serif" font-size="24" fill="white">Validation: {status}</text>"#,
            "</svg>"
        ),
        w = spec.width,
        h = spec.height,
        r = r,
        g = g,
        b = b,
        color = escape_xml(color),
        status = status,
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn rasterize_svg(svg: &str, width: u32, height: u32) -> VariantResult<RgbImage> {
    let opts = usvg::Options {
        fontdb: system_fontdb(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
        .map_err(|e| VariantError::render(format!("parse placeholder svg: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| VariantError::render("failed to allocate placeholder pixmap"))?;
    resvg::render(&tree, resvg::tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    // The backdrop rect is opaque, so premultiplied and straight RGB coincide.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| VariantError::render("placeholder pixmap size mismatch"))
}

fn system_fontdb() -> Arc<usvg::fontdb::Database> {
    static DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    })
    .clone()
}

#[cfg(test)]
#[path = "../../tests/unit/render/placeholder.rs"]
mod tests;
