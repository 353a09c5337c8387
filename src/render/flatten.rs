use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::{
    document::tree::{Document, LayerId},
    foundation::error::VariantResult,
    render::pixels::scale_alpha,
};

/// Manually flatten every effectively visible pixel layer onto an opaque canvas.
///
/// Layers are painted bottom to top at their stored offsets with straight-alpha source-over;
/// opacity is the product of the layer's and its ancestors' opacities. Blend modes are not
/// interpreted. A layer that fails to decode is logged and skipped.
pub fn flatten_visible(doc: &Document, background: [u8; 3]) -> VariantResult<RgbaImage> {
    let [r, g, b] = background;
    let mut canvas = RgbaImage::from_pixel(doc.width(), doc.height(), Rgba([r, g, b, 255]));

    let order: Vec<LayerId> = doc.descendants(true).collect();
    for &id in order.iter().rev() {
        let node = doc.layer(id);
        let Some(pixels) = node.pixels() else {
            continue;
        };
        if !doc.is_effectively_visible(id) {
            continue;
        }

        let raster = match doc.layer_raster(id) {
            Ok(Some(raster)) => raster,
            Ok(None) => continue,
            Err(e) => {
                warn!(layer = %node.name, error = %e, "failed to process layer");
                continue;
            }
        };

        let opacity = effective_opacity(doc, id);
        if opacity <= 0.0 {
            continue;
        }
        debug!(layer = %doc.label(id), opacity, "painting layer");

        if opacity < 1.0 {
            let mut faded = (*raster).clone();
            scale_alpha(&mut faded, opacity);
            image::imageops::overlay(
                &mut canvas,
                &faded,
                i64::from(pixels.left),
                i64::from(pixels.top),
            );
        } else {
            image::imageops::overlay(
                &mut canvas,
                &*raster,
                i64::from(pixels.left),
                i64::from(pixels.top),
            );
        }
    }

    Ok(canvas)
}

fn effective_opacity(doc: &Document, id: LayerId) -> f32 {
    let mut opacity = 1.0f32;
    let mut cur = Some(id);
    while let Some(c) = cur {
        let node = doc.layer(c);
        opacity *= node.opacity.clamp(0.0, 1.0);
        cur = node.parent;
    }
    opacity
}

#[cfg(test)]
#[path = "../../tests/unit/render/flatten.rs"]
mod tests;
