use std::collections::BTreeSet;

use image::{RgbImage, RgbaImage};
use tracing::{debug, error, info, warn};

use crate::{
    document::source::DocumentSource,
    document::tree::Document,
    foundation::error::{VariantError, VariantResult},
    render::flatten::flatten_visible,
    render::pixels::{content_bounds, matte},
    render::placeholder::{PlaceholderSpec, placeholder_image},
    visibility::check::{VisibilityCheck, check_visibility},
    visibility::resolver::resolve_with_colors,
};

/// Compositing strategy that produced a variant image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTier {
    /// The document backend flattened the visible layers itself.
    Native,
    /// Visible pixel layers were painted manually onto an opaque canvas.
    Flatten,
    /// Every strategy failed; a diagnostic placeholder was emitted.
    Placeholder,
}

/// Strategies tried in order before falling back to the placeholder.
pub const RENDER_TIERS: [RenderTier; 2] = [RenderTier::Native, RenderTier::Flatten];

/// Canvas and fallback settings for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    /// Opaque canvas of the manual flatten, also the matte used to drop alpha.
    pub background_rgb: [u8; 3],
    /// Diagnostic image used when every tier fails.
    pub placeholder: PlaceholderSpec,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            background_rgb: [255, 255, 255],
            placeholder: PlaceholderSpec::default(),
        }
    }
}

/// One rendered color, ready for verification.
#[derive(Clone, Debug)]
pub struct RenderedVariant {
    /// Target color.
    pub color: String,
    /// Flattened RGB image.
    pub image: RgbImage,
    /// Strategy that produced `image`.
    pub tier: RenderTier,
    /// Visibility self-check computed before rendering.
    pub check: VisibilityCheck,
}

/// Renders one color at a time from independent copies of a source document.
pub struct Compositor<'a, S: DocumentSource + ?Sized> {
    source: &'a S,
    settings: RenderSettings,
    all_colors: BTreeSet<String>,
}

impl<'a, S: DocumentSource + ?Sized> Compositor<'a, S> {
    /// `all_colors` is the union of color names used to classify layers.
    pub fn new(source: &'a S, settings: RenderSettings, all_colors: BTreeSet<String>) -> Self {
        Self {
            source,
            settings,
            all_colors,
        }
    }

    /// Render `color`.
    ///
    /// Opens a fresh copy of the document, applies the resolved visibility to it and tries
    /// [`RENDER_TIERS`] in order; the first usable image (both sides > 1px) wins. When all
    /// tiers fail the placeholder is returned instead of an error. Only failing to open the
    /// document is an error. The copy is dropped before returning.
    #[tracing::instrument(skip(self))]
    pub fn render(&self, color: &str) -> VariantResult<RenderedVariant> {
        let mut doc = self.source.open()?;
        info!("rendering combination");

        resolve_with_colors(&doc, color, &self.all_colors).apply_to(&mut doc);
        let check = check_visibility(&doc, color, &self.all_colors);
        log_layer_states(&doc);

        for tier in RENDER_TIERS {
            info!(?tier, "attempting composite");
            match self.attempt(tier, &doc) {
                Ok(img) if is_usable(img.width(), img.height()) => {
                    info!(?tier, "composite successful");
                    let image = matte(&img, self.settings.background_rgb);
                    match content_bounds(&image) {
                        Some(bounds) => info!(?bounds, "rendered image has content"),
                        None => warn!("rendered image appears to be empty"),
                    }
                    return Ok(RenderedVariant {
                        color: color.to_string(),
                        image,
                        tier,
                        check,
                    });
                }
                Ok(img) => warn!(
                    ?tier,
                    width = img.width(),
                    height = img.height(),
                    "composite returned invalid image"
                ),
                Err(e) => warn!(?tier, error = %e, "composite failed"),
            }
        }

        error!("all rendering methods failed, creating placeholder");
        Ok(RenderedVariant {
            color: color.to_string(),
            image: placeholder_image(color, check.passed(), &self.settings.placeholder),
            tier: RenderTier::Placeholder,
            check,
        })
    }

    fn attempt(&self, tier: RenderTier, doc: &Document) -> VariantResult<RgbaImage> {
        match tier {
            RenderTier::Native => {
                let backend = doc
                    .backend()
                    .ok_or_else(|| VariantError::render("document has no native compositor"))?;
                backend.composite(doc)
            }
            RenderTier::Flatten => flatten_visible(doc, self.settings.background_rgb),
            RenderTier::Placeholder => Err(VariantError::render(
                "placeholder is not a compositing strategy",
            )),
        }
    }
}

/// Both sides larger than one pixel.
pub fn is_usable(width: u32, height: u32) -> bool {
    width > 1 && height > 1
}

fn log_layer_states(doc: &Document) {
    for id in doc.descendants(true) {
        let node = doc.layer(id);
        debug!(
            layer = %doc.label(id),
            blend = %node.blend,
            opacity = node.opacity,
            visible = node.visible,
            "layer state"
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
