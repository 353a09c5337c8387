use std::path::Path;

use anyhow::Context as _;
use image::{RgbImage, codecs::jpeg::JpegEncoder};

use crate::foundation::error::{VariantError, VariantResult};

/// JPEG quality used when none is configured.
pub const DEFAULT_QUALITY: u8 = 95;

/// Clamp a requested JPEG quality into the encoder's `1..=100` range.
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(1, 100)
}

/// Encode `image` as baseline JPEG.
///
/// Chroma is always written at 4:4:4 (every component uses 1x1 sampling); the `image` encoder
/// has no subsampling setting, so none is exposed here.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> VariantResult<Vec<u8>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(VariantError::encode("cannot encode an empty image"));
    }
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, clamp_quality(quality))
        .encode_image(image)
        .map_err(|e| VariantError::encode(format!("jpeg encode failed: {e}")))?;
    Ok(out)
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> VariantResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Persist already encoded bytes, replacing any previous file.
pub fn write_encoded(path: &Path, bytes: &[u8]) -> VariantResult<()> {
    ensure_parent_dir(path)?;
    std::fs::write(path, bytes)
        .map_err(|e| VariantError::encode(format!("write '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/variant/encode.rs"]
mod tests;
