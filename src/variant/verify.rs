use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{info, warn};

use crate::{
    foundation::digest::sha256_hex,
    foundation::error::{VariantError, VariantResult},
    render::compositor::{RenderTier, is_usable},
    render::pixels::difference_bounds,
};

/// One persisted color variant.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Variant {
    /// File name inside the output directory, `<stem>-<color>-<suffix>.jpg`.
    pub filename: String,
    /// Full path of the written file.
    pub path: PathBuf,
    /// Target color.
    pub color: String,
    /// Metalware tag carried in the file name.
    pub metalware: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Size of the encoded file in bytes.
    pub file_size: u64,
    /// SHA-256 of the raw RGB pixel bytes.
    pub image_hash: String,
    /// SHA-256 of the encoded file bytes.
    pub file_hash: String,
    /// Compositing strategy that produced the image.
    pub tier: RenderTier,
}

/// Colors whose encoded files hash identically.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DuplicateGroup {
    /// Shared file hash.
    pub file_hash: String,
    /// Colors in batch order.
    pub colors: Vec<String>,
}

/// Two variants whose decoded pixels do not differ anywhere.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct IdenticalPair {
    /// The first variant of the batch.
    pub first: String,
    /// The variant compared against it.
    pub other: String,
}

/// Batch-level findings. Never fatal.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchDiagnostics {
    /// File-hash collisions.
    pub duplicates: Vec<DuplicateGroup>,
    /// Pixel-identical pairs against the first variant.
    pub identical_pairs: Vec<IdenticalPair>,
}

impl BatchDiagnostics {
    /// No duplicate or identical output was found.
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.identical_pairs.is_empty()
    }
}

/// Reject images with a zero or unit dimension.
pub fn check_dimensions(color: &str, image: &RgbImage) -> VariantResult<()> {
    let (w, h) = image.dimensions();
    if !is_usable(w, h) {
        return Err(VariantError::degenerate(color, w, h));
    }
    Ok(())
}

/// SHA-256 of the raw pixel bytes of `image`.
pub fn content_hash(image: &RgbImage) -> String {
    sha256_hex(image.as_raw())
}

/// Group variants by file hash, keeping groups of two or more in first-appearance order.
pub fn find_duplicates(variants: &[Variant]) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for v in variants {
        match groups.iter_mut().find(|g| g.file_hash == v.file_hash) {
            Some(g) => g.colors.push(v.color.clone()),
            None => groups.push(DuplicateGroup {
                file_hash: v.file_hash.clone(),
                colors: vec![v.color.clone()],
            }),
        }
    }
    groups.retain(|g| g.colors.len() > 1);
    for g in &groups {
        warn!(
            colors = ?g.colors,
            hash = %g.file_hash,
            "duplicate content detected, visibility logic may be broken"
        );
    }
    groups
}

/// Compare the decoded file of the first variant against every other one.
///
/// Files that cannot be decoded are skipped with a warning.
pub fn compare_with_first(variants: &[Variant]) -> Vec<IdenticalPair> {
    let Some((first, rest)) = variants.split_first() else {
        return Vec::new();
    };
    let Some(reference) = load_rgb(&first.path) else {
        return Vec::new();
    };
    let mut pairs = Vec::new();
    for other in rest {
        let Some(img) = load_rgb(&other.path) else {
            continue;
        };
        match difference_bounds(&reference, &img) {
            Some(bounds) => info!(
                first = %first.color,
                other = %other.color,
                ?bounds,
                "variants differ"
            ),
            None => {
                warn!(
                    first = %first.color,
                    other = %other.color,
                    "variants are visually identical"
                );
                pairs.push(IdenticalPair {
                    first: first.color.clone(),
                    other: other.color.clone(),
                });
            }
        }
    }
    pairs
}

/// Run the batch diagnostics; `compare_pixels` enables the decoded pixel comparison.
#[tracing::instrument(skip(variants), fields(count = variants.len()))]
pub fn verify_batch(variants: &[Variant], compare_pixels: bool) -> BatchDiagnostics {
    let duplicates = find_duplicates(variants);
    if duplicates.is_empty() && variants.len() > 1 {
        info!("all variants have unique file hashes");
    }
    let identical_pairs = if compare_pixels {
        compare_with_first(variants)
    } else {
        Vec::new()
    };
    BatchDiagnostics {
        duplicates,
        identical_pairs,
    }
}

fn load_rgb(path: &Path) -> Option<RgbImage> {
    match image::open(path) {
        Ok(img) => Some(img.to_rgb8()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not reload variant for comparison");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/variant/verify.rs"]
mod tests;
