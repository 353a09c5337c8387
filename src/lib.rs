//! psd-variants turns a layered product mockup (PSD) into one flattened JPEG per color option.
//!
//! A product document carries five top-level groups: `@main` (shared product layers, usually
//! including a "metalware" layer), `camera`, `colors` and `base` (one branch per color option)
//! and `bg`. A color is renderable only when all of `camera`, `colors` and `base` name it.
//!
//! # Pipeline overview
//!
//! 1. **Open**: a [`DocumentSource`] yields a fresh arena [`Document`] per call
//! 2. **Validate**: [`validate`] checks the required top-level groups
//! 3. **Resolve**: [`resolve_visibility`] computes a [`VisibilityMap`] for one color (pure)
//! 4. **Render**: [`Compositor`] applies the map to a fresh copy and flattens it, trying the
//!    native backend, then a manual flatten, then a diagnostic placeholder
//! 5. **Verify**: dimension gate, hashing and duplicate detection over the batch
//!
//! [`process`] runs the whole batch for a PSD file and returns `(success, variants)`.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No shared mutable state**: every color renders from its own copy of the document.
//! - **Per-color isolation**: a failing color is logged and skipped; the batch continues.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod document;
mod foundation;
mod process;
mod render;
mod validate;
mod variant;
mod visibility;

#[cfg(test)]
#[path = "../tests/unit/fixtures.rs"]
pub(crate) mod test_fixtures;

pub use document::builder::DocumentBuilder;
pub use document::psd_file::PsdFile;
pub use document::source::{DocumentSource, MemorySource, RasterBackend};
pub use document::tree::{
    BlendMode, Descendants, Document, LayerId, LayerKind, LayerNode, PixelContent, layer_key,
};
pub use foundation::digest::sha256_hex;
pub use foundation::error::{VariantError, VariantResult};
pub use process::opts::{ProcessOpts, file_component};
pub use process::processor::{
    ProcessOutcome, SkippedColor, VariantProcessor, process, process_with_opts,
};
pub use render::compositor::{
    Compositor, RENDER_TIERS, RenderSettings, RenderTier, RenderedVariant, is_usable,
};
pub use render::flatten::flatten_visible;
pub use render::pixels::{PixelBounds, content_bounds, difference_bounds, matte, scale_alpha};
pub use render::placeholder::{PlaceholderSpec, placeholder_image};
pub use validate::structure::{
    REQUIRED_GROUPS, StructureReport, inspect_structure, require_structure, validate,
};
pub use variant::encode::{
    DEFAULT_QUALITY, clamp_quality, encode_jpeg, ensure_parent_dir, write_encoded,
};
pub use variant::verify::{
    BatchDiagnostics, DuplicateGroup, IdenticalPair, Variant, check_dimensions,
    compare_with_first, content_hash, find_duplicates, verify_batch,
};
pub use visibility::check::{VisibilityCheck, check_visibility};
pub use visibility::resolver::{
    CANONICAL_GROUPS, COLOR_GROUPS, ColorCatalog, VisibilityMap, VisibilityRule, classify,
    resolve_visibility, resolve_with_colors,
};
