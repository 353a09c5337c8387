use image::RgbaImage;

use crate::{
    document::tree::{Document, LayerId},
    foundation::error::VariantResult,
};

/// Rendering engine behind a parsed document.
///
/// A backend flattens a document natively (blend modes and opacity handled by the engine) and
/// decodes pixel layers whose rasters were not loaded up front.
pub trait RasterBackend: Send + Sync {
    /// Short engine name for diagnostics.
    fn name(&self) -> &'static str;

    /// Flatten every effectively visible layer of `doc` into one canvas-sized image.
    fn composite(&self, doc: &Document) -> VariantResult<RgbaImage>;

    /// Decode the raster of pixel layer `id`, cropped to its own bounds.
    fn layer_raster(&self, doc: &Document, id: LayerId) -> VariantResult<Option<RgbaImage>>;
}

/// Something that can repeatedly open independent copies of one layered document.
pub trait DocumentSource {
    /// Base name used for output files (file stem for file-backed sources).
    fn stem(&self) -> &str;

    /// Open a fresh copy; visibility changes on it never reach other copies.
    fn open(&self) -> VariantResult<Document>;
}

/// Source serving clones of an already built [`Document`].
#[derive(Clone, Debug)]
pub struct MemorySource {
    stem: String,
    document: Document,
}

impl MemorySource {
    /// Wrap `document`, naming outputs after `stem`.
    pub fn new(stem: impl Into<String>, document: Document) -> Self {
        Self {
            stem: stem.into(),
            document,
        }
    }
}

impl DocumentSource for MemorySource {
    fn stem(&self) -> &str {
        &self.stem
    }

    fn open(&self) -> VariantResult<Document> {
        Ok(self.document.clone())
    }
}
