use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::{
    document::source::RasterBackend,
    document::tree::{BlendMode, Document, LayerId, LayerKind, LayerNode, PixelContent, layer_key},
    foundation::error::{VariantError, VariantResult},
};

/// Incremental constructor for [`Document`] arenas.
///
/// Children are attached in call order, which is stacking order topmost first. Parents must
/// be groups; violations are reported by [`DocumentBuilder::build`].
pub struct DocumentBuilder {
    width: u32,
    height: u32,
    nodes: Vec<LayerNode>,
    roots: Vec<LayerId>,
    backend: Option<Arc<dyn RasterBackend>>,
    misplaced: Vec<String>,
}

impl DocumentBuilder {
    /// Start an empty document with the given canvas size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            nodes: Vec::new(),
            roots: Vec::new(),
            backend: None,
            misplaced: Vec::new(),
        }
    }

    /// Attach the engine used for native compositing and deferred decoding.
    pub fn backend(mut self, backend: Arc<dyn RasterBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Append a visible, normal, fully opaque group.
    pub fn group(&mut self, parent: Option<LayerId>, name: impl Into<String>) -> LayerId {
        self.push(
            parent,
            name.into(),
            LayerKind::Group {
                children: Vec::new(),
            },
        )
    }

    /// Append a visible, normal, fully opaque pixel layer.
    pub fn pixel(
        &mut self,
        parent: Option<LayerId>,
        name: impl Into<String>,
        content: PixelContent,
    ) -> LayerId {
        self.push(parent, name.into(), LayerKind::Pixel(content))
    }

    /// Append a pixel layer filled with one straight-alpha RGBA color.
    pub fn solid(
        &mut self,
        parent: Option<LayerId>,
        name: impl Into<String>,
        (left, top): (i32, i32),
        (width, height): (u32, u32),
        rgba: [u8; 4],
    ) -> LayerId {
        let raster = RgbaImage::from_pixel(width, height, Rgba(rgba));
        self.pixel(
            parent,
            name,
            PixelContent {
                left,
                top,
                width,
                height,
                raster: Some(Arc::new(raster)),
                source_index: None,
            },
        )
    }

    /// Set the own visibility flag of `id`.
    pub fn visible(&mut self, id: LayerId, visible: bool) -> &mut Self {
        self.nodes[id.index()].visible = visible;
        self
    }

    /// Set the opacity of `id`, clamped to `[0, 1]`.
    pub fn opacity(&mut self, id: LayerId, opacity: f32) -> &mut Self {
        self.nodes[id.index()].opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set the blend mode of `id`.
    pub fn blend(&mut self, id: LayerId, blend: BlendMode) -> &mut Self {
        self.nodes[id.index()].blend = blend;
        self
    }

    /// Mark `id` as a clipping layer.
    pub fn clipping(&mut self, id: LayerId, clipping: bool) -> &mut Self {
        self.nodes[id.index()].clipping = clipping;
        self
    }

    /// Finish the document.
    pub fn build(self) -> VariantResult<Document> {
        if !self.misplaced.is_empty() {
            return Err(VariantError::document(format!(
                "layers attached to non-group parents: {}",
                self.misplaced.join(", ")
            )));
        }
        Ok(Document {
            width: self.width,
            height: self.height,
            nodes: self.nodes,
            roots: self.roots,
            backend: self.backend,
        })
    }

    fn push(&mut self, parent: Option<LayerId>, name: String, kind: LayerKind) -> LayerId {
        let id = LayerId(self.nodes.len() as u32);
        match parent {
            None => self.roots.push(id),
            Some(p) => match self.nodes.get_mut(p.index()).map(|n| &mut n.kind) {
                Some(LayerKind::Group { children }) => children.push(id),
                _ => self.misplaced.push(name.clone()),
            },
        }
        self.nodes.push(LayerNode {
            key: layer_key(&name),
            name,
            parent,
            visible: true,
            blend: BlendMode::Normal,
            opacity: 1.0,
            clipping: false,
            kind,
        });
        id
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/builder.rs"]
mod tests;
