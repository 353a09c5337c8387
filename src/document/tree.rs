use std::sync::Arc;

use image::RgbaImage;

use crate::{
    document::source::RasterBackend,
    foundation::error::{VariantError, VariantResult},
};

/// Index of a layer node inside a [`Document`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct LayerId(pub(crate) u32);

impl LayerId {
    /// Position of this node in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Normalized matching key for layer and color names: trimmed and lower-cased.
pub fn layer_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Layer blend mode as reported by the document parser.
pub enum BlendMode {
    /// Standard source-over.
    Normal,
    /// Group pass-through (children blend with what is below the group).
    PassThrough,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
    /// Color dodge.
    ColorDodge,
    /// Color burn.
    ColorBurn,
    /// Hard light.
    HardLight,
    /// Soft light.
    SoftLight,
    /// Difference.
    Difference,
    /// Exclusion.
    Exclusion,
    /// Any mode this crate does not name explicitly.
    Other(String),
}

impl BlendMode {
    /// Map a parser-provided mode name (`"Multiply"`, `"color_dodge"`, `"pass through"`...).
    pub fn from_name(name: &str) -> Self {
        let squashed: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match squashed.as_str() {
            "normal" => Self::Normal,
            "passthrough" => Self::PassThrough,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            "overlay" => Self::Overlay,
            "darken" => Self::Darken,
            "lighten" => Self::Lighten,
            "colordodge" => Self::ColorDodge,
            "colorburn" => Self::ColorBurn,
            "hardlight" => Self::HardLight,
            "softlight" => Self::SoftLight,
            "difference" => Self::Difference,
            "exclusion" => Self::Exclusion,
            _ => Self::Other(name.trim().to_string()),
        }
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(name) => f.write_str(name),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Clone, Debug)]
/// Raster payload of a pixel layer.
pub struct PixelContent {
    /// Left offset of the raster on the document canvas.
    pub left: i32,
    /// Top offset of the raster on the document canvas.
    pub top: i32,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Decoded straight-alpha pixels, when held in memory.
    pub raster: Option<Arc<RgbaImage>>,
    /// Index of the layer in the backing parser, when decoding is deferred to it.
    pub source_index: Option<usize>,
}

#[derive(Clone, Debug)]
/// Node payload: a group of children or a pixel leaf.
pub enum LayerKind {
    /// Container layer; children are stored topmost-first.
    Group {
        /// Child layers in stacking order, topmost first.
        children: Vec<LayerId>,
    },
    /// Raster leaf.
    Pixel(PixelContent),
}

#[derive(Clone, Debug)]
/// One layer of the document tree.
pub struct LayerNode {
    /// Name as stored in the document.
    pub name: String,
    /// [`layer_key`] of `name`.
    pub key: String,
    /// Enclosing group; `None` for top-level layers.
    pub parent: Option<LayerId>,
    /// Own visibility flag.
    pub visible: bool,
    /// Blend mode.
    pub blend: BlendMode,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Whether this is a clipping layer.
    pub clipping: bool,
    /// Group or pixel payload.
    pub kind: LayerKind,
}

impl LayerNode {
    /// Whether this node is a group.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group { .. })
    }

    /// Pixel payload, if this is a pixel layer.
    pub fn pixels(&self) -> Option<&PixelContent> {
        match &self.kind {
            LayerKind::Pixel(p) => Some(p),
            LayerKind::Group { .. } => None,
        }
    }
}

/// Parsed layered document: an arena of layer nodes plus canvas size.
///
/// Parent links are plain indices and never own anything. Only visibility flags change after
/// construction; a fresh copy is opened for every render pass.
#[derive(Clone)]
pub struct Document {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) nodes: Vec<LayerNode>,
    pub(crate) roots: Vec<LayerId>,
    pub(crate) backend: Option<Arc<dyn RasterBackend>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &self.nodes.len())
            .field("roots", &self.roots)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl Document {
    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of layers (groups included).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no layers at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level layers, topmost first.
    pub fn roots(&self) -> &[LayerId] {
        &self.roots
    }

    /// Layer by id.
    ///
    /// Ids handed out by this document are always in range.
    pub fn layer(&self, id: LayerId) -> &LayerNode {
        &self.nodes[id.index()]
    }

    /// Children of a group, topmost first; empty for pixel layers.
    pub fn children(&self, id: LayerId) -> &[LayerId] {
        match &self.layer(id).kind {
            LayerKind::Group { children } => children,
            LayerKind::Pixel(_) => &[],
        }
    }

    /// Normalized name of the layer's immediate parent.
    pub fn parent_key(&self, id: LayerId) -> Option<&str> {
        self.layer(id)
            .parent
            .map(|p| self.layer(p).key.as_str())
    }

    /// Backend that decoded this document, if any.
    pub fn backend(&self) -> Option<&dyn RasterBackend> {
        self.backend.as_deref()
    }

    /// First top-level group whose name equals `name` exactly (case-sensitive).
    pub fn find_group(&self, name: &str) -> Option<LayerId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| {
                let node = self.layer(id);
                node.is_group() && node.name == name
            })
    }

    /// Ordered, de-duplicated color names of the immediate children of group `group_name`.
    ///
    /// Names are normalized with [`layer_key`]; blank names are skipped. A missing group
    /// yields an empty list.
    pub fn collect_color_names(&self, group_name: &str) -> Vec<String> {
        let Some(group) = self.find_group(group_name) else {
            return Vec::new();
        };
        let mut colors: Vec<String> = Vec::new();
        for &child in self.children(group) {
            let key = &self.layer(child).key;
            if !key.is_empty() && !colors.iter().any(|c| c == key) {
                colors.push(key.clone());
            }
        }
        colors
    }

    /// Lazy depth-first (pre-order, topmost first) walk over every layer.
    ///
    /// With `include_clip == false` clipping layers and their subtrees are skipped. Every call
    /// starts a fresh traversal.
    pub fn descendants(&self, include_clip: bool) -> Descendants<'_> {
        let mut stack: Vec<LayerId> = self.roots.clone();
        stack.reverse();
        Descendants {
            doc: self,
            stack,
            include_clip,
        }
    }

    /// Own flag and every ancestor's flag are set.
    pub fn is_effectively_visible(&self, id: LayerId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.layer(c);
            if !node.visible {
                return false;
            }
            cur = node.parent;
        }
        true
    }

    /// Set the own visibility flag of one layer.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        self.nodes[id.index()].visible = visible;
    }

    /// Decoded pixels of a pixel layer.
    ///
    /// In-memory rasters are returned directly; deferred layers are decoded by the backend.
    /// Groups and empty layers yield `None`.
    pub fn layer_raster(&self, id: LayerId) -> VariantResult<Option<Arc<RgbaImage>>> {
        let node = self.layer(id);
        let Some(pixels) = node.pixels() else {
            return Ok(None);
        };
        if let Some(raster) = &pixels.raster {
            return Ok(Some(Arc::clone(raster)));
        }
        if pixels.source_index.is_none() {
            return Ok(None);
        }
        let backend = self.backend().ok_or_else(|| {
            VariantError::render(format!(
                "layer '{}' defers decoding but the document has no backend",
                node.name
            ))
        })?;
        Ok(backend.layer_raster(self, id)?.map(Arc::new))
    }

    /// `parent/name` label for diagnostics.
    pub fn label(&self, id: LayerId) -> String {
        let node = self.layer(id);
        match node.parent {
            Some(p) => format!("{}/{}", self.layer(p).name, node.name),
            None => format!("Root/{}", node.name),
        }
    }
}

/// Iterator returned by [`Document::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<LayerId>,
    include_clip: bool,
}

impl Iterator for Descendants<'_> {
    type Item = LayerId;

    fn next(&mut self) -> Option<LayerId> {
        while let Some(id) = self.stack.pop() {
            if !self.include_clip && self.doc.layer(id).clipping {
                continue;
            }
            for &c in self.doc.children(id).iter().rev() {
                self.stack.push(c);
            }
            return Some(id);
        }
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/tree.rs"]
mod tests;
