use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use image::RgbaImage;

use crate::{
    document::builder::DocumentBuilder,
    document::source::{DocumentSource, RasterBackend},
    document::tree::{BlendMode, Document, LayerId, PixelContent},
    foundation::error::{VariantError, VariantResult},
};

/// File-backed source decoding Photoshop documents with the `psd` crate.
///
/// The file is read once; every [`DocumentSource::open`] re-parses the cached bytes so each
/// render pass works on an independent copy.
#[derive(Clone, Debug)]
pub struct PsdFile {
    path: PathBuf,
    stem: String,
    bytes: Arc<Vec<u8>>,
}

impl PsdFile {
    /// Read `path` into memory.
    pub fn load(path: impl AsRef<Path>) -> VariantResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read psd from '{}'", path.display()))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self {
            path: path.to_path_buf(),
            stem,
            bytes: Arc::new(bytes),
        })
    }

    /// Path the document was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for PsdFile {
    fn stem(&self) -> &str {
        &self.stem
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn open(&self) -> VariantResult<Document> {
        let psd = psd::Psd::from_bytes(&self.bytes).map_err(|e| {
            VariantError::document(format!("parse '{}': {e:?}", self.path.display()))
        })?;
        let (width, height) = (psd.width(), psd.height());
        let records = collect_records(&psd, width, height);
        assemble(width, height, &records, Some(Arc::new(PsdBackend { psd })))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum RecordKind {
    /// `first_index` is the index in `layers()` where the group opens, when the parser knows it.
    Group { id: u32, first_index: Option<usize> },
    Pixel { index: usize },
}

/// Flat, parser-neutral description of one layer or group.
#[derive(Clone, Debug)]
pub(crate) struct LayerRecord {
    pub(crate) kind: RecordKind,
    pub(crate) name: String,
    pub(crate) parent_group: Option<u32>,
    pub(crate) visible: bool,
    pub(crate) clipping: bool,
    pub(crate) opacity: u8,
    pub(crate) blend: String,
    pub(crate) bounds: (i32, i32, u32, u32),
}

// `psd` reports the raw flag bits: `visible()` is set for layers hidden in Photoshop and
// `is_clipping_mask()` is set for clipping bases. Both are inverted here.
fn collect_records(psd: &psd::Psd, width: u32, height: u32) -> Vec<LayerRecord> {
    let mut records = Vec::with_capacity(psd.layers().len() + psd.groups().len());
    for (index, layer) in psd.layers().iter().enumerate() {
        records.push(LayerRecord {
            kind: RecordKind::Pixel { index },
            name: layer.name().to_string(),
            parent_group: layer.parent_id(),
            visible: !layer.visible(),
            clipping: !layer.is_clipping_mask(),
            opacity: layer.opacity(),
            blend: format!("{:?}", layer.blend_mode()),
            bounds: clip_to_canvas(
                layer.layer_left(),
                layer.layer_top(),
                u32::from(layer.width()),
                u32::from(layer.height()),
                width,
                height,
            ),
        });
    }
    let mut groups: Vec<&psd::PsdGroup> = psd.groups().values().collect();
    groups.sort_by_key(|g| g.id());
    for group in groups {
        records.push(LayerRecord {
            kind: RecordKind::Group {
                id: group.id(),
                first_index: group_first_index(psd, group.id()),
            },
            name: group.name().to_string(),
            parent_group: group.parent_id(),
            visible: !group.visible(),
            clipping: !group.is_clipping_mask(),
            opacity: group.opacity(),
            blend: format!("{:?}", group.blend_mode()),
            bounds: (0, 0, 0, 0),
        });
    }
    records
}

/// Where a group opens in `layers()`.
///
/// The parser keeps every group's layers as a contiguous sub-slice of `layers()`. Its offset
/// locates the group even when the group is empty.
fn group_first_index(psd: &psd::Psd, id: u32) -> Option<usize> {
    let sub = psd.get_group_sub_layers(&id)?;
    let size = std::mem::size_of::<psd::PsdLayer>();
    let offset = (sub.as_ptr() as usize).checked_sub(psd.layers().as_ptr() as usize)?;
    let index = offset.checked_div(size)?;
    (index <= psd.layers().len()).then_some(index)
}

/// Intersect a layer rectangle with the canvas.
pub(crate) fn clip_to_canvas(
    left: i32,
    top: i32,
    width: u32,
    height: u32,
    canvas_w: u32,
    canvas_h: u32,
) -> (i32, i32, u32, u32) {
    let x0 = i64::from(left).clamp(0, i64::from(canvas_w));
    let y0 = i64::from(top).clamp(0, i64::from(canvas_h));
    let x1 = (i64::from(left) + i64::from(width)).clamp(0, i64::from(canvas_w));
    let y1 = (i64::from(top) + i64::from(height)).clamp(0, i64::from(canvas_h));
    (
        x0 as i32,
        y0 as i32,
        (x1 - x0).max(0) as u32,
        (y1 - y0).max(0) as u32,
    )
}

/// Build an arena from flat records.
///
/// Pixel indices follow the parser's `layers()`, topmost first. Siblings are ordered by
/// ascending position: a pixel sits at its own index, a group at the index where it opens
/// (or, when that is unknown, at the smallest index beneath it). A group ranks above the
/// pixel it opens on, and ties between groups go to the lower id, which the parser hands
/// out top-down. Groups with no known position sink to the bottom. Records whose parent
/// group is unknown become top-level.
pub(crate) fn assemble(
    width: u32,
    height: u32,
    records: &[LayerRecord],
    backend: Option<Arc<dyn RasterBackend>>,
) -> VariantResult<Document> {
    let group_ids: HashSet<u32> = records
        .iter()
        .filter_map(|r| match r.kind {
            RecordKind::Group { id, .. } => Some(id),
            RecordKind::Pixel { .. } => None,
        })
        .collect();

    let parent_of = |r: &LayerRecord| r.parent_group.filter(|p| group_ids.contains(p));

    let mut group_parent: HashMap<u32, Option<u32>> = HashMap::new();
    for r in records {
        if let RecordKind::Group { id, .. } = r.kind {
            group_parent.insert(id, parent_of(r).filter(|&p| p != id));
        }
    }

    // Smallest pixel index below each group, walking up the parent chain.
    let mut lowest_index: HashMap<u32, usize> = HashMap::new();
    for r in records {
        let RecordKind::Pixel { index } = r.kind else {
            continue;
        };
        let mut cur = parent_of(r);
        let mut seen = HashSet::new();
        while let Some(g) = cur {
            if !seen.insert(g) {
                return Err(VariantError::document(format!(
                    "group nesting cycle through group {g}"
                )));
            }
            let slot = lowest_index.entry(g).or_insert(index);
            *slot = (*slot).min(index);
            cur = group_parent.get(&g).copied().flatten();
        }
    }

    let sort_key = |r: &LayerRecord| -> (usize, u8, u32) {
        match r.kind {
            RecordKind::Pixel { index } => (index, 1, 0),
            RecordKind::Group { id, first_index } => {
                let pos = first_index.or_else(|| lowest_index.get(&id).copied());
                (pos.unwrap_or(usize::MAX), 0, id)
            }
        }
    };

    let mut children: HashMap<Option<u32>, Vec<&LayerRecord>> = HashMap::new();
    for r in records {
        let parent = match r.kind {
            RecordKind::Group { id, .. } => group_parent.get(&id).copied().flatten(),
            RecordKind::Pixel { .. } => parent_of(r),
        };
        children.entry(parent).or_default().push(r);
    }
    for list in children.values_mut() {
        list.sort_by_key(|r| sort_key(*r));
    }

    let mut builder = DocumentBuilder::new(width, height);
    if let Some(backend) = backend {
        builder = builder.backend(backend);
    }

    let mut pending: Vec<(Option<LayerId>, &LayerRecord)> = children
        .get(&None)
        .map(|list| list.iter().rev().map(|r| (None, *r)).collect())
        .unwrap_or_default();
    let mut placed_groups: HashSet<u32> = HashSet::new();
    let mut placed = 0usize;

    while let Some((parent, r)) = pending.pop() {
        placed += 1;
        let id = match r.kind {
            RecordKind::Group { id: gid, .. } => {
                if !placed_groups.insert(gid) {
                    return Err(VariantError::document(format!(
                        "group {gid} appears more than once"
                    )));
                }
                let id = builder.group(parent, r.name.clone());
                if let Some(list) = children.get(&Some(gid)) {
                    for c in list.iter().rev() {
                        pending.push((Some(id), *c));
                    }
                }
                id
            }
            RecordKind::Pixel { index } => {
                let (left, top, w, h) = r.bounds;
                builder.pixel(
                    parent,
                    r.name.clone(),
                    PixelContent {
                        left,
                        top,
                        width: w,
                        height: h,
                        raster: None,
                        source_index: Some(index),
                    },
                )
            }
        };
        builder
            .visible(id, r.visible)
            .clipping(id, r.clipping)
            .opacity(id, f32::from(r.opacity) / 255.0)
            .blend(id, BlendMode::from_name(&r.blend));
    }

    if placed != records.len() {
        return Err(VariantError::document(format!(
            "{} layers are unreachable from the document root",
            records.len() - placed
        )));
    }
    builder.build()
}

struct PsdBackend {
    psd: psd::Psd,
}

impl RasterBackend for PsdBackend {
    fn name(&self) -> &'static str {
        "psd"
    }

    fn composite(&self, doc: &Document) -> VariantResult<RgbaImage> {
        let visible: HashSet<usize> = doc
            .descendants(true)
            .filter(|&id| doc.is_effectively_visible(id))
            .filter_map(|id| doc.layer(id).pixels().and_then(|p| p.source_index))
            .collect();
        let filter = |(idx, _layer): (usize, &psd::PsdLayer)| visible.contains(&idx);
        let rgba = self
            .psd
            .flatten_layers_rgba(&filter)
            .map_err(|e| VariantError::render(format!("psd flatten failed: {e:?}")))?;
        RgbaImage::from_raw(self.psd.width(), self.psd.height(), rgba)
            .ok_or_else(|| VariantError::render("psd flatten returned a short buffer"))
    }

    fn layer_raster(&self, doc: &Document, id: LayerId) -> VariantResult<Option<RgbaImage>> {
        let Some(pixels) = doc.layer(id).pixels() else {
            return Ok(None);
        };
        let Some(index) = pixels.source_index else {
            return Ok(None);
        };
        if pixels.width == 0 || pixels.height == 0 {
            return Ok(None);
        }
        let layer = self.psd.layers().get(index).ok_or_else(|| {
            VariantError::render(format!("psd layer index {index} out of range"))
        })?;

        let rgba = layer.rgba();
        let (canvas_w, canvas_h) = (self.psd.width(), self.psd.height());
        let (raw_left, raw_top) = (layer.layer_left(), layer.layer_top());
        let (raw_w, raw_h) = (u32::from(layer.width()), u32::from(layer.height()));

        // The parser may hand back either a canvas-sized buffer or one sized to the layer.
        let (source, origin) = if rgba.len() == (canvas_w as usize) * (canvas_h as usize) * 4 {
            (RgbaImage::from_raw(canvas_w, canvas_h, rgba), (0, 0))
        } else if rgba.len() == (raw_w as usize) * (raw_h as usize) * 4 {
            (RgbaImage::from_raw(raw_w, raw_h, rgba), (raw_left, raw_top))
        } else {
            return Err(VariantError::render(format!(
                "layer '{}' raster has unexpected length {}",
                layer.name(),
                rgba.len()
            )));
        };
        let source = source.ok_or_else(|| VariantError::render("layer raster buffer too short"))?;

        let x = (pixels.left - origin.0).max(0) as u32;
        let y = (pixels.top - origin.1).max(0) as u32;
        Ok(Some(
            image::imageops::crop_imm(&source, x, y, pixels.width, pixels.height).to_image(),
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/psd_file.rs"]
mod tests;
