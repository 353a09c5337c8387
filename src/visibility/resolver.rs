use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::document::tree::{Document, LayerId, layer_key};

/// Top-level groups that are always shown.
pub const CANONICAL_GROUPS: [&str; 5] = ["bg", "base", "colors", "camera", "@main"];

/// Groups whose immediate children name the color options.
pub const COLOR_GROUPS: [&str; 3] = ["camera", "colors", "base"];

/// Color names found in each color-bearing group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorCatalog {
    /// Colors under `camera`, in document order.
    pub camera: Vec<String>,
    /// Colors under `colors`, in document order.
    pub colors: Vec<String>,
    /// Colors under `base`, in document order.
    pub base: Vec<String>,
}

impl ColorCatalog {
    /// Read the three color groups of `doc`.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            camera: doc.collect_color_names("camera"),
            colors: doc.collect_color_names("colors"),
            base: doc.collect_color_names("base"),
        }
    }

    /// Union of every color name in the three groups.
    pub fn all_colors(&self) -> BTreeSet<String> {
        self.camera
            .iter()
            .chain(&self.colors)
            .chain(&self.base)
            .cloned()
            .collect()
    }

    /// Colors present in all three groups, in `camera` order.
    ///
    /// Camera colors missing from `colors` or `base` are logged and dropped.
    pub fn valid_colors(&self) -> Vec<String> {
        let mut out = Vec::new();
        for color in &self.camera {
            if self.colors.contains(color) && self.base.contains(color) {
                out.push(color.clone());
            } else {
                warn!(color = %color, "color missing in colors or base groups");
            }
        }
        out
    }
}

/// Which rule decided a layer's visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityRule {
    /// Canonical top-level container.
    Container,
    /// Child of `bg`.
    Background,
    /// Color-named child of `base`/`colors`/`camera`/`@main` equal to the target.
    TargetColor,
    /// Color-named child of `base`/`colors`/`camera`/`@main` naming another color.
    OtherColor,
    /// Non-color child of a color-bearing group or `@main`.
    Shared,
    /// Inside a per-color subgroup; shown only for the target color.
    ColorBranch,
    /// Nothing else matched.
    Default,
}

/// Computed visibility flag for every layer of one document, indexed by [`LayerId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityMap {
    flags: Vec<bool>,
}

impl VisibilityMap {
    /// Flag for `id`; unknown ids read as hidden.
    pub fn is_visible(&self, id: LayerId) -> bool {
        self.flags.get(id.index()).copied().unwrap_or(false)
    }

    /// Number of layers covered.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the map covers no layers.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Ids flagged visible, in arena order.
    pub fn visible_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| LayerId(i as u32))
    }

    /// Write these flags into `doc`.
    ///
    /// `doc` must be a copy of the document the map was resolved from.
    pub fn apply_to(&self, doc: &mut Document) {
        for (i, &visible) in self.flags.iter().enumerate().take(doc.len()) {
            doc.set_visible(LayerId(i as u32), visible);
        }
    }
}

/// Resolve visibility of every layer for `target_color`.
///
/// Pure: `doc` is not modified. Matching is trimmed and case-insensitive.
#[tracing::instrument(skip(doc))]
pub fn resolve_visibility(doc: &Document, target_color: &str) -> VisibilityMap {
    let all_colors = ColorCatalog::from_document(doc).all_colors();
    info!(colors = ?all_colors, "resolving layer visibility");
    resolve_with_colors(doc, target_color, &all_colors)
}

/// [`resolve_visibility`] with a precomputed color universe.
pub fn resolve_with_colors(
    doc: &Document,
    target_color: &str,
    all_colors: &BTreeSet<String>,
) -> VisibilityMap {
    let target = layer_key(target_color);
    let mut flags = vec![true; doc.len()];
    for id in doc.descendants(true) {
        let (visible, rule) = classify(doc, id, &target, all_colors);
        debug!(
            layer = %doc.label(id),
            ?rule,
            visible,
            "visibility decision"
        );
        flags[id.index()] = visible;
    }
    VisibilityMap { flags }
}

/// Decide one layer. Rules are checked in a fixed order; the first match wins.
pub fn classify(
    doc: &Document,
    id: LayerId,
    target: &str,
    all_colors: &BTreeSet<String>,
) -> (bool, VisibilityRule) {
    let key = doc.layer(id).key.as_str();
    let Some(parent) = doc.parent_key(id) else {
        if CANONICAL_GROUPS.contains(&key) && doc.layer(id).is_group() {
            return (true, VisibilityRule::Container);
        }
        return (true, VisibilityRule::Default);
    };

    match parent {
        "bg" => (true, VisibilityRule::Background),
        "base" | "colors" | "camera" => {
            if key == target {
                (true, VisibilityRule::TargetColor)
            } else if all_colors.contains(key) {
                (false, VisibilityRule::OtherColor)
            } else {
                (true, VisibilityRule::Shared)
            }
        }
        "@main" => {
            if !all_colors.contains(key) {
                (true, VisibilityRule::Shared)
            } else if key == target {
                (true, VisibilityRule::TargetColor)
            } else {
                (false, VisibilityRule::OtherColor)
            }
        }
        p if all_colors.contains(p) => (p == target, VisibilityRule::ColorBranch),
        _ => (true, VisibilityRule::Default),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/visibility/resolver.rs"]
mod tests;
