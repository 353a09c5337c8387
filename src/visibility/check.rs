use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::document::tree::{Document, layer_key};

/// Counts of visible color-specific layers after visibility was applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct VisibilityCheck {
    /// Visible layers belonging to the target color.
    pub target_visible: usize,
    /// Visible layers belonging to any other color.
    pub other_visible: usize,
}

impl VisibilityCheck {
    /// Target color shows up and nothing else does.
    pub fn passed(&self) -> bool {
        self.target_visible > 0 && self.other_visible == 0
    }
}

/// Diagnostic self-check over the document's current visibility flags.
///
/// A color layer is a color-named direct child of `colors`/`camera`/`base`, or any child of a
/// color-named group. Only own flags are counted. Never blocks rendering.
pub fn check_visibility(
    doc: &Document,
    target_color: &str,
    all_colors: &BTreeSet<String>,
) -> VisibilityCheck {
    let target = layer_key(target_color);
    let mut check = VisibilityCheck::default();

    for id in doc.descendants(true) {
        let node = doc.layer(id);
        if !node.visible {
            continue;
        }
        let Some(parent) = doc.parent_key(id) else {
            continue;
        };
        let is_color_layer =
            matches!(parent, "colors" | "camera" | "base") && all_colors.contains(&node.key);
        let owner = if is_color_layer {
            node.key.as_str()
        } else if all_colors.contains(parent) {
            parent
        } else {
            continue;
        };
        if owner == target {
            check.target_visible += 1;
        } else {
            check.other_visible += 1;
        }
    }

    if check.passed() {
        info!(
            target = check.target_visible,
            other = check.other_visible,
            "visibility validation passed"
        );
    } else {
        warn!(
            target = check.target_visible,
            other = check.other_visible,
            "visibility validation failed"
        );
    }
    check
}

#[cfg(test)]
#[path = "../../tests/unit/visibility/check.rs"]
mod tests;
