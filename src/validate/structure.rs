use tracing::{error, info, warn};

use crate::{
    document::tree::Document,
    foundation::error::{VariantError, VariantResult},
};

/// Top-level groups every product document must contain (exact, case-sensitive names).
pub const REQUIRED_GROUPS: [&str; 5] = ["@main", "camera", "colors", "base", "bg"];

/// Outcome of inspecting a document's top-level layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StructureReport {
    /// Required groups that are absent, in [`REQUIRED_GROUPS`] order.
    pub missing_groups: Vec<String>,
    /// `@main` has a child whose name contains "metalware" (case-insensitive).
    pub metalware_found: bool,
}

impl StructureReport {
    /// No required group is missing.
    pub fn is_valid(&self) -> bool {
        self.missing_groups.is_empty()
    }
}

/// Inspect `doc` without logging.
pub fn inspect_structure(doc: &Document) -> StructureReport {
    let missing_groups = REQUIRED_GROUPS
        .iter()
        .filter(|name| doc.find_group(name).is_none())
        .map(|name| (*name).to_string())
        .collect();
    let metalware_found = doc.find_group("@main").is_some_and(|main| {
        doc.children(main)
            .iter()
            .any(|&id| doc.layer(id).name.to_lowercase().contains("metalware"))
    });
    StructureReport {
        missing_groups,
        metalware_found,
    }
}

/// `false` iff a required group is missing. A missing metalware layer only warns.
pub fn validate(doc: &Document) -> bool {
    let report = inspect_structure(doc);
    for name in &report.missing_groups {
        error!(group = %name, "missing required group");
    }
    if !report.is_valid() {
        return false;
    }
    if !report.metalware_found {
        warn!("@main group should contain metalware layer");
    }
    info!("document structure validated");
    true
}

/// Like [`validate`] but returns the report, or a structure error naming the missing groups.
pub fn require_structure(doc: &Document) -> VariantResult<StructureReport> {
    if !validate(doc) {
        let report = inspect_structure(doc);
        return Err(VariantError::structure(format!(
            "missing required groups: {}",
            report.missing_groups.join(", ")
        )));
    }
    Ok(inspect_structure(doc))
}

#[cfg(test)]
#[path = "../../tests/unit/validate/structure.rs"]
mod tests;
