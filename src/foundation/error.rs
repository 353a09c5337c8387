/// Convenience result type used across the crate.
pub type VariantResult<T> = Result<T, VariantError>;

/// Top-level error taxonomy used by document, render and processing APIs.
#[derive(thiserror::Error, Debug)]
pub enum VariantError {
    /// The layered document could not be opened or parsed.
    #[error("document error: {0}")]
    Document(String),

    /// Required top-level groups are missing; the whole document is rejected.
    #[error("structure error: {0}")]
    Structure(String),

    /// A rendered image has a zero or unit dimension.
    #[error("degenerate render for '{color}': {width}x{height}")]
    Degenerate {
        /// Target color of the rejected render.
        color: String,
        /// Rendered width in pixels.
        width: u32,
        /// Rendered height in pixels.
        height: u32,
    },

    /// A compositing strategy failed.
    #[error("render error: {0}")]
    Render(String),

    /// JPEG encoding or persisting a variant failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VariantError {
    /// Build a [`VariantError::Document`] value.
    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document(msg.into())
    }

    /// Build a [`VariantError::Structure`] value.
    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }

    /// Build a [`VariantError::Degenerate`] value.
    pub fn degenerate(color: impl Into<String>, width: u32, height: u32) -> Self {
        Self::Degenerate {
            color: color.into(),
            width,
            height,
        }
    }

    /// Build a [`VariantError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`VariantError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
