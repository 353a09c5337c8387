use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::error::VariantResult,
    render::compositor::RenderSettings,
    render::placeholder::PlaceholderSpec,
    variant::encode::{DEFAULT_QUALITY, clamp_quality},
};

/// Tunables of a processing run. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProcessOpts {
    /// JPEG quality, clamped to `1..=100` when encoding.
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Last component of every variant file name: `<stem>-<color>-<suffix>.jpg`.
    #[serde(default = "default_filename_suffix")]
    pub filename_suffix: String,
    /// Canvas of the manual flatten and matte used when dropping alpha.
    #[serde(default = "default_background_rgb")]
    pub background_rgb: [u8; 3],
    /// Placeholder width in pixels.
    #[serde(default = "default_placeholder_width")]
    pub placeholder_width: u32,
    /// Placeholder height in pixels.
    #[serde(default = "default_placeholder_height")]
    pub placeholder_height: u32,
    /// Placeholder fill.
    #[serde(default = "default_placeholder_rgb")]
    pub placeholder_rgb: [u8; 3],
    /// Reload written files and compare pixels against the first variant.
    #[serde(default = "default_compare_pixels")]
    pub compare_pixels: bool,
}

impl Default for ProcessOpts {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            filename_suffix: default_filename_suffix(),
            background_rgb: default_background_rgb(),
            placeholder_width: default_placeholder_width(),
            placeholder_height: default_placeholder_height(),
            placeholder_rgb: default_placeholder_rgb(),
            compare_pixels: default_compare_pixels(),
        }
    }
}

impl ProcessOpts {
    /// Read options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> VariantResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open process config '{}'", path.display()))?;
        let opts: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse process config '{}'", path.display()))?;
        Ok(opts)
    }

    /// Quality actually handed to the encoder.
    pub fn effective_quality(&self) -> u8 {
        clamp_quality(self.quality)
    }

    /// `<stem>-<color>-<suffix>.jpg`, each part passed through [`file_component`].
    pub fn variant_filename(&self, stem: &str, color: &str) -> String {
        format!(
            "{}-{}-{}.jpg",
            file_component(stem),
            file_component(color),
            file_component(&self.filename_suffix)
        )
    }

    /// Compositor settings derived from these options.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            background_rgb: self.background_rgb,
            placeholder: PlaceholderSpec {
                width: self.placeholder_width,
                height: self.placeholder_height,
                rgb: self.placeholder_rgb,
            },
        }
    }
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_filename_suffix() -> String {
    "metalware_1".to_string()
}

fn default_background_rgb() -> [u8; 3] {
    [255, 255, 255]
}

fn default_placeholder_width() -> u32 {
    800
}

fn default_placeholder_height() -> u32 {
    600
}

fn default_placeholder_rgb() -> [u8; 3] {
    [255, 0, 0]
}

fn default_compare_pixels() -> bool {
    true
}

/// Replace path separators, characters Windows rejects in file names and control characters
/// with `_`, so layer names can never address another directory.
pub fn file_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/process/opts.rs"]
mod tests;
