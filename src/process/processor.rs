use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;
use tracing::{error, info};

use crate::{
    document::psd_file::PsdFile,
    document::source::DocumentSource,
    foundation::digest::sha256_hex,
    foundation::error::{VariantError, VariantResult},
    process::opts::ProcessOpts,
    render::compositor::{Compositor, RenderedVariant},
    validate::structure::require_structure,
    variant::encode::{encode_jpeg, write_encoded},
    variant::verify::{BatchDiagnostics, Variant, check_dimensions, content_hash, verify_batch},
    visibility::resolver::ColorCatalog,
};

/// A color that produced no variant, with the reason.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SkippedColor {
    /// The color.
    pub color: String,
    /// Display form of the error that skipped it.
    pub reason: String,
}

/// Result of a processing run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ProcessOutcome {
    /// At least one variant was written.
    pub success: bool,
    /// Written variants, in valid-color order.
    pub variants: Vec<Variant>,
    /// Duplicate and identical-output findings.
    #[serde(flatten)]
    pub diagnostics: BatchDiagnostics,
    /// Colors that failed individually.
    pub skipped: Vec<SkippedColor>,
}

impl ProcessOutcome {
    fn failed() -> Self {
        Self::default()
    }

    /// `(success, variants)`.
    pub fn into_parts(self) -> (bool, Vec<Variant>) {
        (self.success, self.variants)
    }
}

/// Batch driver: validates a document once, then renders and persists one JPEG per color.
pub struct VariantProcessor<S: DocumentSource> {
    source: S,
    output_dir: PathBuf,
    opts: ProcessOpts,
}

impl<S: DocumentSource> VariantProcessor<S> {
    /// Process `source` into `output_dir` with default options.
    pub fn new(source: S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
            opts: ProcessOpts::default(),
        }
    }

    /// Replace the options.
    pub fn with_opts(mut self, opts: ProcessOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Active options.
    pub fn opts(&self) -> &ProcessOpts {
        &self.opts
    }

    /// Directory variants are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the whole batch.
    ///
    /// Document-level failures (unopenable document, missing required groups, no valid color)
    /// abort before rendering. Per-color failures are logged and recorded in
    /// [`ProcessOutcome::skipped`]. The run succeeds iff at least one variant was written.
    #[tracing::instrument(skip(self), fields(stem = self.source.stem(), out = %self.output_dir.display()))]
    pub fn process(&self) -> ProcessOutcome {
        if let Err(e) = std::fs::create_dir_all(&self.output_dir) {
            error!(error = %e, "failed to create output directory");
            return ProcessOutcome::failed();
        }

        let doc = match self.source.open() {
            Ok(doc) => doc,
            Err(e) => {
                error!(error = %e, "failed to load document");
                return ProcessOutcome::failed();
            }
        };
        if let Err(e) = require_structure(&doc) {
            error!(error = %e, "document structure validation failed");
            return ProcessOutcome::failed();
        }

        let catalog = ColorCatalog::from_document(&doc);
        let valid = catalog.valid_colors();
        if valid.is_empty() {
            error!("no valid color combinations found");
            return ProcessOutcome::failed();
        }
        drop(doc);
        info!(colors = ?valid, "generating variants");

        let compositor = Compositor::new(
            &self.source,
            self.opts.render_settings(),
            catalog.all_colors(),
        );
        let mut variants = Vec::with_capacity(valid.len());
        let mut skipped = Vec::new();
        for color in &valid {
            info!(color = %color, "processing color variant");
            match compositor
                .render(color)
                .and_then(|rendered| self.persist(rendered))
            {
                Ok(v) => variants.push(v),
                Err(e) => {
                    error!(color = %color, error = %e, "failed to generate variant");
                    skipped.push(SkippedColor {
                        color: color.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let diagnostics = verify_batch(&variants, self.opts.compare_pixels);
        let success = !variants.is_empty();
        if success {
            info!(count = variants.len(), "processing completed");
        } else {
            error!("no variants generated");
        }
        ProcessOutcome {
            success,
            variants,
            diagnostics,
            skipped,
        }
    }

    fn persist(&self, rendered: RenderedVariant) -> VariantResult<Variant> {
        let RenderedVariant {
            color, image, tier, ..
        } = rendered;
        check_dimensions(&color, &image)?;
        let image_hash = content_hash(&image);

        let filename = self.opts.variant_filename(self.source.stem(), &color);
        let path = output_path(&self.output_dir, &filename)?;
        let bytes = encode_jpeg(&image, self.opts.effective_quality())?;
        write_encoded(&path, &bytes)?;

        let file_size = std::fs::metadata(&path)
            .with_context(|| format!("stat '{}'", path.display()))?
            .len();
        let file_hash = sha256_hex(&bytes);
        info!(
            file = %filename,
            width = image.width(),
            height = image.height(),
            file_size,
            image_hash = %image_hash,
            file_hash = %file_hash,
            "generated variant"
        );
        Ok(Variant {
            filename,
            path,
            color,
            metalware: self.opts.filename_suffix.clone(),
            width: image.width(),
            height: image.height(),
            file_size,
            image_hash,
            file_hash,
            tier,
        })
    }
}

/// Join `filename` onto `dir`, refusing names that would land anywhere but directly in `dir`.
pub(crate) fn output_path(dir: &Path, filename: &str) -> VariantResult<PathBuf> {
    let mut components = Path::new(filename).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    let path = dir.join(filename);
    if !single || path.parent() != Some(dir) {
        return Err(VariantError::encode(format!(
            "output file '{filename}' would leave '{}'",
            dir.display()
        )));
    }
    Ok(path)
}

/// Process the PSD at `document_path` into `output_dir` with `opts`.
pub fn process_with_opts(
    document_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    opts: ProcessOpts,
) -> ProcessOutcome {
    let source = match PsdFile::load(document_path.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to load document");
            return ProcessOutcome::failed();
        }
    };
    VariantProcessor::new(source, output_dir.as_ref())
        .with_opts(opts)
        .process()
}

/// Process the PSD at `document_path` into `output_dir` with default options.
///
/// Returns `(success, variants)`; `success` is false when no variant was written.
pub fn process(
    document_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> (bool, Vec<Variant>) {
    process_with_opts(document_path, output_dir, ProcessOpts::default()).into_parts()
}

#[cfg(test)]
#[path = "../../tests/unit/process/processor.rs"]
mod tests;
