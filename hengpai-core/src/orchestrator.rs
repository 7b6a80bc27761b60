//! Conversion orchestration
//!
//! A conversion runs detection first and stops there when the book is already
//! horizontal. Otherwise the configured external converter gets the first
//! attempt; its output still has the spine direction stripped afterwards. If
//! there is no external converter, or it fails, the direct engine rewrites
//! the archive itself.

use crate::detector::{detect_path, Verdict};
use crate::error::{ExternalError, Result};
use crate::external::ExternalConverter;
use crate::package::{is_rewrite_target, EpubArchive};
use crate::repackager::write_atomically;
use crate::rewriter::{rewrite_content, strip_spine_direction};
use crate::working_set::WorkingSet;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Suffix appended to the input stem by [`default_output_path`]
pub const OUTPUT_SUFFIX: &str = "_horizontal";

/// Which engine produced a converted archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Engine {
    /// In-process rewrite of CSS, XHTML and OPF text
    Direct,
    /// An [`ExternalConverter`], by name
    External(String),
}

/// Result of [`Converter::orchestrate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do; no output was written
    AlreadyHorizontal(Verdict),
    /// A converted archive was written to `output`
    Converted {
        verdict: Verdict,
        output: PathBuf,
        engine: Engine,
    },
}

impl Outcome {
    pub fn verdict(&self) -> Verdict {
        match self {
            Outcome::AlreadyHorizontal(verdict) | Outcome::Converted { verdict, .. } => *verdict,
        }
    }

    pub fn needs_conversion(&self) -> bool {
        self.verdict().needs_conversion()
    }

    /// Path of the written archive, if any
    pub fn output(&self) -> Option<&Path> {
        match self {
            Outcome::AlreadyHorizontal(_) => None,
            Outcome::Converted { output, .. } => Some(output),
        }
    }
}

/// Entry point for converting books, optionally through an external converter
#[derive(Default)]
pub struct Converter {
    external: Option<Box<dyn ExternalConverter>>,
}

impl Converter {
    /// Converter that only uses the direct engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Try `external` before falling back to the direct engine
    pub fn with_external(mut self, external: Box<dyn ExternalConverter>) -> Self {
        self.external = Some(external);
        self
    }

    pub fn external(&self) -> Option<&dyn ExternalConverter> {
        self.external.as_deref()
    }

    /// Detect, and if needed convert, the book at `input` into `output`.
    ///
    /// Returns [`Outcome::AlreadyHorizontal`] without touching the filesystem
    /// when no vertical signal is found. External converter failures are
    /// logged and answered with the direct engine; only direct-engine errors
    /// are returned.
    pub fn orchestrate(&self, input: &Path, output: &Path) -> Result<Outcome> {
        let verdict = detect_path(input)?;
        if !verdict.needs_conversion() {
            tracing::info!("{} is already horizontal", input.display());
            return Ok(Outcome::AlreadyHorizontal(verdict));
        }

        tracing::info!(
            "Detected: vertical_css={}, rtl_spine={}",
            verdict.has_vertical_css(),
            verdict.has_rtl_spine()
        );

        if let Some(external) = self.external() {
            match convert_external(external, input, output) {
                Ok(()) => {
                    tracing::info!("Converted ({}): {}", external.name(), output.display());
                    return Ok(Outcome::Converted {
                        verdict,
                        output: output.to_path_buf(),
                        engine: Engine::External(external.name().to_string()),
                    });
                }
                Err(e) => tracing::warn!(
                    "{} failed, falling back to direct conversion: {}",
                    external.name(),
                    e
                ),
            }
        }

        convert_direct(input, output)?;
        Ok(Outcome::Converted {
            verdict,
            output: output.to_path_buf(),
            engine: Engine::Direct,
        })
    }
}

/// Convert an archive with the direct engine, writing the result to `writer`.
///
/// Strips the spine direction from the package document, rewrites writing
/// modes and punctuation in every CSS and (X)HTML entry, and repackages with
/// the original entry order.
pub fn convert_archive<R, W>(epub: &mut EpubArchive<R>, writer: W) -> Result<W>
where
    R: Read + Seek,
    W: Write + Seek,
{
    transform(epub, writer, true)
}

/// Direct-engine conversion from `input` to `output`.
///
/// `output` only appears once the archive is complete.
pub fn convert_direct(input: &Path, output: &Path) -> Result<()> {
    transform_file(input, output, true)?;
    tracing::info!("Converted (direct): {}", output.display());
    Ok(())
}

/// Strip the spine direction of `input` into `output`, leaving content files alone.
///
/// Used on archives produced by an external converter.
pub fn fix_spine_direction(input: &Path, output: &Path) -> Result<()> {
    transform_file(input, output, false)
}

/// `<dir>/<stem>_horizontal.<ext>` for an input path
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{OUTPUT_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{OUTPUT_SUFFIX}"),
    };
    input.with_file_name(name)
}

fn convert_external(
    external: &dyn ExternalConverter,
    input: &Path,
    output: &Path,
) -> std::result::Result<(), ExternalError> {
    let work_dir = tempfile::Builder::new().prefix("hengpai-ext-").tempdir()?;
    let converted = external.convert(input, work_dir.path())?;
    fix_spine_direction(&converted, output).map_err(ExternalError::PostProcess)
}

fn transform_file(input: &Path, output: &Path, content: bool) -> Result<()> {
    let mut epub = EpubArchive::open(input)?;
    write_atomically(output, |file| {
        transform(&mut epub, BufWriter::new(file), content)?
            .into_inner()
            .map_err(|e| e.into_error())?;
        Ok(())
    })
}

fn transform<R, W>(epub: &mut EpubArchive<R>, writer: W, content: bool) -> Result<W>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let working = WorkingSet::extract(epub)?;

    if working.rewrite_entry(working.package_document(), strip_spine_direction)? {
        tracing::debug!(
            "Removed page-progression-direction from {}",
            working.package_document()
        );
    }

    if content {
        let mut rewritten = 0;
        for name in working.entries().iter().filter(|name| is_rewrite_target(name)) {
            if working.rewrite_entry(name, rewrite_content)? {
                rewritten += 1;
            }
        }
        tracing::debug!("Rewrote {} content files", rewritten);
    }

    Ok(working.repackage(writer)?)
}
