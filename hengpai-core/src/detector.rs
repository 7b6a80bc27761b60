//! Vertical layout detection

use crate::error::Result;
use crate::package::{is_detection_target, EpubArchive};
use crate::rewriter::{has_rtl_spine, has_vertical_writing_mode};
use serde::Serialize;
use std::io::{Read, Seek};
use std::path::Path;

/// Outcome of scanning an archive for vertical-layout signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    has_vertical_css: bool,
    has_rtl_spine: bool,
    needs_conversion: bool,
}

impl Verdict {
    pub fn new(has_vertical_css: bool, has_rtl_spine: bool) -> Self {
        Self {
            has_vertical_css,
            has_rtl_spine,
            needs_conversion: has_vertical_css || has_rtl_spine,
        }
    }

    /// A content file declares a vertical writing mode
    pub fn has_vertical_css(&self) -> bool {
        self.has_vertical_css
    }

    /// The spine declares right-to-left page progression
    pub fn has_rtl_spine(&self) -> bool {
        self.has_rtl_spine
    }

    pub fn needs_conversion(&self) -> bool {
        self.needs_conversion
    }
}

/// Scan an archive for vertical writing signals.
///
/// The package document is checked for an RTL spine, then content files are
/// scanned in archive order until the first vertical writing-mode declaration.
/// Nothing is written.
pub fn detect<R: Read + Seek>(epub: &mut EpubArchive<R>) -> Result<Verdict> {
    let (package_path, package) = epub.read_package_document()?;
    let rtl_spine = has_rtl_spine(&package);

    let mut vertical_css = false;
    for name in epub.entry_names()? {
        if !is_detection_target(&name) {
            continue;
        }
        let Some(text) = epub.read_text(&name)? else {
            continue;
        };
        if has_vertical_writing_mode(&text) {
            tracing::debug!("Vertical writing mode declared in {}", name);
            vertical_css = true;
            break;
        }
    }

    let verdict = Verdict::new(vertical_css, rtl_spine);
    tracing::debug!(
        "Detection for package {}: vertical_css={}, rtl_spine={}",
        package_path,
        verdict.has_vertical_css(),
        verdict.has_rtl_spine()
    );
    Ok(verdict)
}

/// Open the EPUB at `path` and run [`detect`] on it
pub fn detect_path(path: impl AsRef<Path>) -> Result<Verdict> {
    let mut epub = EpubArchive::open(path)?;
    detect(&mut epub)
}
