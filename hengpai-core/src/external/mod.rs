//! External converters that can take over the text conversion

mod calibre;

pub use calibre::CalibrePlugin;

use crate::error::ExternalError;
use std::path::{Path, PathBuf};

/// A converter living outside this crate, such as a desktop application plugin.
///
/// Failures are returned, never raised; the orchestrator answers every error
/// by running the direct engine instead.
pub trait ExternalConverter: Send + Sync {
    /// Name used in logs and conversion reports
    fn name(&self) -> &str;

    /// Convert `input`, writing any output into `work_dir`.
    ///
    /// Returns the path of the converted archive, which must live under
    /// `work_dir`.
    fn convert(&self, input: &Path, work_dir: &Path) -> Result<PathBuf, ExternalError>;
}
