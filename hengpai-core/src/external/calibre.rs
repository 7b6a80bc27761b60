//! Calibre "Chinese Text Conversion" plugin
//!
//! The plugin is driven through `calibre-debug`, which runs a small Python
//! script inside Calibre's environment. It converts the text direction but
//! leaves `page-progression-direction` on the spine, which the orchestrator
//! fixes afterwards.

use super::ExternalConverter;
use crate::error::ExternalError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const CALIBRE_DEBUG: &str = "calibre-debug";

const MACOS_CALIBRE_DEBUG: &str = "/Applications/calibre.app/Contents/MacOS/calibre-debug";

const RUNNER_SCRIPT_NAME: &str = "_plugin_runner.py";

const RUNNER_SCRIPT: &str = "from calibre_plugins.chinese_text.main import main; \
import sys; sys.exit(main(sys.argv[1:], ('cli','0.0')))";

/// Converter backed by Calibre's TradSimpChinese plugin
#[derive(Debug, Clone)]
pub struct CalibrePlugin {
    debug_bin: PathBuf,
}

impl CalibrePlugin {
    /// Use a specific `calibre-debug` executable.
    ///
    /// A bare command name is looked up on `PATH`, like a shell would.
    pub fn with_binary(debug_bin: impl Into<PathBuf>) -> Self {
        let debug_bin = debug_bin.into();
        let debug_bin = if debug_bin.components().count() == 1 {
            search_path(&debug_bin).unwrap_or(debug_bin)
        } else {
            debug_bin
        };
        Self { debug_bin }
    }

    /// Find `calibre-debug` on `PATH` or in the default macOS install location
    pub fn locate() -> Option<Self> {
        search_path(Path::new(CALIBRE_DEBUG))
            .or_else(|| {
                let app = PathBuf::from(MACOS_CALIBRE_DEBUG);
                is_executable(&app).then_some(app)
            })
            .map(Self::with_binary)
    }

    /// Path of the `calibre-debug` executable in use
    pub fn debug_bin(&self) -> &Path {
        &self.debug_bin
    }

    fn command(&self, script: &Path, input: &Path, work_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.debug_bin);
        cmd.arg("-e")
            .arg(script)
            .arg("--")
            .args(["-td", "h", "-up", "-d", "t2t"])
            .arg("-od")
            .arg(work_dir)
            .arg("-f")
            .arg(input);
        cmd
    }
}

impl ExternalConverter for CalibrePlugin {
    fn name(&self) -> &str {
        "calibre"
    }

    fn convert(&self, input: &Path, work_dir: &Path) -> Result<PathBuf, ExternalError> {
        if !is_executable(&self.debug_bin) {
            return Err(ExternalError::NotFound(self.debug_bin.clone()));
        }

        let script = work_dir.join(RUNNER_SCRIPT_NAME);
        fs::write(&script, RUNNER_SCRIPT)?;

        tracing::debug!("Running {} on {}", self.debug_bin.display(), input.display());
        let output = self.command(&script, input, work_dir).output()?;
        if !output.status.success() {
            return Err(ExternalError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        find_epub(work_dir)?.ok_or(ExternalError::NoOutput)
    }
}

/// First `.epub` file directly inside `dir`, by name
fn find_epub(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut epubs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "epub"))
        .collect();
    epubs.sort();
    Ok(epubs.into_iter().next())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// First executable named `name` in the directories of `PATH`
fn search_path(name: &Path) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}
