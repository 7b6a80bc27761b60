//! CLI command implementations

mod batch;
mod convert;
mod detect;

pub use batch::batch;
pub use convert::convert;
pub use detect::detect;

use hengpai_core::{CalibrePlugin, Converter};
use std::path::PathBuf;

/// Build a converter, trying the Calibre plugin first unless `direct` is set
fn build_converter(direct: bool, calibre_debug: Option<PathBuf>) -> Converter {
    if direct {
        return Converter::new();
    }

    let plugin = match calibre_debug {
        Some(path) => Some(CalibrePlugin::with_binary(path)),
        None => CalibrePlugin::locate(),
    };

    match plugin {
        Some(plugin) => {
            tracing::info!("Using Calibre: {}", plugin.debug_bin().display());
            Converter::new().with_external(Box::new(plugin))
        }
        None => {
            tracing::debug!("calibre-debug not found, using direct conversion");
            Converter::new()
        }
    }
}
