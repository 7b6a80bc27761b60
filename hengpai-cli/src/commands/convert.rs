//! Convert command implementation

use anyhow::{bail, Context, Result};
use hengpai_core::{default_output_path, Engine, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Convert a vertical EPUB to horizontal layout
pub fn convert(
    input: &Path,
    output: Option<&Path>,
    direct: bool,
    calibre_debug: Option<PathBuf>,
) -> Result<()> {
    if !input.is_file() {
        bail!("File not found: {}", input.display());
    }

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    let converter = super::build_converter(direct, calibre_debug);

    // Set up progress bar with animation
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Converting {}...", input.display()));

    let outcome = converter
        .orchestrate(input, &output)
        .with_context(|| format!("Failed to convert {}", input.display()));
    pb.finish_and_clear();

    match outcome? {
        Outcome::AlreadyHorizontal(_) => {
            println!("Already horizontal, no conversion needed.");
        }
        Outcome::Converted {
            verdict,
            output,
            engine,
        } => {
            println!(
                "Detected: vertical_css={}, rtl_spine={}",
                verdict.has_vertical_css(),
                verdict.has_rtl_spine()
            );
            let via = match engine {
                Engine::Direct => "direct".to_string(),
                Engine::External(name) => name,
            };
            println!("Converted ({}): {}", via, output.display());
        }
    }

    Ok(())
}
