//! Batch conversion command implementation

use anyhow::{bail, Context, Result};
use hengpai_core::{default_output_path, Converter, Outcome};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Convert every EPUB in a directory
pub fn batch(
    input_dir: &Path,
    output_dir: &Path,
    jobs: usize,
    direct: bool,
    calibre_debug: Option<PathBuf>,
) -> Result<()> {
    // Ensure output directory exists
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    // Find all EPUB files
    let mut files: Vec<_> = fs::read_dir(input_dir)
        .with_context(|| format!("Failed to read {}", input_dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("epub"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        println!("No EPUB files found in {}", input_dir.display());
        return Ok(());
    }

    println!("Found {} files to check", files.len());

    let converter = super::build_converter(direct, calibre_debug);

    // Set up progress tracking
    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
            .progress_chars("##-"),
    );

    let converted_count = AtomicUsize::new(0);
    let skipped_count = AtomicUsize::new(0);
    let error_count = AtomicUsize::new(0);

    // Configure thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()
        .ok(); // Ignore if already configured

    // Process files in parallel
    files.par_iter().for_each(|file_path| {
        match process_file(&converter, file_path, output_dir) {
            Ok(Outcome::AlreadyHorizontal(_)) => {
                skipped_count.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Skipped {:?}: already horizontal", file_path);
            }
            Ok(Outcome::Converted { output, .. }) => {
                converted_count.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Converted {:?} -> {:?}", file_path, output);
            }
            Err(e) => {
                error_count.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Failed to convert {:?}: {:#}", file_path, e);
            }
        }

        overall_pb.inc(1);
    });

    overall_pb.finish();

    let converted = converted_count.load(Ordering::Relaxed);
    let skipped = skipped_count.load(Ordering::Relaxed);
    let errors = error_count.load(Ordering::Relaxed);

    println!("\nBatch conversion complete:");
    println!("  Converted: {}", converted);
    println!("  Skipped:   {}", skipped);
    println!("  Errors:    {}", errors);

    if errors > 0 {
        bail!("Batch conversion completed with {} errors", errors);
    }

    Ok(())
}

fn process_file(converter: &Converter, input_path: &Path, output_dir: &Path) -> Result<Outcome> {
    let file_name = default_output_path(input_path)
        .file_name()
        .map(|name| name.to_owned())
        .context("Could not determine output filename from input")?;
    let output = output_dir.join(file_name);

    Ok(converter.orchestrate(input_path, &output)?)
}
