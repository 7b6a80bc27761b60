//! Error types for Hengpai Core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using HengpaiError
pub type Result<T> = std::result::Result<T, HengpaiError>;

/// Top-level error type for all Hengpai operations
#[derive(Debug, Error)]
pub enum HengpaiError {
    #[error("Malformed container: {0}")]
    MalformedContainer(#[from] ContainerError),

    #[error("Package document not found in archive: {0}")]
    MissingPackageDocument(String),

    #[error("Repackage error: {0}")]
    Repackage(#[from] RepackageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while resolving `META-INF/container.xml`
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("META-INF/container.xml is missing")]
    Missing,

    #[error("container.xml is not well-formed: {0}")]
    Unparsable(String),

    #[error("container.xml has no rootfile with a full-path attribute")]
    NoRootfile,
}

/// Errors that occur while writing the output archive
#[derive(Debug, Error)]
pub enum RepackageError {
    #[error("Entry missing from working set: {0}")]
    MissingEntry(String),

    #[error("Entry path escapes the working set: {0}")]
    UnsafePath(String),

    #[error("Zip write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by an external converter.
///
/// These never abort a conversion; the orchestrator logs them and falls back
/// to the direct engine.
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("Converter executable not found: {0}")]
    NotFound(PathBuf),

    #[error("Converter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Converter produced no EPUB output")]
    NoOutput,

    #[error("Post-processing converter output failed: {0}")]
    PostProcess(#[source] HengpaiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
