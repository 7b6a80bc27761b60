//! Hengpai Core Library
//!
//! Detects Chinese EPUB books typeset for vertical reading (直排) and converts
//! them to horizontal layout (橫排). Conversion rewrites `writing-mode`
//! declarations, strips the right-to-left spine direction and replaces
//! vertical-form punctuation, then repackages the archive as a valid EPUB.

pub mod detector;
pub mod error;
pub mod external;
pub mod orchestrator;
pub mod package;
pub mod punctuation;
pub mod repackager;
pub mod rewriter;
pub mod working_set;

pub use detector::{detect, detect_path, Verdict};
pub use error::{ContainerError, ExternalError, HengpaiError, RepackageError, Result};
pub use external::{CalibrePlugin, ExternalConverter};
pub use orchestrator::{
    convert_archive, convert_direct, default_output_path, fix_spine_direction, Converter, Engine,
    Outcome,
};
pub use package::EpubArchive;
