//! Scoped extraction area for a conversion
//!
//! A [`WorkingSet`] holds every entry of a source archive as a file under a
//! private temporary directory, together with the original entry order and
//! the package-document path. The directory is removed when the working set
//! is dropped, whichever way the conversion ends.

use crate::error::{HengpaiError, RepackageError, Result};
use crate::package::{decode_lossy, EpubArchive};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;

/// Extracted archive contents awaiting rewrite and repackaging
pub struct WorkingSet {
    dir: TempDir,
    entries: Vec<String>,
    package_document: String,
}

impl WorkingSet {
    /// Extract every entry of `epub` into a fresh temporary directory.
    ///
    /// Fails before anything is written if the package document cannot be
    /// located, and with [`HengpaiError::MissingPackageDocument`] if the
    /// archive does not contain it.
    pub fn extract<R: Read + Seek>(epub: &mut EpubArchive<R>) -> Result<Self> {
        Self::extract_in(epub, &std::env::temp_dir())
    }

    /// Like [`WorkingSet::extract`], with the temporary directory created under `parent`
    pub fn extract_in<R: Read + Seek>(epub: &mut EpubArchive<R>, parent: &Path) -> Result<Self> {
        let package_document = epub.locate_package_document()?;
        let dir = tempfile::Builder::new()
            .prefix("hengpai-")
            .tempdir_in(parent)?;

        let mut entries = Vec::with_capacity(epub.len());
        let mut seen = HashSet::new();
        for i in 0..epub.archive.len() {
            let mut file = epub.archive.by_index(i)?;
            let name = file.name().to_string();
            let target = entry_path(dir.path(), &name)?;

            if file.is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&target)?;
                io::copy(&mut file, &mut out)?;
            }

            // Later duplicates overwrite the file but keep the first position
            if seen.insert(name.clone()) {
                entries.push(name);
            }
        }

        if !entries.contains(&package_document) {
            return Err(HengpaiError::MissingPackageDocument(package_document));
        }

        tracing::debug!(
            "Extracted {} entries to {}",
            entries.len(),
            dir.path().display()
        );

        Ok(Self {
            dir,
            entries,
            package_document,
        })
    }

    /// Root of the extraction directory
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Entry names in original archive order
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Path of the package document inside the archive
    pub fn package_document(&self) -> &str {
        &self.package_document
    }

    /// Filesystem location of an entry
    pub fn path_of(&self, name: &str) -> std::result::Result<PathBuf, RepackageError> {
        entry_path(self.root(), name)
    }

    /// Apply `rewrite` to an entry's text and write it back if it changed.
    ///
    /// Returns whether the entry was modified. Invalid UTF-8 is replaced
    /// before rewriting; untouched entries keep their original bytes.
    pub fn rewrite_entry<F>(&self, name: &str, rewrite: F) -> Result<bool>
    where
        F: for<'a> FnOnce(&'a str) -> Cow<'a, str>,
    {
        let path = self.path_of(name)?;
        let bytes = fs::read(&path)?;
        let lossy = std::str::from_utf8(&bytes).is_err();
        let text = decode_lossy(bytes);

        match rewrite(&text) {
            Cow::Borrowed(_) => Ok(false),
            Cow::Owned(rewritten) if rewritten == text => Ok(false),
            Cow::Owned(rewritten) => {
                if lossy {
                    tracing::warn!("{} is not valid UTF-8; invalid bytes were replaced", name);
                }
                let mut file = File::create(&path)?;
                file.write_all(rewritten.as_bytes())?;
                tracing::debug!("Rewrote {}", name);
                Ok(true)
            }
        }
    }

    /// Serialize the working set into an EPUB archive
    pub fn repackage<W: Write + Seek>(&self, writer: W) -> std::result::Result<W, RepackageError> {
        crate::repackager::repackage(self.root(), &self.entries, writer)
    }
}

/// Resolve an entry name under `root`, rejecting names that escape it
pub(crate) fn entry_path(root: &Path, name: &str) -> std::result::Result<PathBuf, RepackageError> {
    let mut normalized = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(RepackageError::UnsafePath(name.to_string()));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(RepackageError::UnsafePath(name.to_string()));
    }

    Ok(root.join(normalized))
}
