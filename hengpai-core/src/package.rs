//! EPUB archive access
//!
//! An EPUB is a ZIP container whose package document (OPF) is found through
//! the pointer file `META-INF/container.xml`. The OPF location differs between
//! producers, so it is always discovered and never guessed.

use crate::error::{ContainerError, HengpaiError, Result};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Name of the mandatory first entry
pub const MIMETYPE_PATH: &str = "mimetype";

/// Content of the `mimetype` entry
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// Pointer file naming the package document
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

const CONTAINER_NS: &[u8] = b"urn:oasis:names:tc:opendocument:xmlns:container";

/// Upper bound on the buffer reserved from an entry's declared size
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Suffixes of entries whose text is rewritten during conversion
const REWRITE_SUFFIXES: [&str; 4] = [".css", ".xhtml", ".html", ".htm"];

/// An EPUB archive opened for reading
pub struct EpubArchive<R> {
    pub(crate) archive: ZipArchive<R>,
}

impl EpubArchive<BufReader<File>> {
    /// Open an EPUB file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> EpubArchive<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    /// Number of entries in the archive
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Entry names in the order they appear in the archive
    pub fn entry_names(&mut self) -> Result<Vec<String>> {
        (0..self.archive.len())
            .map(|i| Ok(self.archive.by_index_raw(i)?.name().to_string()))
            .collect()
    }

    /// Read an entry's bytes, or `None` if the archive has no such entry
    pub fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.archive.by_name(name) {
            Ok(mut file) => {
                // Header sizes are untrusted; cap the preallocation
                let hint = file.size().min(MAX_PREALLOCATION) as usize;
                let mut data = Vec::with_capacity(hint);
                file.read_to_end(&mut data)?;
                Ok(Some(data))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read an entry as text, replacing invalid UTF-8 sequences
    pub fn read_text(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.read_entry(name)?.map(decode_lossy))
    }

    /// Find the package document path through `META-INF/container.xml`
    pub fn locate_package_document(&mut self) -> Result<String> {
        let container = self
            .read_entry(CONTAINER_PATH)?
            .ok_or(ContainerError::Missing)?;
        let xml = std::str::from_utf8(&container)
            .map_err(|e| ContainerError::Unparsable(e.to_string()))?;
        Ok(parse_container(xml)?)
    }

    /// Locate and read the package document, returning `(path, text)`
    pub fn read_package_document(&mut self) -> Result<(String, String)> {
        let path = self.locate_package_document()?;
        let text = self
            .read_text(&path)?
            .ok_or_else(|| HengpaiError::MissingPackageDocument(path.clone()))?;
        Ok((path, text))
    }
}

/// Extract the first `rootfile/@full-path` from a container document.
///
/// Only `rootfile` elements bound to the OASIS container namespace count,
/// whatever prefix the document uses for it.
pub fn parse_container(xml: &str) -> std::result::Result<String, ContainerError> {
    let mut reader = NsReader::from_str(xml);

    loop {
        match reader.read_resolved_event() {
            Ok((ResolveResult::Bound(Namespace(ns)), Event::Start(e) | Event::Empty(e)))
                if ns == CONTAINER_NS && e.local_name().as_ref() == b"rootfile" =>
            {
                let attr = e
                    .try_get_attribute("full-path")
                    .map_err(|err| ContainerError::Unparsable(err.to_string()))?
                    .ok_or(ContainerError::NoRootfile)?;
                let full_path = attr
                    .unescape_value()
                    .map_err(|err| ContainerError::Unparsable(err.to_string()))?;
                if full_path.is_empty() {
                    return Err(ContainerError::NoRootfile);
                }
                return Ok(full_path.into_owned());
            }
            Ok((_, Event::Eof)) => return Err(ContainerError::NoRootfile),
            Ok(_) => {}
            Err(e) => return Err(ContainerError::Unparsable(e.to_string())),
        }
    }
}

/// Whether the layout detector scans this entry for writing-mode declarations
pub fn is_detection_target(name: &str) -> bool {
    is_rewrite_target(name) || name.ends_with(".xml")
}

/// Whether conversion rewrites this entry's text
pub fn is_rewrite_target(name: &str) -> bool {
    REWRITE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

pub(crate) fn decode_lossy(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
