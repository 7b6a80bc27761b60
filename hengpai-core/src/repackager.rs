//! EPUB archive serialization
//!
//! The EPUB container requires `mimetype` to be the first entry and to be
//! stored uncompressed, so reading systems can sniff the type at a fixed
//! offset. Every other entry is deflated and keeps its original position.

use crate::error::{RepackageError, Result};
use crate::package::{EPUB_MIMETYPE, MIMETYPE_PATH};
use crate::working_set::entry_path;
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write the files under `root` into an EPUB archive.
///
/// `entry_order` is the entry list of the source archive. Every name in it
/// must exist under `root`. A source without a `mimetype` entry gets the
/// canonical one.
pub fn repackage<W: Write + Seek>(
    root: &Path,
    entry_order: &[String],
    writer: W,
) -> std::result::Result<W, RepackageError> {
    let mut zip = ZipWriter::new(writer);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MIMETYPE_PATH, stored)?;
    if entry_order.iter().any(|name| name == MIMETYPE_PATH) {
        let mimetype = read_entry(root, MIMETYPE_PATH)?;
        zip.write_all(&mimetype)?;
    } else {
        tracing::warn!("Source archive has no mimetype entry; writing {}", EPUB_MIMETYPE);
        zip.write_all(EPUB_MIMETYPE.as_bytes())?;
    }

    for name in entry_order.iter().filter(|name| *name != MIMETYPE_PATH) {
        if name.ends_with('/') {
            if !entry_path(root, name)?.is_dir() {
                return Err(RepackageError::MissingEntry(name.clone()));
            }
            zip.add_directory(name.as_str(), deflated)?;
            continue;
        }

        let data = read_entry(root, name)?;
        zip.start_file(name.as_str(), deflated)?;
        zip.write_all(&data)?;
    }

    Ok(zip.finish()?)
}

/// Repackage `root` into the file at `output`.
///
/// The archive is assembled in a temporary file beside `output` and renamed
/// into place only once it is complete.
pub fn repackage_to_path(root: &Path, entry_order: &[String], output: &Path) -> Result<()> {
    write_atomically(output, |file| {
        repackage(root, entry_order, BufWriter::new(file))?
            .into_inner()
            .map_err(|e| e.into_error())?;
        Ok(())
    })
}

/// Run `write` against a temporary file and persist it as `output` on success.
///
/// On error the temporary file is deleted and `output` is left untouched.
pub fn write_atomically<F>(output: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = temp_file_builder().tempfile_in(dir)?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(output).map_err(|e| e.error)?;
    Ok(())
}

/// Temp files default to owner-only access; request the mode a plain
/// `File::create` gets so the process umask applies as usual.
fn temp_file_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".hengpai-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

fn read_entry(root: &Path, name: &str) -> std::result::Result<Vec<u8>, RepackageError> {
    let path = entry_path(root, name)?;
    fs::read(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RepackageError::MissingEntry(name.to_string()),
        _ => RepackageError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn populate(root: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn names(data: Vec<u8>) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_mimetype_first_and_stored() {
        let dir = tempfile::tempdir().unwrap();
        populate(
            dir.path(),
            &[
                ("mimetype", "application/epub+zip"),
                ("OEBPS/content.opf", "<package/>"),
            ],
        );
        // Source listed mimetype last
        let order = vec!["OEBPS/content.opf".to_string(), "mimetype".to_string()];

        let data = repackage(dir.path(), &order, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();

        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        let mut content = String::new();
        first.read_to_string(&mut content).unwrap();
        assert_eq!(content, "application/epub+zip");
        drop(first);

        let second = archive.by_index(1).unwrap();
        assert_eq!(second.name(), "OEBPS/content.opf");
        assert_eq!(second.compression(), CompressionMethod::Deflated);
    }

    #[test]
    fn test_preserves_entry_order() {
        let dir = tempfile::tempdir().unwrap();
        populate(
            dir.path(),
            &[
                ("mimetype", "application/epub+zip"),
                ("z.css", "a"),
                ("a.xhtml", "b"),
                ("m/n.opf", "c"),
            ],
        );
        let order: Vec<String> = ["mimetype", "z.css", "m/", "m/n.opf", "a.xhtml"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let data = repackage(dir.path(), &order, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        assert_eq!(names(data), order);
    }

    #[test]
    fn test_synthesizes_missing_mimetype() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), &[("content.opf", "<package/>")]);
        let order = vec!["content.opf".to_string()];

        let data = repackage(dir.path(), &order, Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        assert_eq!(names(data), vec!["mimetype", "content.opf"]);
    }

    #[test]
    fn test_missing_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), &[("mimetype", "application/epub+zip")]);
        let order = vec!["mimetype".to_string(), "OEBPS/gone.xhtml".to_string()];

        match repackage(dir.path(), &order, Cursor::new(Vec::new())) {
            Err(RepackageError::MissingEntry(name)) => assert_eq!(name, "OEBPS/gone.xhtml"),
            other => panic!("Expected missing entry error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_failed_write_leaves_no_output() {
        let source = tempfile::tempdir().unwrap();
        populate(source.path(), &[("mimetype", "application/epub+zip")]);
        let order = vec!["mimetype".to_string(), "missing.css".to_string()];

        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("book.epub");
        assert!(repackage_to_path(source.path(), &order, &output).is_err());
        assert!(!output.exists());
        assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_output_has_regular_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let out_dir = tempfile::tempdir().unwrap();
        let reference = out_dir.path().join("reference");
        File::create(&reference).unwrap();
        let output = out_dir.path().join("book.epub");

        write_atomically(&output, |file| Ok(file.write_all(b"data")?)).unwrap();

        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&output), mode(&reference));
    }

    #[test]
    fn test_repackage_to_path() {
        let source = tempfile::tempdir().unwrap();
        populate(
            source.path(),
            &[("mimetype", "application/epub+zip"), ("a.css", "body {}")],
        );
        let order = vec!["mimetype".to_string(), "a.css".to_string()];

        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("book.epub");
        repackage_to_path(source.path(), &order, &output).unwrap();
        assert_eq!(names(fs::read(&output).unwrap()), order);
    }
}
