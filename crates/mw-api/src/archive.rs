//! Manifest archive extraction.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::ApiError;

/// Extracts the manifest database from a downloaded archive into `dest_dir`
/// and returns its path.
///
/// The archive is expected to hold a single database file; the first file
/// entry is used. Entry names that would escape `dest_dir` are rejected.
pub fn extract_manifest(archive: &[u8], dest_dir: &Path) -> Result<PathBuf, ApiError> {
    let mut archive = ZipArchive::new(Cursor::new(archive))?;
    fs::create_dir_all(dest_dir)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !entry.is_file() {
            continue;
        }
        let Some(name) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping archive entry with unsafe path");
            continue;
        };
        let Some(file_name) = name.file_name() else {
            continue;
        };
        let path = dest_dir.join(file_name);
        let mut out = File::create(&path)?;
        let written = io::copy(&mut entry, &mut out)?;
        tracing::info!(path = %path.display(), bytes = written, "extracted manifest");
        return Ok(path);
    }

    Err(ApiError::InvalidResponse(
        "manifest archive contains no files".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn archive_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_the_manifest_file() {
        let temp = tempfile::tempdir().unwrap();
        let bytes = archive_with(&[("world_sql_content_abc.content", b"sqlite bytes".as_slice())]);

        let path = extract_manifest(&bytes, &temp.path().join("manifest")).unwrap();
        assert_eq!(path, temp.path().join("manifest/world_sql_content_abc.content"));
        assert_eq!(fs::read(&path).unwrap(), b"sqlite bytes");
    }

    #[test]
    fn empty_archive_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let bytes = archive_with(&[]);

        let err = extract_manifest(&bytes, temp.path()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn garbage_is_an_archive_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = extract_manifest(b"not a zip", temp.path()).unwrap_err();
        assert!(matches!(err, ApiError::Archive(_)));
    }
}
