//! ZIP extraction into a workspace directory.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use tracing::{debug, warn};
use zip::result::ZipError;

use super::ArchiveManifest;
use crate::error::RepairError;
use crate::paths;

/// Extract every entry of a ZIP archive into `dest`
///
/// Entries whose names would land outside `dest` (absolute paths, `..`)
/// are skipped.
pub fn extract_all(archive_path: &Path, dest: &Path) -> Result<ArchiveManifest, RepairError> {
    let file = File::open(archive_path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => RepairError::ArchiveNotFound(archive_path.to_path_buf()),
        _ => RepairError::io(archive_path, e),
    })?;
    let reader = BufReader::new(file);
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| match e {
        ZipError::Io(source) => RepairError::io(archive_path, source),
        other => RepairError::NotAZip {
            path: archive_path.to_path_buf(),
            source: other,
        },
    })?;

    let mut manifest = ArchiveManifest::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| RepairError::io(&out_path, e))?;
            continue;
        }

        paths::ensure_parent_dirs(&out_path).map_err(|e| RepairError::io(&out_path, e))?;
        let mut out = File::create(&out_path).map_err(|e| RepairError::io(&out_path, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| RepairError::io(&out_path, e))?;

        manifest.record(paths::to_entry_name(&relative), entry.last_modified());
    }

    debug!(
        "Extracted {} entries from {} into {}",
        archive.len(),
        archive_path.display(),
        dest.display()
    );
    if manifest.is_empty() {
        warn!("{} has no file entries", archive_path.display());
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_all_preserves_structure() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let zip_path = dir.path().join("save.zip");
        write_zip(
            &zip_path,
            &[
                ("scene.bb8scene", b"{\"version\": \"0.6.0.1\"}"),
                ("bibites/bibite_0.bb8", b"{}"),
            ],
        );

        let dest = dir.path().join("out");
        fs::create_dir(&dest)?;
        let manifest = extract_all(&zip_path, &dest)?;

        assert_eq!(fs::read(dest.join("scene.bb8scene"))?, b"{\"version\": \"0.6.0.1\"}");
        assert_eq!(fs::read(dest.join("bibites/bibite_0.bb8"))?, b"{}");
        assert!(manifest.modified_time("bibites/bibite_0.bb8").is_some());
        Ok(())
    }

    #[test]
    fn test_extract_skips_traversal_entries() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let zip_path = dir.path().join("evil.zip");
        write_zip(&zip_path, &[("../escape.txt", b"nope"), ("ok.txt", b"fine")]);

        let dest = dir.path().join("out");
        fs::create_dir(&dest)?;
        extract_all(&zip_path, &dest)?;

        assert!(dest.join("ok.txt").exists());
        assert!(!dir.path().join("escape.txt").exists());
        Ok(())
    }

    #[test]
    fn test_extract_directories_only() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let zip_path = dir.path().join("hollow.zip");
        let mut zip = zip::ZipWriter::new(File::create(&zip_path)?);
        zip.add_directory("bibites/", zip::write::SimpleFileOptions::default())?;
        zip.finish()?;

        let dest = dir.path().join("out");
        fs::create_dir(&dest)?;
        let manifest = extract_all(&zip_path, &dest)?;

        assert!(manifest.is_empty());
        assert!(dest.join("bibites").is_dir());
        Ok(())
    }

    #[test]
    fn test_extract_not_a_zip() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let bogus = dir.path().join("bogus.zip");
        fs::write(&bogus, b"this is definitely not a zip archive")?;

        let result = extract_all(&bogus, dir.path());
        assert!(matches!(result, Err(RepairError::NotAZip { .. })));
        Ok(())
    }

    #[test]
    fn test_extract_missing_archive() {
        let dir = tempdir().unwrap();
        let result = extract_all(&dir.path().join("missing.zip"), dir.path());
        assert!(matches!(result, Err(RepairError::ArchiveNotFound(_))));
    }
}
