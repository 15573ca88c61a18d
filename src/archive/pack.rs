//! ZIP creation from a workspace directory.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use super::ArchiveManifest;
use crate::error::RepairError;
use crate::paths;

/// Pack every file under `root` into a new deflate ZIP at `output`
///
/// Entries are named by their path relative to `root` and written in
/// file-name order. The archive is built in a temporary file next to
/// `output` and renamed into place once complete, so a failure never
/// leaves a truncated archive behind. Returns the number of files written.
pub fn write_tree(root: &Path, output: &Path, manifest: &ArchiveManifest) -> Result<usize, RepairError> {
    let output_dir = paths::archive_dir(output);
    let temp = tempfile::Builder::new()
        .prefix(".bibite_repair_")
        .suffix(".zip.part")
        .tempfile_in(&output_dir)
        .map_err(|e| RepairError::io(&output_dir, e))?;

    let mut zip = zip::ZipWriter::new(temp.as_file());
    let mut written = 0;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| RepairError::io(root, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let name = paths::to_entry_name(relative);
        let size = entry
            .metadata()
            .map_err(|e| RepairError::io(entry.path(), e.into()))?
            .len();

        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(size >= u32::MAX as u64);
        if let Some(time) = manifest.modified_time(&name) {
            options = options.last_modified_time(time);
        }

        zip.start_file(name, options)?;
        let mut file = File::open(entry.path()).map_err(|e| RepairError::io(entry.path(), e))?;
        io::copy(&mut file, &mut zip).map_err(|e| RepairError::io(entry.path(), e))?;
        written += 1;
    }

    zip.finish()?;
    temp.persist(output)
        .map_err(|e| RepairError::io(output, e.error))?;

    debug!("Packed {} files from {} into {}", written, root.display(), output.display());
    Ok(written)
}
