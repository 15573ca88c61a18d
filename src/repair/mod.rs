//! Save repair pipeline
//!
//! A repair run goes through these stages, in order:
//! 1. Extract the save archive into a workspace
//! 2. Read the save version from `scene.bb8scene`
//! 3. Patch every bibite record if the version is the broken one
//! 4. Pack the workspace into `<name>_modified.zip` next to the source
//! 5. Remove the workspace
//!
//! Each stage returns `Result<_, RepairError>`; the first failure stops the
//! run and no output archive is produced.

pub mod bibite;
pub mod scene;
pub mod sink;
pub mod workspace;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive;
use crate::config::{RepairConfig, WorkspaceMode};
use crate::error::RepairError;
use crate::paths;

pub use sink::{validate_selection, LogSink, MemorySink, PathSupplier, StdoutSink};
use sink::report;
use workspace::Workspace;

/// The release whose save conversion this tool undoes
pub const BROKEN_VERSION: &str = "0.6.0.1";

/// Whether a save of this version gets its bibites patched
pub fn needs_repair(version: &str) -> bool {
    version == BROKEN_VERSION
}

/// Result of a successful repair run
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// The new `_modified` archive
    pub output_path: PathBuf,
    /// Version read from the scene descriptor
    pub version: String,
    /// File names of the bibite records that were rewritten
    pub patched: Vec<String>,
    /// Number of files packed into the new archive
    pub files_written: usize,
}

/// What a save archive contains, without changing anything
#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub version: String,
    pub needs_repair: bool,
    pub bibite_count: usize,
    pub entry_count: usize,
}

/// Repair a save archive, writing `<name>_modified.zip` next to it
pub fn repair_save(
    archive_path: &Path,
    config: &RepairConfig,
    sink: &mut dyn LogSink,
) -> Result<RepairOutcome, RepairError> {
    config.validate(archive_path)?;

    let workspace = Workspace::create(&config.workspace, archive_path)?;
    info!(
        "Repairing {} in workspace {}",
        archive_path.display(),
        workspace.path().display()
    );

    let outcome = match run_stages(archive_path, workspace.path(), sink) {
        Ok(outcome) => outcome,
        Err(e) => {
            workspace.abandon();
            return Err(e);
        }
    };

    report(sink, "Removing temporary files");
    workspace.cleanup()?;

    report(
        sink,
        &format!("Repair complete! Saved as: {}", outcome.output_path.display()),
    );
    report(sink, "You can now load the hopefully fixed save");

    Ok(outcome)
}

fn run_stages(
    archive_path: &Path,
    workspace: &Path,
    sink: &mut dyn LogSink,
) -> Result<RepairOutcome, RepairError> {
    report(sink, "Extracting ZIP file...");
    let manifest = archive::extract_all(archive_path, workspace)?;

    let version = scene::read_version(workspace)?;
    report(sink, &format!("Save version: {}", version));

    let mut patched = Vec::new();
    if needs_repair(&version) {
        report(sink, "Modifying save files...");
        for path in bibite::bibite_files(workspace)? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            report(sink, &format!("Attempting to fix {}", name));
            bibite::patch_file(&path, sink)?;
            patched.push(name);
        }
    } else {
        debug!("Version {} is not {}, packing unchanged", version, BROKEN_VERSION);
    }

    let output_path = paths::modified_archive_path(archive_path);
    report(sink, "Creating new ZIP file...");
    let files_written = archive::write_tree(workspace, &output_path, &manifest)?;

    Ok(RepairOutcome {
        output_path,
        version,
        patched,
        files_written,
    })
}

/// Inspect a save archive without writing anything next to it
pub fn inspect_save(archive_path: &Path) -> Result<SaveInfo, RepairError> {
    let workspace = Workspace::create(&WorkspaceMode::Scoped, archive_path)?;
    let manifest = archive::extract_all(archive_path, workspace.path())?;
    let version = scene::read_version(workspace.path())?;
    let bibite_count = bibite::bibite_files(workspace.path())?.len();

    Ok(SaveInfo {
        needs_repair: needs_repair(&version),
        version,
        bibite_count,
        entry_count: manifest.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::fs::{self, File};
    use std::io::{Read, Write};
    use tempfile::tempdir;

    fn bibite_json(wag: f64, activation: f64, progress: f64) -> Vec<u8> {
        let mut nodes: Vec<Value> = (0..48).map(|i| json!({"Index": i, "baseActivation": 0.0})).collect();
        nodes[bibite::EGG_PRODUCTION_NODE]["baseActivation"] = json!(activation);
        let record = json!({
            "genes": {"genes": {"MouthMusclesWAG": wag}},
            "brain": {"Nodes": nodes},
            "body": {"eggLayer": {"eggProgress": progress}},
        });
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend(serde_json::to_vec(&record).unwrap());
        bytes
    }

    fn write_save(path: &Path, version: Option<&str>, extra: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        if let Some(version) = version {
            zip.start_file("scene.bb8scene", options).unwrap();
            let scene = format!("\u{feff}{{\"version\": \"{}\", \"zoom\": 1.5}}", version);
            zip.write_all(scene.as_bytes()).unwrap();
        }
        for (name, data) in extra {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn read_zip(path: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entries = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            entries.insert(entry.name().to_string(), data);
        }
        entries
    }

    fn leftover_workspaces(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".bibite_repair_"))
            .count()
    }

    #[test]
    fn test_repair_broken_save() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        let bibite = bibite_json(0.00025, 0.1, 0.0);
        write_save(
            &save,
            Some(BROKEN_VERSION),
            &[
                ("bibites/bibite_0.bb8", bibite.as_slice()),
                ("pellets/pellets.bb8", b"{\"count\": 2}"),
                ("settings.bb8settings", b"\xEF\xBB\xBF{}"),
            ],
        );

        let mut sink = MemorySink::default();
        let outcome = repair_save(&save, &RepairConfig::default(), &mut sink)?;

        assert_eq!(outcome.output_path, dir.path().join("world_modified.zip"));
        assert_eq!(outcome.version, BROKEN_VERSION);
        assert_eq!(outcome.patched, vec!["bibite_0.bb8".to_string()]);
        assert_eq!(outcome.files_written, 4);

        let before = read_zip(&save);
        let after = read_zip(&outcome.output_path);
        assert_eq!(
            before.keys().collect::<Vec<_>>(),
            after.keys().collect::<Vec<_>>()
        );
        for name in ["scene.bb8scene", "pellets/pellets.bb8", "settings.bb8settings"] {
            assert_eq!(before[name], after[name], "{} changed", name);
        }

        let fixed = &after["bibites/bibite_0.bb8"];
        assert!(fixed.starts_with(b"\xEF\xBB\xBF"));
        let record: Value = serde_json::from_slice(&fixed[3..])?;
        assert_eq!(record["genes"]["genes"]["MouthMusclesWAG"], json!(2.5));
        assert_eq!(record["brain"]["Nodes"][35]["baseActivation"], json!(0.5));
        assert_eq!(record["body"]["eggLayer"]["eggProgress"], json!(1.0));

        assert_eq!(leftover_workspaces(dir.path()), 0);
        Ok(())
    }

    #[test]
    fn test_progress_messages_in_order() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        let bibite = bibite_json(0.5, 0.0, 0.2);
        write_save(&save, Some(BROKEN_VERSION), &[("bibites/b.bb8", bibite.as_slice())]);

        let mut sink = MemorySink::default();
        repair_save(&save, &RepairConfig::default(), &mut sink)?;

        let expected = vec![
            "Extracting ZIP file...".to_string(),
            "Save version: 0.6.0.1".to_string(),
            "Modifying save files...".to_string(),
            "Attempting to fix b.bb8".to_string(),
            "Increasing Jaw Muscles WAG by removing the e-".to_string(),
            "Increasing Egg Production node by 0.4".to_string(),
            "Increasing egg Progress by 1 if it is 0.0".to_string(),
            "Creating new ZIP file...".to_string(),
            "Removing temporary files".to_string(),
            format!(
                "Repair complete! Saved as: {}",
                dir.path().join("world_modified.zip").display()
            ),
            "You can now load the hopefully fixed save".to_string(),
        ];
        assert_eq!(sink.lines, expected);
        Ok(())
    }

    #[test]
    fn test_other_version_is_plain_copy() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        let bibite = bibite_json(0.00025, 0.1, 0.0);
        write_save(&save, Some("0.7.0.0"), &[("bibites/bibite_0.bb8", bibite.as_slice())]);

        let mut sink = MemorySink::default();
        let outcome = repair_save(&save, &RepairConfig::default(), &mut sink)?;

        assert!(outcome.patched.is_empty());
        assert_eq!(read_zip(&save), read_zip(&outcome.output_path));
        assert!(!sink.lines.iter().any(|l| l == "Modifying save files..."));
        Ok(())
    }

    #[test]
    fn test_missing_version_is_unknown() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        write_save(&save, None, &[("scene.bb8scene", b"{\"zoom\": 1}")]);

        let outcome = repair_save(&save, &RepairConfig::default(), &mut MemorySink::default())?;
        assert_eq!(outcome.version, scene::UNKNOWN_VERSION);
        Ok(())
    }

    #[test]
    fn test_broken_save_without_bibites_folder() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("empty.zip");
        write_save(&save, Some(BROKEN_VERSION), &[]);

        let outcome = repair_save(&save, &RepairConfig::default(), &mut MemorySink::default())?;
        assert!(outcome.patched.is_empty());
        assert_eq!(outcome.files_written, 1);
        Ok(())
    }

    #[test]
    fn test_missing_scene_produces_no_output() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        write_save(&save, None, &[("bibites/a.bb8", b"{}")]);

        let result = repair_save(&save, &RepairConfig::default(), &mut MemorySink::default());
        assert!(matches!(result, Err(RepairError::SceneNotFound)));
        assert!(!dir.path().join("world_modified.zip").exists());
        assert_eq!(leftover_workspaces(dir.path()), 0);
        Ok(())
    }

    #[test]
    fn test_malformed_bibite_produces_no_output() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        write_save(&save, Some(BROKEN_VERSION), &[("bibites/a.bb8", b"{ nope")]);

        let result = repair_save(&save, &RepairConfig::default(), &mut MemorySink::default());
        assert!(matches!(result, Err(RepairError::EntityMalformed { .. })));
        assert!(!dir.path().join("world_modified.zip").exists());
        Ok(())
    }

    #[test]
    fn test_not_a_zip() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        fs::write(&save, b"plain text pretending to be a save")?;

        let result = repair_save(&save, &RepairConfig::default(), &mut MemorySink::default());
        let err = result.unwrap_err();
        assert!(matches!(err, RepairError::NotAZip { .. }));
        assert_eq!(err.user_message(), "The selected file is not a valid ZIP file.");
        Ok(())
    }

    #[test]
    fn test_fixed_workspace_kept_on_failure() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        write_save(&save, Some(BROKEN_VERSION), &[("bibites/a.bb8", b"[]")]);
        let work = dir.path().join("work");

        let config = RepairConfig::with_fixed_workspace(&work);
        let result = repair_save(&save, &config, &mut MemorySink::default());

        assert!(matches!(result, Err(RepairError::Entity { .. })));
        assert!(work.join("scene.bb8scene").is_file());
        Ok(())
    }

    #[test]
    fn test_fixed_workspace_removed_on_success() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        write_save(&save, Some("0.7.0.0"), &[]);
        let work = dir.path().join("work");

        let config = RepairConfig::with_fixed_workspace(&work);
        repair_save(&save, &config, &mut MemorySink::default())?;
        assert!(!work.exists());
        Ok(())
    }

    #[test]
    fn test_inspect_save() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let save = dir.path().join("world.zip");
        let bibite = bibite_json(1.0, 0.0, 0.0);
        write_save(
            &save,
            Some(BROKEN_VERSION),
            &[
                ("bibites/a.bb8", bibite.as_slice()),
                ("bibites/b.bb8", bibite.as_slice()),
            ],
        );

        let info = inspect_save(&save)?;
        assert_eq!(info.version, BROKEN_VERSION);
        assert!(info.needs_repair);
        assert_eq!(info.bibite_count, 2);
        assert_eq!(info.entry_count, 3);
        assert!(!dir.path().join("world_modified.zip").exists());
        assert_eq!(leftover_workspaces(dir.path()), 0);
        Ok(())
    }

    #[test]
    fn test_needs_repair_exact_match() {
        assert!(needs_repair("0.6.0.1"));
        assert!(!needs_repair("0.6.0.1 "));
        assert!(!needs_repair("0.6.0"));
        assert!(!needs_repair(scene::UNKNOWN_VERSION));
    }
}
