//! Save archive handling.
//!
//! Extracts a ZIP save into a workspace directory and packs a workspace
//! directory back into a ZIP, using the zip crate for both directions.
//! Entry timestamps read during extraction are carried into the new
//! archive through an [`ArchiveManifest`].

pub mod extract;
pub mod pack;

use std::collections::BTreeMap;

pub use extract::extract_all;
pub use pack::write_tree;

/// Entry metadata recorded while extracting, keyed by entry name
#[derive(Debug, Default, Clone)]
pub struct ArchiveManifest {
    entries: BTreeMap<String, Option<zip::DateTime>>,
}

impl ArchiveManifest {
    /// Record an extracted file entry and its last-modified time
    pub fn record(&mut self, entry_name: String, time: Option<zip::DateTime>) {
        self.entries.insert(entry_name, time);
    }

    /// Last-modified time of an entry, if the source archive had one
    pub fn modified_time(&self, entry_name: &str) -> Option<zip::DateTime> {
        self.entries.get(entry_name).copied().flatten()
    }

    /// Number of file entries extracted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
