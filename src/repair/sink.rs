//! Collaborators the pipeline talks to: where the save path comes from and
//! where progress lines go.

use std::path::PathBuf;

use tracing::info;

use crate::error::RepairError;

/// Receives single-line progress messages from the pipeline
pub trait LogSink {
    fn log(&mut self, message: &str);
}

impl<F: FnMut(&str)> LogSink for F {
    fn log(&mut self, message: &str) {
        self(message)
    }
}

/// Collects progress lines in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl LogSink for MemorySink {
    fn log(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}

/// Prints progress lines to stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn log(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// Send a progress line to the sink, mirrored to tracing
pub(crate) fn report(sink: &mut dyn LogSink, message: &str) {
    info!("{}", message);
    sink.log(message);
}

/// Supplies the save archive the user picked
pub trait PathSupplier {
    fn selected_path(&self) -> Option<PathBuf>;
}

impl PathSupplier for PathBuf {
    fn selected_path(&self) -> Option<PathBuf> {
        Some(self.clone())
    }
}

impl PathSupplier for Option<PathBuf> {
    fn selected_path(&self) -> Option<PathBuf> {
        self.clone()
    }
}

impl PathSupplier for String {
    fn selected_path(&self) -> Option<PathBuf> {
        let trimmed = self.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }
}

/// Check the selection before the pipeline starts
pub fn validate_selection(supplier: &dyn PathSupplier) -> Result<PathBuf, RepairError> {
    let path = supplier
        .selected_path()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(RepairError::NoFileSelected)?;

    if !path.is_file() {
        return Err(RepairError::NotAFile(path));
    }

    Ok(path)
}
