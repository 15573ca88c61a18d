//! bibite-repair - fixes Bibites saves broken by the 0.6.0.1 conversion
//!
//! Unpacks a save archive, patches the bibite records if the scene version
//! is 0.6.0.1, and packs everything into `<name>_modified.zip`.

pub mod archive;
pub mod config;
pub mod encoding;
pub mod error;
pub mod gui;
pub mod paths;
pub mod repair;

pub use config::{ConfigError, RepairConfig, WorkspaceMode};
pub use error::RepairError;
pub use repair::{inspect_save, repair_save, RepairOutcome, SaveInfo};
