//! bibite-repair - fixes Bibites saves broken by the 0.6.0.1 conversion

use anyhow::{Context, Result};
use bibite_repair::gui::{self, Settings};
use bibite_repair::repair::{self, validate_selection, StdoutSink};
use bibite_repair::{paths, RepairConfig, RepairError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bibite-repair")]
#[command(version)]
#[command(about = "Repairs Bibites save archives broken by the 0.6.0.1 migration")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair a save archive, writing <name>_modified.zip next to it
    Repair {
        /// Path to the save .zip file
        archive: PathBuf,

        /// Extract into this fixed directory instead of a temporary one.
        /// The directory is cleared first and kept if the repair fails.
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Use the fixed temp_zip_extraction directory next to the executable
        #[arg(long, conflicts_with = "workspace")]
        legacy_workspace: bool,
    },

    /// Show the version and contents of a save archive without changing it
    Info {
        /// Path to the save .zip file
        archive: PathBuf,
    },

    /// Open the repair window (default)
    Gui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Repair {
            archive,
            workspace,
            legacy_workspace,
        } => {
            init_console_logging(cli.verbose)?;

            let archive = validate_selection(&archive).unwrap_or_else(|e| exit_with(e));

            let config = match (workspace, legacy_workspace) {
                (Some(dir), _) => RepairConfig::with_fixed_workspace(dir),
                (None, true) => RepairConfig::with_fixed_workspace(paths::legacy_workspace_dir()),
                (None, false) => RepairConfig::default(),
            };

            match repair::repair_save(&archive, &config, &mut StdoutSink) {
                Ok(outcome) => {
                    println!();
                    println!("=== Repair Summary ===");
                    println!("Version:        {}", outcome.version);
                    println!("Bibites fixed:  {}", outcome.patched.len());
                    println!("Files written:  {}", outcome.files_written);
                    println!("Output:         {}", outcome.output_path.display());
                }
                Err(e) => {
                    tracing::error!("Repair failed: {:?}", e);
                    exit_with(e);
                }
            }
        }

        Commands::Info { archive } => {
            init_console_logging(cli.verbose)?;

            let archive = validate_selection(&archive).unwrap_or_else(|e| exit_with(e));
            println!("Reading {}...\n", archive.display());
            let info = repair::inspect_save(&archive).unwrap_or_else(|e| {
                tracing::error!("Reading save failed: {:?}", e);
                exit_with(e)
            });

            println!("=== Save Information ===");
            println!("Version:        {}", info.version);
            println!("Needs repair:   {}", if info.needs_repair { "Yes" } else { "No" });
            println!("Bibites:        {}", info.bibite_count);
            println!("Files:          {}", info.entry_count);
            if info.needs_repair {
                println!("\nRun `bibite-repair repair {}` to fix it.", archive.display());
            }
        }

        Commands::Gui => {
            let _guard = init_file_logging(cli.verbose)?;
            gui::run().map_err(|e| anyhow::anyhow!("Failed to run the repair window: {}", e))?;
        }
    }

    Ok(())
}

/// Print the player-facing message and exit: 2 for a bad selection, 1 otherwise
fn exit_with(error: RepairError) -> ! {
    eprintln!("Error: {}", error.user_message());
    std::process::exit(if error.is_input_error() { 2 } else { 1 });
}

/// Log to stderr, only when verbose or RUST_LOG is set
fn init_console_logging(verbose: bool) -> Result<()> {
    if verbose || std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::from_default_env().add_directive(if verbose {
                "bibite_repair=debug".parse()?
            } else {
                "bibite_repair=warn".parse()?
            }))
            .init();
    }
    Ok(())
}

/// Log to ~/.config/bibite-repair/logs/repair.log while the window is open
fn init_file_logging(verbose: bool) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = Settings::config_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create {:?}", log_dir))?;

    let appender = tracing_appender::rolling::never(&log_dir, "repair.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let level = if verbose { "bibite_repair=debug" } else { "bibite_repair=info" };
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    Ok(guard)
}
