use crate::config::Overrides;
use crate::models::DynamicUpdate;
use clap::Parser;
use std::path::PathBuf;

/// Unattended in-place OS upgrade: keeps the machine awake, optionally applies
/// pending updates, runs setup silently and restores power settings afterwards.
#[derive(Debug, Parser)]
#[command(name = "inplace_upgrade", version, about)]
pub struct Cli {
    /// Image file (.iso) or directory containing setup.exe.
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Installer dynamic update mode.
    #[arg(long, value_enum)]
    pub dynamic_update: Option<DynamicUpdate>,

    /// Search for and install pending updates before upgrading.
    #[arg(long, conflicts_with = "skip_updates")]
    pub run_updates: bool,

    /// Go straight to the OS upgrade.
    #[arg(long)]
    pub skip_updates: bool,

    /// Include driver updates in the update phase.
    #[arg(long)]
    pub include_drivers: bool,

    /// Directory removed after a fully successful upgrade.
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let run_updates = if self.run_updates {
            Some(true)
        } else if self.skip_updates {
            Some(false)
        } else {
            None
        };
        Overrides {
            source: self.source.clone(),
            dynamic_update: self.dynamic_update,
            run_updates,
            include_drivers: self.include_drivers.then_some(true),
            staging_dir: self.staging_dir.clone(),
        }
    }
}
