//! Everything that touches the live machine goes through [`SystemContext`] so
//! the services can run against a fake in tests.

#[cfg(test)]
pub mod fake;
mod windows;

pub use windows::WindowsSystem;

use crate::error::Result;
use crate::models::{
    DownloadReport, InstallReport, MountHandle, PowerSetting, UpdateCriteria, UpdateItem,
};
use std::path::Path;

pub trait SystemContext {
    /// Current idle timeout of the active power scheme, in seconds.
    async fn read_power_timeout(&self, setting: PowerSetting) -> Result<u32>;

    async fn write_power_timeout(&self, setting: PowerSetting, seconds: u32) -> Result<()>;

    async fn search_updates(&self, criteria: &UpdateCriteria) -> Result<Vec<UpdateItem>>;

    async fn download_updates(&self, items: &[UpdateItem]) -> Result<DownloadReport>;

    /// Installs without prompting; only items already downloaded are passed in.
    async fn install_updates(&self, items: &[UpdateItem]) -> Result<InstallReport>;

    /// Mounts the image read-only. The handle is returned even when no drive
    /// root was assigned so the caller can still release it.
    async fn mount_image(&self, image: &Path) -> Result<MountHandle>;

    async fn dismount_image(&self, handle: &MountHandle) -> Result<()>;

    /// Runs the installer to completion and returns its raw exit code.
    async fn run_installer(&self, setup_path: &Path, args: &[String]) -> Result<i32>;
}
