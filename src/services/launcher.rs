use crate::error::Result;
use crate::models::DynamicUpdate;
use crate::system::SystemContext;
use std::path::{Path, PathBuf};

/// Fixed unattended flag set. Only the dynamic-update mode varies.
pub fn setup_args(dynamic_update: DynamicUpdate, log_dir: &Path) -> Vec<String> {
    vec![
        "/Auto".to_string(),
        "Upgrade".to_string(),
        "/Quiet".to_string(),
        "/EULA".to_string(),
        "accept".to_string(),
        "/NoReboot".to_string(),
        "/DynamicUpdate".to_string(),
        dynamic_update.as_arg().to_string(),
        "/Telemetry".to_string(),
        "Disable".to_string(),
        "/CopyLogs".to_string(),
        log_dir.to_string_lossy().into_owned(),
    ]
}

/// Starts `setup.exe` unattended with its logs copied into `log_dir`.
pub struct UpgradeLauncher<'a, C> {
    ctx: &'a C,
    log_dir: PathBuf,
}

impl<'a, C: SystemContext> UpgradeLauncher<'a, C> {
    pub fn new(ctx: &'a C, log_dir: PathBuf) -> Self {
        Self { ctx, log_dir }
    }

    /// Blocks until the installer exits and returns its exit code untouched.
    pub async fn launch(&self, setup_path: &Path, dynamic_update: DynamicUpdate) -> Result<i32> {
        std::fs::create_dir_all(&self.log_dir)?;

        let args = setup_args(dynamic_update, &self.log_dir);
        tracing::info!("Launching {} {}", setup_path.display(), args.join(" "));
        self.ctx.run_installer(setup_path, &args).await
    }
}
