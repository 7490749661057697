use crate::error::{AppError, Result};
use std::path::PathBuf;

const APP_DIR: &str = "InplaceUpgrade";
const BIN_DIR: &str = "bin";
const CONF_DIR: &str = "conf";
const LOGS_DIR: &str = "logs";
const SETUP_LOGS_DIR: &str = "setup";
const STATUS_LOG_FILE: &str = "upgrade-status.log";
const STAGING_DIR: &str = "OSUpgrade";
const HOME_ENV: &str = "INPLACE_UPGRADE_HOME";

pub fn state_root() -> Result<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        if home.trim().is_empty() {
            return Err(AppError::Config(format!("{} is set but empty", HOME_ENV)));
        }
        return Ok(PathBuf::from(home));
    }

    if let Some(program_data) = std::env::var_os("ProgramData") {
        return Ok(PathBuf::from(program_data).join(APP_DIR));
    }

    let exe_path = std::env::current_exe()?;
    let exe_dir = exe_path
        .parent()
        .ok_or_else(|| AppError::Config("Failed to resolve executable directory".to_string()))?;

    if exe_dir.file_name().and_then(|name| name.to_str()) == Some(BIN_DIR) {
        let root = exe_dir.parent().ok_or_else(|| {
            AppError::Config("Failed to resolve state root from bin".to_string())
        })?;
        return Ok(root.to_path_buf());
    }

    Ok(exe_dir.to_path_buf())
}

pub fn conf_dir() -> Result<PathBuf> {
    Ok(state_root()?.join(CONF_DIR))
}

pub fn logs_dir() -> Result<PathBuf> {
    Ok(state_root()?.join(LOGS_DIR))
}

pub fn status_log_path() -> Result<PathBuf> {
    Ok(logs_dir()?.join(STATUS_LOG_FILE))
}

pub fn setup_log_dir() -> Result<PathBuf> {
    Ok(logs_dir()?.join(SETUP_LOGS_DIR))
}

/// Well-known local directory expected to hold the upgrade media.
pub fn default_staging_dir() -> PathBuf {
    let drive = std::env::var("SystemDrive")
        .ok()
        .filter(|drive| !drive.trim().is_empty())
        .unwrap_or_else(|| "C:".to_string());
    PathBuf::from(format!("{}\\", drive)).join(STAGING_DIR)
}
