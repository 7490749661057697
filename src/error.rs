use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Install source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Mounted image {} did not expose a drive root", .0.display())]
    MountResolution(PathBuf),

    #[error("setup.exe not found under {}", .0.display())]
    SetupNotFound(PathBuf),

    #[error("Power configuration error: {0}")]
    Power(String),

    #[error("Update error: {0}")]
    Update(String),

    #[error("Mount error: {0}")]
    Mount(String),

    #[error("Launch error: {0}")]
    Launch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Resolution failures abort the run before the installer is started.
    /// Dismount errors never propagate, so `Mount` only comes from mounting.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            AppError::SourceNotFound(_)
                | AppError::Mount(_)
                | AppError::MountResolution(_)
                | AppError::SetupNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
