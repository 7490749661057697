use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Installer dynamic-update mode. `Disable` avoids a known stall of the vendor
/// installer partway through its progress when dynamic content is fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum DynamicUpdate {
    #[value(name = "Enable", alias = "enable")]
    Enable,
    #[default]
    #[value(name = "Disable", alias = "disable")]
    Disable,
}

impl DynamicUpdate {
    pub fn as_arg(self) -> &'static str {
        match self {
            DynamicUpdate::Enable => "Enable",
            DynamicUpdate::Disable => "Disable",
        }
    }
}

impl fmt::Display for DynamicUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

impl FromStr for DynamicUpdate {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enable" => Ok(DynamicUpdate::Enable),
            "disable" => Ok(DynamicUpdate::Disable),
            other => Err(AppError::Config(format!(
                "Invalid dynamic update mode '{}', expected Enable or Disable",
                other
            ))),
        }
    }
}

const DRIVER_ROLLBACK: i32 = 0xC190_0101_u32 as i32;
const INCOMPATIBLE_APP: i32 = 0xC190_0208_u32 as i32;
const UNSUPPORTED_TARGET: i32 = 0xC190_0204_u32 as i32;
const DEVICE_DRIVER_ERROR: i32 = 0x800F_0923_u32 as i32;

/// Classification of an installer (or update-phase) exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupExitCode {
    Success,
    RestartRequired,
    GeneralError,
    HardBlock,
    DownloadFailure,
    Cancelled,
    SuccessRebootRequired,
    DriverRollback,
    IncompatibleApp,
    UnsupportedTarget,
    DeviceDriverError,
    Unknown(i32),
}

impl SetupExitCode {
    pub const SUCCESS: i32 = 0;
    pub const SUCCESS_REBOOT_REQUIRED: i32 = 3010;

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::RestartRequired,
            3 => Self::GeneralError,
            4 => Self::HardBlock,
            5 => Self::DownloadFailure,
            302 => Self::Cancelled,
            3010 => Self::SuccessRebootRequired,
            DRIVER_ROLLBACK => Self::DriverRollback,
            INCOMPATIBLE_APP => Self::IncompatibleApp,
            UNSUPPORTED_TARGET => Self::UnsupportedTarget,
            DEVICE_DRIVER_ERROR => Self::DeviceDriverError,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::RestartRequired => 1,
            Self::GeneralError => 3,
            Self::HardBlock => 4,
            Self::DownloadFailure => 5,
            Self::Cancelled => 302,
            Self::SuccessRebootRequired => 3010,
            Self::DriverRollback => DRIVER_ROLLBACK,
            Self::IncompatibleApp => INCOMPATIBLE_APP,
            Self::UnsupportedTarget => UNSUPPORTED_TARGET,
            Self::DeviceDriverError => DEVICE_DRIVER_ERROR,
            Self::Unknown(code) => code,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::RestartRequired => "Restart required to continue",
            Self::GeneralError => "General error",
            Self::HardBlock => "Hard compatibility block",
            Self::DownloadFailure => "Download or dynamic update failure",
            Self::Cancelled => "Cancelled",
            Self::SuccessRebootRequired => "Success, reboot required",
            Self::DriverRollback => "Driver rollback",
            Self::IncompatibleApp => "Incompatible application detected",
            Self::UnsupportedTarget => "Unsupported edition or target",
            Self::DeviceDriverError => "Device or driver error during upgrade",
            Self::Unknown(_) => "Unknown",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::SuccessRebootRequired)
    }
}

impl fmt::Display for SetupExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code();
        if code < 0 {
            write!(f, "0x{:08X} ({})", code as u32, self.description())
        } else {
            write!(f, "{} ({})", code, self.description())
        }
    }
}
