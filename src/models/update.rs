use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-operation and per-item result codes reported by the update agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[repr(i32)]
pub enum OperationResultCode {
    NotStarted = 0,
    InProgress = 1,
    Succeeded = 2,
    SucceededWithErrors = 3,
    Failed = 4,
    Aborted = 5,
}

impl OperationResultCode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::NotStarted),
            1 => Some(Self::InProgress),
            2 => Some(Self::Succeeded),
            3 => Some(Self::SucceededWithErrors),
            4 => Some(Self::Failed),
            5 => Some(Self::Aborted),
            _ => None,
        }
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Both success-like codes count an item as installed.
    pub fn counts_as_installed(self) -> bool {
        matches!(self, Self::Succeeded | Self::SucceededWithErrors)
    }
}

impl fmt::Display for OperationResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::Succeeded => "succeeded",
            Self::SucceededWithErrors => "succeeded with errors",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCriteria {
    pub include_drivers: bool,
}

impl UpdateCriteria {
    pub fn new(include_drivers: bool) -> Self {
        Self { include_drivers }
    }

    /// Search expression understood by the update agent.
    pub fn query(&self) -> String {
        let mut query = "IsInstalled=0 and IsHidden=0".to_string();
        if !self.include_drivers {
            query.push_str(" and Type='Software'");
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_downloaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub result_code: OperationResultCode,
    /// The searched items with their download state refreshed.
    pub items: Vec<UpdateItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub result_code: OperationResultCode,
    pub reboot_required: bool,
    pub item_results: Vec<OperationResultCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub installed: usize,
    pub reboot_required: bool,
    pub result_code: OperationResultCode,
}

impl UpdateOutcome {
    pub fn nothing_installed() -> Self {
        Self {
            installed: 0,
            reboot_required: false,
            result_code: OperationResultCode::NotStarted,
        }
    }
}
