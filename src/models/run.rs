use super::setup::SetupExitCode;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeResult {
    /// Raw exit code of the installer process.
    Installer(i32),
    /// The update phase left a reboot pending, so the installer was never started.
    DeferredForReboot,
}

impl UpgradeResult {
    pub fn code(self) -> i32 {
        match self {
            UpgradeResult::Installer(code) => code,
            UpgradeResult::DeferredForReboot => SetupExitCode::SUCCESS_REBOOT_REQUIRED,
        }
    }

    pub fn classification(self) -> SetupExitCode {
        SetupExitCode::from_code(self.code())
    }

    /// Only a clean, no-reboot-pending finish lets the staging media go.
    pub fn allows_staging_cleanup(self) -> bool {
        self.code() == SetupExitCode::SUCCESS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    RebootAndRerun,
    RebootWhenConvenient,
    ReviewLogs,
    Nothing,
}

impl NextAction {
    pub fn for_result(result: UpgradeResult) -> Self {
        if result == UpgradeResult::DeferredForReboot {
            return NextAction::RebootAndRerun;
        }
        match result.classification() {
            SetupExitCode::Success => NextAction::Nothing,
            SetupExitCode::SuccessRebootRequired => NextAction::RebootWhenConvenient,
            SetupExitCode::RestartRequired => NextAction::RebootAndRerun,
            _ => NextAction::ReviewLogs,
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            NextAction::RebootAndRerun => "Reboot the machine, then run the upgrade again.",
            NextAction::RebootWhenConvenient => {
                "Reboot at your convenience to finish the upgrade."
            }
            NextAction::ReviewLogs => "Review the setup logs before retrying.",
            NextAction::Nothing => "Nothing further is needed.",
        }
    }
}

/// Terminal outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub result: UpgradeResult,
    pub classification: SetupExitCode,
    pub next_action: NextAction,
}

impl RunReport {
    pub fn new(result: UpgradeResult) -> Self {
        Self {
            result,
            classification: result.classification(),
            next_action: NextAction::for_result(result),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.result.code()
    }

    /// The single line shown to the operator.
    pub fn summary_line(&self) -> String {
        format!(
            "Upgrade finished with code {}. {}",
            self.classification,
            self.next_action.instruction()
        )
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary_line())
    }
}
