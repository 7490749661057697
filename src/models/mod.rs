pub mod power;
pub mod run;
pub mod setup;
pub mod source;
pub mod update;

pub use power::{PowerSetting, PowerTimeoutSnapshot};
pub use run::{RunReport, UpgradeResult};
pub use setup::{DynamicUpdate, SetupExitCode};
pub use source::{InstallSource, MountHandle};
pub use update::{
    DownloadReport, InstallReport, OperationResultCode, UpdateCriteria, UpdateItem, UpdateOutcome,
};
