pub mod launcher;
pub mod orchestrator;
pub mod power_guard;
pub mod source_resolver;
pub mod update_runner;

pub use launcher::UpgradeLauncher;
pub use orchestrator::UpgradeOrchestrator;
pub use power_guard::PowerStateGuard;
pub use source_resolver::SourceResolver;
pub use update_runner::UpdateRunner;
