use super::{PowerStateGuard, SourceResolver, UpdateRunner, UpgradeLauncher};
use crate::best_effort::best_effort;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::event_log::{Phase, StatusLog};
use crate::models::{MountHandle, PowerTimeoutSnapshot, RunReport, UpgradeResult};
use crate::system::SystemContext;

/// What teardown has to undo, filled in as the run makes progress.
#[derive(Debug, Default)]
struct RunState {
    snapshot: Option<PowerTimeoutSnapshot>,
    mount: Option<MountHandle>,
}

/// Sequences power capture, the optional update phase, source resolution and
/// the installer launch. Teardown runs on every exit path.
pub struct UpgradeOrchestrator<'a, C> {
    ctx: &'a C,
    config: &'a Config,
}

impl<'a, C: SystemContext> UpgradeOrchestrator<'a, C> {
    pub fn new(ctx: &'a C, config: &'a Config) -> Self {
        Self { ctx, config }
    }

    pub async fn run(&self, log: &mut StatusLog) -> Result<RunReport> {
        log.info(
            Phase::Power,
            format!(
                "Starting upgrade run {} from {}",
                log.run_id(),
                self.config.source.display()
            ),
        );

        let mut state = RunState::default();
        let outcome = self.execute(&mut state, log).await;

        if let Err(e) = &outcome {
            let phase = if e.is_resolution_failure() {
                Phase::Source
            } else {
                Phase::Launch
            };
            log.error(phase, format!("Upgrade aborted: {}", e));
        }

        let result = outcome.as_ref().ok().map(|report| report.result);
        self.teardown(state, result, log).await;
        outcome
    }

    async fn execute(&self, state: &mut RunState, log: &mut StatusLog) -> Result<RunReport> {
        let power = PowerStateGuard::new(self.ctx);
        let snapshot = power.capture(log).await;
        state.snapshot = Some(snapshot).filter(PowerTimeoutSnapshot::is_usable);
        power.disable_all(log).await;

        if self.config.run_updates {
            if let Some(report) = self.run_update_phase(log).await {
                return Ok(report);
            }
        } else {
            log.info(Phase::Update, "Update phase disabled");
        }

        let source = SourceResolver::new(self.ctx)
            .resolve(&self.config.source, &mut state.mount)
            .await?;
        log.info(
            Phase::Source,
            format!(
                "Using setup.exe from {} ({})",
                source.root.display(),
                if source.mount.is_some() {
                    "mounted image"
                } else {
                    "directory"
                }
            ),
        );

        let code = UpgradeLauncher::new(self.ctx, self.config.setup_log_dir.clone())
            .launch(&source.setup_path, self.config.dynamic_update)
            .await?;

        let report = RunReport::new(UpgradeResult::Installer(code));
        let message = format!("Setup exited: {}", report.classification);
        if report.classification.is_success() {
            log.info_with_code(Phase::Result, message, code);
        } else {
            log.error_with_code(Phase::Result, message, code);
        }
        Ok(report)
    }

    /// Returns a report only when a pending reboot must stop the run here.
    async fn run_update_phase(&self, log: &mut StatusLog) -> Option<RunReport> {
        match UpdateRunner::new(self.ctx)
            .run(self.config.include_drivers, log)
            .await
        {
            Ok(outcome) if outcome.reboot_required => {
                let report = RunReport::new(UpgradeResult::DeferredForReboot);
                log.info_with_code(
                    Phase::Update,
                    format!(
                        "{} update(s) installed and a reboot is pending; OS upgrade deferred",
                        outcome.installed
                    ),
                    report.exit_code(),
                );
                Some(report)
            }
            Ok(_) => None,
            Err(e) => {
                log.error(Phase::Update, format!("Update phase failed: {}", e));
                None
            }
        }
    }

    async fn teardown(&self, state: RunState, result: Option<UpgradeResult>, log: &mut StatusLog) {
        if let Some(handle) = state.mount {
            let released = best_effort(
                log,
                Phase::Teardown,
                "dismount image",
                self.ctx.dismount_image(&handle),
            )
            .await;
            if released.is_some() {
                log.info(
                    Phase::Teardown,
                    format!("Dismounted {}", handle.image_path.display()),
                );
            }
        }

        match state.snapshot {
            Some(snapshot) => {
                PowerStateGuard::new(self.ctx)
                    .restore(&snapshot, log)
                    .await
            }
            None => log.warn(
                Phase::Teardown,
                "No power snapshot was captured; idle timeouts stay disabled",
            ),
        }

        let staging_dir = &self.config.staging_dir;
        match result {
            Some(result) if result.allows_staging_cleanup() => {
                if !staging_dir.exists() {
                    return;
                }
                let removed = best_effort(log, Phase::Teardown, "remove staging directory", async {
                    tokio::fs::remove_dir_all(staging_dir)
                        .await
                        .map_err(AppError::from)
                })
                .await;
                if removed.is_some() {
                    log.info(
                        Phase::Teardown,
                        format!("Removed staging directory {}", staging_dir.display()),
                    );
                }
            }
            _ => log.info(
                Phase::Teardown,
                format!("Keeping staging directory {}", staging_dir.display()),
            ),
        }
    }
}
