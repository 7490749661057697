use crate::error::Result;
use crate::event_log::{Phase, StatusLog};
use crate::models::{UpdateCriteria, UpdateItem, UpdateOutcome};
use crate::system::SystemContext;

/// Searches, downloads and installs pending updates through the update agent.
///
/// Errors are returned to the caller; deciding whether they are fatal is the
/// orchestrator's job.
pub struct UpdateRunner<'a, C> {
    ctx: &'a C,
}

impl<'a, C: SystemContext> UpdateRunner<'a, C> {
    pub fn new(ctx: &'a C) -> Self {
        Self { ctx }
    }

    pub async fn run(&self, include_drivers: bool, log: &mut StatusLog) -> Result<UpdateOutcome> {
        let criteria = UpdateCriteria::new(include_drivers);
        let found = self.ctx.search_updates(&criteria).await?;
        log.info(
            Phase::Update,
            format!(
                "Found {} applicable update(s) for \"{}\"",
                found.len(),
                criteria.query()
            ),
        );
        if found.is_empty() {
            return Ok(UpdateOutcome::nothing_installed());
        }

        let download = self.ctx.download_updates(&found).await?;
        let downloaded: Vec<UpdateItem> = download
            .items
            .into_iter()
            .filter(|item| item.is_downloaded)
            .collect();
        for item in &downloaded {
            tracing::debug!("Downloaded {} ({})", item.title, item.id);
        }
        log.info_with_code(
            Phase::Update,
            format!(
                "Download {}: {} of {} update(s) ready",
                download.result_code,
                downloaded.len(),
                found.len()
            ),
            download.result_code.raw(),
        );
        if downloaded.is_empty() {
            return Ok(UpdateOutcome::nothing_installed());
        }

        let install = self.ctx.install_updates(&downloaded).await?;
        let installed = install
            .item_results
            .iter()
            .filter(|code| code.counts_as_installed())
            .count();
        log.info_with_code(
            Phase::Update,
            format!(
                "Install {}: {} update(s) installed, reboot required: {}",
                install.result_code, installed, install.reboot_required
            ),
            install.result_code.raw(),
        );

        Ok(UpdateOutcome {
            installed,
            reboot_required: install.reboot_required,
            result_code: install.result_code,
        })
    }
}
