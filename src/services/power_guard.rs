use crate::best_effort::best_effort;
use crate::event_log::{Phase, StatusLog};
use crate::models::{PowerSetting, PowerTimeoutSnapshot};
use crate::system::SystemContext;

/// Keeps the machine awake for the duration of a run and puts the idle
/// timeouts back afterwards. Every read and write is best-effort.
pub struct PowerStateGuard<'a, C> {
    ctx: &'a C,
}

impl<'a, C: SystemContext> PowerStateGuard<'a, C> {
    pub fn new(ctx: &'a C) -> Self {
        Self { ctx }
    }

    pub async fn capture(&self, log: &mut StatusLog) -> PowerTimeoutSnapshot {
        let mut snapshot = PowerTimeoutSnapshot::default();
        for setting in PowerSetting::ALL {
            let action = format!("read {} timeout", setting);
            let value = best_effort(
                log,
                Phase::Power,
                &action,
                self.ctx.read_power_timeout(setting),
            )
            .await;
            snapshot.set(setting, value);
        }

        log.info(
            Phase::Power,
            format!(
                "Captured timeouts: standby AC={} DC={}, hibernate AC={} DC={}",
                display_value(snapshot.standby_ac),
                display_value(snapshot.standby_dc),
                display_value(snapshot.hibernate_ac),
                display_value(snapshot.hibernate_dc),
            ),
        );
        snapshot
    }

    pub async fn disable_all(&self, log: &mut StatusLog) {
        let mut disabled = 0;
        for setting in PowerSetting::ALL {
            let action = format!("disable {} timeout", setting);
            if best_effort(
                log,
                Phase::Power,
                &action,
                self.ctx.write_power_timeout(setting, 0),
            )
            .await
            .is_some()
            {
                disabled += 1;
            }
        }
        log.info(
            Phase::Power,
            format!("Disabled {} of {} idle timeouts", disabled, PowerSetting::ALL.len()),
        );
    }

    pub async fn restore(&self, snapshot: &PowerTimeoutSnapshot, log: &mut StatusLog) {
        let mut restored = 0;
        for setting in PowerSetting::ALL {
            let action = format!("restore {} timeout", setting);
            if best_effort(
                log,
                Phase::Teardown,
                &action,
                self.ctx
                    .write_power_timeout(setting, snapshot.restore_value(setting)),
            )
            .await
            .is_some()
            {
                restored += 1;
            }
        }
        log.info(
            Phase::Teardown,
            format!("Restored {} of {} idle timeouts", restored, PowerSetting::ALL.len()),
        );
    }
}

fn display_value(value: Option<u32>) -> String {
    value
        .map(|seconds| seconds.to_string())
        .unwrap_or_else(|| "unreadable".to_string())
}
