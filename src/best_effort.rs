use crate::error::Result;
use crate::event_log::{Phase, StatusLog};
use std::future::Future;

/// Runs a step whose failure must not abort the caller.
///
/// On error a warning naming `action` is recorded and `None` is returned.
pub async fn best_effort<T, F>(
    log: &mut StatusLog,
    phase: Phase,
    action: &str,
    step: F,
) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match step.await {
        Ok(value) => Some(value),
        Err(e) => {
            log.warn(phase, format!("Failed to {}: {}", action, e));
            None
        }
    }
}
