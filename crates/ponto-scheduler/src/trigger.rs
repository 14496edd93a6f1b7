//! Deferred one-shot trigger arming.
//!
//! Once the day's entry is in, the exact exit moment is known only
//! approximately. Instead of polling, the orchestrator registers one
//! OS-level one-shot trigger for the provisional exit time, capped at a
//! configured ceiling. Re-arming always cancels the previous trigger
//! for the logical task first, so at most one future invocation is
//! ever pending.

use std::sync::Arc;

use chrono::NaiveTime;

use ponto_core::clock;
use ponto_core::config::TriggerConfig;
use ponto_core::error::{PontoError, Result};
use ponto_core::traits::OsScheduler;

/// What got registered, for logs and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedTrigger {
    pub task: String,
    pub at: NaiveTime,
    /// True when the target exceeded the ceiling and was clamped down.
    pub clamped: bool,
    /// Mode that actually succeeded.
    pub elevated: bool,
}

/// Arms exactly one future re-invocation of the orchestrator.
pub struct DeferredTriggerScheduler {
    config: TriggerConfig,
    scheduler: Arc<dyn OsScheduler>,
}

impl DeferredTriggerScheduler {
    pub fn new(config: TriggerConfig, scheduler: Arc<dyn OsScheduler>) -> Self {
        Self { config, scheduler }
    }

    /// Register a one-shot trigger for "today at `target`", clamped to
    /// the ceiling. Tries the elevated mode first when configured,
    /// falling back to the reduced-privilege mode with a logged
    /// degradation instead of failing outright.
    pub async fn arm(&self, target: NaiveTime) -> Result<ArmedTrigger> {
        let (at, clamped) = if target > self.config.ceiling {
            tracing::warn!(
                "⚠️ Target {} past ceiling {}; clamping",
                clock::fmt_hm(target),
                clock::fmt_hm(self.config.ceiling)
            );
            (self.config.ceiling, true)
        } else {
            (target, false)
        };

        let task = self.config.task_name.as_str();

        // Replace, never accumulate: one pending trigger per logical task.
        if let Err(e) = self.scheduler.cancel(task).await {
            tracing::warn!("⚠️ Cancel of previous trigger failed: {e}");
        }

        if self.config.elevated {
            match self.scheduler.register_once(task, at, true).await {
                Ok(()) => {
                    tracing::info!("⏰ Trigger armed (elevated): {task} at {}", clock::fmt_hm(at));
                    return Ok(ArmedTrigger {
                        task: task.to_string(),
                        at,
                        clamped,
                        elevated: true,
                    });
                }
                Err(e) => {
                    tracing::warn!("⚠️ Elevated registration unavailable ({e}); degrading to user mode");
                }
            }
        }

        self.scheduler
            .register_once(task, at, false)
            .await
            .map_err(|e| PontoError::Scheduling(format!("register '{task}': {e}")))?;
        tracing::info!("⏰ Trigger armed (user mode): {task} at {}", clock::fmt_hm(at));
        Ok(ArmedTrigger {
            task: task.to_string(),
            at,
            clamped,
            elevated: false,
        })
    }
}
