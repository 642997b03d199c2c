// In-process trigger engine
//
// Holds the registered trigger plan and fires due triggers from a polling
// loop. A watermark tracks the last poll instant; every trigger with an
// occurrence inside (watermark, now] fires exactly once, and occurrences
// missed during a stall collapse into a single catch-up invocation at the
// earliest missed instant.

use crate::composer::TriggerRegistry;
use crate::errors::ComposeError;
use crate::models::{JobInvocation, PayerTrigger};
use crate::schedule::{self, SCHEDULE_TZ};
use crate::telemetry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cron::Schedule as CronSchedule;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::interval;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Configuration for the trigger engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often to check for due triggers (seconds)
    pub poll_interval_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30,
        }
    }
}

/// AccumulationJobRunner executes the job body behind a fired trigger
#[async_trait]
pub trait AccumulationJobRunner: Send + Sync {
    async fn run(&self, invocation: &JobInvocation) -> anyhow::Result<()>;
}

/// Runner that only logs the invocation, used until a stage wires in its
/// real job body
pub struct LogJobRunner;

#[async_trait]
impl AccumulationJobRunner for LogJobRunner {
    async fn run(&self, invocation: &JobInvocation) -> anyhow::Result<()> {
        info!(
            invocation_id = %invocation.id,
            payer = %invocation.payer,
            job_type = %invocation.job_type,
            scheduled_for = %invocation.scheduled_for,
            "Accumulation job invoked"
        );
        Ok(())
    }
}

struct RegisteredTrigger {
    trigger: PayerTrigger,
    // Parsed once at registration so the poll loop never re-parses.
    schedule: CronSchedule,
}

/// TriggerEngine drives registered payer triggers on a polling loop
pub struct TriggerEngine {
    config: EngineConfig,
    runner: Arc<dyn AccumulationJobRunner>,
    triggers: RwLock<Vec<RegisteredTrigger>>,
    watermark: RwLock<DateTime<Utc>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl TriggerEngine {
    pub fn new(config: EngineConfig, runner: Arc<dyn AccumulationJobRunner>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            runner,
            triggers: RwLock::new(Vec::new()),
            watermark: RwLock::new(Utc::now()),
            shutdown_tx,
        }
    }

    pub async fn trigger_count(&self) -> usize {
        self.triggers.read().await.len()
    }

    /// Fire every trigger with an occurrence in (watermark, now], then
    /// advance the watermark to `now`.
    #[instrument(skip(self))]
    pub async fn fire_due(&self, now: DateTime<Utc>) -> usize {
        let since = *self.watermark.read().await;
        let mut fired = 0;

        {
            let triggers = self.triggers.read().await;
            for registered in triggers.iter() {
                let reference = since.with_timezone(&SCHEDULE_TZ);
                let Some(next) = registered.schedule.after(&reference).next() else {
                    continue;
                };
                let next_utc = next.with_timezone(&Utc);
                if next_utc <= now {
                    self.dispatch(&registered.trigger, next_utc).await;
                    fired += 1;
                }
            }
        }

        *self.watermark.write().await = now;
        fired
    }

    async fn dispatch(&self, trigger: &PayerTrigger, scheduled_for: DateTime<Utc>) {
        let invocation = JobInvocation {
            id: Uuid::new_v4(),
            payer: trigger.payer.clone(),
            job_type: trigger.job_type,
            scheduled_for,
        };
        info!(
            invocation_id = %invocation.id,
            payer = %invocation.payer,
            job_type = %invocation.job_type,
            scheduled_for = %scheduled_for,
            "Trigger fired"
        );
        telemetry::record_trigger_fired(&invocation.payer, invocation.job_type);

        // A failing job body must not take the poll loop down with it.
        if let Err(e) = self.runner.run(&invocation).await {
            error!(
                error = %e,
                invocation_id = %invocation.id,
                payer = %invocation.payer,
                job_type = %invocation.job_type,
                "Accumulation job failed"
            );
        }
    }

    /// Run the polling loop until `stop` is called
    pub async fn start(&self) {
        let mut poll_interval = interval(Duration::from_secs(self.config.poll_interval_seconds));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let trigger_count = self.trigger_count().await;
        info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            trigger_count,
            "Trigger engine started"
        );

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    let fired = self.fire_due(Utc::now()).await;
                    if fired > 0 {
                        debug!(fired, "Dispatched due triggers");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Trigger engine shutting down");
                    break;
                }
            }
        }
    }

    pub async fn stop(&self) {
        info!("Stopping trigger engine");
        // Send fails only when the loop is not running, which is fine.
        let _ = self.shutdown_tx.send(());
    }
}

#[async_trait]
impl TriggerRegistry for TriggerEngine {
    async fn register(&self, trigger: &PayerTrigger) -> Result<(), ComposeError> {
        let parsed = schedule::parse_cron_expression(&trigger.cron_expression).map_err(|e| {
            ComposeError::RegistrationFailed {
                payer: trigger.payer.clone(),
                job_type: trigger.job_type,
                reason: e.to_string(),
            }
        })?;
        debug!(
            payer = %trigger.payer,
            job_type = %trigger.job_type,
            expression = %trigger.cron_expression,
            "Trigger registered"
        );
        self.triggers.write().await.push(RegisteredTrigger {
            trigger: trigger.clone(),
            schedule: parsed,
        });
        Ok(())
    }
}
