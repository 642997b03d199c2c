// Trigger composition for the payer job schedule table
//
// Walks the table, resolves each listed stage's cadence into concrete
// trigger instants, and registers one recurring trigger per instant with
// whatever scheduler backs the TriggerRegistry.

pub mod engine;

pub use engine::{AccumulationJobRunner, EngineConfig, LogJobRunner, TriggerEngine};

use crate::errors::ComposeError;
use crate::models::{JobType, PayerJobSchedule, PayerTrigger};
use crate::schedule;
use crate::telemetry;
use async_trait::async_trait;
use tracing::{info, instrument};

/// TriggerRegistry is the seam to the external recurring-task scheduler
#[async_trait]
pub trait TriggerRegistry: Send + Sync {
    /// Register one recurring trigger
    async fn register(&self, trigger: &PayerTrigger) -> Result<(), ComposeError>;
}

/// Resolve the whole table into a trigger plan.
///
/// Violations are collected across every payer and stage before anything is
/// returned, so one load failure reports the entire set of problems instead
/// of the first one found.
#[instrument(skip(records), fields(payer_count = records.len()))]
pub fn compose_triggers(records: &[PayerJobSchedule]) -> Result<Vec<PayerTrigger>, ComposeError> {
    let mut plan = Vec::new();
    let mut violations = Vec::new();

    for record in records {
        // Every stage listed to run must have a cadence assigned.
        for job_type in &record.jobs {
            match record.job_schedules.get(job_type) {
                None => violations.push(format!(
                    "payer '{}': job '{}' is listed in jobs but has no cadence in job_schedules",
                    record.payer, job_type
                )),
                Some(&cadence) => match schedule::resolve_trigger_specs(*job_type, cadence) {
                    Ok(specs) => {
                        for spec in specs {
                            plan.push(PayerTrigger::new(record.payer.clone(), *job_type, spec));
                        }
                    }
                    Err(e) => violations.push(format!("payer '{}': {}", record.payer, e)),
                },
            }
        }

        // Dormant cadence assignments (present in job_schedules, absent from
        // jobs) still have to resolve so they do not rot while unused.
        for job_type in JobType::ALL {
            if record.jobs.contains(&job_type) {
                continue;
            }
            if let Some(&cadence) = record.job_schedules.get(&job_type) {
                if let Err(e) = schedule::resolve_trigger_specs(job_type, cadence) {
                    violations.push(format!("payer '{}': {}", record.payer, e));
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(plan)
    } else {
        Err(ComposeError::InvalidTable { violations })
    }
}

/// Validate the table without building a plan
pub fn validate_table(records: &[PayerJobSchedule]) -> Result<(), ComposeError> {
    compose_triggers(records).map(|_| ())
}

/// Compose the table and register every trigger in plan order.
///
/// Registration only starts once the whole table has composed, so an
/// invalid table registers nothing at all.
#[instrument(skip(records, registry), fields(payer_count = records.len()))]
pub async fn register_payer_triggers(
    records: &[PayerJobSchedule],
    registry: &dyn TriggerRegistry,
) -> Result<Vec<PayerTrigger>, ComposeError> {
    let plan = compose_triggers(records)?;
    for trigger in &plan {
        registry.register(trigger).await?;
    }
    telemetry::set_triggers_registered(plan.len());
    info!(
        trigger_count = plan.len(),
        payer_count = records.len(),
        "Payer triggers registered"
    );
    Ok(plan)
}
