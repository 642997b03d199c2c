// Scheduler binary entry point

use common::composer::{register_payer_triggers, EngineConfig, LogJobRunner, TriggerEngine};
use common::config::Settings;
use common::payers;
use common::storage::AccumulationFileHandler;
use common::telemetry;
use std::sync::Arc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize tracing/logging and metrics
    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;
    telemetry::init_metrics(settings.observability.metrics_port)?;

    info!("Starting payer accumulation scheduler");

    // Initialize the accumulation file handler up front so a storage
    // misconfiguration fails the boot, not the first fired job.
    let handler = AccumulationFileHandler::new(&settings, false).map_err(|e| {
        error!(error = %e, "Failed to initialize accumulation file handler");
        e
    })?;
    info!(
        local_backend = handler.is_local(),
        "Accumulation file handler ready"
    );

    // Load the payer job schedule table
    let records = payers::payer_job_schedules();
    info!(payer_count = records.len(), "Payer job schedule table loaded");

    // Create the trigger engine
    let engine_config = EngineConfig {
        poll_interval_seconds: settings.scheduler.poll_interval_seconds,
    };
    let engine = Arc::new(TriggerEngine::new(engine_config, Arc::new(LogJobRunner)));
    info!("Trigger engine created");

    // Compose and register the trigger plan. An invalid table aborts the
    // boot with every violation in the error, so nothing half-registers.
    let plan = register_payer_triggers(&records, engine.as_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Refusing to start with an invalid payer job schedule table");
            e
        })?;
    info!(trigger_count = plan.len(), "Trigger plan registered");
    debug!(plan = %serde_json::to_string(&plan)?, "Full trigger plan");

    // Set up graceful shutdown
    let engine_for_shutdown = engine.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        engine_for_shutdown.stop().await;
    });

    // Start the trigger polling loop
    info!("Starting trigger polling loop");
    engine.start().await;

    telemetry::shutdown_tracer();
    info!("Scheduler stopped");
    Ok(())
}
