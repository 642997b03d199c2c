// Error handling framework

use crate::models::{Cadence, JobType};
use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("no trigger times defined for job type '{job_type}' at cadence '{cadence}'")]
    UndefinedTriggerMapping { job_type: JobType, cadence: Cadence },

    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("no upcoming execution for expression '{expression}'")]
    NoUpcomingExecution { expression: String },
}

/// Trigger composition errors
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("payer job schedule table is invalid ({} violation(s)): {}", .violations.len(), .violations.join("; "))]
    InvalidTable { violations: Vec<String> },

    #[error("failed to register trigger for payer '{payer}' job '{job_type}': {reason}")]
    RegistrationFailed {
        payer: String,
        job_type: JobType,
        reason: String,
    },
}

/// Storage-related errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object storage error: {0}")]
    ObjectStore(String),

    #[error("file system error: {0}")]
    FileSystem(String),

    #[error("credentials error: {0}")]
    Credentials(String),
}
