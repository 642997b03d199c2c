// Accumulation file naming conventions
//
// Lifecycle state lives in the object name, not in the handler: generated
// files land under `pending/`, move under `processed/` once transferred,
// and under `archived/` after response reconciliation. The handler never
// inspects these prefixes; the jobs that own each transition do.

use crate::models::JobType;
use chrono::{DateTime, Utc};
use regex::Regex;

pub const PENDING_PREFIX: &str = "pending";
pub const PROCESSED_PREFIX: &str = "processed";
pub const ARCHIVED_PREFIX: &str = "archived";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Name for an outbound accumulation file, unique per generation run
pub fn accumulation_filename(payer: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "{}/{}_accumulation_{}.edi",
        PENDING_PREFIX,
        payer,
        generated_at.format(TIMESTAMP_FORMAT)
    )
}

/// Matcher for the 277 response files a payer drops back for one of our
/// accumulation submissions
pub fn response_filename_pattern(payer: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"^{}_accumulation_\d{{14}}\.277$",
        regex::escape(payer)
    ))
}

/// The same file under a different lifecycle prefix
pub fn relocated(filename: &str, prefix: &str) -> String {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    format!("{}/{}", prefix, base)
}

/// Bucket carrying a payer's files for one pipeline stage
pub fn stage_bucket(payer: &str, job_type: JobType) -> String {
    format!("accumulation-{}-{}", payer, job_type.as_str().replace('_', "-"))
}
