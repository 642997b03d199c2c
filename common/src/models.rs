use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Helper functions for Weekday serialization
fn serialize_weekday<S>(weekday: &Option<Weekday>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match weekday {
        Some(day) => serializer.serialize_some(&day.to_string()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_weekday<'de, D>(deserializer: D) -> Result<Option<Weekday>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    value
        .map(|s| Weekday::from_str(&s).map_err(|_| serde::de::Error::custom("invalid weekday")))
        .transpose()
}

// ============================================================================
// Pipeline Models
// ============================================================================

/// JobType identifies one stage of the payer accumulation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    DataSourcing,
    FileGeneration,
    FileTransfer,
    ProcessResponses,
}

impl JobType {
    /// Every pipeline stage, in pipeline order
    pub const ALL: [JobType; 4] = [
        JobType::DataSourcing,
        JobType::FileGeneration,
        JobType::FileTransfer,
        JobType::ProcessResponses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::DataSourcing => "data_sourcing",
            JobType::FileGeneration => "file_generation",
            JobType::FileTransfer => "file_transfer",
            JobType::ProcessResponses => "process_responses",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cadence defines how often a pipeline stage runs for a payer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    FourTimesDaily,
    TwiceDaily,
    Daily,
    Weekly,
    Biweekly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::FourTimesDaily => "four_times_daily",
            Cadence::TwiceDaily => "twice_daily",
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Biweekly => "biweekly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete recurring trigger instant.
///
/// Hours are UTC. `weekday` and `days_of_month` narrow the recurrence for
/// weekly and biweekly cadences; a spec with neither fires every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub hour: u32,
    pub minute: u32,
    #[serde(
        default,
        serialize_with = "serialize_weekday",
        deserialize_with = "deserialize_weekday",
        skip_serializing_if = "Option::is_none"
    )]
    pub weekday: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_month: Option<Vec<u8>>,
}

impl TriggerSpec {
    /// Fires every day at the given UTC hour
    pub fn daily(hour: u32) -> Self {
        Self {
            hour,
            minute: 0,
            weekday: None,
            days_of_month: None,
        }
    }

    /// Fires once a week at the given UTC hour
    pub fn weekly(hour: u32, weekday: Weekday) -> Self {
        Self {
            hour,
            minute: 0,
            weekday: Some(weekday),
            days_of_month: None,
        }
    }

    /// Fires on fixed days of the month at the given UTC hour
    pub fn on_days_of_month(hour: u32, days: &[u8]) -> Self {
        Self {
            hour,
            minute: 0,
            weekday: None,
            days_of_month: Some(days.to_vec()),
        }
    }

    /// Render as a seconds-resolution cron expression
    /// (`sec min hour day-of-month month day-of-week year`)
    pub fn cron_expression(&self) -> String {
        let day_of_month = match &self.days_of_month {
            Some(days) => days
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(","),
            None => "*".to_string(),
        };
        let day_of_week = match self.weekday {
            Some(day) => weekday_token(day).to_string(),
            None => "*".to_string(),
        };
        format!(
            "0 {} {} {} * {} *",
            self.minute, self.hour, day_of_month, day_of_week
        )
    }
}

fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

// ============================================================================
// Payer Models
// ============================================================================

/// One payer's scheduling record.
///
/// `jobs` lists the stages that actually run for the payer; `job_schedules`
/// assigns a cadence per stage. A stage may carry a cadence without being
/// listed in `jobs` (it stays dormant), but every listed job must have a
/// cadence assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayerJobSchedule {
    pub payer: String,
    pub job_schedules: HashMap<JobType, Cadence>,
    pub jobs: Vec<JobType>,
}

/// A fully resolved trigger: one payer, one stage, one recurring instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerTrigger {
    pub payer: String,
    pub job_type: JobType,
    pub spec: TriggerSpec,
    pub cron_expression: String,
}

impl PayerTrigger {
    pub fn new(payer: String, job_type: JobType, spec: TriggerSpec) -> Self {
        let cron_expression = spec.cron_expression();
        Self {
            payer,
            job_type,
            spec,
            cron_expression,
        }
    }
}

/// Handed to a job runner each time a trigger fires
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInvocation {
    pub id: Uuid,
    pub payer: String,
    pub job_type: JobType,
    pub scheduled_for: DateTime<Utc>,
}
