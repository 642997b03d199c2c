// Trigger time resolution for the accumulation pipeline
//
// Maps a (job type, cadence) pair to the fixed set of UTC instants at which
// that stage fires, and computes upcoming occurrences from the rendered
// cron expressions.

use crate::errors::ScheduleError;
use crate::models::{Cadence, JobType, TriggerSpec};
use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Timezone every trigger instant is expressed in
pub const SCHEDULE_TZ: Tz = chrono_tz::UTC;

/// Day of week shared by every weekly cadence
const WEEKLY_DAY: Weekday = Weekday::Mon;

/// Days of month shared by every biweekly cadence. Day 29 does not exist in
/// a 28-day February, so that occurrence is skipped there.
const BIWEEKLY_DAYS: [u8; 3] = [1, 15, 29];

/// Resolve a stage and cadence to its concrete trigger instants.
///
/// The mapping is a closed table: combinations without an entry (for
/// example four-times-daily data sourcing) are configuration errors, not
/// schedules to invent on the fly.
pub fn resolve_trigger_specs(
    job_type: JobType,
    cadence: Cadence,
) -> Result<Vec<TriggerSpec>, ScheduleError> {
    let specs = match job_type {
        JobType::DataSourcing => match cadence {
            Cadence::Daily => vec![TriggerSpec::daily(16)],
            Cadence::TwiceDaily => vec![TriggerSpec::daily(16), TriggerSpec::daily(23)],
            Cadence::Weekly => vec![TriggerSpec::weekly(16, WEEKLY_DAY)],
            Cadence::Biweekly => vec![TriggerSpec::on_days_of_month(16, &BIWEEKLY_DAYS)],
            Cadence::FourTimesDaily => return Err(undefined(job_type, cadence)),
        },
        JobType::FileGeneration => match cadence {
            Cadence::Daily => vec![TriggerSpec::daily(18)],
            Cadence::TwiceDaily => vec![TriggerSpec::daily(0), TriggerSpec::daily(18)],
            Cadence::Weekly => vec![TriggerSpec::weekly(18, WEEKLY_DAY)],
            Cadence::Biweekly => vec![TriggerSpec::on_days_of_month(18, &BIWEEKLY_DAYS)],
            Cadence::FourTimesDaily => return Err(undefined(job_type, cadence)),
        },
        JobType::FileTransfer => match cadence {
            Cadence::Daily => vec![TriggerSpec::daily(12)],
            Cadence::FourTimesDaily => vec![
                TriggerSpec::daily(12),
                TriggerSpec::daily(15),
                TriggerSpec::daily(18),
                TriggerSpec::daily(21),
            ],
            Cadence::TwiceDaily => vec![TriggerSpec::daily(12), TriggerSpec::daily(21)],
            Cadence::Weekly => vec![TriggerSpec::weekly(12, WEEKLY_DAY)],
            Cadence::Biweekly => vec![TriggerSpec::on_days_of_month(12, &BIWEEKLY_DAYS)],
        },
        JobType::ProcessResponses => match cadence {
            Cadence::Daily => vec![TriggerSpec::daily(19)],
            Cadence::TwiceDaily => vec![TriggerSpec::daily(4), TriggerSpec::daily(19)],
            Cadence::Weekly => vec![TriggerSpec::weekly(19, WEEKLY_DAY)],
            Cadence::Biweekly => vec![TriggerSpec::on_days_of_month(19, &BIWEEKLY_DAYS)],
            Cadence::FourTimesDaily => return Err(undefined(job_type, cadence)),
        },
    };
    Ok(specs)
}

fn undefined(job_type: JobType, cadence: Cadence) -> ScheduleError {
    ScheduleError::UndefinedTriggerMapping { job_type, cadence }
}

/// Parse and validate a cron expression
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(expression).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Next fire instant of a trigger spec strictly after `reference`.
///
/// The expression is evaluated in `timezone` and the result converted back
/// to UTC, mirroring how the registered scheduler evaluates it.
pub fn next_fire_time(
    spec: &TriggerSpec,
    reference: DateTime<Utc>,
    timezone: Tz,
) -> Result<DateTime<Utc>, ScheduleError> {
    let expression = spec.cron_expression();
    let schedule = parse_cron_expression(&expression)?;
    let reference_in_tz = reference.with_timezone(&timezone);
    let next_in_tz = schedule.after(&reference_in_tz).next().ok_or_else(|| {
        ScheduleError::NoUpcomingExecution {
            expression: expression.clone(),
        }
    })?;
    Ok(next_in_tz.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hours(specs: &[TriggerSpec]) -> Vec<u32> {
        specs.iter().map(|s| s.hour).collect()
    }

    #[test]
    fn test_data_sourcing_trigger_times() {
        let daily = resolve_trigger_specs(JobType::DataSourcing, Cadence::Daily).unwrap();
        assert_eq!(hours(&daily), vec![16]);

        let twice = resolve_trigger_specs(JobType::DataSourcing, Cadence::TwiceDaily).unwrap();
        assert_eq!(hours(&twice), vec![16, 23]);

        let weekly = resolve_trigger_specs(JobType::DataSourcing, Cadence::Weekly).unwrap();
        assert_eq!(hours(&weekly), vec![16]);
        assert_eq!(weekly[0].weekday, Some(Weekday::Mon));

        let biweekly = resolve_trigger_specs(JobType::DataSourcing, Cadence::Biweekly).unwrap();
        assert_eq!(hours(&biweekly), vec![16]);
        assert_eq!(biweekly[0].days_of_month, Some(vec![1, 15, 29]));
    }

    #[test]
    fn test_file_generation_trigger_times() {
        let daily = resolve_trigger_specs(JobType::FileGeneration, Cadence::Daily).unwrap();
        assert_eq!(hours(&daily), vec![18]);

        let twice = resolve_trigger_specs(JobType::FileGeneration, Cadence::TwiceDaily).unwrap();
        assert_eq!(hours(&twice), vec![0, 18]);

        let weekly = resolve_trigger_specs(JobType::FileGeneration, Cadence::Weekly).unwrap();
        assert_eq!(hours(&weekly), vec![18]);

        let biweekly = resolve_trigger_specs(JobType::FileGeneration, Cadence::Biweekly).unwrap();
        assert_eq!(hours(&biweekly), vec![18]);
    }

    #[test]
    fn test_file_transfer_trigger_times() {
        let daily = resolve_trigger_specs(JobType::FileTransfer, Cadence::Daily).unwrap();
        assert_eq!(hours(&daily), vec![12]);

        let four = resolve_trigger_specs(JobType::FileTransfer, Cadence::FourTimesDaily).unwrap();
        assert_eq!(hours(&four), vec![12, 15, 18, 21]);

        let twice = resolve_trigger_specs(JobType::FileTransfer, Cadence::TwiceDaily).unwrap();
        assert_eq!(hours(&twice), vec![12, 21]);

        let weekly = resolve_trigger_specs(JobType::FileTransfer, Cadence::Weekly).unwrap();
        assert_eq!(hours(&weekly), vec![12]);
        assert_eq!(weekly[0].weekday, Some(Weekday::Mon));

        let biweekly = resolve_trigger_specs(JobType::FileTransfer, Cadence::Biweekly).unwrap();
        assert_eq!(hours(&biweekly), vec![12]);
        assert_eq!(biweekly[0].days_of_month, Some(vec![1, 15, 29]));
    }

    #[test]
    fn test_process_responses_trigger_times() {
        let daily = resolve_trigger_specs(JobType::ProcessResponses, Cadence::Daily).unwrap();
        assert_eq!(hours(&daily), vec![19]);

        let twice = resolve_trigger_specs(JobType::ProcessResponses, Cadence::TwiceDaily).unwrap();
        assert_eq!(hours(&twice), vec![4, 19]);

        let weekly = resolve_trigger_specs(JobType::ProcessResponses, Cadence::Weekly).unwrap();
        assert_eq!(hours(&weekly), vec![19]);

        let biweekly = resolve_trigger_specs(JobType::ProcessResponses, Cadence::Biweekly).unwrap();
        assert_eq!(hours(&biweekly), vec![19]);
    }

    #[test]
    fn test_four_times_daily_is_only_defined_for_file_transfer() {
        for job_type in [
            JobType::DataSourcing,
            JobType::FileGeneration,
            JobType::ProcessResponses,
        ] {
            let result = resolve_trigger_specs(job_type, Cadence::FourTimesDaily);
            assert!(matches!(
                result,
                Err(ScheduleError::UndefinedTriggerMapping { .. })
            ));
        }
        assert!(resolve_trigger_specs(JobType::FileTransfer, Cadence::FourTimesDaily).is_ok());
    }

    #[test]
    fn test_every_resolved_spec_renders_a_parseable_expression() {
        for job_type in JobType::ALL {
            for cadence in [
                Cadence::FourTimesDaily,
                Cadence::TwiceDaily,
                Cadence::Daily,
                Cadence::Weekly,
                Cadence::Biweekly,
            ] {
                if let Ok(specs) = resolve_trigger_specs(job_type, cadence) {
                    for spec in specs {
                        parse_cron_expression(&spec.cron_expression()).unwrap();
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_invalid_cron_expression() {
        let result = parse_cron_expression("not a cron expression");
        assert!(matches!(
            result,
            Err(ScheduleError::InvalidCronExpression { .. })
        ));
    }

    #[test]
    fn test_next_fire_time_daily() {
        let spec = TriggerSpec::daily(18);
        let reference = Utc.with_ymd_and_hms(2026, 3, 10, 17, 0, 0).unwrap();
        let next = next_fire_time(&spec, reference, SCHEDULE_TZ).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap());

        // Past today's instant, the next occurrence is tomorrow
        let later = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
        let next = next_fire_time(&spec, later, SCHEDULE_TZ).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 11, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_next_fire_time_weekly_lands_on_monday() {
        let spec = TriggerSpec::weekly(16, Weekday::Mon);
        // 2026-03-10 is a Tuesday; next Monday is 2026-03-16
        let reference = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let next = next_fire_time(&spec, reference, SCHEDULE_TZ).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 16, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_biweekly_skips_missing_february_29() {
        let spec = TriggerSpec::on_days_of_month(12, &[1, 15, 29]);
        // 2027 is not a leap year, so after Feb 15 the next day-of-month hit is Mar 1
        let reference = Utc.with_ymd_and_hms(2027, 2, 16, 0, 0, 0).unwrap();
        let next = next_fire_time(&spec, reference, SCHEDULE_TZ).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2027, 3, 1, 12, 0, 0).unwrap());
    }
}
