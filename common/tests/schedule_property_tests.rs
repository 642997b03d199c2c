// Property-based tests for trigger time resolution

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use common::models::{Cadence, JobType, TriggerSpec};
use common::schedule::{next_fire_time, resolve_trigger_specs, SCHEDULE_TZ};
use proptest::prelude::*;

// ============================================================================
// Property Generators
// ============================================================================

fn arb_job_type() -> impl Strategy<Value = JobType> {
    prop::sample::select(JobType::ALL.to_vec())
}

fn arb_cadence() -> impl Strategy<Value = Cadence> {
    prop::sample::select(vec![
        Cadence::FourTimesDaily,
        Cadence::TwiceDaily,
        Cadence::Daily,
        Cadence::Weekly,
        Cadence::Biweekly,
    ])
}

/// Reference instants between 2020 and 2040
fn arb_reference_time() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800i64..2_208_988_800i64)
        .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// *For any* resolved trigger spec and reference instant, the next fire
    /// time is strictly later, lands exactly on the trigger's UTC hour, and
    /// carries no minute or second component.
    #[test]
    fn property_next_fire_time_lands_on_the_trigger_instant(
        job_type in arb_job_type(),
        cadence in arb_cadence(),
        reference in arb_reference_time()
    ) {
        prop_assume!(resolve_trigger_specs(job_type, cadence).is_ok());

        for spec in resolve_trigger_specs(job_type, cadence).unwrap() {
            let next = next_fire_time(&spec, reference, SCHEDULE_TZ).unwrap();
            prop_assert!(next > reference);
            prop_assert_eq!(next.hour(), spec.hour);
            prop_assert_eq!(next.minute(), 0);
            prop_assert_eq!(next.second(), 0);
        }
    }

    /// *For any* reference instant, a weekly trigger always fires on Monday.
    #[test]
    fn property_weekly_triggers_fire_on_monday(
        hour in 0u32..24u32,
        reference in arb_reference_time()
    ) {
        let spec = TriggerSpec::weekly(hour, Weekday::Mon);
        let next = next_fire_time(&spec, reference, SCHEDULE_TZ).unwrap();
        prop_assert_eq!(next.weekday(), Weekday::Mon);
        prop_assert_eq!(next.hour(), hour);
    }

    /// *For any* reference instant, a biweekly trigger fires only on the
    /// 1st, 15th or 29th of the month.
    #[test]
    fn property_biweekly_triggers_fire_on_fixed_days(
        hour in 0u32..24u32,
        reference in arb_reference_time()
    ) {
        let spec = TriggerSpec::on_days_of_month(hour, &[1, 15, 29]);
        let next = next_fire_time(&spec, reference, SCHEDULE_TZ).unwrap();
        prop_assert!([1, 15, 29].contains(&next.day()));
        prop_assert_eq!(next.hour(), hour);
    }

    /// *For any* daily trigger, consecutive occurrences are exactly one day
    /// apart.
    #[test]
    fn property_daily_occurrences_are_24_hours_apart(
        hour in 0u32..24u32,
        reference in arb_reference_time()
    ) {
        let spec = TriggerSpec::daily(hour);
        let first = next_fire_time(&spec, reference, SCHEDULE_TZ).unwrap();
        let second = next_fire_time(&spec, first, SCHEDULE_TZ).unwrap();
        prop_assert_eq!(second - first, chrono::Duration::days(1));
    }

    /// *For any* four-times-daily file transfer day, the four occurrences
    /// starting from midnight are 12:00, 15:00, 18:00 and 21:00.
    #[test]
    fn property_four_times_daily_transfer_walks_the_window(
        reference in arb_reference_time()
    ) {
        let specs = resolve_trigger_specs(JobType::FileTransfer, Cadence::FourTimesDaily).unwrap();
        let midnight = reference
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();

        let mut hours: Vec<u32> = specs
            .iter()
            .map(|spec| next_fire_time(spec, midnight, SCHEDULE_TZ).unwrap().hour())
            .collect();
        hours.sort_unstable();
        prop_assert_eq!(hours, vec![12, 15, 18, 21]);
    }
}
