// Declarative payer job schedule table
//
// One record per onboarded payer. The table is plain data: cadence changes
// are code changes that ship through review and redeploy, never runtime
// mutation. Validation happens once at load in the composer.

use crate::models::{Cadence, JobType, PayerJobSchedule};
use std::collections::HashMap;

/// The full payer job schedule table
pub fn payer_job_schedules() -> Vec<PayerJobSchedule> {
    vec![
        PayerJobSchedule {
            payer: "aetna".to_string(),
            job_schedules: HashMap::from([
                (JobType::FileGeneration, Cadence::Daily),
                (JobType::DataSourcing, Cadence::Daily),
                (JobType::FileTransfer, Cadence::Daily),
            ]),
            jobs: vec![
                JobType::FileGeneration,
                JobType::DataSourcing,
                JobType::FileTransfer,
            ],
        },
        PayerJobSchedule {
            payer: "premera".to_string(),
            job_schedules: HashMap::from([
                (JobType::DataSourcing, Cadence::TwiceDaily),
                (JobType::FileGeneration, Cadence::TwiceDaily),
                (JobType::FileTransfer, Cadence::TwiceDaily),
                (JobType::ProcessResponses, Cadence::TwiceDaily),
            ]),
            jobs: vec![
                JobType::DataSourcing,
                JobType::FileGeneration,
                JobType::FileTransfer,
                JobType::ProcessResponses,
            ],
        },
        PayerJobSchedule {
            payer: "uhc".to_string(),
            job_schedules: HashMap::from([
                (JobType::DataSourcing, Cadence::Daily),
                (JobType::FileGeneration, Cadence::Daily),
                (JobType::FileTransfer, Cadence::Daily),
                (JobType::ProcessResponses, Cadence::Daily),
            ]),
            jobs: vec![
                JobType::DataSourcing,
                JobType::FileGeneration,
                JobType::FileTransfer,
                JobType::ProcessResponses,
            ],
        },
        PayerJobSchedule {
            payer: "cigna".to_string(),
            job_schedules: HashMap::from([
                (JobType::DataSourcing, Cadence::Daily),
                (JobType::FileGeneration, Cadence::Daily),
                (JobType::FileTransfer, Cadence::FourTimesDaily),
                (JobType::ProcessResponses, Cadence::Daily),
            ]),
            jobs: vec![
                JobType::DataSourcing,
                JobType::FileGeneration,
                JobType::FileTransfer,
                JobType::ProcessResponses,
            ],
        },
        PayerJobSchedule {
            payer: "esi".to_string(),
            job_schedules: HashMap::from([
                (JobType::DataSourcing, Cadence::Weekly),
                (JobType::FileGeneration, Cadence::Weekly),
                (JobType::FileTransfer, Cadence::Weekly),
                (JobType::ProcessResponses, Cadence::Weekly),
            ]),
            jobs: vec![
                JobType::DataSourcing,
                JobType::FileGeneration,
                JobType::FileTransfer,
                JobType::ProcessResponses,
            ],
        },
        PayerJobSchedule {
            payer: "anthem".to_string(),
            job_schedules: HashMap::from([
                (JobType::DataSourcing, Cadence::Biweekly),
                (JobType::FileGeneration, Cadence::Biweekly),
                (JobType::FileTransfer, Cadence::Biweekly),
                (JobType::ProcessResponses, Cadence::Biweekly),
            ]),
            jobs: vec![
                JobType::DataSourcing,
                JobType::FileGeneration,
                JobType::FileTransfer,
                JobType::ProcessResponses,
            ],
        },
        // luminare keeps a process_responses cadence assigned while the
        // response feed is paused; the stage is out of `jobs` so it stays
        // dormant but the entry still has to resolve.
        PayerJobSchedule {
            payer: "luminare".to_string(),
            job_schedules: HashMap::from([
                (JobType::DataSourcing, Cadence::Weekly),
                (JobType::FileGeneration, Cadence::Weekly),
                (JobType::FileTransfer, Cadence::Weekly),
                (JobType::ProcessResponses, Cadence::Weekly),
            ]),
            jobs: vec![
                JobType::DataSourcing,
                JobType::FileGeneration,
                JobType::FileTransfer,
            ],
        },
        PayerJobSchedule {
            payer: "surest".to_string(),
            job_schedules: HashMap::from([
                (JobType::DataSourcing, Cadence::Daily),
                (JobType::FileGeneration, Cadence::Daily),
                (JobType::FileTransfer, Cadence::TwiceDaily),
            ]),
            jobs: vec![
                JobType::DataSourcing,
                JobType::FileGeneration,
                JobType::FileTransfer,
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payer_names_are_unique() {
        let records = payer_job_schedules();
        let mut names: Vec<_> = records.iter().map(|r| r.payer.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), records.len());
    }

    #[test]
    fn test_every_listed_job_has_a_cadence() {
        for record in payer_job_schedules() {
            for job_type in &record.jobs {
                assert!(
                    record.job_schedules.contains_key(job_type),
                    "payer '{}' lists job '{}' without a cadence",
                    record.payer,
                    job_type
                );
            }
        }
    }

    #[test]
    fn test_aetna_record_matches_onboarding_sheet() {
        let records = payer_job_schedules();
        let aetna = records.iter().find(|r| r.payer == "aetna").unwrap();
        assert_eq!(aetna.jobs.len(), 3);
        assert!(!aetna.jobs.contains(&JobType::ProcessResponses));
        assert_eq!(
            aetna.job_schedules.get(&JobType::FileGeneration),
            Some(&Cadence::Daily)
        );
        assert_eq!(
            aetna.job_schedules.get(&JobType::DataSourcing),
            Some(&Cadence::Daily)
        );
        assert_eq!(
            aetna.job_schedules.get(&JobType::FileTransfer),
            Some(&Cadence::Daily)
        );
    }

    #[test]
    fn test_luminare_keeps_a_dormant_response_cadence() {
        let records = payer_job_schedules();
        let luminare = records.iter().find(|r| r.payer == "luminare").unwrap();
        assert!(!luminare.jobs.contains(&JobType::ProcessResponses));
        assert!(luminare
            .job_schedules
            .contains_key(&JobType::ProcessResponses));
    }
}
