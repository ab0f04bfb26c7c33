//! Day-tick scheduler - advances every Active job by one simulated day.

use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::jobs::{Job, JobBoard, JobState};
use crate::ledger::{InvariantViolation, ResourceLedger};
use crate::reservation::release;
use crate::treasury::Treasury;

/// What happened when a job finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub job: JobId,
    pub crew: CrewId,
    pub payout: i64,
    pub morale_delta: i32,
    pub quality: u8,
    /// Day the job completed on.
    pub day: u64,
    pub on_time: bool,
}

/// `round(net_profit × fraction)`.
pub fn completion_payout(net_profit: i64, fraction: f64) -> i64 {
    (net_profit as f64 * fraction).round() as i64
}

/// Advance all Active jobs by one day, in job-id order.
///
/// A job that reaches its planned duration is settled: its crew and
/// equipment are released, the payout is credited and the crew's pending
/// morale delta applied. If settling hits a broken invariant the job is
/// left Active and untouched, the violation is logged, and the other jobs
/// still tick.
pub fn advance_one_day(
    board: &mut JobBoard,
    ledger: &mut ResourceLedger,
    treasury: &mut impl Treasury,
    payout_fraction: f64,
    day: u64,
) -> Vec<CompletionReport> {
    let mut reports = Vec::new();

    for id in board.ids_in_state(JobState::Active) {
        let Some(job) = board.get_mut(id) else {
            continue;
        };
        if !job.advance_day() {
            log::debug!(
                "{} day {}/{} ({}%)",
                id,
                job.elapsed_days(),
                job.planned_duration(),
                job.progress()
            );
            continue;
        }

        match settle(ledger, job, treasury, payout_fraction, day) {
            Ok(report) => {
                log::info!(
                    "{} completed on day {}: payout {}, quality {}, morale {:+}{}",
                    id,
                    day,
                    report.payout,
                    report.quality,
                    report.morale_delta,
                    if report.on_time { "" } else { ", late" }
                );
                reports.push(report);
            }
            Err(violation) => {
                log::error!("{} could not be settled: {}", id, violation);
            }
        }
    }

    reports
}

fn settle(
    ledger: &mut ResourceLedger,
    job: &mut Job,
    treasury: &mut impl Treasury,
    payout_fraction: f64,
    day: u64,
) -> Result<CompletionReport, InvariantViolation> {
    let crew = job
        .crew()
        .ok_or(InvariantViolation::MissingCrew { job: job.id })?;
    let crew_entity = ledger
        .crew_entity(crew)
        .ok_or(InvariantViolation::MissingCrew { job: job.id })?;

    release(ledger, job)?;
    if let Err(e) = job.complete(day) {
        // Unreachable while advance_day reports completion correctly.
        log::error!("{}", e);
    }

    let payout = completion_payout(job.net_profit(), payout_fraction);
    treasury.credit(payout);
    if let Ok(mut record) = ledger.world.get::<&mut Crew>(crew_entity) {
        record.adjust_morale(job.pending_morale_delta());
    }

    Ok(CompletionReport {
        job: job.id,
        crew,
        payout,
        morale_delta: job.pending_morale_delta(),
        quality: job.quality(),
        day,
        on_time: job.on_time(),
    })
}
