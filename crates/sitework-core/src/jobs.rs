//! Job lifecycle - Proposed → Active → Completed, or Proposed → Cancelled.
//!
//! A [`Job`] owns its requirement snapshot and policy. Only the
//! transitions defined here move it between states; none skip a state or
//! go back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sitework_logic::outcome::{JobBasis, OutcomeProjection};
use sitework_logic::policy::PolicyConfiguration;
use sitework_logic::requirements::JobRequirements;
use sitework_logic::resources::EquipmentType;
use sitework_logic::tuning::OutcomeTuning;

use crate::catalog::ContractTemplate;
use crate::components::{CrewId, JobId, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Proposed,
    Active,
    Completed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled)
    }
}

/// Illegal state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    IllegalTransition {
        job: JobId,
        from: JobState,
        to: JobState,
    },
    /// Completion requested before the planned duration elapsed.
    NotFinished { job: JobId, elapsed: u32, planned: u32 },
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::IllegalTransition { job, from, to } => {
                write!(f, "{} cannot go from {:?} to {:?}", job, from, to)
            }
            LifecycleError::NotFinished {
                job,
                elapsed,
                planned,
            } => write!(f, "{} has run {} of {} days", job, elapsed, planned),
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Everything frozen onto a job when it is committed.
#[derive(Debug, Clone)]
pub(crate) struct Commitment {
    pub crew: CrewId,
    pub projection: OutcomeProjection,
    pub crew_morale: u8,
    pub deployed_units: Vec<UnitId>,
    pub rented: Option<EquipmentType>,
    pub temporary_hires: u32,
    pub day: u64,
}

/// A contracted unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub contract_id: u32,
    pub location: String,
    pub contract_payment: i64,
    pub deadline_days: u32,
    pub base_duration: u32,

    requirements: JobRequirements,
    policy: PolicyConfiguration,
    state: JobState,

    crew: Option<CrewId>,
    elapsed_days: u32,
    planned_duration: u32,
    /// 0-100
    progress: u8,
    quality: u8,
    pending_morale_delta: i32,
    net_profit: i64,
    morale_at_commit: Option<u8>,

    deployed_units: Vec<UnitId>,
    rented: Option<EquipmentType>,
    temporary_hires: u32,
    committed_on: Option<u64>,
    completed_on: Option<u64>,
}

impl Job {
    /// Accept a contract. Requirements are copied out of the template.
    pub fn propose(id: JobId, template: &ContractTemplate) -> Self {
        Self {
            id,
            contract_id: template.id,
            location: template.location.clone(),
            contract_payment: template.payment,
            deadline_days: template.deadline_days,
            base_duration: template.base_duration,
            requirements: JobRequirements::snapshot(&template.requirements),
            policy: PolicyConfiguration::new(),
            state: JobState::Proposed,
            crew: None,
            elapsed_days: 0,
            planned_duration: 0,
            progress: 0,
            quality: 0,
            pending_morale_delta: 0,
            net_profit: 0,
            morale_at_commit: None,
            deployed_units: Vec::new(),
            rented: None,
            temporary_hires: 0,
            committed_on: None,
            completed_on: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn basis(&self) -> JobBasis {
        JobBasis {
            base_duration: self.base_duration,
            contract_payment: self.contract_payment,
        }
    }

    pub fn requirements(&self) -> &JobRequirements {
        &self.requirements
    }

    pub fn policy(&self) -> &PolicyConfiguration {
        &self.policy
    }

    /// Policy and requirements are editable only while Proposed.
    pub(crate) fn planning_mut(&mut self) -> Option<(&mut PolicyConfiguration, &mut JobRequirements)> {
        if self.state == JobState::Proposed {
            Some((&mut self.policy, &mut self.requirements))
        } else {
            None
        }
    }

    /// Re-derive the working requirement copy from the current levers.
    pub(crate) fn recompute_requirements(&mut self, tuning: &OutcomeTuning) {
        if self.state == JobState::Proposed {
            self.requirements.recompute(&self.policy, tuning);
        }
    }

    pub fn crew(&self) -> Option<CrewId> {
        self.crew
    }

    pub fn elapsed_days(&self) -> u32 {
        self.elapsed_days
    }

    pub fn planned_duration(&self) -> u32 {
        self.planned_duration
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn pending_morale_delta(&self) -> i32 {
        self.pending_morale_delta
    }

    pub fn net_profit(&self) -> i64 {
        self.net_profit
    }

    pub fn morale_at_commit(&self) -> Option<u8> {
        self.morale_at_commit
    }

    pub fn deployed_units(&self) -> &[UnitId] {
        &self.deployed_units
    }

    pub fn rented(&self) -> Option<EquipmentType> {
        self.rented
    }

    pub fn temporary_hires(&self) -> u32 {
        self.temporary_hires
    }

    pub fn committed_on(&self) -> Option<u64> {
        self.committed_on
    }

    pub fn completed_on(&self) -> Option<u64> {
        self.completed_on
    }

    /// Finished within the client's deadline.
    pub fn on_time(&self) -> bool {
        self.planned_duration <= self.deadline_days
    }

    // ── Transitions ────────────────────────────────────────────────────

    fn transition(&mut self, to: JobState) -> Result<(), LifecycleError> {
        let legal = matches!(
            (self.state, to),
            (JobState::Proposed, JobState::Active)
                | (JobState::Proposed, JobState::Cancelled)
                | (JobState::Active, JobState::Completed)
        );
        if !legal {
            return Err(LifecycleError::IllegalTransition {
                job: self.id,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), LifecycleError> {
        self.transition(JobState::Cancelled)
    }

    /// Enter Active. Only the reservation commit calls this.
    pub(crate) fn activate(&mut self, commitment: Commitment) -> Result<(), LifecycleError> {
        self.transition(JobState::Active)?;
        self.crew = Some(commitment.crew);
        self.elapsed_days = 0;
        self.progress = 0;
        self.planned_duration = commitment.projection.planned_duration;
        self.quality = commitment.projection.quality;
        self.pending_morale_delta = commitment.projection.morale_delta;
        self.net_profit = commitment.projection.net_profit;
        self.morale_at_commit = Some(commitment.crew_morale);
        self.deployed_units = commitment.deployed_units;
        self.rented = commitment.rented;
        self.temporary_hires = commitment.temporary_hires;
        self.committed_on = Some(commitment.day);
        Ok(())
    }

    /// Count one day of work. Returns `true` once the planned duration is reached.
    pub(crate) fn advance_day(&mut self) -> bool {
        if self.state != JobState::Active {
            return false;
        }
        self.elapsed_days = (self.elapsed_days + 1).min(self.planned_duration);
        self.progress = percent(self.elapsed_days, self.planned_duration);
        self.elapsed_days == self.planned_duration
    }

    /// Enter Completed. Only the day-tick scheduler calls this.
    pub(crate) fn complete(&mut self, day: u64) -> Result<(), LifecycleError> {
        if self.state == JobState::Active && self.elapsed_days != self.planned_duration {
            return Err(LifecycleError::NotFinished {
                job: self.id,
                elapsed: self.elapsed_days,
                planned: self.planned_duration,
            });
        }
        self.transition(JobState::Completed)?;
        self.completed_on = Some(day);
        Ok(())
    }
}

fn percent(elapsed: u32, planned: u32) -> u8 {
    if planned == 0 {
        return 100;
    }
    (100.0 * elapsed as f64 / planned as f64).round().min(100.0) as u8
}

/// All jobs the company has accepted, by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobBoard {
    jobs: BTreeMap<JobId, Job>,
    next_id: u32,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a contract as a new Proposed job.
    pub fn propose(&mut self, template: &ContractTemplate) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.jobs.insert(id, Job::propose(id, template));
        id
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn in_state(&self, state: JobState) -> impl Iterator<Item = &Job> {
        self.jobs.values().filter(move |j| j.state == state)
    }

    pub(crate) fn ids_in_state(&self, state: JobState) -> Vec<JobId> {
        self.in_state(state).map(|j| j.id).collect()
    }

    /// Active job currently holding a crew.
    pub fn holder_of(&self, crew: CrewId) -> Option<JobId> {
        self.in_state(JobState::Active)
            .find(|j| j.crew == Some(crew))
            .map(|j| j.id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
