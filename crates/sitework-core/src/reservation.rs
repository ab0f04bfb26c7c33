//! Reservation - feasibility, atomic commit and release of a job's resources.
//!
//! Commit runs in two phases. The first only reads: it checks the job, the
//! crew, every requirement and the ledger invariants it is about to rely
//! on, and builds a plan. The second applies the plan and cannot fail, so
//! a rejected commit never leaves partial state behind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sitework_logic::feasibility::{assess, FeasibilityReport, FeasibilityRules};
use sitework_logic::lever::LeverPosition;
use sitework_logic::outcome::{project_outcome, OutcomeProjection};
use sitework_logic::policy::LeverKind;
use sitework_logic::resources::{EquipmentType, MaterialType, Profession};
use sitework_logic::tuning::OutcomeTuning;

use crate::components::*;
use crate::jobs::{Commitment, Job, JobBoard, JobState, LifecycleError};
use crate::ledger::{InvariantViolation, ResourceLedger};

/// Why a commit was refused. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    InsufficientCrew {
        profession: Profession,
        required: u32,
        available: u32,
    },
    InsufficientEquipment {
        equipment: EquipmentType,
        required: u32,
        available: u32,
    },
    InsufficientMaterial {
        material: MaterialType,
        required: u32,
        available: u32,
    },
    CrewAlreadyEngaged { crew: CrewId, job: Option<JobId> },
    UnknownCrew(CrewId),
    UnknownJob(JobId),
    NotProposed { job: JobId, state: JobState },
    Invariant(InvariantViolation),
}

impl std::fmt::Display for ReservationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationError::InsufficientCrew {
                profession,
                required,
                available,
            } => write!(
                f,
                "not enough {}s: need {}, have {}",
                profession.name(),
                required,
                available
            ),
            ReservationError::InsufficientEquipment {
                equipment,
                required,
                available,
            } => write!(
                f,
                "not enough {} units: need {}, have {}",
                equipment.name(),
                required,
                available
            ),
            ReservationError::InsufficientMaterial {
                material,
                required,
                available,
            } => write!(
                f,
                "not enough {}: need {}, have {}",
                material.name(),
                required,
                available
            ),
            ReservationError::CrewAlreadyEngaged { crew, job } => match job {
                Some(job) => write!(f, "{} is already engaged on {}", crew, job),
                None => write!(f, "{} is already engaged", crew),
            },
            ReservationError::UnknownCrew(id) => write!(f, "unknown {}", id),
            ReservationError::UnknownJob(id) => write!(f, "unknown {}", id),
            ReservationError::NotProposed { job, state } => {
                write!(f, "{} is {:?}, not Proposed", job, state)
            }
            ReservationError::Invariant(v) => write!(f, "invariant violated: {}", v),
        }
    }
}

impl std::error::Error for ReservationError {}

impl From<InvariantViolation> for ReservationError {
    fn from(v: InvariantViolation) -> Self {
        ReservationError::Invariant(v)
    }
}

impl From<LifecycleError> for ReservationError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::IllegalTransition { job, from, .. } => {
                ReservationError::NotProposed { job, state: from }
            }
            LifecycleError::NotFinished { job, .. } => ReservationError::NotProposed {
                job,
                state: JobState::Active,
            },
        }
    }
}

// ── Feasibility ────────────────────────────────────────────────────────

/// Gap report for a job under its current policy. Recomputed on every call.
pub fn feasibility(ledger: &ResourceLedger, job: &Job, temporary_hire_limit: u32) -> FeasibilityReport {
    let rules = FeasibilityRules::from_policy(job.policy(), temporary_hire_limit);
    assess(job.requirements().current(), &ledger.availability(), rules)
}

pub fn can_commit(ledger: &ResourceLedger, job: &Job, temporary_hire_limit: u32) -> bool {
    job.state() == JobState::Proposed && feasibility(ledger, job, temporary_hire_limit).committable
}

/// Lock the High end of the material levers when stock could not cover
/// the larger quantities it asks for, and unlock it once stock can.
/// Returns the levers that were snapped from High to Mid.
pub fn refresh_lever_locks(ledger: &ResourceLedger, job: &mut Job, tuning: &OutcomeTuning) -> Vec<LeverKind> {
    let mut snapped = Vec::new();
    for kind in [LeverKind::MaterialPolicy, LeverKind::DeliverySpeed] {
        let Some((policy, requirements)) = job.planning_mut() else {
            return snapped;
        };
        let mut trial = *policy;
        trial.set_locked(kind, LeverPosition::High, false);
        let _ = trial.set_lever(kind, LeverPosition::High);
        let short = requirements
            .preview_materials(&trial, tuning)
            .iter()
            .any(|(material, quantity)| ledger.stock_quantity(*material) < *quantity);
        if policy.set_locked(kind, LeverPosition::High, short) {
            log::info!(
                "{}: {} locked at {}, snapped to standard",
                job.id,
                kind.name(),
                kind.position_label(LeverPosition::High)
            );
            snapped.push(kind);
        }
    }
    if !snapped.is_empty() {
        job.recompute_requirements(tuning);
    }
    snapped
}

/// A lever moved by the engine rather than the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockChange {
    pub job: JobId,
    pub lever: LeverKind,
}

// ── Commit ─────────────────────────────────────────────────────────────

/// Resource claims validated and ready to apply.
struct CommitPlan {
    crew_entity: hecs::Entity,
    worker_entities: Vec<hecs::Entity>,
    unit_entities: Vec<(hecs::Entity, UnitId)>,
    rented: Option<EquipmentType>,
    temporary_hires: u32,
    materials: BTreeMap<MaterialType, u32>,
    crew_morale: u8,
}

/// Settings the commit needs besides the job and crew.
#[derive(Debug, Clone, Copy)]
pub struct CommitContext<'a> {
    pub tuning: &'a OutcomeTuning,
    pub temporary_hire_limit: u32,
    pub day: u64,
}

/// Atomically reserve everything `job` needs and make it Active.
pub fn commit(
    ledger: &mut ResourceLedger,
    board: &mut JobBoard,
    job_id: JobId,
    crew_id: CrewId,
    ctx: CommitContext<'_>,
) -> Result<OutcomeProjection, ReservationError> {
    let job = board.get(job_id).ok_or(ReservationError::UnknownJob(job_id))?;
    let plan = plan_commit(ledger, board, job, crew_id, ctx.temporary_hire_limit)?;
    let projection = project_outcome(&job.basis(), job.policy(), ctx.tuning, Some(plan.crew_morale));

    // Everything below is infallible given a valid plan.
    let job = board
        .get_mut(job_id)
        .ok_or(ReservationError::UnknownJob(job_id))?;
    job.activate(Commitment {
        crew: crew_id,
        projection: projection.clone(),
        crew_morale: plan.crew_morale,
        deployed_units: plan.unit_entities.iter().map(|(_, id)| *id).collect(),
        rented: plan.rented,
        temporary_hires: plan.temporary_hires,
        day: ctx.day,
    })?;
    apply_plan(ledger, &plan, job_id);

    log::info!(
        "{} committed with {}: {} days, quality {}, profit {}{}",
        job_id,
        crew_id,
        projection.planned_duration,
        projection.quality,
        projection.net_profit,
        match plan.rented {
            Some(e) => format!(", renting one {}", e.name()),
            None => String::new(),
        }
    );
    Ok(projection)
}

fn plan_commit(
    ledger: &ResourceLedger,
    board: &JobBoard,
    job: &Job,
    crew_id: CrewId,
    temporary_hire_limit: u32,
) -> Result<CommitPlan, ReservationError> {
    if job.state() != JobState::Proposed {
        return Err(ReservationError::NotProposed {
            job: job.id,
            state: job.state(),
        });
    }

    let crew_entity = ledger
        .crew_entity(crew_id)
        .ok_or(ReservationError::UnknownCrew(crew_id))?;
    let crew = ledger
        .crew(crew_id)
        .ok_or(ReservationError::UnknownCrew(crew_id))?;
    let holder = board.holder_of(crew_id);
    if crew.engaged || holder.is_some() {
        return Err(ReservationError::CrewAlreadyEngaged {
            crew: crew_id,
            job: holder.or(crew.job),
        });
    }

    // Crew members: present, idle, and listed by this crew only.
    let mut worker_entities = Vec::with_capacity(crew.workers.len());
    let mut composition: BTreeMap<Profession, u32> = BTreeMap::new();
    for member in &crew.workers {
        let entity = ledger
            .worker_entity(*member)
            .ok_or(InvariantViolation::MissingWorker {
                worker: *member,
                crew: crew_id,
            })?;
        let worker = ledger
            .worker(*member)
            .ok_or(InvariantViolation::MissingWorker {
                worker: *member,
                crew: crew_id,
            })?;
        if worker.engaged {
            return Err(InvariantViolation::WorkerEngagementMismatch {
                worker: *member,
                crew: crew_id,
            }
            .into());
        }
        if let Some(other) = ledger
            .crews()
            .into_iter()
            .find(|c| c.id != crew_id && c.workers.contains(member))
        {
            return Err(InvariantViolation::WorkerInTwoCrews {
                worker: *member,
                first: other.id,
                second: crew_id,
            }
            .into());
        }
        *composition.entry(worker.profession).or_insert(0) += 1;
        worker_entities.push(entity);
    }

    // Professions, with temporary hires allowed on the temporary-hires setting.
    let hire_limit = if job.policy().position(LeverKind::CrewSize) == LeverPosition::High {
        temporary_hire_limit
    } else {
        0
    };
    let mut shortfall = 0;
    let mut first_short = None;
    for (profession, required) in &job.requirements().current().crew {
        let available = composition.get(profession).copied().unwrap_or(0);
        if available < *required {
            shortfall += required - available;
            if first_short.is_none() {
                first_short = Some((*profession, *required, available));
            }
        }
    }
    if let Some((profession, required, available)) = first_short {
        if shortfall > hire_limit {
            return Err(ReservationError::InsufficientCrew {
                profession,
                required,
                available,
            });
        }
    }

    // Equipment, with at most one rented unit on the rental setting.
    let rental = job.policy().position(LeverKind::EquipmentMode) == LeverPosition::High;
    let mut rented = None;
    let mut unit_entities = Vec::new();
    for (equipment, required) in &job.requirements().current().equipment {
        let mut candidates: Vec<(hecs::Entity, UnitId)> = ledger
            .world
            .query::<&EquipmentUnit>()
            .iter()
            .filter(|(_, u)| u.equipment_type == *equipment && u.is_available())
            .map(|(e, u)| (e, u.id))
            .collect();
        candidates.sort_by_key(|(_, id)| *id);
        let available = candidates.len() as u32;
        if available < *required {
            if rental && rented.is_none() && required - available == 1 {
                rented = Some(*equipment);
            } else {
                return Err(ReservationError::InsufficientEquipment {
                    equipment: *equipment,
                    required: *required,
                    available,
                });
            }
        }
        unit_entities.extend(candidates.into_iter().take(*required as usize));
    }

    // Materials.
    let materials = job.requirements().current().materials.clone();
    for (material, required) in &materials {
        let available = ledger.stock_quantity(*material);
        if available < *required {
            return Err(ReservationError::InsufficientMaterial {
                material: *material,
                required: *required,
                available,
            });
        }
    }

    Ok(CommitPlan {
        crew_entity,
        worker_entities,
        unit_entities,
        rented,
        temporary_hires: shortfall,
        materials,
        crew_morale: crew.morale,
    })
}

fn apply_plan(ledger: &mut ResourceLedger, plan: &CommitPlan, job: JobId) {
    if let Ok(mut crew) = ledger.world.get::<&mut Crew>(plan.crew_entity) {
        crew.engaged = true;
        crew.job = Some(job);
    }
    for entity in &plan.worker_entities {
        if let Ok(mut worker) = ledger.world.get::<&mut Worker>(*entity) {
            worker.engaged = true;
        }
    }
    for (entity, _) in &plan.unit_entities {
        if let Ok(mut unit) = ledger.world.get::<&mut EquipmentUnit>(*entity) {
            unit.state = EquipmentState::Deployed;
        }
    }
    for (material, quantity) in &plan.materials {
        ledger.warehouse.debit(*material, *quantity);
    }
}

// ── Release ────────────────────────────────────────────────────────────

/// Return a finished job's crew and equipment. Consumed material stays consumed.
pub fn release(ledger: &mut ResourceLedger, job: &Job) -> Result<(), InvariantViolation> {
    let Some(crew_id) = job.crew() else {
        return Ok(());
    };
    let crew_entity = ledger
        .crew_entity(crew_id)
        .ok_or(InvariantViolation::CrewBindingMismatch { crew: crew_id })?;
    let members = ledger
        .crew(crew_id)
        .ok_or(InvariantViolation::CrewBindingMismatch { crew: crew_id })?
        .workers;

    let mut worker_entities = Vec::with_capacity(members.len());
    for member in &members {
        let entity = ledger
            .worker_entity(*member)
            .ok_or(InvariantViolation::MissingWorker {
                worker: *member,
                crew: crew_id,
            })?;
        worker_entities.push(entity);
    }
    let mut unit_entities = Vec::with_capacity(job.deployed_units().len());
    for unit in job.deployed_units() {
        let entity = ledger.unit_entity(*unit).ok_or(InvariantViolation::MissingUnit {
            unit: *unit,
            job: job.id,
        })?;
        unit_entities.push(entity);
    }

    if let Ok(mut crew) = ledger.world.get::<&mut Crew>(crew_entity) {
        crew.engaged = false;
        crew.job = None;
    }
    for entity in worker_entities {
        if let Ok(mut worker) = ledger.world.get::<&mut Worker>(entity) {
            worker.engaged = false;
        }
    }
    for entity in unit_entities {
        if let Ok(mut unit) = ledger.world.get::<&mut EquipmentUnit>(entity) {
            unit.state = EquipmentState::Available;
        }
    }
    Ok(())
}

/// Cross-check the board against the ledger: each Active job holds an
/// existing, engaged crew no other job holds, and each deployed unit is
/// held by exactly one Active job.
pub fn check_reservations(ledger: &ResourceLedger, board: &JobBoard) -> Result<(), InvariantViolation> {
    ledger.check_invariants()?;

    let mut crew_holder: BTreeMap<CrewId, JobId> = BTreeMap::new();
    let mut unit_holder: BTreeMap<UnitId, JobId> = BTreeMap::new();
    for job in board.in_state(JobState::Active) {
        let crew = job.crew().ok_or(InvariantViolation::MissingCrew { job: job.id })?;
        if let Some(first) = crew_holder.insert(crew, job.id) {
            return Err(InvariantViolation::CrewDoubleBooked {
                crew,
                first,
                second: job.id,
            });
        }
        match ledger.crew(crew) {
            None => return Err(InvariantViolation::MissingCrew { job: job.id }),
            Some(record) if !record.engaged || record.job != Some(job.id) => {
                return Err(InvariantViolation::CrewBindingMismatch { crew });
            }
            Some(_) => {}
        }

        for unit in job.deployed_units() {
            if let Some(first) = unit_holder.insert(*unit, job.id) {
                return Err(InvariantViolation::UnitDoubleBooked {
                    unit: *unit,
                    first,
                    second: job.id,
                });
            }
            match ledger.unit(*unit) {
                None => {
                    return Err(InvariantViolation::MissingUnit {
                        unit: *unit,
                        job: job.id,
                    })
                }
                Some(record) if record.state != EquipmentState::Deployed => {
                    return Err(InvariantViolation::HeldUnitNotDeployed {
                        unit: *unit,
                        job: job.id,
                    });
                }
                Some(_) => {}
            }
        }
    }

    for (_, unit) in ledger.world.query::<&EquipmentUnit>().iter() {
        if unit.state == EquipmentState::Deployed && !unit_holder.contains_key(&unit.id) {
            return Err(InvariantViolation::UnitNotHeld { unit: unit.id });
        }
    }
    for crew in ledger.crews() {
        if crew.engaged && !crew_holder.contains_key(&crew.id) {
            return Err(InvariantViolation::CrewBindingMismatch { crew: crew.id });
        }
    }
    Ok(())
}
