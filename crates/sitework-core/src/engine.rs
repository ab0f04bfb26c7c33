//! Company engine - main entry point for running the simulation

use rand::rngs::StdRng;
use rand::SeedableRng;
use sitework_logic::feasibility::FeasibilityReport;
use sitework_logic::lever::{LeverError, LeverPosition};
use sitework_logic::outcome::{project_outcome, OutcomeProjection};
use sitework_logic::policy::{InsuranceKind, LeverKind};

use crate::catalog::ContractTemplate;
use crate::components::*;
use crate::config::{CompanyConfig, ConfigError};
use crate::generation::{generate_roster, Roster, RosterConfig};
use crate::jobs::{Job, JobBoard, JobState, LifecycleError};
use crate::ledger::{InvariantViolation, LedgerError, ResourceLedger};
use crate::persistence::{load_company, save_company, Clock, SaveError};
use crate::reservation::{self, CommitContext, LockChange, ReservationError};
use crate::scheduler::{self, CompletionReport};
use crate::treasury::{Funds, Treasury};

/// Main company engine
pub struct CompanyEngine {
    ledger: ResourceLedger,
    board: JobBoard,
    funds: Funds,
    config: CompanyConfig,
    clock: Clock,
    /// Levers snapped by stock changes, not yet taken by the host.
    lock_changes: Vec<LockChange>,
}

impl CompanyEngine {
    /// Create an empty company. The config is taken as given; see
    /// [`CompanyEngine::try_new`] for a validated constructor.
    pub fn new(config: CompanyConfig) -> Self {
        Self {
            ledger: ResourceLedger::new(config.warehouse_capacity),
            board: JobBoard::new(),
            funds: Funds::new(config.starting_funds),
            clock: Clock::default(),
            config,
            lock_changes: Vec::new(),
        }
    }

    pub fn try_new(config: CompanyConfig) -> Result<Self, Vec<ConfigError>> {
        let errors = config.validate();
        if errors.is_empty() {
            Ok(Self::new(config))
        } else {
            Err(errors)
        }
    }

    /// Populate the company with generated crews, equipment and stock.
    pub fn generate(&mut self, roster: &RosterConfig) -> Result<Roster, LedgerError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let roster = generate_roster(&mut self.ledger, roster, &mut rng)?;
        let changes = self.refresh_locks();
        self.lock_changes.extend(changes);
        Ok(roster)
    }

    // ── Jobs ───────────────────────────────────────────────────────────

    /// Accept a contract as a Proposed job.
    pub fn propose_job(&mut self, template: &ContractTemplate) -> JobId {
        let id = self.board.propose(template);
        if let Some(job) = self.board.get_mut(id) {
            let snapped = reservation::refresh_lever_locks(&self.ledger, job, &self.config.tuning);
            self.lock_changes
                .extend(snapped.into_iter().map(|lever| LockChange { job: id, lever }));
        }
        log::info!("{} proposed: {} for {}", id, template.location, template.payment);
        id
    }

    /// Move a lever. Locks are re-evaluated against current stock first;
    /// a locked extreme leaves the lever at Mid and is reported as
    /// [`JobError::Lever`].
    pub fn set_lever(
        &mut self,
        job: JobId,
        kind: LeverKind,
        position: LeverPosition,
    ) -> Result<(), JobError> {
        let record = self.board.get_mut(job).ok_or(JobError::UnknownJob(job))?;
        let state = record.state();
        if state != JobState::Proposed {
            return Err(JobError::NotEditable { job, state });
        }
        let mut snapped = reservation::refresh_lever_locks(&self.ledger, record, &self.config.tuning);

        let (policy, _) = record
            .planning_mut()
            .ok_or(JobError::NotEditable { job, state })?;
        let result = policy.set_lever(kind, position);

        record.recompute_requirements(&self.config.tuning);
        snapped.extend(reservation::refresh_lever_locks(
            &self.ledger,
            record,
            &self.config.tuning,
        ));
        self.lock_changes
            .extend(snapped.into_iter().map(|lever| LockChange { job, lever }));

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                log::warn!("{}: {} rejected: {}", job, kind.name(), e);
                Err(JobError::Lever(e))
            }
        }
    }

    pub fn set_insurance(
        &mut self,
        job: JobId,
        kind: InsuranceKind,
        enabled: bool,
    ) -> Result<(), JobError> {
        let record = self.board.get_mut(job).ok_or(JobError::UnknownJob(job))?;
        let state = record.state();
        let (policy, _) = record
            .planning_mut()
            .ok_or(JobError::NotEditable { job, state })?;
        policy.set_insurance(kind, enabled);
        Ok(())
    }

    /// Projected numbers for a job. Before commit no crew morale is
    /// known, so no low-morale penalty applies; after commit the morale
    /// captured at commit is used.
    pub fn projected_outcome(&self, job: JobId) -> Result<OutcomeProjection, JobError> {
        let record = self.job(job).ok_or(JobError::UnknownJob(job))?;
        Ok(project_outcome(
            &record.basis(),
            record.policy(),
            &self.config.tuning,
            record.morale_at_commit(),
        ))
    }

    /// Projection as if `crew` were committed now, using its current morale.
    pub fn projected_outcome_for_crew(
        &self,
        job: JobId,
        crew: CrewId,
    ) -> Result<OutcomeProjection, JobError> {
        let record = self.job(job).ok_or(JobError::UnknownJob(job))?;
        let crew = self.ledger.crew(crew).ok_or(JobError::UnknownCrew(crew))?;
        Ok(project_outcome(
            &record.basis(),
            record.policy(),
            &self.config.tuning,
            Some(crew.morale),
        ))
    }

    pub fn feasibility(&self, job: JobId) -> Result<FeasibilityReport, JobError> {
        let record = self.job(job).ok_or(JobError::UnknownJob(job))?;
        Ok(reservation::feasibility(
            &self.ledger,
            record,
            self.config.temporary_hire_limit,
        ))
    }

    pub fn can_commit(&self, job: JobId) -> bool {
        self.job(job).is_some_and(|record| {
            reservation::can_commit(&self.ledger, record, self.config.temporary_hire_limit)
        })
    }

    /// Reserve everything the job needs and start it. All or nothing.
    pub fn commit_job(&mut self, job: JobId, crew: CrewId) -> Result<(), ReservationError> {
        let ctx = CommitContext {
            tuning: &self.config.tuning,
            temporary_hire_limit: self.config.temporary_hire_limit,
            day: self.clock.day,
        };
        match reservation::commit(&mut self.ledger, &mut self.board, job, crew, ctx) {
            Ok(_) => {
                let changes = self.refresh_locks();
                self.lock_changes.extend(changes);
                Ok(())
            }
            Err(e) => {
                log::warn!("{} not committed: {}", job, e);
                Err(e)
            }
        }
    }

    /// Drop a Proposed job. Nothing was reserved, so the ledger is untouched.
    pub fn cancel_job(&mut self, job: JobId) -> Result<(), JobError> {
        let record = self.board.get_mut(job).ok_or(JobError::UnknownJob(job))?;
        record.cancel()?;
        log::info!("{} cancelled", job);
        Ok(())
    }

    // ── Time ───────────────────────────────────────────────────────────

    /// Run one simulated day.
    pub fn advance_one_day(&mut self) -> Vec<CompletionReport> {
        self.clock.day += 1;
        log::debug!("day {}", self.clock.day);
        let reports = scheduler::advance_one_day(
            &mut self.board,
            &mut self.ledger,
            &mut self.funds,
            self.config.completion_payout_fraction,
            self.clock.day,
        );
        let changes = self.refresh_locks();
        self.lock_changes.extend(changes);
        reports
    }

    /// Update the simulation by delta_seconds. Each day boundary crossed
    /// runs exactly one day tick.
    pub fn update(&mut self, delta_seconds: f32) -> Vec<CompletionReport> {
        let scaled_delta = (delta_seconds * self.clock.time_scale).max(0.0) as f64;
        self.clock.seconds_into_day += scaled_delta;

        let mut reports = Vec::new();
        let day_length = self.config.seconds_per_day;
        if !(day_length > 0.0) {
            return reports;
        }
        while self.clock.seconds_into_day >= day_length {
            self.clock.seconds_into_day -= day_length;
            reports.extend(self.advance_one_day());
        }
        reports
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, 0.0 = paused)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.clock.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.clock.time_scale
    }

    /// Days simulated so far.
    pub fn day(&self) -> u64 {
        self.clock.day
    }

    /// Fraction of the current day already elapsed (0.0-1.0).
    pub fn day_fraction(&self) -> f64 {
        if self.config.seconds_per_day > 0.0 {
            self.clock.seconds_into_day / self.config.seconds_per_day
        } else {
            0.0
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.board.get(id)
    }

    pub fn jobs(&self) -> &JobBoard {
        &self.board
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Directory mutations (hiring, crews, equipment, deliveries).
    /// Anything held by an Active job is refused by the ledger itself.
    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    pub fn balance(&self) -> i64 {
        self.funds.balance()
    }

    pub fn config(&self) -> &CompanyConfig {
        &self.config
    }

    /// Re-evaluate lever locks on every Proposed job against current stock
    /// and return the levers this pass snapped to Mid.
    pub fn refresh_locks(&mut self) -> Vec<LockChange> {
        let mut changes = Vec::new();
        for id in self.board.ids_in_state(JobState::Proposed) {
            if let Some(job) = self.board.get_mut(id) {
                let snapped = reservation::refresh_lever_locks(&self.ledger, job, &self.config.tuning);
                changes.extend(snapped.into_iter().map(|lever| LockChange { job: id, lever }));
            }
        }
        changes
    }

    /// Levers the engine snapped to Mid since the last call: on propose,
    /// lever moves, commits, generation and day ticks.
    pub fn take_lock_changes(&mut self) -> Vec<LockChange> {
        std::mem::take(&mut self.lock_changes)
    }

    /// Full consistency check of ledger and reservations.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        reservation::check_reservations(&self.ledger, &self.board)
    }

    // ── Persistence ────────────────────────────────────────────────────

    /// Save company state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        save_company(
            writer,
            &self.ledger,
            &self.board,
            &self.funds,
            &self.config,
            self.clock,
        )
    }

    /// Load company state from a reader, replacing the current state.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = load_company(reader)?;

        self.ledger = loaded.ledger;
        self.board = loaded.board;
        self.funds = loaded.funds;
        self.config = loaded.config;
        self.clock = loaded.clock;
        self.lock_changes.clear();

        Ok(())
    }
}

impl Default for CompanyEngine {
    fn default() -> Self {
        Self::new(CompanyConfig::default())
    }
}

/// Rejected job-planning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    UnknownJob(JobId),
    UnknownCrew(CrewId),
    /// Policy can only change while the job is Proposed.
    NotEditable { job: JobId, state: JobState },
    Lever(LeverError),
    Lifecycle(LifecycleError),
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::UnknownJob(id) => write!(f, "unknown {}", id),
            JobError::UnknownCrew(id) => write!(f, "unknown {}", id),
            JobError::NotEditable { job, state } => {
                write!(f, "{} is {:?} and can no longer be edited", job, state)
            }
            JobError::Lever(e) => write!(f, "{}", e),
            JobError::Lifecycle(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for JobError {}

impl From<LeverError> for JobError {
    fn from(e: LeverError) -> Self {
        JobError::Lever(e)
    }
}

impl From<LifecycleError> for JobError {
    fn from(e: LifecycleError) -> Self {
        JobError::Lifecycle(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ContractCatalog;
    use sitework_logic::resources::{EquipmentType, MaterialType, Profession};

    fn engine() -> (CompanyEngine, CrewId) {
        let mut engine = CompanyEngine::new(CompanyConfig {
            seconds_per_day: 10.0,
            ..Default::default()
        });
        let ledger = engine.ledger_mut();
        let crew = ledger.form_crew("Alpha", 6);
        for profession in [Profession::Carpenter, Profession::Laborer] {
            let w = ledger.hire_worker(Name::new("Test", "Worker"), profession);
            ledger.assign_to_crew(w, crew).unwrap();
        }
        ledger.receive_material(MaterialType::Lumber, 100).unwrap();
        (engine, crew)
    }

    fn shed() -> ContractTemplate {
        ContractCatalog::builtin().get(1).unwrap().clone()
    }

    #[test]
    fn test_engine_creation() {
        let engine = CompanyEngine::default();
        assert_eq!(engine.day(), 0);
        assert_eq!(engine.balance(), 50_000);
        assert!(engine.jobs().is_empty());
    }

    #[test]
    fn test_try_new_rejects_bad_config() {
        let config = CompanyConfig {
            warehouse_capacity: 0,
            ..Default::default()
        };
        assert_eq!(
            CompanyEngine::try_new(config).err(),
            Some(vec![ConfigError::ZeroWarehouseCapacity])
        );
    }

    #[test]
    fn test_engine_generation_is_seeded() {
        let config = CompanyConfig {
            seed: Some(11),
            ..Default::default()
        };
        let mut a = CompanyEngine::new(config.clone());
        let mut b = CompanyEngine::new(config);
        a.generate(&RosterConfig::default()).unwrap();
        b.generate(&RosterConfig::default()).unwrap();

        let names = |e: &CompanyEngine| {
            e.ledger()
                .crews()
                .into_iter()
                .map(|c| c.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
        assert_eq!(a.ledger().available_equipment_count(EquipmentType::Crane), 2);
    }

    #[test]
    fn test_update_crosses_day_boundaries() {
        let (mut engine, _) = engine();
        engine.update(9.0);
        assert_eq!(engine.day(), 0);
        engine.update(1.0);
        assert_eq!(engine.day(), 1);
        engine.update(25.0);
        assert_eq!(engine.day(), 3);
        assert!((engine.day_fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_time_scale() {
        let (mut engine, _) = engine();
        engine.set_time_scale(2.0);
        engine.update(5.0);
        assert_eq!(engine.day(), 1);

        engine.set_time_scale(0.0);
        engine.update(1_000.0);
        assert_eq!(engine.day(), 1);

        engine.set_time_scale(-3.0);
        assert_eq!(engine.time_scale(), 0.0);
    }

    #[test]
    fn test_job_runs_to_completion_through_update() {
        let (mut engine, crew) = engine();
        let job = engine.propose_job(&shed());
        engine.commit_job(job, crew).unwrap();
        assert_eq!(engine.job(job).unwrap().planned_duration(), 4);

        let reports = engine.update(40.0);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].job, job);
        assert_eq!(reports[0].day, 4);
        assert_eq!(engine.balance(), 52_500);
        assert!(!engine.ledger().crew(crew).unwrap().engaged);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn test_set_lever_rules() {
        let (mut engine, crew) = engine();
        let job = engine.propose_job(&shed());

        engine
            .set_lever(job, LeverKind::WorkHours, LeverPosition::High)
            .unwrap();
        assert_eq!(engine.projected_outcome(job).unwrap().planned_duration, 3);

        assert_eq!(
            engine.set_lever(JobId(99), LeverKind::WorkHours, LeverPosition::Low),
            Err(JobError::UnknownJob(JobId(99)))
        );

        engine.commit_job(job, crew).unwrap();
        assert_eq!(
            engine.set_lever(job, LeverKind::WorkHours, LeverPosition::Low),
            Err(JobError::NotEditable {
                job,
                state: JobState::Active
            })
        );
        assert!(engine
            .set_insurance(job, InsuranceKind::WeatherDelay, true)
            .is_err());
    }

    #[test]
    fn test_locked_premium_materials() {
        let (mut engine, _) = engine();
        let mut template = shed();
        // 90 × 1.2 = 108 > 100 in stock.
        template.requirements.materials.insert(MaterialType::Lumber, 90);
        let job = engine.propose_job(&template);

        let err = engine
            .set_lever(job, LeverKind::MaterialPolicy, LeverPosition::High)
            .unwrap_err();
        assert!(matches!(err, JobError::Lever(LeverError::Locked { .. })));
        let record = engine.job(job).unwrap();
        assert_eq!(record.policy().position(LeverKind::MaterialPolicy), LeverPosition::Mid);
        assert_eq!(record.requirements().current().materials[&MaterialType::Lumber], 90);

        // A delivery frees the lever.
        engine
            .ledger_mut()
            .receive_material(MaterialType::Lumber, 10)
            .unwrap();
        engine
            .set_lever(job, LeverKind::MaterialPolicy, LeverPosition::High)
            .unwrap();
        assert_eq!(
            engine.job(job).unwrap().requirements().current().materials[&MaterialType::Lumber],
            108
        );
    }

    #[test]
    fn test_commit_reports_levers_it_snapped() {
        let (mut engine, crew) = engine();
        let mut waiting = shed();
        waiting.requirements.materials.insert(MaterialType::Lumber, 50);
        let queued = engine.propose_job(&waiting);
        // 50 × 1.2 = 60, covered by 100 in stock.
        engine
            .set_lever(queued, LeverKind::MaterialPolicy, LeverPosition::High)
            .unwrap();
        assert!(engine.take_lock_changes().is_empty());

        let mut started = shed();
        started.requirements.materials.insert(MaterialType::Lumber, 45);
        let job = engine.propose_job(&started);
        engine.commit_job(job, crew).unwrap();

        // 55 left, short of the 60 premium needs.
        assert_eq!(
            engine.take_lock_changes(),
            vec![LockChange {
                job: queued,
                lever: LeverKind::MaterialPolicy
            }]
        );
        assert_eq!(
            engine.job(queued).unwrap().policy().position(LeverKind::MaterialPolicy),
            LeverPosition::Mid
        );
        assert!(engine.take_lock_changes().is_empty());
    }

    #[test]
    fn test_projection_for_low_morale_crew() {
        let (mut engine, crew) = engine();
        engine.ledger_mut().set_crew_morale(crew, 20).unwrap();
        let job = engine.propose_job(&shed());

        assert_eq!(engine.projected_outcome(job).unwrap().quality, 100);
        assert_eq!(
            engine.projected_outcome_for_crew(job, crew).unwrap().quality,
            70
        );
        assert_eq!(
            engine.projected_outcome_for_crew(job, CrewId(9)),
            Err(JobError::UnknownCrew(CrewId(9)))
        );

        engine.commit_job(job, crew).unwrap();
        assert_eq!(engine.job(job).unwrap().quality(), 70);
        assert_eq!(engine.projected_outcome(job).unwrap().quality, 70);
    }

    #[test]
    fn test_cancel() {
        let (mut engine, crew) = engine();
        let job = engine.propose_job(&shed());
        engine.cancel_job(job).unwrap();
        assert_eq!(engine.job(job).unwrap().state(), JobState::Cancelled);
        assert!(engine.cancel_job(job).is_err());
        assert!(matches!(
            engine.commit_job(job, crew),
            Err(ReservationError::NotProposed { .. })
        ));
        assert_eq!(engine.ledger().stock_quantity(MaterialType::Lumber), 100);
    }

    #[test]
    fn test_save_load() {
        let (mut engine, crew) = engine();
        let job = engine.propose_job(&shed());
        engine.commit_job(job, crew).unwrap();
        engine.update(15.0);

        let mut buffer = Vec::new();
        engine.save(&mut buffer).expect("Save failed");

        let mut loaded = CompanyEngine::default();
        loaded.load(&buffer[..]).expect("Load failed");
        assert_eq!(loaded.day(), 1);
        assert!((loaded.day_fraction() - 0.5).abs() < 1e-9);
        assert_eq!(loaded.job(job).unwrap().elapsed_days(), 1);

        let reports = loaded.update(30.0);
        assert_eq!(reports.len(), 1);
        assert_eq!(loaded.balance(), 52_500);
    }
}
