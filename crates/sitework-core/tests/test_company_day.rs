//! Integration tests for a company running jobs day by day.
//!
//! Exercises: CompanyEngine → propose → levers → commit → day ticks
//! → completion payout → save/load

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sitework_core::catalog::{ContractCatalog, ContractTemplate};
use sitework_core::generation::RosterConfig;
use sitework_core::prelude::*;
use sitework_logic::requirements::RequirementSet;

// ── Helpers ────────────────────────────────────────────────────────────

fn company() -> (CompanyEngine, CrewId) {
    let mut engine = CompanyEngine::new(CompanyConfig::default());
    let ledger = engine.ledger_mut();
    let crew = ledger.form_crew("Granite Gang", 8);
    for profession in [
        Profession::Mason,
        Profession::Mason,
        Profession::Carpenter,
        Profession::Laborer,
        Profession::Laborer,
    ] {
        let worker = ledger.hire_worker(Name::new("Test", "Worker"), profession);
        ledger.assign_to_crew(worker, crew).unwrap();
    }
    ledger.add_equipment(EquipmentType::ConcreteMixer);
    ledger.add_equipment(EquipmentType::Scaffolding);
    ledger.add_equipment(EquipmentType::Scaffolding);
    ledger.receive_material(MaterialType::Cement, 150).unwrap();
    ledger.receive_material(MaterialType::Bricks, 100).unwrap();
    ledger.receive_material(MaterialType::Lumber, 50).unwrap();
    (engine, crew)
}

fn house() -> ContractTemplate {
    ContractCatalog::builtin().get(2).unwrap().clone()
}

fn small_job(duration: u32) -> ContractTemplate {
    ContractTemplate {
        id: 50,
        location: "Porch".to_string(),
        payment: 3_000,
        deadline_days: duration,
        base_duration: duration,
        requirements: RequirementSet::new()
            .with_crew(Profession::Laborer, 2)
            .with_equipment(EquipmentType::Scaffolding, 1)
            .with_material(MaterialType::Lumber, 10),
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn baseline_house_projection() {
    let (mut engine, _) = company();
    let job = engine.propose_job(&house());
    let projection = engine.projected_outcome(job).unwrap();
    assert_eq!(projection.planned_duration, 20);
    assert_eq!(projection.quality, 100);
    assert_eq!(projection.net_profit, 10_000);
    assert!(engine.can_commit(job));
}

#[test]
fn lean_economy_slow_job_needs_56_cement() {
    let (mut engine, _) = company();
    let job = engine.propose_job(&house());
    engine
        .set_lever(job, LeverKind::CrewSize, LeverPosition::Low)
        .unwrap();
    engine
        .set_lever(job, LeverKind::MaterialPolicy, LeverPosition::Low)
        .unwrap();
    engine
        .set_lever(job, LeverKind::DeliverySpeed, LeverPosition::Low)
        .unwrap();

    let requirements = engine.job(job).unwrap().requirements().current().clone();
    assert_eq!(requirements.materials[&MaterialType::Cement], 56);
    assert_eq!(requirements.crew[&Profession::Mason], 1);

    engine
        .set_lever(job, LeverKind::CrewSize, LeverPosition::Mid)
        .unwrap();
    assert_eq!(
        engine.job(job).unwrap().requirements().current().crew,
        house().requirements.crew
    );
}

#[test]
fn five_day_job_frees_crew_on_fifth_tick() {
    let (mut engine, crew) = company();
    let job = engine.propose_job(&small_job(5));
    engine.commit_job(job, crew).unwrap();
    let before = engine.balance();

    for _ in 0..4 {
        assert!(engine.advance_one_day().is_empty());
        assert!(engine.ledger().crew(crew).unwrap().engaged);
    }
    let reports = engine.advance_one_day();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].crew, crew);
    assert_eq!(reports[0].day, 5);
    assert_eq!(engine.balance(), before + 3_000);

    let record = engine.job(job).unwrap();
    assert_eq!(record.state(), JobState::Completed);
    assert_eq!(record.elapsed_days(), 5);
    assert!(!engine.ledger().crew(crew).unwrap().engaged);
    assert_eq!(engine.ledger().idle_worker_count(Profession::Laborer), 2);
    assert_eq!(engine.ledger().stock_quantity(MaterialType::Lumber), 40);
}

#[test]
fn rental_one_missing_versus_two_missing() {
    let (mut engine, crew) = company();
    let mut template = house();
    template
        .requirements
        .equipment
        .insert(EquipmentType::Scaffolding, 3);
    let one_short = engine.propose_job(&template);
    engine
        .set_lever(one_short, LeverKind::EquipmentMode, LeverPosition::High)
        .unwrap();
    assert!(engine.can_commit(one_short));

    template
        .requirements
        .equipment
        .insert(EquipmentType::Scaffolding, 4);
    let two_short = engine.propose_job(&template);
    engine
        .set_lever(two_short, LeverKind::EquipmentMode, LeverPosition::High)
        .unwrap();
    assert!(!engine.can_commit(two_short));
    let report = engine.feasibility(two_short).unwrap();
    assert_eq!(report.equipment_gaps[&EquipmentType::Scaffolding], -2);

    engine.commit_job(one_short, crew).unwrap();
    assert_eq!(
        engine.job(one_short).unwrap().rented(),
        Some(EquipmentType::Scaffolding)
    );
    assert_eq!(
        engine
            .ledger()
            .available_equipment_count(EquipmentType::Scaffolding),
        0
    );
}

#[test]
fn failed_commit_changes_nothing() {
    let (mut engine, crew) = company();
    let mut template = house();
    template
        .requirements
        .materials
        .insert(MaterialType::Bricks, 101);
    let job = engine.propose_job(&template);

    let err = engine.commit_job(job, crew).unwrap_err();
    assert_eq!(
        err,
        ReservationError::InsufficientMaterial {
            material: MaterialType::Bricks,
            required: 101,
            available: 100
        }
    );
    let ledger = engine.ledger();
    assert!(!ledger.crew(crew).unwrap().engaged);
    assert_eq!(ledger.idle_worker_count(Profession::Mason), 2);
    assert_eq!(
        ledger.available_equipment_count(EquipmentType::Scaffolding),
        2
    );
    assert_eq!(ledger.stock_quantity(MaterialType::Cement), 150);
    assert_eq!(engine.job(job).unwrap().state(), JobState::Proposed);
    engine.check_invariants().unwrap();
}

#[test]
fn engaged_crew_is_protected_from_directory_changes() {
    let (mut engine, crew) = company();
    let job = engine.propose_job(&small_job(3));
    engine.commit_job(job, crew).unwrap();

    let member = engine.ledger().crew(crew).unwrap().workers[0];
    let ledger = engine.ledger_mut();
    assert!(ledger.remove_from_crew(member).is_err());
    assert!(ledger.set_crew_morale(crew, 10).is_err());
    let deployed = engine.job(job).unwrap().deployed_units()[0];
    assert!(engine.ledger_mut().send_to_repair(deployed).is_err());
}

#[test]
fn save_mid_job_and_finish_after_load() {
    let (mut engine, crew) = company();
    let job = engine.propose_job(&small_job(3));
    engine.commit_job(job, crew).unwrap();
    engine.advance_one_day();

    let mut buffer = Vec::new();
    engine.save(&mut buffer).unwrap();
    let mut restored = CompanyEngine::default();
    restored.load(&buffer[..]).unwrap();
    restored.check_invariants().unwrap();

    assert!(restored.advance_one_day().is_empty());
    let reports = restored.advance_one_day();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].day, 3);
    assert!(!restored.ledger().crew(crew).unwrap().engaged);
}

// ── Randomized operation sequences ─────────────────────────────────────

#[test]
fn random_operations_never_double_book_a_crew() {
    let catalog = ContractCatalog::builtin();

    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut engine = CompanyEngine::new(CompanyConfig {
            seed: Some(seed),
            ..Default::default()
        });
        engine.generate(&RosterConfig::default()).unwrap();
        let crews: Vec<CrewId> = engine.ledger().crews().iter().map(|c| c.id).collect();

        for _ in 0..300 {
            let jobs: Vec<JobId> = engine.jobs().iter().map(|j| j.id).collect();
            let pick_job = |rng: &mut StdRng| jobs.get(rng.gen_range(0..jobs.len().max(1))).copied();

            match rng.gen_range(0..100) {
                0..=14 => {
                    let template = &catalog.contracts[rng.gen_range(0..catalog.contracts.len())];
                    engine.propose_job(template);
                }
                15..=44 => {
                    if let Some(job) = pick_job(&mut rng) {
                        let kind = LeverKind::ALL[rng.gen_range(0..LeverKind::ALL.len())];
                        let position = LeverPosition::ALL[rng.gen_range(0..3)];
                        let _ = engine.set_lever(job, kind, position);
                    }
                }
                45..=64 => {
                    if let Some(job) = pick_job(&mut rng) {
                        let crew = crews[rng.gen_range(0..crews.len())];
                        let _ = engine.commit_job(job, crew);
                    }
                }
                65..=69 => {
                    if let Some(job) = pick_job(&mut rng) {
                        let _ = engine.cancel_job(job);
                    }
                }
                70..=79 => {
                    let material = MaterialType::ALL[rng.gen_range(0..MaterialType::ALL.len())];
                    let _ = engine
                        .ledger_mut()
                        .receive_material(material, rng.gen_range(10..80));
                }
                _ => {
                    engine.advance_one_day();
                }
            }

            engine.check_invariants().unwrap();

            let mut holders: BTreeMap<CrewId, u32> = BTreeMap::new();
            for job in engine.jobs().in_state(JobState::Active) {
                *holders.entry(job.crew().unwrap()).or_insert(0) += 1;
            }
            assert!(holders.values().all(|count| *count == 1));
            for crew in engine.ledger().crews() {
                assert_eq!(crew.engaged, holders.contains_key(&crew.id));
            }
        }
    }
}
