//! SiteWork Headless Simulation Harness
//!
//! Validates planning logic, contract data and a full seeded company run.
//! Runs entirely in-process, no host, no rendering.
//!
//! Usage:
//!   cargo run -p sitework-simtest
//!   cargo run -p sitework-simtest -- --verbose
//!   cargo run -p sitework-simtest -- --json

use std::collections::BTreeMap;

use serde::Serialize;
use sitework_core::catalog::ContractCatalog;
use sitework_core::config::CompanyConfig;
use sitework_core::engine::CompanyEngine;
use sitework_core::generation::RosterConfig;
use sitework_core::jobs::JobState;
use sitework_logic::feasibility::{assess, AvailabilitySnapshot, FeasibilityRules};
use sitework_logic::lever::LeverPosition;
use sitework_logic::outcome::{project_outcome, JobBasis};
use sitework_logic::policy::{LeverKind, PolicyConfiguration};
use sitework_logic::requirements::JobRequirements;
use sitework_logic::resources::{EquipmentType, MaterialType};
use sitework_logic::tuning::OutcomeTuning;

// ── Contract catalog (same JSON hosts load) ─────────────────────────────
const CONTRACTS_JSON: &str = include_str!("../../../data/contracts.json");

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    if !json {
        println!("=== SiteWork Simulation Harness ===\n");
    }

    let mut results = Vec::new();

    // 1. Contract catalog validation
    results.extend(validate_catalog(verbose && !json));

    // 2. Outcome calculator sweep
    results.extend(validate_outcomes(verbose && !json));

    // 3. Requirement scaling
    results.extend(validate_requirements(verbose && !json));

    // 4. Feasibility rules
    results.extend(validate_feasibility(verbose && !json));

    // 5. Seeded company run
    results.extend(validate_company_run(verbose && !json));

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("could not serialize results: {}", e),
        }
    } else {
        // ── Summary ──
        println!();
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }

        println!(
            "\n=== RESULT: {}/{} passed, {} failed ===",
            passed, total, failed
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Contract Catalog ─────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("--- Contract Catalog ---");
    }
    let mut results = Vec::new();

    let catalog = match ContractCatalog::from_json(CONTRACTS_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "catalog_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "catalog_not_empty".into(),
        passed: !catalog.contracts.is_empty(),
        detail: format!("{} contracts loaded", catalog.contracts.len()),
    });

    let mut ids: Vec<u32> = catalog.contracts.iter().map(|c| c.id).collect();
    ids.sort();
    ids.dedup();
    results.push(TestResult {
        name: "catalog_unique_ids".into(),
        passed: ids.len() == catalog.contracts.len(),
        detail: format!("{} unique ids", ids.len()),
    });

    let bad: Vec<_> = catalog
        .contracts
        .iter()
        .filter(|c| c.payment <= 0 || c.base_duration == 0 || c.requirements.total_crew() == 0)
        .map(|c| c.id)
        .collect();
    results.push(TestResult {
        name: "catalog_positive_terms".into(),
        passed: bad.is_empty(),
        detail: if bad.is_empty() {
            "all contracts pay, take time and need a crew".into()
        } else {
            format!("contracts with bad terms: {:?}", bad)
        },
    });

    let late: Vec<_> = catalog
        .contracts
        .iter()
        .filter(|c| c.deadline_days < c.base_duration)
        .map(|c| c.id)
        .collect();
    results.push(TestResult {
        name: "catalog_deadlines_reachable".into(),
        passed: late.is_empty(),
        detail: if late.is_empty() {
            "every deadline is reachable at standard settings".into()
        } else {
            format!("deadline before base duration: {:?}", late)
        },
    });

    // Built-in offers must match the data file where ids overlap.
    let builtin = ContractCatalog::builtin();
    let drift: Vec<_> = builtin
        .contracts
        .iter()
        .filter(|b| catalog.get(b.id).is_some_and(|c| c != *b))
        .map(|b| b.id)
        .collect();
    results.push(TestResult {
        name: "catalog_builtin_in_sync".into(),
        passed: drift.is_empty(),
        detail: if drift.is_empty() {
            format!("{} built-in contracts match", builtin.contracts.len())
        } else {
            format!("built-in contracts differ from data file: {:?}", drift)
        },
    });

    results
}

// ── 2. Outcome Sweep ────────────────────────────────────────────────────

fn validate_outcomes(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("--- Outcome Calculator ---");
    }
    let mut results = Vec::new();
    let tuning = OutcomeTuning::default();

    results.push(TestResult {
        name: "tuning_valid".into(),
        passed: tuning.validate().is_empty(),
        detail: format!("{} tuning problems", tuning.validate().len()),
    });

    let basis = JobBasis {
        base_duration: 20,
        contract_payment: 10_000,
    };
    let baseline = project_outcome(&basis, &PolicyConfiguration::new(), &tuning, None);
    results.push(TestResult {
        name: "outcome_baseline".into(),
        passed: baseline.planned_duration == 20
            && baseline.quality == 100
            && baseline.net_profit == 10_000,
        detail: format!(
            "duration={} quality={} profit={}",
            baseline.planned_duration, baseline.quality, baseline.net_profit
        ),
    });

    // Sweep every configuration; track the extremes.
    let configurations = PolicyConfiguration::all_combinations();
    let mut out_of_range = 0;
    let (mut shortest, mut longest) = (u32::MAX, 0);
    let (mut min_profit, mut max_profit) = (i64::MAX, i64::MIN);
    for policy in &configurations {
        for morale in [None, Some(0u8)] {
            let p = project_outcome(&basis, policy, &tuning, morale);
            if p.planned_duration < 1 || p.quality > 100 {
                out_of_range += 1;
            }
            shortest = shortest.min(p.planned_duration);
            longest = longest.max(p.planned_duration);
            min_profit = min_profit.min(p.net_profit);
            max_profit = max_profit.max(p.net_profit);
        }
    }
    if verbose {
        println!(
            "  duration {}..={} days, profit {}..={}",
            shortest, longest, min_profit, max_profit
        );
    }
    results.push(TestResult {
        name: "outcome_sweep_in_range".into(),
        passed: out_of_range == 0,
        detail: format!(
            "{} configurations, {} out of range, duration {}..={}",
            configurations.len(),
            out_of_range,
            shortest,
            longest
        ),
    });

    // One-day jobs never collapse to zero days.
    let one_day = JobBasis {
        base_duration: 1,
        contract_payment: 100,
    };
    let min_duration = configurations
        .iter()
        .map(|p| project_outcome(&one_day, p, &tuning, None).planned_duration)
        .min()
        .unwrap_or(0);
    results.push(TestResult {
        name: "outcome_minimum_one_day".into(),
        passed: min_duration == 1,
        detail: format!("shortest one-day job: {} days", min_duration),
    });

    results
}

// ── 3. Requirement Scaling ──────────────────────────────────────────────

fn validate_requirements(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("--- Requirement Scaling ---");
    }
    let mut results = Vec::new();
    let tuning = OutcomeTuning::default();
    let catalog = ContractCatalog::builtin();

    let mut not_idempotent = Vec::new();
    let mut not_restored = Vec::new();
    for contract in &catalog.contracts {
        for policy in PolicyConfiguration::all_combinations().iter().step_by(97) {
            let mut requirements = JobRequirements::snapshot(&contract.requirements);
            requirements.recompute(policy, &tuning);
            let once = requirements.current().clone();
            requirements.recompute(policy, &tuning);
            if requirements.current() != &once {
                not_idempotent.push(contract.id);
            }
            requirements.recompute(&PolicyConfiguration::new(), &tuning);
            if requirements.current() != &contract.requirements {
                not_restored.push(contract.id);
            }
        }
    }
    results.push(TestResult {
        name: "requirements_idempotent".into(),
        passed: not_idempotent.is_empty(),
        detail: format!("{} non-idempotent recomputations", not_idempotent.len()),
    });
    results.push(TestResult {
        name: "requirements_restore_on_standard".into(),
        passed: not_restored.is_empty(),
        detail: format!("{} configurations failed to restore", not_restored.len()),
    });

    let house = catalog.get(2).map(|c| c.requirements.clone()).unwrap_or_default();
    let mut requirements = JobRequirements::snapshot(&house);
    let lean = PolicyConfiguration::new()
        .with(LeverKind::CrewSize, LeverPosition::Low)
        .with(LeverKind::MaterialPolicy, LeverPosition::Low)
        .with(LeverKind::DeliverySpeed, LeverPosition::Low);
    requirements.recompute(&lean, &tuning);
    let cement = requirements
        .current()
        .materials
        .get(&MaterialType::Cement)
        .copied()
        .unwrap_or(0);
    results.push(TestResult {
        name: "requirements_economy_slow".into(),
        passed: cement == 56,
        detail: format!("100 cement scaled to {}", cement),
    });

    results
}

// ── 4. Feasibility ──────────────────────────────────────────────────────

fn validate_feasibility(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("--- Feasibility ---");
    }
    let mut results = Vec::new();
    let catalog = ContractCatalog::builtin();
    let house = catalog.get(2).map(|c| c.requirements.clone()).unwrap_or_default();

    let snapshot = |scaffolding: u32| AvailabilitySnapshot {
        idle_workers: house.crew.clone(),
        available_equipment: BTreeMap::from([
            (EquipmentType::ConcreteMixer, 1),
            (EquipmentType::Scaffolding, scaffolding),
        ]),
        stock: house.materials.clone(),
    };
    let rental = FeasibilityRules::from_policy(
        &PolicyConfiguration::new().with(LeverKind::EquipmentMode, LeverPosition::High),
        0,
    );

    let one = assess(&house, &snapshot(1), rental);
    let two = assess(&house, &snapshot(0), rental);
    results.push(TestResult {
        name: "feasibility_rental_one_missing".into(),
        passed: one.committable && one.rental_substitution == Some(EquipmentType::Scaffolding),
        detail: format!("committable={}", one.committable),
    });
    results.push(TestResult {
        name: "feasibility_rental_two_missing".into(),
        passed: !two.committable,
        detail: format!("committable={}", two.committable),
    });

    let exact = assess(
        &house,
        &snapshot(2),
        FeasibilityRules::from_policy(&PolicyConfiguration::new(), 0),
    );
    results.push(TestResult {
        name: "feasibility_exact_fit".into(),
        passed: exact.committable,
        detail: "requirements met exactly are committable".into(),
    });

    results
}

// ── 5. Company Run ──────────────────────────────────────────────────────

fn validate_company_run(verbose: bool) -> Vec<TestResult> {
    if verbose {
        println!("--- Company Run ---");
    }
    let mut results = Vec::new();

    let config = CompanyConfig {
        seed: Some(42),
        seconds_per_day: 1.0,
        ..Default::default()
    };
    let starting_funds = config.starting_funds;
    let mut engine = CompanyEngine::new(config);
    let roster = match engine.generate(&RosterConfig::default()) {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult {
                name: "company_generate".into(),
                passed: false,
                detail: format!("generation failed: {}", e),
            });
            return results;
        }
    };

    let catalog = match ContractCatalog::from_json(CONTRACTS_JSON) {
        Ok(c) => c,
        Err(_) => ContractCatalog::builtin(),
    };

    let mut violations = Vec::new();
    let mut completed = 0;
    let mut commits = 0;
    for round in 0..4 {
        for contract in &catalog.contracts {
            let job = engine.propose_job(contract);
            if round % 2 == 1 {
                let _ = engine.set_lever(job, LeverKind::WorkHours, LeverPosition::High);
            }
            // A refused commit changes nothing, so just try each idle crew.
            let mut committed = false;
            if engine.can_commit(job) {
                let idle = engine.ledger().idle_crews();
                for crew in idle {
                    if engine.commit_job(job, crew).is_ok() {
                        committed = true;
                        break;
                    }
                }
            }
            if committed {
                commits += 1;
            } else {
                let _ = engine.cancel_job(job);
            }
        }

        for _ in 0..30 {
            completed += engine.update(1.0).len();
            if let Err(v) = engine.check_invariants() {
                violations.push(format!("day {}: {}", engine.day(), v));
            }
        }
        for material in MaterialType::ALL {
            let free = engine.ledger().warehouse().free_space();
            let _ = engine.ledger_mut().receive_material(material, free.min(100));
        }
    }

    let still_active = engine.jobs().in_state(JobState::Active).count();
    if verbose {
        println!(
            "  {} crews, {} commits, {} completed, {} active, funds {}",
            roster.crews.len(),
            commits,
            completed,
            still_active,
            engine.balance()
        );
    }
    results.push(TestResult {
        name: "company_invariants_hold".into(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            format!("{} days without violations", engine.day())
        } else {
            violations.join("; ")
        },
    });
    results.push(TestResult {
        name: "company_jobs_complete".into(),
        passed: completed + still_active == commits,
        detail: format!(
            "{} committed, {} completed, {} active",
            commits, completed, still_active
        ),
    });
    results.push(TestResult {
        name: "company_earned".into(),
        passed: completed == 0 || engine.balance() > starting_funds,
        detail: format!("funds {} -> {}", starting_funds, engine.balance()),
    });

    // Save/load roundtrip of the finished run.
    let mut buffer = Vec::new();
    let roundtrip = engine.save(&mut buffer).and_then(|_| {
        let mut loaded = CompanyEngine::default();
        loaded.load(&buffer[..])?;
        Ok(loaded)
    });
    results.push(match roundtrip {
        Ok(loaded) => TestResult {
            name: "company_save_load".into(),
            passed: loaded.day() == engine.day()
                && loaded.balance() == engine.balance()
                && loaded.jobs().len() == engine.jobs().len(),
            detail: format!("{} bytes", buffer.len()),
        },
        Err(e) => TestResult {
            name: "company_save_load".into(),
            passed: false,
            detail: e.to_string(),
        },
    });

    results
}
