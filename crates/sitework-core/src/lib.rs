//! SiteWork Core - Construction Company Simulation Engine
//!
//! Runs a construction company day by day: jobs are proposed from
//! contracts, tuned with policy levers, committed against the company's
//! crews, equipment and stock, and paid out when they finish.
//!
//! # Architecture
//!
//! The resource ledger is an Entity Component System world via `hecs`:
//! - **Entities**: Workers, crews, equipment units
//! - **Components**: Pure data attached to entities (Worker, Name, Crew, EquipmentUnit)
//! - **Services**: Reservation and the day-tick scheduler, owned by [`engine::CompanyEngine`]
//!
//! Pure planning math (levers, outcome projection, feasibility) lives in
//! `sitework_logic`.
//!
//! # Example
//!
//! ```rust,no_run
//! use sitework_core::prelude::*;
//! use sitework_core::catalog::ContractCatalog;
//! use sitework_core::generation::RosterConfig;
//!
//! let mut engine = CompanyEngine::new(CompanyConfig::default());
//! let roster = engine.generate(&RosterConfig::default()).unwrap();
//!
//! let catalog = ContractCatalog::builtin();
//! let job = engine.propose_job(catalog.get(2).unwrap());
//! engine.set_lever(job, LeverKind::WorkHours, LeverPosition::High).ok();
//! if engine.can_commit(job) {
//!     engine.commit_job(job, roster.crews[0]).ok();
//! }
//!
//! loop {
//!     for report in engine.update(1.0 / 60.0) {
//!         println!("{} paid {}", report.job, report.payout);
//!     }
//! }
//! ```

pub mod catalog;
pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod jobs;
pub mod ledger;
pub mod persistence;
pub mod reservation;
pub mod scheduler;
pub mod treasury;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::CompanyConfig;
    pub use crate::engine::{CompanyEngine, JobError};
    pub use crate::jobs::JobState;
    pub use crate::reservation::{LockChange, ReservationError};
    pub use crate::scheduler::CompletionReport;
    pub use crate::treasury::{Funds, Treasury};
    pub use sitework_logic::lever::LeverPosition;
    pub use sitework_logic::policy::{InsuranceKind, LeverKind};
    pub use sitework_logic::resources::{EquipmentType, MaterialType, Profession};
}
