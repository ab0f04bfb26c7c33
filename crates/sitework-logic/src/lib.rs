//! Pure job-planning logic for SiteWork.
//!
//! This crate holds the parts of the construction-company simulation that
//! need no ledger, clock, or storage. Functions take plain data and return
//! results, so they are unit-testable and shared between the engine and
//! the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`feasibility`] | Requirement vs. availability gaps, rental and temp-hire allowances |
//! | [`lever`] | Three-position lever with lockable extremes |
//! | [`outcome`] | Duration/quality/morale/profit modifiers and final projection |
//! | [`policy`] | Seven levers plus three insurance toggles per job |
//! | [`requirements`] | Snapshot-on-propose requirement sets and policy scaling |
//! | [`resources`] | Profession, equipment and material tags |
//! | [`tuning`] | Balance table for every lever and toggle |

pub mod feasibility;
pub mod lever;
pub mod outcome;
pub mod policy;
pub mod requirements;
pub mod resources;
pub mod tuning;
