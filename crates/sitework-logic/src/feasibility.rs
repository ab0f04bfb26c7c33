//! Feasibility arithmetic - can idle resources cover a job's requirements?
//!
//! Pure function of an [`AvailabilitySnapshot`] (filled by the ledger) and
//! the job's current, policy-scaled requirements. Shortfalls are reported
//! as values, never as errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::lever::LeverPosition;
use crate::policy::{LeverKind, PolicyConfiguration};
use crate::requirements::RequirementSet;
use crate::resources::{EquipmentType, MaterialType, Profession};

/// Idle counts per resource kind at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    pub idle_workers: BTreeMap<Profession, u32>,
    pub available_equipment: BTreeMap<EquipmentType, u32>,
    pub stock: BTreeMap<MaterialType, u32>,
}

impl AvailabilitySnapshot {
    pub fn idle_workers(&self, profession: Profession) -> u32 {
        self.idle_workers.get(&profession).copied().unwrap_or(0)
    }

    pub fn available_equipment(&self, equipment: EquipmentType) -> u32 {
        self.available_equipment.get(&equipment).copied().unwrap_or(0)
    }

    pub fn stock(&self, material: MaterialType) -> u32 {
        self.stock.get(&material).copied().unwrap_or(0)
    }
}

/// Allowances the policy grants on top of real resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeasibilityRules {
    /// Equipment rental: one type short by exactly one unit may be rented.
    pub rental: bool,
    /// Temporary hires available to cover profession shortfalls.
    ///
    /// Hires carry no cost of their own: the High crew-size profit factor
    /// in the tuning table is the whole price, whether zero or all of
    /// them are used.
    pub temporary_hire_limit: u32,
}

impl FeasibilityRules {
    pub fn from_policy(policy: &PolicyConfiguration, temporary_hire_limit: u32) -> Self {
        Self {
            rental: policy.position(LeverKind::EquipmentMode) == LeverPosition::High,
            temporary_hire_limit: if policy.position(LeverKind::CrewSize) == LeverPosition::High {
                temporary_hire_limit
            } else {
                0
            },
        }
    }
}

/// Result of a feasibility check. Gaps are `available - required`;
/// negative means short.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub profession_gaps: BTreeMap<Profession, i64>,
    pub equipment_gaps: BTreeMap<EquipmentType, i64>,
    pub material_gaps: BTreeMap<MaterialType, i64>,
    /// Equipment type covered by the single rental substitution.
    pub rental_substitution: Option<EquipmentType>,
    /// Temporary workers needed to cover profession shortfalls.
    pub temporary_hires: u32,
    pub committable: bool,
}

impl FeasibilityReport {
    pub fn short_professions(&self) -> impl Iterator<Item = (Profession, u32)> + '_ {
        self.profession_gaps
            .iter()
            .filter(|(_, gap)| **gap < 0)
            .map(|(p, gap)| (*p, gap.unsigned_abs() as u32))
    }
}

/// Compare requirements against availability under the given rules.
pub fn assess(
    required: &RequirementSet,
    available: &AvailabilitySnapshot,
    rules: FeasibilityRules,
) -> FeasibilityReport {
    let mut report = FeasibilityReport {
        committable: true,
        ..Default::default()
    };

    let mut crew_shortfall: u32 = 0;
    for (profession, count) in &required.crew {
        let gap = available.idle_workers(*profession) as i64 - *count as i64;
        if gap < 0 {
            crew_shortfall += gap.unsigned_abs() as u32;
        }
        report.profession_gaps.insert(*profession, gap);
    }
    if crew_shortfall > 0 {
        if crew_shortfall <= rules.temporary_hire_limit {
            report.temporary_hires = crew_shortfall;
        } else {
            report.committable = false;
        }
    }

    for (equipment, count) in &required.equipment {
        let gap = available.available_equipment(*equipment) as i64 - *count as i64;
        report.equipment_gaps.insert(*equipment, gap);
        if gap >= 0 {
            continue;
        }
        if gap == -1 && rules.rental && report.rental_substitution.is_none() {
            report.rental_substitution = Some(*equipment);
        } else {
            report.committable = false;
        }
    }

    for (material, quantity) in &required.materials {
        let gap = available.stock(*material) as i64 - *quantity as i64;
        report.material_gaps.insert(*material, gap);
        if gap < 0 {
            report.committable = false;
        }
    }

    report
}
