//! Per-job requirement snapshots and policy scaling.
//!
//! A job copies its contract's requirements once, when it is proposed.
//! That copy is the *original* snapshot and never changes. Everything the
//! levers do is recomputed from it into the *current* set, so repeated
//! recalculation can never compound.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::lever::LeverPosition;
use crate::policy::{LeverKind, PolicyConfiguration};
use crate::resources::{EquipmentType, MaterialType, Profession};
use crate::tuning::OutcomeTuning;

/// Required crew, equipment and materials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub crew: BTreeMap<Profession, u32>,
    pub equipment: BTreeMap<EquipmentType, u32>,
    pub materials: BTreeMap<MaterialType, u32>,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crew(mut self, profession: Profession, count: u32) -> Self {
        self.crew.insert(profession, count);
        self
    }

    pub fn with_equipment(mut self, equipment: EquipmentType, count: u32) -> Self {
        self.equipment.insert(equipment, count);
        self
    }

    pub fn with_material(mut self, material: MaterialType, quantity: u32) -> Self {
        self.materials.insert(material, quantity);
        self
    }

    pub fn total_crew(&self) -> u32 {
        self.crew.values().sum()
    }
}

/// Whether a profession's headcount is currently reduced by a lean crew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReductionState {
    #[default]
    NotReduced,
    Reduced,
}

/// Original snapshot plus the policy-scaled working copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    original: RequirementSet,
    current: RequirementSet,
    reductions: BTreeMap<Profession, ReductionState>,
}

impl JobRequirements {
    /// Take the snapshot. The template is cloned, never borrowed.
    pub fn snapshot(template: &RequirementSet) -> Self {
        let reductions = template
            .crew
            .keys()
            .map(|p| (*p, ReductionState::NotReduced))
            .collect();
        Self {
            original: template.clone(),
            current: template.clone(),
            reductions,
        }
    }

    pub fn original(&self) -> &RequirementSet {
        &self.original
    }

    pub fn current(&self) -> &RequirementSet {
        &self.current
    }

    pub fn reduction_state(&self, profession: Profession) -> ReductionState {
        self.reductions
            .get(&profession)
            .copied()
            .unwrap_or_default()
    }

    /// `current = max(1, round(original × material × delivery))` for every material.
    pub fn scale_materials(&mut self, material_factor: f64, delivery_factor: f64) {
        for (material, original) in &self.original.materials {
            let scaled = (*original as f64 * material_factor * delivery_factor).round();
            let quantity = if scaled < 1.0 { 1 } else { scaled as u32 };
            self.current.materials.insert(*material, quantity);
        }
    }

    /// Follow the crew-size lever.
    ///
    /// Entering `Low` cuts each profession to `max(1, floor(original ×
    /// factor))` once; leaving it restores the original count exactly.
    pub fn apply_crew_size(&mut self, position: LeverPosition, reduction_factor: f64) {
        for (profession, original) in &self.original.crew {
            let state = self
                .reductions
                .entry(*profession)
                .or_insert(ReductionState::NotReduced);
            match (position, *state) {
                (LeverPosition::Low, ReductionState::NotReduced) => {
                    let reduced = (*original as f64 * reduction_factor + 1e-9).floor() as u32;
                    self.current.crew.insert(*profession, reduced.max(1));
                    *state = ReductionState::Reduced;
                }
                (LeverPosition::Mid | LeverPosition::High, ReductionState::Reduced) => {
                    self.current.crew.insert(*profession, *original);
                    *state = ReductionState::NotReduced;
                }
                _ => {}
            }
        }
    }

    /// Bring the working copy in line with the current lever positions.
    pub fn recompute(&mut self, policy: &PolicyConfiguration, tuning: &OutcomeTuning) {
        self.apply_crew_size(policy.position(LeverKind::CrewSize), tuning.crew_reduction_factor);
        self.scale_materials(
            tuning
                .material_quantity
                .factor(policy.position(LeverKind::MaterialPolicy)),
            tuning
                .delivery_quantity
                .factor(policy.position(LeverKind::DeliverySpeed)),
        );
    }

    /// Material quantities the job would need under `policy`, without
    /// touching the working copy.
    pub fn preview_materials(
        &self,
        policy: &PolicyConfiguration,
        tuning: &OutcomeTuning,
    ) -> BTreeMap<MaterialType, u32> {
        let mut preview = self.clone();
        preview.recompute(policy, tuning);
        preview.current.materials
    }
}
