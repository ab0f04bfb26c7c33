//! Per-job policy configuration: seven levers and three insurance toggles.

use serde::{Deserialize, Serialize};

use crate::lever::{LeverError, LeverPosition, PolicyLever};

/// The seven levers, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeverKind {
    WorkHours,
    CrewSize,
    EquipmentMode,
    MaterialPolicy,
    DeliverySpeed,
    QualityControl,
    WagePolicy,
}

impl LeverKind {
    /// Fixed evaluation order. Contributions commute; the order only keeps
    /// explanation lines stable.
    pub const ALL: [LeverKind; 7] = [
        LeverKind::WorkHours,
        LeverKind::CrewSize,
        LeverKind::EquipmentMode,
        LeverKind::MaterialPolicy,
        LeverKind::DeliverySpeed,
        LeverKind::QualityControl,
        LeverKind::WagePolicy,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            LeverKind::WorkHours => "work hours",
            LeverKind::CrewSize => "crew size",
            LeverKind::EquipmentMode => "equipment mode",
            LeverKind::MaterialPolicy => "material policy",
            LeverKind::DeliverySpeed => "delivery speed",
            LeverKind::QualityControl => "quality control",
            LeverKind::WagePolicy => "wage policy",
        }
    }

    /// Label shown for a position of this lever.
    pub fn position_label(&self, position: LeverPosition) -> &'static str {
        use LeverPosition::*;
        match (self, position) {
            (_, Mid) => "standard",
            (LeverKind::WorkHours, Low) => "short shifts",
            (LeverKind::WorkHours, High) => "overtime",
            (LeverKind::CrewSize, Low) => "lean crew",
            (LeverKind::CrewSize, High) => "temporary hires",
            (LeverKind::EquipmentMode, Low) => "owned fleet only",
            (LeverKind::EquipmentMode, High) => "rental",
            (LeverKind::MaterialPolicy, Low) => "economy",
            (LeverKind::MaterialPolicy, High) => "premium",
            (LeverKind::DeliverySpeed, Low) => "slow",
            (LeverKind::DeliverySpeed, High) => "express",
            (LeverKind::QualityControl, Low) => "spot checks",
            (LeverKind::QualityControl, High) => "full inspection",
            (LeverKind::WagePolicy, Low) => "reduced wages",
            (LeverKind::WagePolicy, High) => "bonus wages",
        }
    }
}

/// Insurance toggles, independent of the levers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InsuranceKind {
    WorkerAccident,
    EquipmentDamage,
    WeatherDelay,
}

impl InsuranceKind {
    pub const ALL: [InsuranceKind; 3] = [
        InsuranceKind::WorkerAccident,
        InsuranceKind::EquipmentDamage,
        InsuranceKind::WeatherDelay,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            InsuranceKind::WorkerAccident => "worker accident insurance",
            InsuranceKind::EquipmentDamage => "equipment damage insurance",
            InsuranceKind::WeatherDelay => "weather delay insurance",
        }
    }
}

/// Lever selections and insurance flags for one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfiguration {
    levers: [PolicyLever; 7],
    insurance: [bool; 3],
}

impl PolicyConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lever(&self, kind: LeverKind) -> &PolicyLever {
        &self.levers[kind.index()]
    }

    pub fn position(&self, kind: LeverKind) -> LeverPosition {
        self.lever(kind).position()
    }

    /// Move one lever; see [`PolicyLever::set`].
    pub fn set_lever(&mut self, kind: LeverKind, position: LeverPosition) -> Result<bool, LeverError> {
        self.levers[kind.index()].set(position)
    }

    /// Lock or unlock one extreme of a lever; see [`PolicyLever::set_locked`].
    pub fn set_locked(&mut self, kind: LeverKind, extreme: LeverPosition, locked: bool) -> bool {
        self.levers[kind.index()].set_locked(extreme, locked)
    }

    pub fn insured(&self, kind: InsuranceKind) -> bool {
        self.insurance[kind.index()]
    }

    pub fn set_insurance(&mut self, kind: InsuranceKind, enabled: bool) {
        self.insurance[kind.index()] = enabled;
    }

    /// Builder-style lever setter for tests and presets. Locked extremes
    /// fall back to `Mid`.
    pub fn with(mut self, kind: LeverKind, position: LeverPosition) -> Self {
        let _ = self.set_lever(kind, position);
        self
    }

    pub fn with_insurance(mut self, kind: InsuranceKind) -> Self {
        self.set_insurance(kind, true);
        self
    }

    /// Every lever/insurance combination, for exhaustive sweeps.
    pub fn all_combinations() -> Vec<PolicyConfiguration> {
        let lever_combos = 3usize.pow(LeverKind::ALL.len() as u32);
        let insurance_combos = 1usize << InsuranceKind::ALL.len();
        let mut out = Vec::with_capacity(lever_combos * insurance_combos);
        for mut code in 0..lever_combos {
            let mut base = PolicyConfiguration::new();
            for kind in LeverKind::ALL {
                base = base.with(kind, LeverPosition::ALL[code % 3]);
                code /= 3;
            }
            for mask in 0..insurance_combos {
                let mut config = base;
                for (bit, kind) in InsuranceKind::ALL.iter().enumerate() {
                    config.set_insurance(*kind, mask & (1 << bit) != 0);
                }
                out.push(config);
            }
        }
        out
    }
}
