//! Balance table for lever and insurance effects.
//!
//! Every number the outcome calculator uses lives here so hosts can
//! load an alternative table from their config file.

use serde::{Deserialize, Serialize};

use crate::lever::LeverPosition;
use crate::policy::{InsuranceKind, LeverKind};

/// Effect of one lever position or insurance toggle.
///
/// `duration` and `profit` multiply; `quality` and `morale` add.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub duration: f64,
    pub quality: i32,
    pub morale: i32,
    pub profit: f64,
}

impl Effect {
    pub const NEUTRAL: Effect = Effect {
        duration: 1.0,
        quality: 0,
        morale: 0,
        profit: 1.0,
    };

    pub const fn new(duration: f64, quality: i32, morale: i32, profit: f64) -> Self {
        Self {
            duration,
            quality,
            morale,
            profit,
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Effect::NEUTRAL
    }
}

/// Low/High effects of one lever. `Mid` is always neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeverTuning {
    pub low: Effect,
    pub high: Effect,
}

impl LeverTuning {
    pub fn effect(&self, position: LeverPosition) -> Effect {
        match position {
            LeverPosition::Low => self.low,
            LeverPosition::Mid => Effect::NEUTRAL,
            LeverPosition::High => self.high,
        }
    }
}

/// Quantity factor per lever position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityFactors {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl QuantityFactors {
    pub fn factor(&self, position: LeverPosition) -> f64 {
        match position {
            LeverPosition::Low => self.low,
            LeverPosition::Mid => self.mid,
            LeverPosition::High => self.high,
        }
    }
}

/// Full balance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeTuning {
    pub work_hours: LeverTuning,
    pub crew_size: LeverTuning,
    pub equipment_mode: LeverTuning,
    pub material_policy: LeverTuning,
    pub delivery_speed: LeverTuning,
    pub quality_control: LeverTuning,
    pub wage_policy: LeverTuning,

    pub worker_accident_insurance: Effect,
    pub equipment_damage_insurance: Effect,
    pub weather_delay_insurance: Effect,

    /// Material quantity scaling by material-policy position.
    pub material_quantity: QuantityFactors,
    /// Material quantity scaling by delivery-speed position.
    pub delivery_quantity: QuantityFactors,
    /// Fraction of each profession's headcount kept on a lean crew.
    pub crew_reduction_factor: f64,

    /// Crews below this morale (at commit) drag quality down.
    pub low_morale_threshold: u8,
    pub low_morale_quality_penalty: i32,
}

impl Default for OutcomeTuning {
    fn default() -> Self {
        Self {
            work_hours: LeverTuning {
                low: Effect::new(1.25, 0, 5, 0.98),
                high: Effect::new(0.80, -5, -10, 0.93),
            },
            crew_size: LeverTuning {
                low: Effect::new(1.20, -5, -5, 1.05),
                high: Effect::new(0.85, 0, 0, 0.90),
            },
            equipment_mode: LeverTuning {
                low: Effect::new(1.10, -5, 0, 1.03),
                high: Effect::new(0.95, 0, 0, 0.95),
            },
            material_policy: LeverTuning {
                low: Effect::new(1.0, -15, 0, 1.08),
                high: Effect::new(1.0, 5, 2, 0.94),
            },
            delivery_speed: LeverTuning {
                low: Effect::new(1.15, 0, 0, 1.02),
                high: Effect::new(0.90, 0, 0, 0.96),
            },
            quality_control: LeverTuning {
                low: Effect::new(0.95, -20, 0, 1.03),
                high: Effect::new(1.10, 10, -2, 0.97),
            },
            wage_policy: LeverTuning {
                low: Effect::new(1.0, -5, -15, 1.06),
                high: Effect::new(1.0, 0, 10, 0.94),
            },
            worker_accident_insurance: Effect::new(1.0, 0, 3, 0.98),
            equipment_damage_insurance: Effect::new(1.0, 0, 0, 0.98),
            weather_delay_insurance: Effect::new(1.0, 0, 0, 0.98),
            material_quantity: QuantityFactors {
                low: 0.80,
                mid: 1.0,
                high: 1.20,
            },
            delivery_quantity: QuantityFactors {
                low: 0.70,
                mid: 1.0,
                high: 1.10,
            },
            crew_reduction_factor: 0.8,
            low_morale_threshold: 40,
            low_morale_quality_penalty: -30,
        }
    }
}

impl OutcomeTuning {
    pub fn lever(&self, kind: LeverKind) -> &LeverTuning {
        match kind {
            LeverKind::WorkHours => &self.work_hours,
            LeverKind::CrewSize => &self.crew_size,
            LeverKind::EquipmentMode => &self.equipment_mode,
            LeverKind::MaterialPolicy => &self.material_policy,
            LeverKind::DeliverySpeed => &self.delivery_speed,
            LeverKind::QualityControl => &self.quality_control,
            LeverKind::WagePolicy => &self.wage_policy,
        }
    }

    pub fn insurance(&self, kind: InsuranceKind) -> Effect {
        match kind {
            InsuranceKind::WorkerAccident => self.worker_accident_insurance,
            InsuranceKind::EquipmentDamage => self.equipment_damage_insurance,
            InsuranceKind::WeatherDelay => self.weather_delay_insurance,
        }
    }

    /// Check the table, returning all problems found.
    pub fn validate(&self) -> Vec<TuningError> {
        let mut errors = Vec::new();

        for kind in LeverKind::ALL {
            let tuning = self.lever(kind);
            for (position, effect) in [
                (LeverPosition::Low, tuning.low),
                (LeverPosition::High, tuning.high),
            ] {
                if !positive(effect.duration) || !positive(effect.profit) {
                    errors.push(TuningError::NonPositiveMultiplier {
                        source: format!("{} ({:?})", kind.name(), position),
                    });
                }
            }
        }
        for kind in InsuranceKind::ALL {
            let effect = self.insurance(kind);
            if !positive(effect.duration) || !positive(effect.profit) {
                errors.push(TuningError::NonPositiveMultiplier {
                    source: kind.name().to_string(),
                });
            }
        }

        for (name, factors) in [
            ("material quantity", self.material_quantity),
            ("delivery quantity", self.delivery_quantity),
        ] {
            if !positive(factors.low) || !positive(factors.mid) || !positive(factors.high) {
                errors.push(TuningError::NonPositiveMultiplier {
                    source: name.to_string(),
                });
            }
        }

        if !(self.crew_reduction_factor > 0.0 && self.crew_reduction_factor <= 1.0) {
            errors.push(TuningError::CrewReductionOutOfRange(self.crew_reduction_factor));
        }
        if self.low_morale_threshold > 100 {
            errors.push(TuningError::MoraleThresholdOutOfRange(self.low_morale_threshold));
        }
        if self.low_morale_quality_penalty > 0 {
            errors.push(TuningError::PositiveMoralePenalty(self.low_morale_quality_penalty));
        }

        errors
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Problem found in a balance table.
#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    /// A duration/profit/quantity multiplier is zero, negative or not finite.
    NonPositiveMultiplier { source: String },
    /// Lean-crew factor must lie in (0, 1].
    CrewReductionOutOfRange(f64),
    MoraleThresholdOutOfRange(u8),
    /// The low-morale penalty must not raise quality.
    PositiveMoralePenalty(i32),
}

impl std::fmt::Display for TuningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuningError::NonPositiveMultiplier { source } => {
                write!(f, "non-positive multiplier for {}", source)
            }
            TuningError::CrewReductionOutOfRange(v) => {
                write!(f, "crew reduction factor {} outside (0, 1]", v)
            }
            TuningError::MoraleThresholdOutOfRange(v) => {
                write!(f, "low morale threshold {} above 100", v)
            }
            TuningError::PositiveMoralePenalty(v) => {
                write!(f, "low morale quality penalty {} must be <= 0", v)
            }
        }
    }
}

impl std::error::Error for TuningError {}
