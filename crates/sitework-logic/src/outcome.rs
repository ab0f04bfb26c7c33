//! Outcome calculator - turns a policy configuration into job modifiers.
//!
//! Every lever and insurance toggle contributes one independent
//! [`Effect`]. Duration and profit contributions multiply, quality and
//! morale contributions add, so the result does not depend on the order
//! they are applied in. Levers are still walked in [`LeverKind::ALL`]
//! order so the explanation breakdown reads the same every time.
//!
//! ```
//! use sitework_logic::outcome::{project_outcome, JobBasis};
//! use sitework_logic::policy::PolicyConfiguration;
//! use sitework_logic::tuning::OutcomeTuning;
//!
//! let basis = JobBasis { base_duration: 20, contract_payment: 10_000 };
//! let projection = project_outcome(&basis, &PolicyConfiguration::new(), &OutcomeTuning::default(), None);
//! assert_eq!(projection.planned_duration, 20);
//! assert_eq!(projection.quality, 100);
//! assert_eq!(projection.net_profit, 10_000);
//! ```

use serde::{Deserialize, Serialize};

use crate::lever::LeverPosition;
use crate::policy::{InsuranceKind, LeverKind, PolicyConfiguration};
use crate::tuning::{Effect, OutcomeTuning};

/// Quality before any modifiers.
pub const BASE_QUALITY: i32 = 100;

/// One line of the explanation breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub source: String,
    pub duration_factor: f64,
    pub quality_delta: i32,
    pub morale_delta: i32,
    pub profit_factor: f64,
}

/// Accumulated modifiers, before they are applied to a job's base numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeModifiers {
    pub duration_multiplier: f64,
    /// Unclamped; see [`clamp_quality`].
    pub quality_delta: i32,
    pub morale_delta: i32,
    pub profit_multiplier: f64,
    pub contributions: Vec<Contribution>,
}

impl Default for OutcomeModifiers {
    fn default() -> Self {
        Self {
            duration_multiplier: 1.0,
            quality_delta: 0,
            morale_delta: 0,
            profit_multiplier: 1.0,
            contributions: Vec::new(),
        }
    }
}

impl OutcomeModifiers {
    fn apply(&mut self, source: String, effect: Effect) {
        if effect.is_neutral() {
            return;
        }
        self.duration_multiplier *= effect.duration;
        self.quality_delta += effect.quality;
        self.morale_delta += effect.morale;
        self.profit_multiplier *= effect.profit;
        self.contributions.push(Contribution {
            source,
            duration_factor: effect.duration,
            quality_delta: effect.quality,
            morale_delta: effect.morale,
            profit_factor: effect.profit,
        });
    }
}

/// Combine every lever and toggle into modifiers.
///
/// `crew_morale` is the assigned crew's morale at commit time; `None`
/// means no crew has been chosen yet and the low-morale check is skipped.
pub fn compute_modifiers(
    policy: &PolicyConfiguration,
    tuning: &OutcomeTuning,
    crew_morale: Option<u8>,
) -> OutcomeModifiers {
    let mut modifiers = OutcomeModifiers::default();

    for kind in LeverKind::ALL {
        let position = policy.position(kind);
        if position == LeverPosition::Mid {
            continue;
        }
        let effect = tuning.lever(kind).effect(position);
        let source = format!("{}: {}", kind.name(), kind.position_label(position));
        modifiers.apply(source, effect);
    }

    for kind in InsuranceKind::ALL {
        if policy.insured(kind) {
            modifiers.apply(kind.name().to_string(), tuning.insurance(kind));
        }
    }

    // Evaluated last, against the morale frozen at commit.
    if let Some(morale) = crew_morale {
        if morale < tuning.low_morale_threshold {
            let penalty = Effect::new(1.0, tuning.low_morale_quality_penalty, 0, 1.0);
            modifiers.apply(format!("low crew morale ({})", morale), penalty);
        }
    }

    modifiers
}

/// Base numbers of a job the modifiers are applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBasis {
    pub base_duration: u32,
    pub contract_payment: i64,
}

/// Final projected numbers for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProjection {
    pub planned_duration: u32,
    pub quality: u8,
    pub morale_delta: i32,
    pub net_profit: i64,
    pub explanation: Vec<Contribution>,
}

/// `max(1, round(base × multiplier))`.
pub fn planned_duration(base_duration: u32, multiplier: f64) -> u32 {
    let scaled = (base_duration as f64 * multiplier).round();
    if scaled < 1.0 {
        1
    } else {
        scaled as u32
    }
}

/// `clamp(100 + delta, 0, 100)`.
pub fn clamp_quality(quality_delta: i32) -> u8 {
    (BASE_QUALITY + quality_delta).clamp(0, 100) as u8
}

/// `round(payment × multiplier)`.
pub fn net_profit(contract_payment: i64, multiplier: f64) -> i64 {
    (contract_payment as f64 * multiplier).round() as i64
}

/// Apply modifiers to a job's base numbers.
pub fn finalize(basis: &JobBasis, modifiers: OutcomeModifiers) -> OutcomeProjection {
    OutcomeProjection {
        planned_duration: planned_duration(basis.base_duration, modifiers.duration_multiplier),
        quality: clamp_quality(modifiers.quality_delta),
        morale_delta: modifiers.morale_delta,
        net_profit: net_profit(basis.contract_payment, modifiers.profit_multiplier),
        explanation: modifiers.contributions,
    }
}

/// Compute modifiers and apply them in one go.
pub fn project_outcome(
    basis: &JobBasis,
    policy: &PolicyConfiguration,
    tuning: &OutcomeTuning,
    crew_morale: Option<u8>,
) -> OutcomeProjection {
    finalize(basis, compute_modifiers(policy, tuning, crew_morale))
}
