//! Protection-motivation appraisals.
//!
//! Both household decisions (moving house and adopting a measure) score a
//! candidate as the mean of a threat appraisal and a coping appraisal, each
//! clamped to `[0, 1]`.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::{
    hazard::{RAIN_DAMAGE_MAX, RIVER_DAMAGE_MAX},
    household::DamageRecord,
    measures::Measure,
};

/// Wealth at which money pressure halves.
const MONEY_PRESSURE_SCALE: f64 = 100_000.0;
const EXPERIENCE_WEIGHT: f64 = 0.7;
const DO_NOTHING_BASE: f64 = 0.05;
const DO_NOTHING_PRESSURE_WEIGHT: f64 = 0.15;
const STAY_BASE: f64 = 0.2;
const STAY_SATISFACTION_WEIGHT: f64 = 0.5;
const AMENITY_EFFICACY: f64 = 0.5;

/// Cumulative mitigation capacity. Not clamped: decay may push either
/// component below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Protection {
    pub rain: i32,
    pub river: i32,
}

impl Protection {
    pub fn new(rain: i32, river: i32) -> Self {
        Self { rain, river }
    }

    pub fn rain_probability(&self) -> f64 {
        clamp01((RAIN_DAMAGE_MAX - self.rain) as f64 / RAIN_DAMAGE_MAX as f64)
    }

    pub fn river_probability(&self) -> f64 {
        clamp01((RIVER_DAMAGE_MAX - self.river) as f64 / RIVER_DAMAGE_MAX as f64)
    }

    /// Chance that a uniform hazard draw exceeds this protection, averaged
    /// over rain and river.
    pub fn flood_probability(&self) -> f64 {
        (self.rain_probability() + self.river_probability()) / 2.0
    }

    pub fn decay(&mut self, magnitude: i32) {
        self.rain -= magnitude;
        self.river -= magnitude;
    }
}

impl Add for Protection {
    type Output = Protection;

    fn add(self, rhs: Protection) -> Protection {
        Protection {
            rain: self.rain + rhs.rain,
            river: self.river + rhs.river,
        }
    }
}

impl AddAssign for Protection {
    fn add_assign(&mut self, rhs: Protection) {
        self.rain += rhs.rain;
        self.river += rhs.river;
    }
}

pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Share of recorded rounds that cost the household money.
pub fn experience_factor(history: &[DamageRecord]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let flooded = history.iter().filter(|r| r.damage_cost > 0.0).count();
    clamp01(flooded as f64 / history.len() as f64)
}

/// Perceived benefit of keeping money in the bank; 1 for households with no
/// positive wealth.
pub fn money_pressure(wealth: f64) -> f64 {
    let wealth = wealth.max(0.0);
    clamp01(1.0 - wealth / (wealth + MONEY_PRESSURE_SCALE))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    pub threat: f64,
    pub coping: f64,
}

impl Appraisal {
    pub fn new(threat: f64, coping: f64) -> Self {
        Self {
            threat: clamp01(threat),
            coping: clamp01(coping),
        }
    }

    pub fn motivation(&self) -> f64 {
        clamp01((self.threat + self.coping) / 2.0)
    }
}

/// Inputs of a relocation appraisal for one candidate house.
#[derive(Debug, Clone, Copy)]
pub struct RelocationInputs {
    pub current_probability: f64,
    pub candidate_probability: f64,
    pub candidate_value: f64,
    pub max_mortgage: f64,
    pub satisfaction: f64,
    pub experience: f64,
}

pub fn relocation_appraisal(inputs: &RelocationInputs) -> Appraisal {
    let stay_benefit = STAY_BASE + STAY_SATISFACTION_WEIGHT * clamp01(inputs.satisfaction);
    // expected damage is approximated by the flood probability itself
    let expected_damage = inputs.current_probability;
    let threat =
        inputs.current_probability + expected_damage + inputs.experience - stay_benefit;

    let affordable = inputs.candidate_value <= inputs.max_mortgage;
    let self_efficacy = if affordable { 1.0 } else { 0.0 };
    let response_cost = if inputs.max_mortgage > 0.0 {
        clamp01(inputs.candidate_value / inputs.max_mortgage)
    } else {
        1.0
    };
    let risk_reduction = (inputs.current_probability - inputs.candidate_probability).max(0.0);
    let coping = risk_reduction + self_efficacy - response_cost;

    Appraisal::new(threat, coping)
}

/// Inputs of a measure-adoption appraisal for one candidate measure.
#[derive(Debug, Clone, Copy)]
pub struct AdoptionInputs {
    pub protection: Protection,
    pub wealth: f64,
    pub experience: f64,
}

pub fn adoption_appraisal(inputs: &AdoptionInputs, measure: &Measure) -> Appraisal {
    let current_probability = inputs.protection.flood_probability();
    let do_nothing_benefit =
        DO_NOTHING_BASE + DO_NOTHING_PRESSURE_WEIGHT * money_pressure(inputs.wealth);
    let threat = current_probability + EXPERIENCE_WEIGHT * inputs.experience - do_nothing_benefit;

    let protected = inputs.protection + measure.protection();
    let amenity = if measure.satisfaction == 1 {
        AMENITY_EFFICACY
    } else {
        0.0
    };
    let response_efficacy =
        clamp01((current_probability - protected.flood_probability()).max(0.0) + amenity);
    let affordable = inputs.wealth > 0.0 && inputs.wealth >= measure.cost;
    let self_efficacy = if affordable { 1.0 } else { 0.0 };
    let response_cost = clamp01(measure.cost / inputs.wealth.max(1.0));
    let coping = response_efficacy + self_efficacy - response_cost;

    Appraisal::new(threat, coping)
}
