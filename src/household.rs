//! Household agents and their per-round decision pipeline.
//!
//! Every round a household runs, in this order and without rollback:
//! income, housing (buy or relocate), mortgage tax, measure adoption, damage,
//! round rules (protection decay, debt penalty), satisfaction record.
//! All mutations land immediately, so an earlier household can take a house
//! or change nothing a later one sees except the housing registry.

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::BehaviorConfig,
    hazard::HazardDraw,
    housing::{House, HouseId, HousingRegistry, RelocationSearch},
    measures::{Measure, MeasureCatalog},
    pmt::{adoption_appraisal, experience_factor, AdoptionInputs, Appraisal, Protection},
};

pub type AgentId = String;

fn default_efficacy() -> f64 {
    0.5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    #[default]
    Never,
    Once,
    Several,
}

impl ExperienceLevel {
    pub fn after_flood(self) -> Self {
        match self {
            ExperienceLevel::Never => ExperienceLevel::Once,
            ExperienceLevel::Once | ExperienceLevel::Several => ExperienceLevel::Several,
        }
    }
}

/// Everything needed to construct a household. Optional attributes have
/// explicit defaults instead of being attached after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub wealth: f64,
    pub income: f64,
    /// Borrowing capacity; `wealth × max_mortgage_multiplier` when omitted.
    #[serde(default)]
    pub max_mortgage: Option<f64>,
    #[serde(default)]
    pub preferred_rating: f64,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default = "default_efficacy")]
    pub self_efficacy: f64,
    #[serde(default = "default_efficacy")]
    pub outcome_efficacy: f64,
    #[serde(default = "default_efficacy")]
    pub risk_perception: f64,
    /// House owned when the run starts. Placed by the scenario builder,
    /// which also checks it exists and is free.
    #[serde(default)]
    pub house: Option<HouseId>,
}

impl AgentProfile {
    pub fn new(id: impl Into<AgentId>, wealth: f64, income: f64) -> Self {
        Self {
            id: id.into(),
            wealth,
            income,
            max_mortgage: None,
            preferred_rating: 0.0,
            experience_level: ExperienceLevel::Never,
            self_efficacy: default_efficacy(),
            outcome_efficacy: default_efficacy(),
            risk_perception: default_efficacy(),
            house: None,
        }
    }

    pub fn with_max_mortgage(mut self, max_mortgage: f64) -> Self {
        self.max_mortgage = Some(max_mortgage);
        self
    }

    pub fn with_preferred_rating(mut self, rating: f64) -> Self {
        self.preferred_rating = rating;
        self
    }

    pub fn with_experience(mut self, level: ExperienceLevel) -> Self {
        self.experience_level = level;
        self
    }

    pub fn with_house(mut self, house_id: impl Into<HouseId>) -> Self {
        self.house = Some(house_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRecord {
    pub rain_diff: i32,
    pub river_diff: i32,
    pub damage_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HousingEvent {
    Purchased {
        house_id: HouseId,
    },
    Relocated {
        from: HouseId,
        to: HouseId,
        motivation: f64,
    },
}

/// Money and decisions of the current round, kept so the wealth ledger can
/// be rebuilt: `income - tax_paid - measure_spend - damage_cost + subsidy + payout`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundActivity {
    pub round: u32,
    pub income: f64,
    pub tax_paid: f64,
    pub measure_spend: f64,
    pub damage_cost: f64,
    pub subsidy: f64,
    pub payout: f64,
    pub adopted: Vec<String>,
    pub housing: Option<HousingEvent>,
}

impl RoundActivity {
    pub fn net_change(&self) -> f64 {
        self.income - self.tax_paid - self.measure_spend - self.damage_cost
            + self.subsidy
            + self.payout
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Bought(HouseId),
    AlreadyHoused,
    NoMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelocationOutcome {
    Moved {
        from: HouseId,
        to: HouseId,
        motivation: f64,
    },
    /// Best candidate did not clear the threshold, or there was none.
    Stayed { best_motivation: Option<f64> },
    NotRelocationRound,
    Unhoused,
}

/// Scored adoption candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureScore<'a> {
    pub measure: &'a Measure,
    pub appraisal: Appraisal,
    pub motivation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdAgent {
    pub id: AgentId,
    pub wealth: f64,
    pub income: f64,
    pub mortgage: Option<f64>,
    pub max_mortgage: f64,
    pub house: Option<HouseId>,
    pub preferred_rating: f64,
    pub protection: Protection,
    pub satisfaction: f64,
    pub experience_level: ExperienceLevel,
    pub self_efficacy: f64,
    pub outcome_efficacy: f64,
    pub risk_perception: f64,
    pub adopted_measures: Vec<Measure>,
    pub damage_history: Vec<DamageRecord>,
    pub satisfaction_history: Vec<f64>,
    pub activity: RoundActivity,
}

impl HouseholdAgent {
    pub fn new(profile: AgentProfile, config: &BehaviorConfig) -> Self {
        let max_mortgage = profile
            .max_mortgage
            .unwrap_or(profile.wealth * config.max_mortgage_multiplier);
        Self {
            id: profile.id,
            wealth: profile.wealth,
            income: profile.income,
            mortgage: None,
            max_mortgage,
            house: None,
            preferred_rating: profile.preferred_rating,
            protection: Protection::default(),
            satisfaction: config.initial_satisfaction,
            experience_level: profile.experience_level,
            self_efficacy: profile.self_efficacy,
            outcome_efficacy: profile.outcome_efficacy,
            risk_perception: profile.risk_perception,
            adopted_measures: Vec::new(),
            damage_history: Vec::new(),
            satisfaction_history: Vec::new(),
            activity: RoundActivity::default(),
        }
    }

    /// Clears the per-round ledger. Policy credits that precede the step
    /// must come after this.
    pub fn begin_round(&mut self, round: u32) {
        self.activity = RoundActivity {
            round,
            ..RoundActivity::default()
        };
    }

    pub fn step(
        &mut self,
        housing: &mut HousingRegistry,
        catalog: &MeasureCatalog,
        hazard: HazardDraw,
        round: u32,
        config: &BehaviorConfig,
    ) {
        if self.activity.round != round {
            self.begin_round(round);
        }
        self.receive_income();
        if self.house.is_none() {
            self.buy_house(housing, round);
        } else if config.relocation.enabled {
            self.consider_relocation(housing, round, config);
        }
        self.pay_mortgage_tax(config.tax_rate);
        if config.adoption.enabled {
            self.adopt_measures(catalog, config.adoption.threshold);
        }
        self.resolve_damage(hazard, config);
        self.apply_round_rules(round, config);
        self.satisfaction_history.push(self.satisfaction);
    }

    pub fn receive_income(&mut self) {
        self.wealth += self.income;
        self.activity.income += self.income;
    }

    /// Takes ownership of `house` outside the round pipeline, as for a
    /// household that starts the run already housed. The caller marks the
    /// house occupied.
    pub fn move_into(&mut self, house: &House) {
        self.house = Some(house.id.clone());
        self.mortgage = Some(house.value);
        self.protection += house.protection();
    }

    /// First-fit purchase. Adds the house's protection on top of whatever
    /// the household already has.
    pub fn buy_house(&mut self, housing: &mut HousingRegistry, round: u32) -> PurchaseOutcome {
        if self.house.is_some() {
            return PurchaseOutcome::AlreadyHoused;
        }
        let (house_id, value, protection) =
            match housing.first_match(round, self.max_mortgage, self.preferred_rating) {
                Some(house) => (house.id.clone(), house.value, house.protection()),
                None => return PurchaseOutcome::NoMatch,
            };
        if !housing.occupy(&house_id) {
            return PurchaseOutcome::NoMatch;
        }
        self.house = Some(house_id.clone());
        self.mortgage = Some(value);
        self.protection += protection;
        self.activity.housing = Some(HousingEvent::Purchased {
            house_id: house_id.clone(),
        });
        debug!("round {round}: {} bought {house_id} for {value:.0}", self.id);
        PurchaseOutcome::Bought(house_id)
    }

    /// Only evaluated on the configured relocation round. A move replaces
    /// the household's protection with the new house's ratings, dropping
    /// anything gained from measures.
    pub fn consider_relocation(
        &mut self,
        housing: &mut HousingRegistry,
        round: u32,
        config: &BehaviorConfig,
    ) -> RelocationOutcome {
        if round != config.relocation.round {
            return RelocationOutcome::NotRelocationRound;
        }
        let current = match &self.house {
            Some(id) => id.clone(),
            None => return RelocationOutcome::Unhoused,
        };
        let best = housing.best_relocation(&RelocationSearch {
            current: &current,
            round,
            max_mortgage: self.max_mortgage,
            satisfaction: self.satisfaction,
            experience: experience_factor(&self.damage_history),
        });
        let candidate = match best {
            Some(candidate) if candidate.motivation > config.relocation.threshold => candidate,
            other => {
                return RelocationOutcome::Stayed {
                    best_motivation: other.map(|c| c.motivation),
                }
            }
        };
        let (value, protection) = match housing.get(&candidate.house_id) {
            Some(house) => (house.value, house.protection()),
            None => {
                return RelocationOutcome::Stayed {
                    best_motivation: Some(candidate.motivation),
                }
            }
        };
        if !housing.occupy(&candidate.house_id) {
            return RelocationOutcome::Stayed {
                best_motivation: Some(candidate.motivation),
            };
        }
        housing.vacate(&current);

        self.house = Some(candidate.house_id.clone());
        self.mortgage = Some(value);
        self.protection = protection;
        self.activity.housing = Some(HousingEvent::Relocated {
            from: current.clone(),
            to: candidate.house_id.clone(),
            motivation: candidate.motivation,
        });
        debug!(
            "round {round}: {} moved {current} -> {} (pm {:.3})",
            self.id, candidate.house_id, candidate.motivation
        );
        RelocationOutcome::Moved {
            from: current,
            to: candidate.house_id,
            motivation: candidate.motivation,
        }
    }

    /// Pays `rate` of the outstanding mortgage; no-op without one.
    pub fn pay_mortgage_tax(&mut self, rate: f64) -> f64 {
        let Some(mortgage) = self.mortgage.as_mut() else {
            return 0.0;
        };
        let payment = rate * *mortgage;
        *mortgage -= payment;
        self.wealth -= payment;
        self.activity.tax_paid += payment;
        payment
    }

    fn is_candidate(&self, measure: &Measure) -> bool {
        measure.available && (measure.repeatable || !self.has_adopted(&measure.name))
    }

    /// Scores every eligible measure against the household's current state,
    /// highest motivation first. Equal scores keep catalog order.
    pub fn score_measures<'a>(&self, catalog: &'a MeasureCatalog) -> Vec<MeasureScore<'a>> {
        let inputs = AdoptionInputs {
            protection: self.protection,
            wealth: self.wealth,
            experience: experience_factor(&self.damage_history),
        };
        let mut scores: Vec<MeasureScore<'a>> = catalog
            .iter()
            .filter(|measure| self.is_candidate(measure))
            .map(|measure| {
                let appraisal = adoption_appraisal(&inputs, measure);
                MeasureScore {
                    measure,
                    appraisal,
                    motivation: appraisal.motivation(),
                }
            })
            .collect();
        scores.sort_by(|a, b| {
            b.motivation
                .partial_cmp(&a.motivation)
                .unwrap_or(Ordering::Equal)
        });
        scores
    }

    /// Adopts, in score order, every measure above `threshold` that the
    /// household can still pay for. Each purchase is paid immediately, so it
    /// can price out the candidates after it.
    pub fn adopt_measures(&mut self, catalog: &MeasureCatalog, threshold: f64) -> Vec<String> {
        let scores = self.score_measures(catalog);
        let mut adopted = Vec::new();
        for score in scores {
            if score.motivation <= threshold {
                continue;
            }
            if !score.measure.cost.is_finite() || self.wealth < score.measure.cost {
                continue;
            }
            if self.adopt(score.measure) {
                adopted.push(score.measure.name.clone());
            }
        }
        adopted
    }

    /// Buys a measure outright. Refuses a second copy of a non-repeatable
    /// measure.
    pub fn adopt(&mut self, measure: &Measure) -> bool {
        if !measure.repeatable && self.has_adopted(&measure.name) {
            return false;
        }
        self.wealth -= measure.cost;
        self.protection += measure.protection();
        self.satisfaction += f64::from(measure.satisfaction);
        self.adopted_measures.push(measure.clone());
        self.activity.measure_spend += measure.cost;
        self.activity.adopted.push(measure.name.clone());
        debug!("{} adopted {} for {:.0}", self.id, measure.name, measure.cost);
        true
    }

    /// Charges unmitigated hazard intensity and lowers satisfaction by the
    /// same number of points. Wealth may go negative.
    pub fn resolve_damage(&mut self, hazard: HazardDraw, config: &BehaviorConfig) -> DamageRecord {
        let rain_diff = (hazard.rain_damage - self.protection.rain).max(0);
        let river_diff = (hazard.river_damage - self.protection.river).max(0);
        let damage_cost = config.damage_unit_cost * f64::from(rain_diff + river_diff);
        self.wealth -= damage_cost;

        if rain_diff > 0 {
            self.satisfaction -= f64::from(rain_diff);
        }
        if river_diff > 0 {
            self.satisfaction -= f64::from(river_diff);
        }
        if damage_cost > 0.0 {
            self.experience_level = self.experience_level.after_flood();
        }

        let record = DamageRecord {
            rain_diff,
            river_diff,
            damage_cost,
        };
        self.damage_history.push(record);
        self.activity.damage_cost += damage_cost;
        record
    }

    pub fn apply_round_rules(&mut self, round: u32, config: &BehaviorConfig) {
        if let Some(decay) = &config.decay {
            if decay.round == round {
                self.protection.decay(decay.magnitude);
            }
        }
        if self.wealth < 0.0 {
            self.satisfaction -= config.debt_penalty;
        }
    }

    pub fn credit_subsidy(&mut self, amount: f64) {
        self.wealth += amount;
        self.activity.subsidy += amount;
    }

    pub fn credit_payout(&mut self, amount: f64) {
        self.wealth += amount;
        self.activity.payout += amount;
    }

    pub fn has_adopted(&self, name: &str) -> bool {
        self.adopted_measures.iter().any(|m| m.name == name)
    }

    pub fn adopted_names(&self) -> Vec<String> {
        self.adopted_measures.iter().map(|m| m.name.clone()).collect()
    }

    /// Damage charged in the latest resolved round.
    pub fn last_damage_cost(&self) -> f64 {
        self.damage_history
            .last()
            .map(|record| record.damage_cost)
            .unwrap_or(0.0)
    }
}
