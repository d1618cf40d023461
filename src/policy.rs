//! Policy levers applied around the household step: a one-time subsidy
//! credit and an insurance payout hook.

use serde::{Deserialize, Serialize};

use crate::{
    household::HouseholdAgent,
    measures::{MeasureCatalog, INSURANCE_MEASURE},
};

fn default_subsidy_round() -> u32 {
    2
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub insurance_available: bool,
    #[serde(default)]
    pub subsidy: Option<SubsidyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyConfig {
    pub measure: String,
    pub level: f64,
    #[serde(default = "default_subsidy_round")]
    pub round: u32,
    /// Agents that receive the credit; every agent when omitted.
    #[serde(default)]
    pub recipients: Option<Vec<String>>,
}

/// One-time wealth credit worth `cost × subsidy_percentage` of a catalog
/// entry, paid on a single round.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsidyScheme {
    pub measure: String,
    pub amount: f64,
    pub active_round: u32,
    pub recipients: Option<Vec<String>>,
}

impl SubsidyScheme {
    /// Reads the amount from the configured catalog so that a mutated cost
    /// or rate is honoured. Returns `None` when the measure is unknown.
    pub fn from_catalog(config: &SubsidyConfig, catalog: &MeasureCatalog) -> Option<Self> {
        let measure = catalog.get(&config.measure)?;
        Some(Self {
            measure: measure.name.clone(),
            amount: measure.subsidy_amount(),
            active_round: config.round,
            recipients: config.recipients.clone(),
        })
    }

    pub fn applies_to(&self, agent_id: &str) -> bool {
        match &self.recipients {
            Some(ids) => ids.iter().any(|id| id == agent_id),
            None => true,
        }
    }

    /// Credits the agent when the round matches. Returns the amount paid.
    pub fn apply(&self, agent: &mut HouseholdAgent, round: u32) -> f64 {
        if round != self.active_round || !self.applies_to(&agent.id) || self.amount <= 0.0 {
            return 0.0;
        }
        agent.credit_subsidy(self.amount);
        self.amount
    }
}

/// Pays a household's flood damage back when it holds the insurance measure
/// and the latest round brought river damage.
#[derive(Debug, Clone, PartialEq)]
pub struct InsuranceScheme {
    pub measure: String,
}

impl Default for InsuranceScheme {
    fn default() -> Self {
        Self {
            measure: INSURANCE_MEASURE.to_string(),
        }
    }
}

impl InsuranceScheme {
    pub fn new(measure: impl Into<String>) -> Self {
        Self {
            measure: measure.into(),
        }
    }

    pub fn covers(&self, agent: &HouseholdAgent) -> bool {
        agent.has_adopted(&self.measure)
    }

    /// Returns the payout credited, zero when nothing is owed.
    pub fn settle(&self, agent: &mut HouseholdAgent) -> f64 {
        if !self.covers(agent) {
            return 0.0;
        }
        let payout = match agent.damage_history.last() {
            Some(record) if record.river_diff > 0 && record.damage_cost > 0.0 => {
                record.damage_cost
            }
            _ => return 0.0,
        };
        agent.credit_payout(payout);
        payout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BehaviorConfig,
        hazard::HazardDraw,
        household::AgentProfile,
        measures::Measure,
    };

    fn agent(id: &str, wealth: f64) -> HouseholdAgent {
        HouseholdAgent::new(
            AgentProfile::new(id, wealth, 0.0).with_max_mortgage(0.0),
            &BehaviorConfig::default(),
        )
    }

    #[test]
    fn subsidy_pays_once_on_its_round() {
        let mut catalog = MeasureCatalog::standard();
        catalog
            .get_mut("Self-activating wall")
            .unwrap()
            .subsidy_percentage = 0.5;
        let scheme = SubsidyScheme::from_catalog(
            &SubsidyConfig {
                measure: "Self-activating wall".into(),
                level: 0.5,
                round: 2,
                recipients: Some(vec!["p1".into()]),
            },
            &catalog,
        )
        .unwrap();
        let mut p1 = agent("p1", 1_000.0);
        let mut p2 = agent("p2", 1_000.0);

        assert_eq!(scheme.apply(&mut p1, 1), 0.0);
        assert_eq!(scheme.apply(&mut p1, 2), 6_000.0);
        assert_eq!(scheme.apply(&mut p2, 2), 0.0);
        assert_eq!(p1.wealth, 7_000.0);
        assert_eq!(p2.wealth, 1_000.0);
    }

    #[test]
    fn insurance_pays_river_damage_for_holders_only() {
        let config = BehaviorConfig::default();
        let insurance = Measure::new(INSURANCE_MEASURE, 0.0, true, 0, 0, 1);
        let scheme = InsuranceScheme::default();

        let mut holder = agent("holder", 10_000.0);
        holder.adopt(&insurance);
        holder.resolve_damage(HazardDraw::new(0, 3), &config);
        let mut uninsured = agent("uninsured", 10_000.0);
        uninsured.resolve_damage(HazardDraw::new(0, 3), &config);

        assert_eq!(scheme.settle(&mut holder), 12_000.0);
        assert_eq!(holder.wealth, 10_000.0);
        assert_eq!(scheme.settle(&mut uninsured), 0.0);
        assert_eq!(uninsured.wealth, -2_000.0);
    }

    #[test]
    fn insurance_ignores_rain_only_damage() {
        let config = BehaviorConfig::default();
        let scheme = InsuranceScheme::default();
        let mut holder = agent("holder", 10_000.0);
        holder.adopt(&Measure::new(INSURANCE_MEASURE, 0.0, true, 0, 0, 1));
        holder.resolve_damage(HazardDraw::new(4, 0), &config);
        assert_eq!(scheme.settle(&mut holder), 0.0);
    }
}
