use serde::{Deserialize, Serialize};

use crate::{
    config::BehaviorConfig,
    hazard::HazardDraw,
    history::HistoryRecorder,
    household::{ExperienceLevel, HouseholdAgent, RoundActivity},
    housing::{HouseId, HousingRegistry},
    measures::MeasureCatalog,
    pmt::Protection,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub wealth: f64,
    pub satisfaction: f64,
    pub house: Option<HouseId>,
    pub mortgage: Option<f64>,
    pub protection: Protection,
    pub experience_level: ExperienceLevel,
    pub measures: Vec<String>,
    pub activity: RoundActivity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub round: u32,
    pub hazard: Option<HazardDraw>,
    pub houses_available: usize,
    pub total_wealth: f64,
    pub mean_satisfaction: f64,
    pub agents: Vec<AgentSnapshot>,
}

/// Everything a run mutates. Agents are kept in creation order, which is
/// also the order they act in.
pub struct World {
    round: u32,
    pub(crate) agents: Vec<HouseholdAgent>,
    pub(crate) housing: HousingRegistry,
    pub(crate) catalog: MeasureCatalog,
    pub(crate) behavior: BehaviorConfig,
    pub(crate) hazard: Option<HazardDraw>,
    pub(crate) history: HistoryRecorder,
}

impl World {
    pub fn new(
        agents: Vec<HouseholdAgent>,
        housing: HousingRegistry,
        catalog: MeasureCatalog,
        behavior: BehaviorConfig,
    ) -> Self {
        let mut history = HistoryRecorder::new();
        history.record_round_zero(&agents);
        Self {
            round: 0,
            agents,
            housing,
            catalog,
            behavior,
            hazard: None,
            history,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn agents(&self) -> &[HouseholdAgent] {
        &self.agents
    }

    pub fn agent(&self, id: &str) -> Option<&HouseholdAgent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn housing(&self) -> &HousingRegistry {
        &self.housing
    }

    pub fn catalog(&self) -> &MeasureCatalog {
        &self.catalog
    }

    pub fn hazard(&self) -> Option<HazardDraw> {
        self.hazard
    }

    pub fn history(&self) -> &HistoryRecorder {
        &self.history
    }

    /// Advances the round counter and clears every agent's round ledger.
    pub fn begin_round(&mut self) -> u32 {
        self.round += 1;
        self.hazard = None;
        for agent in &mut self.agents {
            agent.begin_round(self.round);
        }
        self.round
    }

    /// Steps every agent, in order, against the round's shared hazard.
    pub fn step_households(&mut self, hazard: HazardDraw) {
        let round = self.round;
        for agent in &mut self.agents {
            agent.step(
                &mut self.housing,
                &self.catalog,
                hazard,
                round,
                &self.behavior,
            );
        }
    }

    pub fn total_wealth(&self) -> f64 {
        self.agents.iter().map(|a| a.wealth).sum()
    }

    pub fn mean_satisfaction(&self) -> f64 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.agents.iter().map(|a| a.satisfaction).sum::<f64>() / self.agents.len() as f64
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let agents = self
            .agents
            .iter()
            .map(|agent| AgentSnapshot {
                id: agent.id.clone(),
                wealth: agent.wealth,
                satisfaction: agent.satisfaction,
                house: agent.house.clone(),
                mortgage: agent.mortgage,
                protection: agent.protection,
                experience_level: agent.experience_level,
                measures: agent.adopted_names(),
                activity: agent.activity.clone(),
            })
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            round: self.round,
            hazard: self.hazard,
            houses_available: self.housing.available_count(),
            total_wealth: self.total_wealth(),
            mean_satisfaction: self.mean_satisfaction(),
            agents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{household::AgentProfile, housing::House};

    fn world() -> World {
        let config = BehaviorConfig::default();
        let agents = vec![
            HouseholdAgent::new(AgentProfile::new("p1", 5_000.0, 35_000.0), &config),
            HouseholdAgent::new(AgentProfile::new("p2", 1_000.0, 20_000.0), &config),
        ];
        let housing = HousingRegistry::new(vec![House {
            id: "h1".into(),
            value: 40_000.0,
            rain_protection: 0,
            river_protection: 0,
            preferred_rating: 0.0,
            available: true,
            available_round: 0,
        }])
        .unwrap();
        World::new(agents, housing, MeasureCatalog::standard(), config)
    }

    #[test]
    fn construction_records_round_zero() {
        let world = world();
        assert_eq!(world.round(), 0);
        assert_eq!(world.history().rows().len(), 2);
        assert!(world.history().rows().iter().all(|r| r.round == 0));
    }

    #[test]
    fn first_agent_in_order_wins_the_only_house() {
        let mut world = world();
        world.behavior.adoption.enabled = false;
        world.begin_round();
        world.step_households(HazardDraw::calm());
        assert_eq!(world.agent("p1").unwrap().house.as_deref(), Some("h1"));
        assert!(world.agent("p2").unwrap().house.is_none());

        let snapshot = world.snapshot("test");
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.houses_available, 0);
        assert_eq!(snapshot.agents.len(), 2);
    }
}
