use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    config::{BehaviorConfig, LoggingConfig},
    engine::{Engine, EngineBuilder, EngineSettings},
    error::ScenarioError,
    hazard::FloodRegime,
    household::{AgentProfile, HouseholdAgent},
    housing::{House, HousingRegistry},
    measures::{Measure, MeasureCatalog},
    policy::{InsuranceScheme, PolicyConfig, SubsidyScheme},
    systems::{BookkeepingSystem, HazardSystem, HouseholdSystem, InsuranceSystem, SubsidySystem},
    world::World,
};

pub const DEFAULT_ROUNDS: u32 = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub snapshot_interval_rounds: u32,
    #[serde(default)]
    pub flood_regime: FloodRegime,
    /// Reseed the hazard stream every round from `hazard_seed + round`.
    #[serde(default)]
    pub hazard_seed: Option<u64>,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Replaces the standard catalog when present.
    #[serde(default)]
    pub measures: Option<Vec<Measure>>,
    pub houses: Vec<House>,
    pub agents: Vec<AgentProfile>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        Scenario::from_path(&path)
            .with_context(|| format!("Failed to load scenario {}", path.display()))
    }
}

impl Scenario {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let data = fs::read_to_string(path)?;
        Self::from_yaml_str(&data)
    }

    pub fn from_yaml_str(data: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(data)?)
    }

    pub fn rounds(&self, override_rounds: Option<u32>) -> u32 {
        override_rounds.or(self.rounds).unwrap_or(DEFAULT_ROUNDS)
    }

    /// The scenario's own copy of the measure catalog with its policy applied.
    pub fn configured_catalog(&self) -> Result<MeasureCatalog, ScenarioError> {
        let base = match &self.measures {
            Some(measures) => MeasureCatalog::new(measures.clone())?,
            None => MeasureCatalog::standard(),
        };
        base.configured(&self.policy)
    }

    /// Validates the whole configuration and assembles the initial world.
    /// Nothing here is deferred to the first round.
    pub fn build_world(&self) -> Result<World, ScenarioError> {
        self.behavior.validate()?;
        let catalog = self.configured_catalog()?;
        let mut housing = HousingRegistry::new(self.houses.clone())?;

        if self.agents.is_empty() {
            return Err(ScenarioError::EmptyPopulation);
        }
        let mut agents: Vec<HouseholdAgent> = Vec::with_capacity(self.agents.len());
        for profile in &self.agents {
            if agents.iter().any(|a| a.id == profile.id) {
                return Err(ScenarioError::DuplicateAgent {
                    id: profile.id.clone(),
                });
            }
            if !profile.wealth.is_finite() || !profile.income.is_finite() {
                return Err(ScenarioError::InvalidParameter {
                    field: "agent.wealth",
                    reason: format!("agent '{}' has non-finite wealth or income", profile.id),
                });
            }
            let mut agent = HouseholdAgent::new(profile.clone(), &self.behavior);
            if let Some(house_id) = &profile.house {
                let house = housing
                    .get(house_id)
                    .cloned()
                    .ok_or_else(|| ScenarioError::UnknownHouse {
                        id: house_id.clone(),
                    })?;
                if !housing.occupy(house_id) {
                    return Err(ScenarioError::InvalidParameter {
                        field: "agent.house",
                        reason: format!("house '{house_id}' is assigned to more than one agent"),
                    });
                }
                agent.move_into(&house);
            }
            agents.push(agent);
        }

        if let Some(recipients) = self.policy.subsidy.as_ref().and_then(|s| s.recipients.as_ref()) {
            for id in recipients {
                if !agents.iter().any(|a| &a.id == id) {
                    return Err(ScenarioError::UnknownAgent { id: id.clone() });
                }
            }
        }

        Ok(World::new(agents, housing, catalog, self.behavior.clone()))
    }

    pub fn engine_settings(&self, snapshot_dir: impl Into<PathBuf>) -> EngineSettings {
        EngineSettings {
            scenario_name: self.name.clone(),
            seed: self.seed,
            snapshot_interval_rounds: self.snapshot_interval_rounds,
            snapshot_dir: snapshot_dir.into(),
        }
    }

    /// Wires the round pipeline: hazard, subsidy, households, insurance,
    /// bookkeeping. The subsidy reads its amount from the world's configured
    /// catalog.
    pub fn build_engine(&self, world: &World, settings: EngineSettings) -> Engine {
        let subsidy = self
            .policy
            .subsidy
            .as_ref()
            .and_then(|config| SubsidyScheme::from_catalog(config, world.catalog()));
        EngineBuilder::new(settings)
            .with_system(HazardSystem::new(self.flood_regime.clone()).with_replay_seed(self.hazard_seed))
            .with_system(SubsidySystem::new(subsidy))
            .with_system(HouseholdSystem::new())
            .with_system(InsuranceSystem::new(InsuranceScheme::default()))
            .with_system(BookkeepingSystem::new())
            .build()
    }
}
