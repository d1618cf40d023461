//! Adoptable flood-protection measures.
//!
//! A catalog is fixed for the length of a run. Scenario tweaks (subsidy
//! rate, insurance on/off) are applied to a deep copy produced by
//! [`MeasureCatalog::configured`], never to a shared instance.

use serde::{Deserialize, Serialize};

use crate::{error::ScenarioError, pmt::Protection, policy::PolicyConfig};

pub const INSURANCE_MEASURE: &str = "Flood insurance";

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    pub cost: f64,
    pub repeatable: bool,
    #[serde(default, alias = "rain_protection")]
    pub protection_rain: i32,
    #[serde(default, alias = "river_protection")]
    pub protection_river: i32,
    #[serde(default)]
    pub satisfaction: i32,
    #[serde(default)]
    pub subsidy_percentage: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl Measure {
    pub fn new(
        name: impl Into<String>,
        cost: f64,
        repeatable: bool,
        protection_rain: i32,
        protection_river: i32,
        satisfaction: i32,
    ) -> Self {
        Self {
            name: name.into(),
            cost,
            repeatable,
            protection_rain,
            protection_river,
            satisfaction,
            subsidy_percentage: 0.0,
            available: true,
        }
    }

    pub fn protection(&self) -> Protection {
        Protection::new(self.protection_rain, self.protection_river)
    }

    /// Amount paid out by a subsidy scheme for this measure.
    pub fn subsidy_amount(&self) -> f64 {
        if self.cost.is_finite() {
            self.cost * self.subsidy_percentage
        } else {
            0.0
        }
    }
}

/// Ordered, name-keyed list of measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasureCatalog {
    measures: Vec<Measure>,
}

impl MeasureCatalog {
    pub fn new(measures: Vec<Measure>) -> Result<Self, ScenarioError> {
        let mut seen: Vec<&str> = Vec::with_capacity(measures.len());
        for measure in &measures {
            if seen.contains(&measure.name.as_str()) {
                return Err(ScenarioError::DuplicateMeasure {
                    name: measure.name.clone(),
                });
            }
            if measure.cost.is_nan() || measure.cost < 0.0 {
                return Err(ScenarioError::InvalidParameter {
                    field: "measure.cost",
                    reason: format!("'{}' has cost {}", measure.name, measure.cost),
                });
            }
            seen.push(&measure.name);
        }
        Ok(Self { measures })
    }

    /// The household adaptation catalog used by the board game.
    pub fn standard() -> Self {
        Self {
            measures: vec![
                Measure::new("Personal improvements", 12_000.0, true, 0, 0, 1),
                Measure::new("Modest house renovations", 12_000.0, true, 0, 0, 1),
                Measure::new("Structual house changes", 12_000.0, true, 0, 0, 1),
                Measure::new(INSURANCE_MEASURE, 6_000.0, true, 0, 0, 1),
                Measure::new("Water pump", 6_000.0, false, 1, 0, 0),
                Measure::new("Self-activating wall", 12_000.0, false, 1, 1, 0),
                Measure::new("Sandbags", 3_000.0, false, 0, 1, 0),
                Measure::new("Waterproofing walls & floors", 20_000.0, false, 1, 1, 1),
                Measure::new("Green garden", 12_000.0, false, 1, 0, 1),
                Measure::new("Rain barrel", 20_000.0, false, 1, 0, 1),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Measure> {
        self.measures.iter()
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Measure> {
        self.measures.iter_mut().find(|m| m.name == name)
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut Measure, ScenarioError> {
        self.get_mut(name).ok_or_else(|| ScenarioError::MissingMeasure {
            name: name.to_string(),
        })
    }

    /// Deep copy with the scenario's policy applied. The insurance entry must
    /// exist so the scenario can toggle it; a subsidised measure must exist
    /// too.
    pub fn configured(&self, policy: &PolicyConfig) -> Result<MeasureCatalog, ScenarioError> {
        let mut catalog = self.clone();

        let insurance = catalog.require_mut(INSURANCE_MEASURE)?;
        insurance.available = policy.insurance_available;

        if let Some(subsidy) = &policy.subsidy {
            if !(0.0..=1.0).contains(&subsidy.level) {
                return Err(ScenarioError::InvalidParameter {
                    field: "policy.subsidy.level",
                    reason: format!("{} is outside [0, 1]", subsidy.level),
                });
            }
            let measure = catalog.require_mut(&subsidy.measure)?;
            measure.subsidy_percentage = subsidy.level;
        }

        Ok(catalog)
    }
}

impl Default for MeasureCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
