//! Housing registry and the two ways a household can take a house.
//!
//! Houses are kept in insertion order and scanned in that order, so the
//! registry layout decides who gets a contested house first.

use serde::{Deserialize, Serialize};

use crate::{
    error::ScenarioError,
    pmt::{relocation_appraisal, Appraisal, Protection, RelocationInputs},
};

pub type HouseId = String;

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub value: f64,
    #[serde(default)]
    pub rain_protection: i32,
    #[serde(default)]
    pub river_protection: i32,
    #[serde(default)]
    pub preferred_rating: f64,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub available_round: u32,
}

impl House {
    pub fn protection(&self) -> Protection {
        Protection::new(self.rain_protection, self.river_protection)
    }

    pub fn flood_probability(&self) -> f64 {
        self.protection().flood_probability()
    }

    fn on_market(&self, round: u32) -> bool {
        self.available && self.available_round <= round
    }
}

/// Best-scoring relocation target found for a household.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelocationCandidate {
    pub house_id: HouseId,
    pub appraisal: Appraisal,
    pub motivation: f64,
}

/// What a household needs to know to search for a safer house.
#[derive(Debug, Clone, Copy)]
pub struct RelocationSearch<'a> {
    pub current: &'a str,
    pub round: u32,
    pub max_mortgage: f64,
    pub satisfaction: f64,
    pub experience: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HousingRegistry {
    houses: Vec<House>,
}

impl HousingRegistry {
    pub fn new(houses: Vec<House>) -> Result<Self, ScenarioError> {
        if houses.is_empty() {
            return Err(ScenarioError::EmptyHousing);
        }
        let mut seen: Vec<&str> = Vec::with_capacity(houses.len());
        for house in &houses {
            if seen.contains(&house.id.as_str()) {
                return Err(ScenarioError::DuplicateHouse {
                    id: house.id.clone(),
                });
            }
            if house.value.is_nan() || house.value < 0.0 {
                return Err(ScenarioError::InvalidParameter {
                    field: "house.value",
                    reason: format!("house '{}' has value {}", house.id, house.value),
                });
            }
            seen.push(&house.id);
        }
        Ok(Self { houses })
    }

    pub fn iter(&self) -> impl Iterator<Item = &House> {
        self.houses.iter()
    }

    pub fn len(&self) -> usize {
        self.houses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&House> {
        self.houses.iter().find(|h| h.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut House> {
        self.houses.iter_mut().find(|h| h.id == id)
    }

    pub fn available_count(&self) -> usize {
        self.houses.iter().filter(|h| h.available).count()
    }

    /// First house, in registry order, that is on the market this round,
    /// within the mortgage limit and at least as good as the household wants.
    pub fn first_match(
        &self,
        round: u32,
        max_mortgage: f64,
        preferred_rating: f64,
    ) -> Option<&House> {
        self.houses.iter().find(|house| {
            house.on_market(round)
                && house.value <= max_mortgage
                && house.preferred_rating >= preferred_rating
        })
    }

    /// Marks a house as taken. Returns `false` when it was already taken or
    /// does not exist.
    pub fn occupy(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(house) if house.available => {
                house.available = false;
                true
            }
            _ => false,
        }
    }

    pub fn vacate(&mut self, id: &str) {
        if let Some(house) = self.get_mut(id) {
            house.available = true;
        }
    }

    /// Scores every affordable, free and strictly safer house and returns
    /// the highest motivation. Ties keep registry order.
    pub fn best_relocation(&self, search: &RelocationSearch<'_>) -> Option<RelocationCandidate> {
        let current = self.get(search.current)?;
        let current_probability = current.flood_probability();

        let mut best: Option<RelocationCandidate> = None;
        for house in &self.houses {
            if house.id == current.id
                || !house.on_market(search.round)
                || house.value > search.max_mortgage
            {
                continue;
            }
            let candidate_probability = house.flood_probability();
            if candidate_probability >= current_probability {
                continue;
            }
            let appraisal = relocation_appraisal(&RelocationInputs {
                current_probability,
                candidate_probability,
                candidate_value: house.value,
                max_mortgage: search.max_mortgage,
                satisfaction: search.satisfaction,
                experience: search.experience,
            });
            let motivation = appraisal.motivation();
            let better = best
                .as_ref()
                .map_or(true, |incumbent| motivation > incumbent.motivation);
            if better {
                best = Some(RelocationCandidate {
                    house_id: house.id.clone(),
                    appraisal,
                    motivation,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house(id: &str, value: f64, rain: i32, river: i32) -> House {
        House {
            id: id.into(),
            value,
            rain_protection: rain,
            river_protection: river,
            preferred_rating: 5.0,
            available: true,
            available_round: 0,
        }
    }

    #[test]
    fn registry_rejects_empty_and_duplicates() {
        assert!(matches!(
            HousingRegistry::new(Vec::new()),
            Err(ScenarioError::EmptyHousing)
        ));
        assert!(matches!(
            HousingRegistry::new(vec![house("h1", 1.0, 0, 0), house("h1", 2.0, 0, 0)]),
            Err(ScenarioError::DuplicateHouse { .. })
        ));
    }

    #[test]
    fn first_match_follows_insertion_order() {
        let mut late = house("late", 50_000.0, 0, 0);
        late.available_round = 3;
        let mut shabby = house("shabby", 40_000.0, 0, 0);
        shabby.preferred_rating = 1.0;
        let registry = HousingRegistry::new(vec![
            late,
            house("pricey", 500_000.0, 0, 0),
            shabby,
            house("first", 60_000.0, 0, 0),
            house("second", 30_000.0, 0, 0),
        ])
        .unwrap();
        let found = registry.first_match(1, 100_000.0, 4.0).unwrap();
        assert_eq!(found.id, "first");
        assert_eq!(registry.first_match(3, 100_000.0, 4.0).unwrap().id, "late");
        assert!(registry.first_match(1, 10_000.0, 4.0).is_none());
    }

    #[test]
    fn occupy_is_exclusive() {
        let mut registry = HousingRegistry::new(vec![house("h1", 1.0, 0, 0)]).unwrap();
        assert!(registry.occupy("h1"));
        assert!(!registry.occupy("h1"));
        assert!(!registry.occupy("missing"));
        registry.vacate("h1");
        assert!(registry.occupy("h1"));
    }

    #[test]
    fn relocation_picks_highest_motivation_among_safer_houses() {
        let mut registry = HousingRegistry::new(vec![
            house("home", 80_000.0, 5, 6),
            house("riskier", 10_000.0, 2, 2),
            house("too_dear", 200_000.0, 10, 12),
            house("safe_dear", 90_000.0, 8, 12),
            house("safe_cheap", 50_000.0, 8, 12),
        ])
        .unwrap();
        registry.occupy("home");
        let best = registry
            .best_relocation(&RelocationSearch {
                current: "home",
                round: 4,
                max_mortgage: 100_000.0,
                satisfaction: 0.0,
                experience: 0.0,
            })
            .unwrap();
        assert_eq!(best.house_id, "safe_cheap");
        assert!((best.motivation - 0.85).abs() < 1e-9);
    }

    #[test]
    fn relocation_skips_taken_houses() {
        let mut registry = HousingRegistry::new(vec![
            house("home", 80_000.0, 5, 6),
            house("safe", 50_000.0, 8, 12),
        ])
        .unwrap();
        registry.occupy("home");
        registry.occupy("safe");
        let search = RelocationSearch {
            current: "home",
            round: 4,
            max_mortgage: 100_000.0,
            satisfaction: 0.0,
            experience: 0.0,
        };
        assert!(registry.best_relocation(&search).is_none());
    }
}
