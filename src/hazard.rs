//! Stochastic flood hazards.
//!
//! One draw per round is shared by every household. Damage resolution only
//! looks at the two intensities, so drawn and injected values are treated
//! the same way.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::SystemRng;

pub const RAIN_DAMAGE_MAX: i32 = 10;
pub const RIVER_DAMAGE_MAX: i32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HazardDraw {
    pub rain_damage: i32,
    pub river_damage: i32,
}

impl HazardDraw {
    pub fn new(rain_damage: i32, river_damage: i32) -> Self {
        Self {
            rain_damage,
            river_damage,
        }
    }

    pub fn calm() -> Self {
        Self::default()
    }
}

/// Uniform integer hazard intensities: rain in `[1, 10]`, river in `[1, 12]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardGenerator;

impl HazardGenerator {
    pub fn new() -> Self {
        Self
    }

    /// With `seed`, the shared stream is reseeded first so the draw can be
    /// replayed; without it the stream simply advances.
    pub fn draw(&self, rng: &mut SystemRng<'_>, seed: Option<u64>) -> HazardDraw {
        if let Some(seed) = seed {
            rng.reseed(seed);
        }
        let rain_damage = rng.gen_range(1..=RAIN_DAMAGE_MAX);
        let river_damage = rng.gen_range(1..=RIVER_DAMAGE_MAX);
        HazardDraw {
            rain_damage,
            river_damage,
        }
    }
}

fn default_shock_round() -> u32 {
    2
}

fn default_shock_rain() -> i32 {
    RAIN_DAMAGE_MAX
}

fn default_shock_river() -> i32 {
    RIVER_DAMAGE_MAX
}

/// How a run produces its per-round hazard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FloodRegime {
    #[default]
    Random,
    OneShock {
        #[serde(default = "default_shock_round")]
        round: u32,
        #[serde(default = "default_shock_rain")]
        rain_damage: i32,
        #[serde(default = "default_shock_river")]
        river_damage: i32,
    },
}

impl FloodRegime {
    pub fn hazard_for_round(
        &self,
        generator: &HazardGenerator,
        round: u32,
        rng: &mut SystemRng<'_>,
    ) -> HazardDraw {
        match *self {
            FloodRegime::Random => generator.draw(rng, None),
            FloodRegime::OneShock {
                round: shock_round,
                rain_damage,
                river_damage,
            } => {
                if round == shock_round {
                    HazardDraw::new(rain_damage, river_damage)
                } else {
                    HazardDraw::calm()
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FloodRegime::Random => "random_floods",
            FloodRegime::OneShock { .. } => "one_shock",
        }
    }
}
