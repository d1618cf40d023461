use anyhow::Result;
use log::debug;

use crate::{
    engine::{System, SystemContext},
    hazard::{FloodRegime, HazardGenerator},
    rng::SystemRng,
    world::World,
};

/// Draws the single hazard every household faces this round.
pub struct HazardSystem {
    regime: FloodRegime,
    generator: HazardGenerator,
    replay_seed: Option<u64>,
}

impl HazardSystem {
    pub fn new(regime: FloodRegime) -> Self {
        Self {
            regime,
            generator: HazardGenerator::new(),
            replay_seed: None,
        }
    }

    /// Reseeds the stream with `seed + round` before each random draw, so a
    /// round's hazard does not depend on earlier rounds.
    pub fn with_replay_seed(mut self, seed: Option<u64>) -> Self {
        self.replay_seed = seed;
        self
    }
}

impl Default for HazardSystem {
    fn default() -> Self {
        Self::new(FloodRegime::default())
    }
}

impl System for HazardSystem {
    fn name(&self) -> &str {
        "hazard"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let hazard = match (&self.regime, self.replay_seed) {
            (FloodRegime::Random, Some(seed)) => self
                .generator
                .draw(rng, Some(seed.wrapping_add(u64::from(ctx.round)))),
            (regime, _) => regime.hazard_for_round(&self.generator, ctx.round, rng),
        };
        debug!(
            "round {}: {} hazard rain {} river {}",
            ctx.round,
            self.regime.label(),
            hazard.rain_damage,
            hazard.river_damage
        );
        world.hazard = Some(hazard);
        Ok(())
    }
}
