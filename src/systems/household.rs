use anyhow::Result;
use log::warn;

use crate::{
    engine::{System, SystemContext},
    hazard::HazardDraw,
    rng::SystemRng,
    world::World,
};

pub struct HouseholdSystem;

impl HouseholdSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HouseholdSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for HouseholdSystem {
    fn name(&self) -> &str {
        "household"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let hazard = match world.hazard {
            Some(hazard) => hazard,
            None => {
                warn!("round {}: no hazard drawn, households face a calm round", ctx.round);
                let calm = HazardDraw::calm();
                world.hazard = Some(calm);
                calm
            }
        };
        world.step_households(hazard);
        Ok(())
    }
}
