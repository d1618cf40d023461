use anyhow::{ensure, Result};

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Records the round's history rows and checks that no house has two owners.
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let mut owned: Vec<&str> = world
            .agents
            .iter()
            .filter_map(|agent| agent.house.as_deref())
            .collect();
        owned.sort_unstable();
        let total = owned.len();
        owned.dedup();
        ensure!(
            owned.len() == total,
            "round {}: a house is held by more than one household",
            ctx.round
        );

        let hazard = world.hazard.unwrap_or_default();
        world.history.record(ctx.round, &world.agents, hazard);
        Ok(())
    }
}
