use anyhow::Result;
use log::debug;

use crate::{
    engine::{System, SystemContext},
    policy::SubsidyScheme,
    rng::SystemRng,
    world::World,
};

/// Credits the configured subsidy before any household acts.
pub struct SubsidySystem {
    scheme: Option<SubsidyScheme>,
}

impl SubsidySystem {
    pub fn new(scheme: Option<SubsidyScheme>) -> Self {
        Self { scheme }
    }
}

impl Default for SubsidySystem {
    fn default() -> Self {
        Self::new(None)
    }
}

impl System for SubsidySystem {
    fn name(&self) -> &str {
        "subsidy"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let Some(scheme) = &self.scheme else {
            return Ok(());
        };
        for agent in &mut world.agents {
            let paid = scheme.apply(agent, ctx.round);
            if paid > 0.0 {
                debug!(
                    "round {}: {} received {paid:.0} towards {}",
                    ctx.round, agent.id, scheme.measure
                );
            }
        }
        Ok(())
    }
}
