use anyhow::Result;
use log::debug;

use crate::{
    engine::{System, SystemContext},
    policy::InsuranceScheme,
    rng::SystemRng,
    world::World,
};

/// Post-round payout hook for insured households.
pub struct InsuranceSystem {
    scheme: InsuranceScheme,
}

impl InsuranceSystem {
    pub fn new(scheme: InsuranceScheme) -> Self {
        Self { scheme }
    }
}

impl Default for InsuranceSystem {
    fn default() -> Self {
        Self::new(InsuranceScheme::default())
    }
}

impl System for InsuranceSystem {
    fn name(&self) -> &str {
        "insurance"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for agent in &mut world.agents {
            let payout = self.scheme.settle(agent);
            if payout > 0.0 {
                debug!("round {}: {} insured payout {payout:.0}", ctx.round, agent.id);
            }
        }
        Ok(())
    }
}
