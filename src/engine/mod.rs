use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::{
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    world::{World, WorldSnapshot},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_rounds: u32,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_rounds,
            ),
            settings: self.settings,
        }
    }
}

/// Drives rounds. Systems run in registration order, one after another,
/// each with its own named random stream.
pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, rounds: u32) -> Result<()> {
        self.run_with_hook(world, rounds, |_| {})
    }

    /// Like [`Engine::run`], handing a snapshot of the world to `hook` after
    /// every completed round.
    pub fn run_with_hook<F>(&mut self, world: &mut World, rounds: u32, mut hook: F) -> Result<()>
    where
        F: FnMut(WorldSnapshot),
    {
        for _ in 0..rounds {
            let round = world.begin_round();
            let ctx = SystemContext {
                round,
                scenario_name: &self.settings.scenario_name,
            };
            for system in &mut self.systems {
                let mut rng_stream = self.rng.stream(system.name());
                system
                    .run(&ctx, world, &mut rng_stream)
                    .with_context(|| format!("system '{}' failed in round {round}", system.name()))?;
            }
            self.snapshot_writer
                .maybe_write(world, &self.settings.scenario_name)?;
            info!(
                "round {round}: hazard {:?}, total wealth {:.0}, mean satisfaction {:.2}",
                world.hazard().map(|h| (h.rain_damage, h.river_damage)),
                world.total_wealth(),
                world.mean_satisfaction()
            );
            hook(world.snapshot(&self.settings.scenario_name));
        }
        Ok(())
    }
}

pub struct SystemContext<'a> {
    pub round: u32,
    pub scenario_name: &'a str,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
