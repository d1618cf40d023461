//! Periodic JSON checkpoints of the world state.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::world::World;

pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval_rounds: u32,
}

impl SnapshotWriter {
    /// An interval of zero disables snapshots.
    pub fn new(output_dir: impl AsRef<Path>, interval_rounds: u32) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval_rounds,
        }
    }

    pub fn should_write(&self, round: u32) -> bool {
        self.interval_rounds > 0 && round > 0 && round % self.interval_rounds == 0
    }

    pub fn maybe_write(&self, world: &World, scenario_name: &str) -> Result<Option<PathBuf>> {
        let round = world.round();
        if !self.should_write(round) {
            return Ok(None);
        }
        let dir = self.output_dir.join(scenario_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("round_{round:04}.json"));
        let json = serde_json::to_string_pretty(&world.snapshot(scenario_name))?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(Some(path))
    }
}
