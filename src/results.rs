//! Files left behind by a finished run: the history CSV and a manifest.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{scenario::Scenario, world::World};

pub const HISTORY_FILE: &str = "history.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub scenario: String,
    pub seed: u64,
    pub rounds: u32,
    pub agents: usize,
    pub flood_regime: String,
    pub finished_at: DateTime<Utc>,
}

/// Writes `<results_dir>/<scenario>/history.csv` and `manifest.json`,
/// returning the scenario directory.
pub fn write_run_outputs(
    results_dir: &Path,
    scenario: &Scenario,
    world: &World,
    rounds: u32,
) -> Result<PathBuf> {
    let out_dir = results_dir.join(&scenario.name);
    world.history().write_csv(out_dir.join(HISTORY_FILE))?;

    let manifest = RunManifest {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        rounds,
        agents: world.agents().len(),
        flood_regime: scenario.flood_regime.label().to_string(),
        finished_at: Utc::now(),
    };
    let manifest_path = out_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;
    Ok(out_dir)
}
