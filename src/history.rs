//! Per-round, per-agent history rows and their CSV export.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    hazard::HazardDraw,
    household::{AgentId, HouseholdAgent},
};

pub const CSV_HEADER: &str =
    "round,agent_id,satisfaction,wealth,rain_damage,river_damage,flood_damage_cost,new_measures,measures";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub round: u32,
    pub agent_id: AgentId,
    pub satisfaction: f64,
    pub wealth: f64,
    /// Empty for round zero.
    pub rain_damage: Option<i32>,
    pub river_damage: Option<i32>,
    pub flood_damage_cost: f64,
    pub new_measures: Vec<String>,
    pub measures: Vec<String>,
}

impl HistoryRow {
    fn to_csv_line(&self) -> String {
        let fields = [
            self.round.to_string(),
            escape(&self.agent_id),
            self.satisfaction.to_string(),
            self.wealth.to_string(),
            self.rain_damage.map(|v| v.to_string()).unwrap_or_default(),
            self.river_damage.map(|v| v.to_string()).unwrap_or_default(),
            self.flood_damage_cost.to_string(),
            escape(&self.new_measures.join(";")),
            escape(&self.measures.join(";")),
        ];
        fields.join(",")
    }
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Collects one row per agent per round. "New" measures are the ones
/// appended to an agent's adoption list since its previous row.
#[derive(Debug, Clone, Default)]
pub struct HistoryRecorder {
    rows: Vec<HistoryRow>,
    recorded_len: HashMap<AgentId, usize>,
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_round_zero(&mut self, agents: &[HouseholdAgent]) {
        for agent in agents {
            let mut held = agent.adopted_names();
            held.sort();
            held.dedup();
            self.rows.push(HistoryRow {
                round: 0,
                agent_id: agent.id.clone(),
                satisfaction: agent.satisfaction,
                wealth: agent.wealth,
                rain_damage: None,
                river_damage: None,
                flood_damage_cost: 0.0,
                new_measures: Vec::new(),
                measures: held,
            });
            self.recorded_len
                .insert(agent.id.clone(), agent.adopted_measures.len());
        }
    }

    pub fn record(&mut self, round: u32, agents: &[HouseholdAgent], hazard: HazardDraw) {
        for agent in agents {
            let previous = self.recorded_len.get(&agent.id).copied().unwrap_or(0);
            let new_measures = agent
                .adopted_measures
                .iter()
                .skip(previous)
                .map(|m| m.name.clone())
                .collect();
            self.rows.push(HistoryRow {
                round,
                agent_id: agent.id.clone(),
                satisfaction: agent.satisfaction,
                wealth: agent.wealth,
                rain_damage: Some(hazard.rain_damage),
                river_damage: Some(hazard.river_damage),
                flood_damage_cost: agent.last_damage_cost(),
                new_measures,
                measures: agent.adopted_names(),
            });
            self.recorded_len
                .insert(agent.id.clone(), agent.adopted_measures.len());
        }
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    pub fn rows_for_round(&self, round: u32) -> impl Iterator<Item = &HistoryRow> {
        self.rows.iter().filter(move |row| row.round == round)
    }

    pub fn to_csv_string(&self) -> String {
        let mut out = String::with_capacity(64 * (self.rows.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.to_csv_line());
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_csv_string())
            .with_context(|| format!("Failed to write history to {}", path.display()))
    }
}
