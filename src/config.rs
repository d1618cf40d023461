//! Behavioural parameters shared by every household in a run.

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

fn default_initial_satisfaction() -> f64 {
    0.0
}

fn default_tax_rate() -> f64 {
    0.1
}

fn default_damage_unit_cost() -> f64 {
    4_000.0
}

fn default_debt_penalty() -> f64 {
    1.0
}

fn default_max_mortgage_multiplier() -> f64 {
    10.0
}

fn default_enabled() -> bool {
    true
}

fn default_relocation_round() -> u32 {
    4
}

fn default_threshold() -> f64 {
    0.6
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    #[serde(default = "default_initial_satisfaction")]
    pub initial_satisfaction: f64,
    /// Share of the outstanding mortgage paid each round.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Cost of one unmitigated damage point.
    #[serde(default = "default_damage_unit_cost")]
    pub damage_unit_cost: f64,
    #[serde(default = "default_debt_penalty")]
    pub debt_penalty: f64,
    #[serde(default = "default_max_mortgage_multiplier")]
    pub max_mortgage_multiplier: f64,
    #[serde(default)]
    pub relocation: RelocationConfig,
    #[serde(default)]
    pub adoption: AdoptionConfig,
    #[serde(default)]
    pub decay: Option<DecayConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelocationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_relocation_round")]
    pub round: u32,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Scheduled loss of protection, applied to every household on one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayConfig {
    pub round: u32,
    pub magnitude: i32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            initial_satisfaction: default_initial_satisfaction(),
            tax_rate: default_tax_rate(),
            damage_unit_cost: default_damage_unit_cost(),
            debt_penalty: default_debt_penalty(),
            max_mortgage_multiplier: default_max_mortgage_multiplier(),
            relocation: RelocationConfig::default(),
            adoption: AdoptionConfig::default(),
            decay: None,
        }
    }
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            round: default_relocation_round(),
            threshold: default_threshold(),
        }
    }
}

impl Default for AdoptionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            threshold: default_threshold(),
        }
    }
}

impl BehaviorConfig {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for (field, value) in [
            ("behavior.initial_satisfaction", self.initial_satisfaction),
            ("behavior.debt_penalty", self.debt_penalty),
            ("behavior.max_mortgage_multiplier", self.max_mortgage_multiplier),
        ] {
            if !value.is_finite() {
                return Err(ScenarioError::InvalidParameter {
                    field,
                    reason: format!("{value} is not a finite number"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(ScenarioError::InvalidParameter {
                field: "behavior.tax_rate",
                reason: format!("{} is outside [0, 1]", self.tax_rate),
            });
        }
        if !self.damage_unit_cost.is_finite() || self.damage_unit_cost < 0.0 {
            return Err(ScenarioError::InvalidParameter {
                field: "behavior.damage_unit_cost",
                reason: format!("{} must be a non-negative number", self.damage_unit_cost),
            });
        }
        if !(0.0..=1.0).contains(&self.relocation.threshold) {
            return Err(ScenarioError::InvalidParameter {
                field: "behavior.relocation.threshold",
                reason: format!("{} is outside [0, 1]", self.relocation.threshold),
            });
        }
        if !(0.0..=1.0).contains(&self.adoption.threshold) {
            return Err(ScenarioError::InvalidParameter {
                field: "behavior.adoption.threshold",
                reason: format!("{} is outside [0, 1]", self.adoption.threshold),
            });
        }
        // Rounds are numbered from 1, so round 0 would never fire.
        if self.relocation.round == 0 {
            return Err(ScenarioError::InvalidParameter {
                field: "behavior.relocation.round",
                reason: "rounds start at 1".to_string(),
            });
        }
        if let Some(decay) = &self.decay {
            if decay.round == 0 {
                return Err(ScenarioError::InvalidParameter {
                    field: "behavior.decay.round",
                    reason: "rounds start at 1".to_string(),
                });
            }
            if decay.magnitude < 0 {
                return Err(ScenarioError::InvalidParameter {
                    field: "behavior.decay.magnitude",
                    reason: format!("{} would add protection", decay.magnitude),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config: BehaviorConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, BehaviorConfig::default());
        assert_eq!(config.relocation.round, 4);
        assert_eq!(config.adoption.threshold, 0.6);
        assert_eq!(config.damage_unit_cost, 4_000.0);
        assert!(config.decay.is_none());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let yaml = "relocation:\n  round: 3\ndecay:\n  round: 2\n  magnitude: 1\n";
        let config: BehaviorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.relocation.round, 3);
        assert_eq!(config.relocation.threshold, 0.6);
        assert!(config.relocation.enabled);
        assert_eq!(
            config.decay,
            Some(DecayConfig {
                round: 2,
                magnitude: 1
            })
        );
    }

    #[test]
    fn thresholds_outside_unit_interval_are_rejected() {
        let mut config = BehaviorConfig::default();
        config.adoption.threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ScenarioError::InvalidParameter { field, .. }) if field == "behavior.adoption.threshold"
        ));
    }

    fn rejected_field(config: &BehaviorConfig) -> Option<&'static str> {
        match config.validate() {
            Err(ScenarioError::InvalidParameter { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn negative_decay_is_rejected() {
        let mut config = BehaviorConfig::default();
        config.decay = Some(DecayConfig {
            round: 2,
            magnitude: -1,
        });
        assert_eq!(rejected_field(&config), Some("behavior.decay.magnitude"));

        config.decay = Some(DecayConfig {
            round: 2,
            magnitude: 0,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_finite_satisfaction_constants_are_rejected() {
        let mut config = BehaviorConfig::default();
        config.debt_penalty = f64::NAN;
        assert_eq!(rejected_field(&config), Some("behavior.debt_penalty"));

        let mut config = BehaviorConfig::default();
        config.initial_satisfaction = f64::INFINITY;
        assert_eq!(rejected_field(&config), Some("behavior.initial_satisfaction"));
    }

    #[test]
    fn round_zero_schedules_are_rejected() {
        let config: BehaviorConfig = serde_yaml::from_str("relocation:\n  round: 0\n").unwrap();
        assert_eq!(rejected_field(&config), Some("behavior.relocation.round"));

        let config: BehaviorConfig =
            serde_yaml::from_str("decay:\n  round: 0\n  magnitude: 1\n").unwrap();
        assert_eq!(rejected_field(&config), Some("behavior.decay.round"));
    }
}
