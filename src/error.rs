use thiserror::Error;

/// Configuration problems detected while assembling a run. All of them are
/// fatal and surface before the first round executes.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("scenario io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("scenario must define at least one house")]
    EmptyHousing,

    #[error("scenario must define at least one household agent")]
    EmptyPopulation,

    #[error("measure catalog has no entry named '{name}'")]
    MissingMeasure { name: String },

    #[error("house id '{id}' defined more than once")]
    DuplicateHouse { id: String },

    #[error("agent id '{id}' defined more than once")]
    DuplicateAgent { id: String },

    #[error("measure '{name}' defined more than once")]
    DuplicateMeasure { name: String },

    #[error("reference to unknown agent '{id}'")]
    UnknownAgent { id: String },

    #[error("reference to unknown house '{id}'")]
    UnknownHouse { id: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
}
