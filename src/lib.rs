pub mod config;
pub mod engine;
pub mod error;
pub mod hazard;
pub mod history;
pub mod household;
pub mod housing;
pub mod measures;
pub mod pmt;
pub mod policy;
pub mod results;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod web;
pub mod world;

pub use error::ScenarioError;
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
