pub mod config;
pub mod loader;

pub use config::PlanConfig;
pub use loader::{ConfigLoadError, load_plan_config};
