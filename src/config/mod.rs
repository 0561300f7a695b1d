//! Configuration loading and application.
mod apply;
mod loader;
mod parse;
pub mod types;


pub use apply::{RunPlan, apply_config, build_api_definition};
pub use loader::load_config;
pub use types::ConfigFile;

#[cfg(test)]
pub(crate) use loader::load_config_file;
pub(crate) use parse::parse_duration_value;
