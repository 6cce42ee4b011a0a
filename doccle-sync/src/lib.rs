pub mod cli;
pub mod load_config;
pub mod schedule;
pub mod server;
pub mod telemetry;

pub use cli::{run, Cli, Commands};
