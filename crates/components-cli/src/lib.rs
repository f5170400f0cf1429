//! Application scaffolding over clap: named flag sections, YAML config
//! fallback, options validation and logging setup.

pub mod app;
pub mod command;
pub mod config;
pub mod flag;
mod help;
pub mod options;
pub mod output;

pub use app::{format_base_name, App};
pub use command::Command;
pub use config::Flags;
pub use flag::NamedFlagSets;
pub use options::CliOptions;
