//! Process bootstrap shared by worktrack binaries: layered configuration and
//! logging initialisation.

pub mod config;
pub mod logging;

pub use config::{default_logging_config, AppConfig, CliArgs, LoggingConfig, Section, ServerConfig};
pub use logging::init_logging_from_config;
