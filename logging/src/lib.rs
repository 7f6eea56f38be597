//! Configuration-driven `tracing` setup shared by the bidcheck crates.
//!
//! A YAML file (`bidcheck_logging.yaml`, or `bidcheck_logging.<env>.yaml`
//! when `BIDCHECK_ENV`/`APP_ENV` is set) selects the minimum level, per-target
//! overrides and the output format. Records from the `log` crate are bridged
//! into tracing unless disabled.

pub mod config;
pub mod error;
mod init;

pub use config::processed::{LoggingConfig, OutputFormat};
pub use error::{Error, Result};
pub use init::{find_config_file, find_config_file_in, init, init_from_file, init_with_config, load_from_file};
