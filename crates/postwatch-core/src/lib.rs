//! Shared configuration for the postwatch workspace.
//!
//! Every binary loads one [`AppConfig`] from the environment at startup and
//! threads it (or the relevant fields) down to the store, engine, and webhook
//! layers. Nothing here touches the network or the filesystem beyond `.env`
//! loading.

use thiserror::Error;

pub mod app_config;
pub mod config;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
