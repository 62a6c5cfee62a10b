pub mod app_config;
pub mod config;
pub mod products;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{CanonicalProduct, CleanedProduct, RawRecord, EXPORT_FIELDS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
