//! Command handlers -- one module per subcommand

pub mod config;
pub mod dataflows;
pub mod filter_type;
pub mod validate;

use std::path::Path;

use tunerlink_core::config::TunerTestConfig;
use tunerlink_core::error::{ConfigError, TunerLinkError};

use crate::error::CliError;

/// Load the tuner configuration, mapping an absent file to `NotApplicable`.
pub(crate) async fn load_config(config_path: &Path) -> Result<TunerTestConfig, CliError> {
    match TunerTestConfig::load(config_path).await {
        Ok(config) => Ok(config),
        Err(TunerLinkError::Config(ConfigError::FileNotFound { .. })) => {
            Err(CliError::NotApplicable {
                path: config_path.to_path_buf(),
            })
        }
        Err(e) => Err(e.into()),
    }
}
