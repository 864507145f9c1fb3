//! Command line options shared by the binaries

use crate::config::Config;
use crate::error::Result;
use clap::Args;
use std::path::PathBuf;

/// Connection, configuration and logging options
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// YAML configuration file
    #[arg(long, short = 'c', env = "MAAS_INVENTORY_CONFIG")]
    pub config: Option<PathBuf>,

    /// MAAS region controller host
    #[arg(long, short = 'm', env = "MAAS_HOST")]
    pub maas_host: Option<String>,

    /// Full MAAS API URL (overrides --maas-host for requests)
    #[arg(long, env = "MAAS_API_URL")]
    pub maas_api_url: Option<String>,

    /// MAAS API key (consumer:key:secret); fetched over SSH when unset
    #[arg(long, env = "MAAS_TOKEN", hide_env_values = true)]
    pub maas_token: Option<String>,

    /// MAAS user owning the API key
    #[arg(long, short = 'u', env = "MAAS_USER")]
    pub maas_user: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl CommonArgs {
    /// Configuration file (or defaults) with command line overrides applied
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(host) = &self.maas_host {
            config.maas.host = host.clone();
        }
        if let Some(url) = &self.maas_api_url {
            config.maas.api_url = Some(url.clone());
        }
        if let Some(token) = &self.maas_token {
            config.maas.token = Some(token.clone());
        }
        if let Some(user) = &self.maas_user {
            config.maas.user = user.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
