//! API key retrieval from the region controller over SSH

use crate::config::MaasConfig;
use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::info;

/// Command line that prints the API key of `config.user`
pub fn apikey_command(config: &MaasConfig) -> Vec<String> {
    vec![
        "ssh".to_string(),
        format!("{}@{}", config.shell_user, config.host),
        "sudo".to_string(),
        "maas-region-admin".to_string(),
        "apikey".to_string(),
        format!("--username={}", config.user),
    ]
}

/// Fetch the API key by running `maas-region-admin` on the region host
pub async fn fetch_api_key(config: &MaasConfig) -> Result<String> {
    let argv = apikey_command(config);
    info!(host = %config.host, user = %config.user, "Fetching MAAS API key over SSH");

    let output = Command::new(&argv[0]).args(&argv[1..]).output().await?;
    if !output.status.success() {
        return Err(Error::Auth(format!(
            "{} exited with {}: {}",
            argv.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if key.is_empty() {
        return Err(Error::Auth(format!("no API key for user {}", config.user)));
    }
    Ok(key)
}
