//! `ssh-keyscan` adapter for the [`HostKeyScanner`] port

use crate::domain::ports::HostKeyScanner;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const KEY_TYPE: &str = "ssh-rsa";

/// Runs `ssh-keyscan -t rsa`
#[derive(Debug, Clone)]
pub struct SshKeyscan {
    timeout: Duration,
}

impl SshKeyscan {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn args(&self, ip: &str, hostname: &str) -> Vec<String> {
        vec![
            "-t".to_string(),
            "rsa".to_string(),
            "-T".to_string(),
            self.timeout.as_secs().max(1).to_string(),
            format!("{},{}", ip, hostname),
        ]
    }
}

/// Key part (`ssh-rsa AAAA...`) of keyscan output, if any
pub fn parse_keyscan_output(output: &str) -> Option<String> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .find_map(|line| line.find(KEY_TYPE).map(|at| line[at..].trim().to_string()))
}

#[async_trait]
impl HostKeyScanner for SshKeyscan {
    async fn scan(&self, ip: &str, hostname: &str) -> Result<Option<String>> {
        let output = Command::new("ssh-keyscan")
            .args(self.args(ip, hostname))
            .output()
            .await
            .map_err(|e| Error::SshKeyscan {
                host: ip.to_string(),
                reason: match e.kind() {
                    ErrorKind::NotFound => "ssh-keyscan not found".to_string(),
                    _ => e.to_string(),
                },
            })?;

        if !output.status.success() {
            debug!(ip, hostname, status = %output.status, "ssh-keyscan failed");
            return Ok(None);
        }

        Ok(parse_keyscan_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let scanner = SshKeyscan::new(Duration::from_secs(10));
        assert_eq!(
            scanner.args("10.0.0.11", "node-01"),
            vec!["-t", "rsa", "-T", "10", "10.0.0.11,node-01"]
        );
    }

    #[test]
    fn test_parse_output() {
        let out = "# 10.0.0.11:22 SSH-2.0-OpenSSH_8.9p1\n10.0.0.11,node-01 ssh-rsa AAAAB3Nza key\n";
        assert_eq!(parse_keyscan_output(out), Some("ssh-rsa AAAAB3Nza key".to_string()));
    }

    #[test]
    fn test_parse_empty_output() {
        assert_eq!(parse_keyscan_output(""), None);
        assert_eq!(parse_keyscan_output("# 10.0.0.11:22 SSH-2.0-OpenSSH\n"), None);
    }
}
