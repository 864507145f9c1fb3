//! maas-tools
//!
//! Operator commands around the inventory: serial commissioning and
//! deployment, drive classification, interface link modes, host keys and
//! tag maintenance.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use maas_inventory::cli::CommonArgs;
use maas_inventory::inventory::tag_members;
use maas_inventory::logging::init_logging;
use maas_inventory::{
    render_json, update_ssh_keys, Config, LifecycleOrchestrator, LinkMode, LinkModePlanner,
    MaasClient, NodeClassifier, ProvisioningApi, SshKeyscan, DEFAULT_KERNEL,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// MAAS provisioning tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Commission every New node, one at a time
    Commission {
        /// Only process this system ID
        #[arg(long, short = 'n')]
        node: Option<String>,
    },

    /// Allocate and deploy every Ready node, one at a time
    Deploy {
        /// OS release (distro series) to install
        #[arg(long, short = 'r')]
        release: Option<String>,

        /// Kernel to install
        #[arg(long, short = 'k', default_value = DEFAULT_KERNEL)]
        kernel: String,

        /// Only process this system ID
        #[arg(long, short = 'n')]
        node: Option<String>,
    },

    /// Tag nodes as storage or client and their spare drives as data or journal
    Classify {
        /// Spare drives of at least this many GiB hold OSD data, smaller ones journals
        #[arg(long, short = 'T', default_value = "0")]
        data_size_threshold: u64,

        /// Remove the tags instead of adding them
        #[arg(long, short = 'U')]
        untag: bool,

        /// Print the plan without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Node tag for storage nodes
        #[arg(long, short = 't')]
        osd_tag: Option<String>,

        /// Drive tag for OSD data drives
        #[arg(long, short = 's')]
        storage_tag: Option<String>,

        /// Drive tag for OSD journal drives
        #[arg(long, short = 'j')]
        journal_tag: Option<String>,

        /// Node tag for client nodes
        #[arg(long)]
        client_tag: Option<String>,
    },

    /// Set the link mode of every non-PXE interface
    LinkMode {
        /// dhcp, static, auto or link_up
        #[arg(long, short = 'M', default_value = "dhcp")]
        mode: LinkMode,
    },

    /// Refresh known_hosts with the nodes' host keys
    SshKeys,

    /// List tags with their member hosts
    Tags {
        /// Tag prefix (defaults to the role prefix)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Update fields of a node
    Update {
        /// System ID of the node
        system_id: String,

        /// Fields as key=value
        #[arg(required = true, value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {}", s)),
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.common.log_level, cli.common.log_json)?;

    let config = cli.common.load_config().context("invalid configuration")?;
    let client = MaasClient::connect(&config.maas)
        .await
        .with_context(|| format!("cannot connect to MAAS at {}", config.maas.api_url()))?;
    info!(api_url = %client.api_url(), "Connected to MAAS");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current poll");
            on_interrupt.cancel();
        }
    });

    run(cli.command, &config, Arc::new(client), cancel).await
}

async fn run(
    command: Commands,
    config: &Config,
    client: Arc<MaasClient>,
    cancel: CancellationToken,
) -> Result<()> {
    match command {
        Commands::Commission { node } => {
            let mut orchestrator = LifecycleOrchestrator::new(client, &config.lifecycle, cancel);
            if let Some(node) = node {
                orchestrator = orchestrator.only(node);
            }
            let report = orchestrator
                .commission_all()
                .await
                .context("commissioning aborted")?;
            print_json(&report)
        }

        Commands::Deploy {
            release,
            kernel,
            node,
        } => {
            let mut orchestrator = LifecycleOrchestrator::new(client, &config.lifecycle, cancel);
            if let Some(node) = node {
                orchestrator = orchestrator.only(node);
            }
            let report = orchestrator
                .deploy_all(release.as_deref(), &kernel)
                .await
                .context("deployment aborted")?;
            print_json(&report)
        }

        Commands::Classify {
            data_size_threshold,
            untag,
            dry_run,
            osd_tag,
            storage_tag,
            journal_tag,
            client_tag,
        } => {
            let mut tags = config.tags.clone();
            if let Some(tag) = osd_tag {
                tags.osds = tag;
            }
            if let Some(tag) = storage_tag {
                tags.osd_data = tag;
            }
            if let Some(tag) = journal_tag {
                tags.osd_journal = tag;
            }
            if let Some(tag) = client_tag {
                tags.clients = tag;
            }

            let classifier = NodeClassifier::new(tags, data_size_threshold);
            let nodes = client.list_nodes().await.context("failed to list nodes")?;
            let plan = classifier.plan(&nodes);
            info!(
                node_tags = plan.node_tags.len(),
                drives = plan.drive_count(),
                "Classification planned"
            );

            if !dry_run {
                classifier
                    .apply(client.as_ref(), &plan, untag)
                    .await
                    .context("failed to apply tags")?;
            }
            print_json(&plan)
        }

        Commands::LinkMode { mode } => {
            let nodes = client.list_nodes().await.context("failed to list nodes")?;
            let failed = LinkModePlanner::new(mode).apply(client.as_ref(), &nodes).await;
            if failed > 0 {
                bail!("{} interface(s) could not be switched to {}", failed, mode);
            }
            Ok(())
        }

        Commands::SshKeys => {
            let scanner = SshKeyscan::new(Duration::from_secs(config.ssh.keyscan_timeout_secs));
            let keys = update_ssh_keys(client.as_ref(), &scanner, &config.ssh.known_hosts)
                .await
                .context("failed to refresh SSH host keys")?;
            print_json(&keys)
        }

        Commands::Tags { prefix } => {
            let prefix = prefix.unwrap_or_else(|| config.tags.role_prefix.clone());
            let members = tag_members(client.as_ref(), &prefix)
                .await
                .context("failed to list tags")?;
            print_json(&members)
        }

        Commands::Update { system_id, fields } => {
            let params: BTreeMap<String, String> = fields.into_iter().collect();
            client
                .update_node(&system_id, &params)
                .await
                .with_context(|| format!("failed to update node {}", system_id))?;
            info!(system_id = %system_id, fields = params.len(), "Node updated");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", render_json(data)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deploy() {
        let cli = Cli::try_parse_from(["maas-tools", "deploy", "-r", "jammy"]).unwrap();
        match cli.command {
            Commands::Deploy { release, kernel, node } => {
                assert_eq!(release.as_deref(), Some("jammy"));
                assert_eq!(kernel, "hwe-x");
                assert!(node.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_link_mode() {
        let cli = Cli::try_parse_from(["maas-tools", "link-mode", "--mode", "LINK_UP"]).unwrap();
        assert!(matches!(cli.command, Commands::LinkMode { mode: LinkMode::LinkUp }));
        assert!(Cli::try_parse_from(["maas-tools", "link-mode", "--mode", "bonded"]).is_err());
    }

    #[test]
    fn test_parse_update_fields() {
        let argv = ["maas-tools", "update", "n1", "hostname=osd-01", "zone=rack2"];
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Update { system_id, fields } => {
                assert_eq!(system_id, "n1");
                assert_eq!(fields[1], ("zone".to_string(), "rack2".to_string()));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["maas-tools", "update", "n1", "broken"]).is_err());
    }
}
