//! maas-inventory
//!
//! Ansible dynamic inventory script for MAAS-managed Ceph clusters.
//!
//! ```text
//! maas-inventory --list              role groups + _meta.hostvars
//! maas-inventory --host [HOSTNAME]   {} (host variables are in --list)
//! maas-inventory --nodes             raw MAAS node records
//! maas-inventory --ssh-keys          refresh ~/.ssh/known_hosts
//! ```
//!
//! Exactly one mode must be given. The result is printed to stdout as
//! key-sorted JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use maas_inventory::cli::CommonArgs;
use maas_inventory::logging::init_logging;
use maas_inventory::{
    render_json, update_ssh_keys, InventoryBuilder, MaasClient, ProvisioningApi, SshKeyscan,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Produce an Ansible inventory from MAAS
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// List nodes by role tag
    #[arg(long)]
    list: bool,

    /// Get host specific variables
    #[arg(long, num_args = 0..=1, value_name = "HOSTNAME")]
    host: Option<Option<String>>,

    /// List all nodes known to MAAS
    #[arg(long)]
    nodes: bool,

    /// Update known_hosts with the nodes' host keys
    #[arg(long)]
    ssh_keys: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Host,
    Nodes,
    SshKeys,
}

impl Args {
    /// The single selected mode, `None` when zero or several were given
    fn mode(&self) -> Option<Mode> {
        let selected: Vec<Mode> = [
            (self.list, Mode::List),
            (self.host.is_some(), Mode::Host),
            (self.nodes, Mode::Nodes),
            (self.ssh_keys, Mode::SshKeys),
        ]
        .into_iter()
        .filter_map(|(on, mode)| on.then_some(mode))
        .collect();

        match selected.as_slice() {
            [mode] => Some(*mode),
            _ => None,
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let Some(mode) = args.mode() else {
        eprintln!("{}", Args::command().render_usage());
        eprintln!("exactly one of --list, --host, --nodes, --ssh-keys is required");
        std::process::exit(1);
    };

    init_logging(&args.common.log_level, args.common.log_json)?;
    let config = args.common.load_config().context("invalid configuration")?;

    let output = match mode {
        Mode::Host => render_json(&BTreeMap::<String, Value>::new())?,
        Mode::List => {
            let client = connect(&config.maas).await?;
            let inventory = InventoryBuilder::new(&config)
                .fetch(&client)
                .await
                .context("failed to build inventory")?;
            render_json(&inventory)?
        }
        Mode::Nodes => {
            let client = connect(&config.maas).await?;
            let records = client
                .list_node_records()
                .await
                .context("failed to list nodes")?;
            render_json(&records)?
        }
        Mode::SshKeys => {
            let client = connect(&config.maas).await?;
            let scanner = SshKeyscan::new(Duration::from_secs(config.ssh.keyscan_timeout_secs));
            let keys = update_ssh_keys(&client, &scanner, &config.ssh.known_hosts)
                .await
                .context("failed to refresh SSH host keys")?;
            render_json(&keys)?
        }
    };

    println!("{}", output);
    Ok(())
}

async fn connect(maas: &maas_inventory::MaasConfig) -> Result<MaasClient> {
    let client = MaasClient::connect(maas)
        .await
        .with_context(|| format!("cannot connect to MAAS at {}", maas.api_url()))?;
    info!(api_url = %client.api_url(), "Connected to MAAS");
    Ok(client)
}
