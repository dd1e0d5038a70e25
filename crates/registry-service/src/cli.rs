//! CLI module for the registry.
//!
//! Provides the command-line interface used by the unified registry-rs
//! binary. Every command prints its result as pretty JSON on stdout.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use registry_config::{load_config, validate_config, LoggingConfig, RegistryConfig};
use registry_core::defaults::{DEFAULT_IP_LIMIT, DEFAULT_QUOTA_GB, DEFAULT_VALIDITY_DAYS};
use registry_core::validate::trial_username;
use registry_core::{Credential, Protocol};

use crate::RegistryService;

/// Registry CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "registry-rs", version, about = "User registry and quota accounting")]
pub struct RegistryArgs {
    /// Config file path (json/jsonc/yaml/toml)
    #[arg(short, long, default_value = "/etc/vpn-api/config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: RegistryCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RegistryCommand {
    /// Show one user's quota view.
    Get {
        /// Protocol (vmess/vless/trojan)
        protocol: String,
        /// Username
        username: String,
    },
    /// List all users with aggregate statistics.
    List {
        /// Restrict to one protocol
        #[arg(long)]
        protocol: Option<String>,
    },
    /// Per-protocol aggregate counts.
    Summary,
    /// Provision a new account.
    Provision(Box<ProvisionArgs>),
}

#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    /// Protocol (vmess/vless/trojan)
    pub protocol: String,
    /// Username (a trial name is generated when omitted)
    #[arg(long)]
    pub username: Option<String>,
    /// UUID credential for vmess/vless (generated when omitted)
    #[arg(long, conflicts_with = "password")]
    pub uuid: Option<String>,
    /// Password credential for trojan (generated when omitted)
    #[arg(long)]
    pub password: Option<String>,
    /// Validity in days from today
    #[arg(long, default_value_t = DEFAULT_VALIDITY_DAYS)]
    pub days: u32,
    /// Quota in GB (0 = unlimited)
    #[arg(long, default_value_t = DEFAULT_QUOTA_GB)]
    pub quota: u64,
    /// Simultaneous-IP limit
    #[arg(long, default_value_t = DEFAULT_IP_LIMIT)]
    pub ip_limit: u32,
}

/// Run a registry command with the given arguments.
pub async fn run(args: RegistryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_or_default(&args.config)?;
    validate_config(&config)?;
    init_tracing(&config.logging);

    let service = RegistryService::new(config);
    match args.command {
        RegistryCommand::Get { protocol, username } => {
            print_json(&service.get_user(&protocol, &username).await?)
        }
        RegistryCommand::List { protocol } => {
            let filter = protocol
                .as_deref()
                .map(Protocol::from_str)
                .transpose()?;
            print_json(&service.get_all_users(filter).await?)
        }
        RegistryCommand::Summary => print_json(&service.get_summary().await),
        RegistryCommand::Provision(provision) => {
            let protocol: Protocol = provision.protocol.parse()?;
            let username = provision.username.unwrap_or_else(trial_username);
            let credential = match (provision.uuid, provision.password) {
                (Some(uuid), _) => Credential::Uuid(uuid),
                (None, Some(password)) => Credential::Password(password),
                (None, None) => Credential::generate(protocol),
            };
            let expiry = expiry_from_today(provision.days);
            let receipt = service
                .provision_user(
                    &provision.protocol,
                    &username,
                    credential,
                    expiry,
                    provision.quota,
                    provision.ip_limit,
                )
                .await?;
            print_json(&receipt)
        }
    }
}

fn load_or_default(path: &PathBuf) -> Result<RegistryConfig, Box<dyn std::error::Error>> {
    if path.exists() {
        Ok(load_config(path)?)
    } else {
        // Matches the deployed behavior: a missing config file falls back
        // to defaults instead of refusing to start.
        eprintln!("config {} not found, using defaults", path.display());
        Ok(RegistryConfig::default())
    }
}

fn expiry_from_today(days: u32) -> NaiveDate {
    let today = Local::now().date_naive();
    today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(today)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    // JSON results go to stdout; logs stay on stderr.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
