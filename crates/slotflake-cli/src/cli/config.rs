use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use slotflake::{CoordinatorConfig, KeySpace, RetryPolicy, TWITTER_EPOCH};

const DEFAULT_EPOCH_MILLIS: u64 = TWITTER_EPOCH.as_millis() as u64;

/// Runtime configuration for the `slotflake` binary.
///
/// Every option can also be supplied through the environment (or a `.env`
/// file in the working directory). The lease store is a directory shared by
/// every process that must receive distinct slots.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "slotflake",
    version,
    about = "Lease datacenter/worker slots and mint Snowflake-style IDs"
)]
pub struct CliArgs {
    /// Directory holding the lease files.
    ///
    /// Point every cooperating process (possibly on different hosts, via a
    /// shared mount) at the same directory.
    ///
    /// Environment variable: `SLOTFLAKE_STORE_DIR`
    #[arg(long, env = "SLOTFLAKE_STORE_DIR", default_value = ".slotflake", global = true)]
    pub store_dir: PathBuf,

    /// Hours a lease survives without renewal.
    ///
    /// Environment variable: `LEASE_TTL_HOURS`
    #[arg(long, env = "LEASE_TTL_HOURS", default_value_t = 24, global = true)]
    pub lease_ttl_hours: u64,

    /// Cron expression (seconds first, UTC) on which `hold` renews its lease.
    ///
    /// Environment variable: `RENEWAL_SCHEDULE`
    #[arg(long, env = "RENEWAL_SCHEDULE", default_value = "0 0 * * * *", global = true)]
    pub renewal_schedule: String,

    /// First segment of lease keys.
    ///
    /// Environment variable: `KEY_PREFIX`
    #[arg(long, env = "KEY_PREFIX", default_value = KeySpace::DEFAULT_PREFIX, global = true)]
    pub key_prefix: String,

    /// Second segment of lease keys.
    ///
    /// Environment variable: `KEY_SUBJECT`
    #[arg(long, env = "KEY_SUBJECT", default_value = KeySpace::DEFAULT_SUBJECT, global = true)]
    pub key_subject: String,

    /// Epoch of the timestamp field, in ms since 1970-01-01 UTC.
    ///
    /// Environment variable: `EPOCH_MILLIS`
    #[arg(long, env = "EPOCH_MILLIS", default_value_t = DEFAULT_EPOCH_MILLIS, global = true)]
    pub epoch_millis: u64,

    /// Attempts per store call while acquiring a slot.
    ///
    /// Environment variable: `STORE_MAX_ATTEMPTS`
    #[arg(long, env = "STORE_MAX_ATTEMPTS", default_value_t = 5, global = true)]
    pub store_max_attempts: u32,

    /// Log output format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Lease a slot, print IDs (one per line), then release the slot.
    Mint {
        /// Number of IDs to print.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u64,
    },
    /// Break an ID into its fields.
    Decode {
        /// The ID, as an unsigned decimal integer.
        id: u64,
    },
    /// List live leases.
    Leases,
    /// Lease a slot and keep it renewed until Ctrl+C or SIGTERM.
    Hold,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub store_dir: PathBuf,
    pub coordinator: CoordinatorConfig,
    pub log_format: LogFormat,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.store_dir.as_os_str().is_empty() {
            bail!("SLOTFLAKE_STORE_DIR must not be empty");
        }
        if matches!(args.command, Command::Mint { count: 0 }) {
            bail!("--count must be greater than 0");
        }

        let coordinator = CoordinatorConfig {
            lease_ttl_hours: args.lease_ttl_hours,
            renewal_schedule: args.renewal_schedule,
            key_prefix: args.key_prefix,
            key_subject: args.key_subject,
            epoch_millis: args.epoch_millis,
            retry: RetryPolicy {
                max_attempts: args.store_max_attempts,
                ..RetryPolicy::default()
            },
        };
        coordinator
            .validate()
            .context("invalid coordinator settings")?;

        Ok(Self {
            store_dir: args.store_dir,
            coordinator,
            log_format: args.log_format,
            command: args.command,
        })
    }
}
