use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use core::time::Duration;
use nodeflake::{BitLayout, DEFAULT_EPOCH, GeneratorConfig};

/// Runtime configuration for the `nodeflake` binary.
///
/// The epoch and bit widths must match whatever produced (or will consume)
/// the IDs: decoding with a different layout yields garbage. Every setting
/// can come from a flag, an environment variable, or a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodeflake",
    version,
    about = "Generate, decode and inspect node-scoped Snowflake IDs"
)]
pub struct CliArgs {
    /// Origin of the timestamp field, in milliseconds since 1970-01-01 UTC.
    ///
    /// Environment variable: `NODEFLAKE_EPOCH_MS`
    #[arg(long, env = "NODEFLAKE_EPOCH_MS", default_value_t = DEFAULT_EPOCH.as_millis() as u64)]
    pub epoch_ms: u64,

    /// Width of the timestamp field.
    ///
    /// Environment variable: `NODEFLAKE_TIMESTAMP_BITS`
    #[arg(long, env = "NODEFLAKE_TIMESTAMP_BITS", default_value_t = BitLayout::REFERENCE.timestamp_bits())]
    pub timestamp_bits: u32,

    /// Width of the datacenter ID field.
    ///
    /// Environment variable: `NODEFLAKE_DATACENTER_ID_BITS`
    #[arg(long, env = "NODEFLAKE_DATACENTER_ID_BITS", default_value_t = BitLayout::REFERENCE.datacenter_id_bits())]
    pub datacenter_id_bits: u32,

    /// Width of the worker ID field.
    ///
    /// Environment variable: `NODEFLAKE_WORKER_ID_BITS`
    #[arg(long, env = "NODEFLAKE_WORKER_ID_BITS", default_value_t = BitLayout::REFERENCE.worker_id_bits())]
    pub worker_id_bits: u32,

    /// Width of the per-millisecond sequence field.
    ///
    /// Environment variable: `NODEFLAKE_SEQUENCE_BITS`
    #[arg(long, env = "NODEFLAKE_SEQUENCE_BITS", default_value_t = BitLayout::REFERENCE.sequence_bits())]
    pub sequence_bits: u32,

    /// Pin the datacenter ID instead of deriving it from the network
    /// interfaces.
    ///
    /// Environment variable: `NODEFLAKE_DATACENTER_ID`
    #[arg(long, env = "NODEFLAKE_DATACENTER_ID")]
    pub datacenter_id: Option<i64>,

    /// Pin the worker ID instead of hashing it from the datacenter ID and
    /// process id.
    ///
    /// Environment variable: `NODEFLAKE_WORKER_ID`
    #[arg(long, env = "NODEFLAKE_WORKER_ID")]
    pub worker_id: Option<i64>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate fresh IDs, one per line.
    Next {
        /// How many IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Split IDs into timestamp, datacenter ID, worker ID and sequence.
    Decode {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Show the node identity this host would use.
    Identity,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub datacenter_id: Option<i64>,
    pub worker_id: Option<i64>,
    pub json: bool,
    pub command: Command,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let layout = BitLayout::new(
            args.timestamp_bits,
            args.datacenter_id_bits,
            args.worker_id_bits,
            args.sequence_bits,
        )
        .context("invalid bit layout")?;

        if i64::try_from(args.epoch_ms).is_err() {
            bail!("NODEFLAKE_EPOCH_MS ({}) does not fit in 63 bits", args.epoch_ms);
        }

        if let Some(id) = args.datacenter_id {
            if !(0..=layout.max_datacenter_id()).contains(&id) {
                bail!(
                    "NODEFLAKE_DATACENTER_ID ({id}) exceeds the datacenter ID space (max = {})",
                    layout.max_datacenter_id()
                );
            }
        }

        if let Some(id) = args.worker_id {
            if !(0..=layout.max_worker_id()).contains(&id) {
                bail!(
                    "NODEFLAKE_WORKER_ID ({id}) exceeds the worker ID space (max = {})",
                    layout.max_worker_id()
                );
            }
        }

        Ok(Self {
            generator: GeneratorConfig::new(Duration::from_millis(args.epoch_ms), layout),
            datacenter_id: args.datacenter_id,
            worker_id: args.worker_id,
            json: args.json,
            command: args.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<AppConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("nodeflake").chain(args.iter().copied()))?;
        AppConfig::try_from(args)
    }

    #[test]
    fn defaults_to_reference_layout() {
        let config = parse(&["next"]).unwrap();
        assert_eq!(config.generator, GeneratorConfig::default());
        assert_eq!(config.command, Command::Next { count: 1 });
        assert!(!config.json);
    }

    #[test]
    fn rejects_layout_wider_than_63_bits() {
        let err = parse(&["--timestamp-bits", "42", "identity"]).unwrap_err();
        assert!(format!("{err:#}").contains("invalid bit layout"));
    }

    #[test]
    fn rejects_pinned_ids_outside_layout() {
        assert!(parse(&["--datacenter-id", "32", "identity"]).is_err());
        assert!(parse(&["--worker-id=-1", "identity"]).is_err());
        assert!(parse(&["--datacenter-id", "31", "--worker-id", "0", "identity"]).is_ok());
    }

    #[test]
    fn json_flag_is_accepted_after_subcommand() {
        let config = parse(&["decode", "42", "--json"]).unwrap();
        assert!(config.json);
        assert_eq!(config.command, Command::Decode { ids: vec![42] });
    }
}
