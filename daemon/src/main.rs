//! Knock daemon: entry point for running a knock server node.

use clap::Parser;
use knock_node::{init_logging, KnockNode, NodeConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "knock-daemon", about = "Proximity knock server daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "KNOCK_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Settings that override the config file.
#[derive(clap::Args)]
struct Overrides {
    /// Address the HTTP API binds to.
    #[arg(long, env = "KNOCK_LISTEN_ADDRESS")]
    listen_address: Option<String>,

    /// HTTP API port.
    #[arg(long, env = "KNOCK_PORT")]
    port: Option<u16>,

    /// Seconds a knock session stays open.
    #[arg(long, env = "KNOCK_TTL_SECS")]
    knock_ttl_secs: Option<u64>,

    /// Seconds between a matching report and the confirmed-knock push.
    #[arg(long, env = "KNOCK_CONFIRM_DELAY_SECS")]
    confirm_delay_secs: Option<u64>,

    /// Ignore `X-Forwarded-For` and use the TCP peer address only.
    #[arg(long, env = "KNOCK_IGNORE_FORWARDED_FOR")]
    ignore_forwarded_for: bool,

    /// Base URL of a remote group document store.
    #[arg(long, env = "KNOCK_GROUP_STORE_URL")]
    group_store_url: Option<String>,

    /// Push provider send endpoint. Without it pushes are only logged.
    #[arg(long, env = "KNOCK_PUSH_ENDPOINT_URL")]
    push_endpoint_url: Option<String>,

    /// Push provider server key.
    #[arg(long, env = "KNOCK_PUSH_SERVER_KEY", hide_env_values = true)]
    push_server_key: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "KNOCK_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "KNOCK_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the server until SIGINT/SIGTERM.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Overrides {
    fn apply(self, base: NodeConfig) -> NodeConfig {
        let mut push = base.push;
        if self.push_endpoint_url.is_some() {
            push.endpoint_url = self.push_endpoint_url;
        }
        if self.push_server_key.is_some() {
            push.server_key = self.push_server_key;
        }
        NodeConfig {
            listen_address: self.listen_address.unwrap_or(base.listen_address),
            port: self.port.unwrap_or(base.port),
            knock_ttl_secs: self.knock_ttl_secs.unwrap_or(base.knock_ttl_secs),
            confirm_delay_secs: self.confirm_delay_secs.unwrap_or(base.confirm_delay_secs),
            trust_forwarded_for: base.trust_forwarded_for && !self.ignore_forwarded_for,
            group_store_url: self.group_store_url.or(base.group_store_url),
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
            push,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(&path.to_string_lossy())?,
        None => NodeConfig::default(),
    };
    let config = cli.overrides.apply(base);
    config.validate()?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Run => {
            init_logging(config.log_format()?, &config.log_level)?;
            if let Some(path) = &cli.config {
                tracing::info!("Loaded config from {}", path.display());
            }

            let mut node = KnockNode::new(config)?;
            let addr = node.start().await?;
            tracing::info!("knock daemon listening on {addr}");

            node.run_until_signal().await?;
            tracing::info!("knock daemon exited cleanly");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("knock-daemon").chain(args.iter().copied()))
            .expect("valid args")
    }

    #[test]
    fn flags_override_base_config() {
        let cli = parse(&["--port", "9000", "--knock-ttl-secs", "30", "--ignore-forwarded-for", "run"]);
        let config = cli.overrides.apply(NodeConfig::default());
        assert_eq!(config.port, 9000);
        assert_eq!(config.knock_ttl_secs, 30);
        assert_eq!(config.confirm_delay_secs, 2);
        assert!(!config.trust_forwarded_for);
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let base = NodeConfig::from_toml_str(
            "port = 7000\n[push]\nendpoint_url = \"https://push.example/send\"",
        )
        .unwrap();
        let cli = parse(&["--push-server-key", "secret", "config"]);
        let config = cli.overrides.apply(base);
        assert_eq!(config.port, 7000);
        assert_eq!(config.push.endpoint_url.as_deref(), Some("https://push.example/send"));
        assert_eq!(config.push.server_key.as_deref(), Some("secret"));
        assert!(config.trust_forwarded_for);
    }
}
