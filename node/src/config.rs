//! Node configuration with TOML file support.

use std::net::SocketAddr;
use std::time::Duration;

use knock_session::KnockConfig;
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a knock server node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Port the HTTP API listens on. `0` picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a knock session stays open.
    #[serde(default = "default_knock_ttl_secs")]
    pub knock_ttl_secs: u64,

    /// Seconds between a matching report and the confirmed-knock push.
    #[serde(default = "default_confirm_delay_secs")]
    pub confirm_delay_secs: u64,

    /// Take the client address from `X-Forwarded-For` when present.
    /// Only enable behind a proxy that overwrites the header.
    #[serde(default = "default_true")]
    pub trust_forwarded_for: bool,

    /// Base URL of a remote group document store. When unset, groups are
    /// held in process and the group management routes are served.
    #[serde(default)]
    pub group_store_url: Option<String>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub push: PushConfig,
}

/// Push gateway settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PushConfig {
    /// Send endpoint of the push provider. When unset, pushes are only logged.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Server key sent as `Authorization: key=...`.
    #[serde(default)]
    pub server_key: Option<String>,

    #[serde(default = "default_push_timeout_secs")]
    pub timeout_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_knock_ttl_secs() -> u64 {
    20
}

fn default_confirm_delay_secs() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_push_timeout_secs() -> u64 {
    10
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.knock_ttl_secs == 0 {
            return Err(NodeError::Config("knock_ttl_secs must be positive".into()));
        }
        if self.confirm_delay_secs >= self.knock_ttl_secs {
            return Err(NodeError::Config(format!(
                "confirm_delay_secs ({}) must be shorter than knock_ttl_secs ({})",
                self.confirm_delay_secs, self.knock_ttl_secs
            )));
        }
        self.log_format()?;
        self.socket_addr()?;
        Ok(())
    }

    pub fn knock_config(&self) -> KnockConfig {
        KnockConfig::from_secs(self.knock_ttl_secs, self.confirm_delay_secs)
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, NodeError> {
        format!("{}:{}", self.listen_address, self.port)
            .parse()
            .map_err(|e| NodeError::Config(format!("invalid listen address: {e}")))
    }
}

impl PushConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            port: default_port(),
            knock_ttl_secs: default_knock_ttl_secs(),
            confirm_delay_secs: default_confirm_delay_secs(),
            trust_forwarded_for: default_true(),
            group_store_url: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
            push: PushConfig::default(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            server_key: None,
            timeout_secs: default_push_timeout_secs(),
        }
    }
}
