//! The knock node: owns the registry and runs the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use knock_groups::{GroupDirectory, GroupStore, HttpGroupStore, MembershipResolver, MemoryGroupStore};
use knock_push::{HttpPushGateway, LogPushGateway, PushGateway};
use knock_rpc::{AppState, KnockMetrics, RpcError, RpcServer};
use knock_session::KnockRegistry;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::shutdown::ShutdownController;

pub struct KnockNode {
    pub config: NodeConfig,
    pub registry: KnockRegistry,
    pub metrics: Arc<KnockMetrics>,
    pub shutdown: Arc<ShutdownController>,
    /// Write access to groups; `None` when a remote store is configured.
    pub directory: Option<Arc<dyn GroupDirectory>>,
    server: Option<JoinHandle<Result<(), RpcError>>>,
    local_addr: Option<SocketAddr>,
}

impl KnockNode {
    /// Build every component from configuration. Nothing is bound yet.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let (store, directory): (Arc<dyn GroupStore>, Option<Arc<dyn GroupDirectory>>) =
            match &config.group_store_url {
                Some(url) => {
                    tracing::info!(url = %url, "using remote group store");
                    let remote: Arc<dyn GroupStore> = Arc::new(HttpGroupStore::new(url.clone()));
                    (remote, None)
                }
                None => {
                    let memory = Arc::new(MemoryGroupStore::new());
                    let directory: Arc<dyn GroupDirectory> = memory.clone();
                    let store: Arc<dyn GroupStore> = memory;
                    (store, Some(directory))
                }
            };

        let gateway: Arc<dyn PushGateway> = match &config.push.endpoint_url {
            Some(url) => Arc::new(HttpPushGateway::new(
                url.clone(),
                config.push.server_key.clone(),
                config.push.timeout(),
            )),
            None => {
                tracing::warn!("no push endpoint configured, pushes will only be logged");
                Arc::new(LogPushGateway)
            }
        };

        tracing::info!(gateway = gateway.name(), "push gateway ready");

        let registry = KnockRegistry::new(
            MembershipResolver::new(store),
            gateway,
            config.knock_config(),
        );
        let metrics = KnockMetrics::new().map_err(|e| NodeError::Metrics(e.to_string()))?;

        Ok(Self {
            config,
            registry,
            metrics: Arc::new(metrics),
            shutdown: Arc::new(ShutdownController::new()),
            directory,
            server: None,
            local_addr: None,
        })
    }

    /// Bind the HTTP listener and start serving in the background.
    ///
    /// Returns the bound address, which differs from the configured one
    /// when port `0` was requested. A stopped node cannot be started again.
    pub async fn start(&mut self) -> Result<SocketAddr, NodeError> {
        if self.server.is_some() {
            return Err(NodeError::AlreadyStarted);
        }
        if self.shutdown.is_shutdown() {
            return Err(NodeError::Stopped);
        }

        let listener = TcpListener::bind(self.config.socket_addr()?).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            knock_ttl_secs = self.config.knock_ttl_secs,
            confirm_delay_secs = self.config.confirm_delay_secs,
            "knock node starting"
        );

        let server = RpcServer::new(AppState {
            registry: self.registry.clone(),
            directory: self.directory.clone(),
            metrics: self.metrics.clone(),
            trust_forwarded_for: self.config.trust_forwarded_for,
        });
        let shutdown = self.shutdown.signalled();
        self.server = Some(tokio::spawn(async move {
            server.serve(listener, shutdown).await
        }));
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    /// Address the HTTP API is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Block until SIGINT/SIGTERM, then stop.
    pub async fn run_until_signal(&mut self) -> Result<(), NodeError> {
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Stop serving and drop every open knock session.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("knock node stopping");
        self.shutdown.shutdown();

        if let Some(handle) = self.server.take() {
            match handle.await {
                Ok(result) => result?,
                Err(e) => tracing::warn!("HTTP server task failed: {e}"),
            }
        }
        self.local_addr = None;

        let open = self.registry.open_count();
        self.registry.clear();
        tracing::info!(dropped_sessions = open, "knock node stopped");
        Ok(())
    }
}
