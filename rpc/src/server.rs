//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use knock_groups::GroupDirectory;
use knock_session::KnockRegistry;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::RpcError;
use crate::handlers;
use crate::metrics::KnockMetrics;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: KnockRegistry,
    /// Write access to groups. `None` when groups are managed elsewhere, in
    /// which case the group routes are not mounted.
    pub directory: Option<Arc<dyn GroupDirectory>>,
    pub metrics: Arc<KnockMetrics>,
    /// Whether `X-Forwarded-For` comes from a trusted proxy.
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub(crate) fn directory(&self) -> Result<&Arc<dyn GroupDirectory>, RpcError> {
        self.directory
            .as_ref()
            .ok_or_else(|| RpcError::Server("group management is not enabled".into()))
    }
}

pub struct RpcServer {
    state: AppState,
}

impl RpcServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all handlers.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/knocks", post(handlers::initiate_knock))
            .route("/knocks/:knock_id/report", post(handlers::report_address))
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::metrics));

        if self.state.directory.is_some() {
            router = router
                .route("/groups", post(handlers::create_group))
                .route("/groups/:code/members", post(handlers::join_group))
                .route(
                    "/groups/:code/members/:member_id",
                    delete(handlers::leave_group),
                );
        }

        router
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError> {
        let addr = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("RPC server listening on {}", addr);

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RpcError::Server(e.to_string()))
    }
}
