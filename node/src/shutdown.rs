//! Stop signal for the HTTP server.
//!
//! The signal is latched: once raised it stays raised, so a server that
//! starts listening after `shutdown()` stops straight away.

use std::future::Future;

use tokio::signal;
use tokio::sync::watch;

pub struct ShutdownController {
    stopped: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (stopped, _) = watch::channel(false);
        Self { stopped }
    }

    /// Resolves once [`ShutdownController::shutdown`] has been called,
    /// including calls made before this future was created.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.stopped.subscribe();
        async move {
            let _ = rx.wait_for(|stopped| *stopped).await;
        }
    }

    pub fn shutdown(&self) {
        self.stopped.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Park until the process gets Ctrl-C or SIGTERM, then raise the signal.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = signal::ctrl_c() => tracing::info!("interrupted, stopping knock node"),
            _ = terminated() => tracing::info!("terminated, stopping knock node"),
        }
        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn terminated() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("SIGTERM handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending::<()>().await;
}
