//! HTTP surface: `GET /status` plus a static asset for everything else.
//!
//! [`spawn`] returns immediately with a [`ServerHandle`]; binding and serving
//! happen on a background task. The handle is the only way to stop it.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::system::StatusSnapshotBuilder;

#[derive(Debug, Clone)]
pub enum ListenerState {
    Starting,
    Listening(SocketAddr),
    Failed(ServiceError),
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// In-flight requests drained within the grace period.
    Graceful,
    /// Grace period expired; the server task was aborted.
    Forced,
    /// Nothing to stop: never started, already stopped, or shut down before.
    NotRunning,
    /// The server task panicked.
    Failed(String),
}

pub fn router(builder: Arc<StatusSnapshotBuilder>, static_asset: &Path) -> Router {
    Router::new()
        .route("/status", get(status))
        .fallback_service(ServeFile::new(static_asset))
        .layer(TraceLayer::new_for_http())
        .with_state(builder)
}

async fn status(State(builder): State<Arc<StatusSnapshotBuilder>>) -> Response {
    let sampled = tokio::task::spawn_blocking(move || builder.build()).await;

    let snapshot = match sampled {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(err)) => {
            tracing::warn!(metric = %err.metric, error = %err, "status request failed");
            return plain_error(err.to_string());
        }
        Err(err) => {
            tracing::error!(error = %err, "metrics sampler task failed");
            return plain_error(format!("metrics sampler task failed: {err}"));
        }
    };

    match serde_json::to_string_pretty(&snapshot) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => plain_error(err.to_string()),
    }
}

fn plain_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{message}\n"),
    )
        .into_response()
}

/// Starts the status service on a background task without waiting for the bind.
pub fn spawn(config: &ServerConfig, builder: Arc<StatusSnapshotBuilder>) -> ServerHandle {
    let app = router(builder, &config.static_asset);
    let token = CancellationToken::new();
    let state = Arc::new(watch::Sender::new(ListenerState::Starting));

    let task = tokio::spawn(serve(
        config.socket_addr(),
        app,
        token.clone(),
        Arc::clone(&state),
    ));

    ServerHandle {
        token,
        state,
        task: Mutex::new(Some(task)),
        grace: config.shutdown_grace(),
    }
}

async fn serve(
    addr: SocketAddr,
    app: Router,
    token: CancellationToken,
    state: Arc<watch::Sender<ListenerState>>,
) {
    let listener = tokio::select! {
        biased;
        () = token.cancelled() => {
            tracing::info!(%addr, "shutdown requested before the listener was bound");
            state.send_replace(ListenerState::Stopped);
            return;
        }
        bound = TcpListener::bind(addr) => match bound {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!(%addr, error = %err, "HTTP listener failed to bind");
                state.send_replace(ListenerState::Failed(ServiceError::Bind {
                    addr,
                    source: Arc::new(err),
                }));
                return;
            }
        },
    };

    let local_addr = listener.local_addr().unwrap_or(addr);
    tracing::info!(addr = %local_addr, "HTTP server listening");
    state.send_replace(ListenerState::Listening(local_addr));

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(token.cancelled_owned())
        .await;
    if let Err(err) = served {
        tracing::error!(error = %err, "HTTP server stopped with an error");
    }
    state.send_replace(ListenerState::Stopped);
}

/// Owner-side control of a running status service.
///
/// Shutdown happens at most once; later calls report [`ShutdownOutcome::NotRunning`].
/// Dropping the handle cancels the service without waiting for it.
pub struct ServerHandle {
    token: CancellationToken,
    state: Arc<watch::Sender<ListenerState>>,
    task: Mutex<Option<JoinHandle<()>>>,
    grace: Duration,
}

impl ServerHandle {
    pub fn state(&self) -> ListenerState {
        self.state.borrow().clone()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace
    }

    /// Waits until the listener is bound, or reports why it never will be.
    pub async fn wait_listening(&self) -> Result<SocketAddr, ServiceError> {
        let mut state = self.state.subscribe();
        loop {
            let settled = match &*state.borrow_and_update() {
                ListenerState::Starting => None,
                ListenerState::Listening(addr) => Some(Ok(*addr)),
                ListenerState::Failed(err) => Some(Err(err.clone())),
                ListenerState::Stopped => Some(Err(ServiceError::NotListening)),
            };
            if let Some(result) = settled {
                return result;
            }
            if state.changed().await.is_err() {
                return Err(ServiceError::NotListening);
            }
        }
    }

    /// Resolves only if the listener fails to start; pending forever otherwise.
    pub async fn failed(&self) -> ServiceError {
        let mut state = self.state.subscribe();
        loop {
            if let ListenerState::Failed(err) = &*state.borrow_and_update() {
                return err.clone();
            }
            if state.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Stops accepting connections and gives in-flight requests up to the
    /// grace period before the server task is aborted.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut task) = task else {
            return ShutdownOutcome::NotRunning;
        };

        self.token.cancel();
        let outcome = match tokio::time::timeout(self.grace, &mut task).await {
            Ok(Ok(())) => ShutdownOutcome::Graceful,
            Ok(Err(err)) => ShutdownOutcome::Failed(err.to_string()),
            Err(_) => {
                task.abort();
                // Wait for the abort so the listener is closed on return.
                let _ = task.await;
                ShutdownOutcome::Forced
            }
        };
        // The task never publishes `Stopped` when it was aborted or panicked.
        self.state.send_replace(ListenerState::Stopped);
        outcome
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
