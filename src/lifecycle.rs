use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::console::{Console, ConsoleExit, log_shutdown};
use crate::error::LifecycleError;
use crate::server::{self, ShutdownOutcome};
use crate::system::{MetricsProvider, StatusSnapshotBuilder};

pub const WELCOME_BANNER: &str = "Welcome to StatusPro. Type 'help' for a list of commands.\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The `stop` command ran.
    Stopped,
    /// Console input ended; handled like `stop`.
    EndOfInput,
    /// The interrupt future resolved (Ctrl-C in the binary).
    Interrupted,
}

/// Wires the HTTP service and the console together and owns the server handle.
pub struct ProcessLifecycle {
    config: Config,
    builder: Arc<StatusSnapshotBuilder>,
}

impl ProcessLifecycle {
    pub fn new(config: Config, provider: Arc<dyn MetricsProvider>) -> Self {
        let builder = Arc::new(StatusSnapshotBuilder::new(
            provider,
            config.metrics.disk_mount.clone(),
        ));
        Self { config, builder }
    }

    /// Starts the server in the background, then drives the console on the
    /// calling task until it exits, the listener fails to bind, or `interrupt`
    /// fires. The server is always shut down before returning.
    pub async fn run<R, W, S>(
        self,
        input: R,
        mut output: W,
        interrupt: S,
    ) -> Result<ExitReason, LifecycleError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        tracing::info!(
            addr = %self.config.server.socket_addr(),
            disk_mount = %self.builder.disk_mount().display(),
            "starting status service"
        );
        let server = server::spawn(&self.config.server, Arc::clone(&self.builder));

        output.write_all(WELCOME_BANNER.as_bytes()).await?;
        output.flush().await?;

        let mut console = Console::new(
            input,
            output,
            Arc::clone(&self.builder),
            self.config.console.fail_fast,
        );

        let result = tokio::select! {
            exit = console.run(&server) => match exit {
                Ok(ConsoleExit::Stopped(_)) => Ok(ExitReason::Stopped),
                Ok(ConsoleExit::EndOfInput) => Ok(ExitReason::EndOfInput),
                Err(err) => Err(LifecycleError::from(err)),
            },
            err = server.failed() => Err(LifecycleError::from(err)),
            () = interrupt => {
                tracing::info!("interrupt received, stopping the program");
                Ok(ExitReason::Interrupted)
            }
        };

        let outcome = server.shutdown().await;
        if outcome != ShutdownOutcome::NotRunning {
            log_shutdown(&outcome, &server);
        }
        result
    }
}
