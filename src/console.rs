use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ConsoleError;
use crate::server::{ServerHandle, ShutdownOutcome};
use crate::system::{StatusSnapshot, StatusSnapshotBuilder};

pub const PROMPT: &str = "> ";

pub const HELP_TEXT: &str = "\
Available commands:
  status  - Print system status
  stop    - Stop the program
  help    - Show this help message
  about   - Show information about the program
";

pub const ABOUT_TEXT: &str = "\
StatusPro v1.0
A simple system status monitoring tool.
";

pub const UNKNOWN_COMMAND: &str =
    "Unknown command. Please enter 'status', 'stop', 'help', or 'about'.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    Stop,
    Help,
    About,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "status" => Command::Status,
            "stop" => Command::Stop,
            "help" => Command::Help,
            "about" => Command::About,
            _ => Command::Unknown,
        }
    }
}

/// How the command loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleExit {
    Stopped(ShutdownOutcome),
    EndOfInput,
}

/// Line-oriented command loop over any async reader and writer.
pub struct Console<R, W> {
    input: R,
    output: W,
    builder: Arc<StatusSnapshotBuilder>,
    fail_fast: bool,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W, builder: Arc<StatusSnapshotBuilder>, fail_fast: bool) -> Self {
        Self {
            input,
            output,
            builder,
            fail_fast,
        }
    }

    /// Runs until `stop`, end of input, or (with fail-fast) a failed `status`.
    /// Only the `stop` command touches the server.
    pub async fn run(&mut self, server: &ServerHandle) -> Result<ConsoleExit, ConsoleError> {
        let mut line = String::new();
        loop {
            self.write(PROMPT).await?;

            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                tracing::info!("console input closed");
                return Ok(ConsoleExit::EndOfInput);
            }

            match Command::parse(&line) {
                Command::Status => self.print_status().await?,
                Command::Stop => {
                    tracing::info!("stopping the program");
                    let outcome = server.shutdown().await;
                    log_shutdown(&outcome, server);
                    return Ok(ConsoleExit::Stopped(outcome));
                }
                Command::Help => self.write(HELP_TEXT).await?,
                Command::About => self.write(ABOUT_TEXT).await?,
                Command::Unknown => self.write(UNKNOWN_COMMAND).await?,
            }
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    async fn print_status(&mut self) -> Result<(), ConsoleError> {
        let builder = Arc::clone(&self.builder);
        let sampled = tokio::task::spawn_blocking(move || builder.build()).await?;

        match sampled {
            Ok(snapshot) => self.write(&format_snapshot(&snapshot)).await,
            Err(err) if self.fail_fast => {
                tracing::error!(metric = %err.metric, error = %err, "status command failed");
                Err(err.into())
            }
            Err(err) => {
                tracing::warn!(metric = %err.metric, error = %err, "status command failed");
                self.write(&format!("Error: {err}\n")).await
            }
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), ConsoleError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

pub fn format_snapshot(snapshot: &StatusSnapshot) -> String {
    format!(
        "CPU Model: {}\nCPU Usage: {:.2}%\nRAM Usage: {:.2}%\nDisk Usage: {:.2}%\n",
        snapshot.cpu_model, snapshot.cpu_usage, snapshot.ram_usage, snapshot.disk_usage
    )
}

pub(crate) fn log_shutdown(outcome: &ShutdownOutcome, server: &ServerHandle) {
    match outcome {
        ShutdownOutcome::Graceful => tracing::info!("HTTP server shut down gracefully"),
        ShutdownOutcome::Forced => tracing::warn!(
            grace_secs = server.grace_period().as_secs_f64(),
            "HTTP server did not drain in time; forced closed"
        ),
        ShutdownOutcome::NotRunning => tracing::debug!("HTTP server was not running"),
        ShutdownOutcome::Failed(err) => {
            tracing::error!(error = %err, "error shutting down HTTP server")
        }
    }
}
